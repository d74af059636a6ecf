//! Member translators
//!
//! A member translator turns a member access in a query (`x.Data.Age`,
//! `x.Data.Aliases.len()`) into SQL. Translators are tried in turn; `None`
//! means "not mine" and lets the next one have a go.

use super::expr::{ColumnExpr, FieldType, SqlExpr};
use super::factory::SqlExpressionFactory;
use tracing::trace;

/// The member being read from an instance expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberAccess {
    /// Field `name` declared on type `owner`.
    Field { owner: String, name: String },
    /// Element count of a collection.
    Length,
}

impl MemberAccess {
    pub fn field(owner: impl Into<String>, name: impl Into<String>) -> Self {
        MemberAccess::Field {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn length() -> Self {
        MemberAccess::Length
    }
}

pub trait MemberTranslator: Send + Sync {
    fn name(&self) -> &'static str;

    fn translate(
        &self,
        instance: &SqlExpr,
        member: &MemberAccess,
        return_type: &FieldType,
    ) -> Option<SqlExpr>;
}

/// Translates field access on `json`/`jsonb` columns into JSON path
/// expressions named the way the column's converter writes them.
#[derive(Debug, Clone)]
pub struct JsonMemberTranslator {
    factory: SqlExpressionFactory,
}

impl JsonMemberTranslator {
    pub fn new(factory: SqlExpressionFactory) -> Self {
        Self { factory }
    }

    fn translate_json_mapping(
        &self,
        instance: &SqlExpr,
        column: &ColumnExpr,
        member: &MemberAccess,
        return_type: &FieldType,
    ) -> Option<SqlExpr> {
        if !column.mapping.is_json() {
            return None;
        }
        let naming = column.mapping.naming.as_ref()?;

        let (owner, name) = match member {
            MemberAccess::Length => return Some(self.factory.array_length(instance)),
            MemberAccess::Field { owner, name } => (owner, name),
        };

        // No override and no naming policy: the stored key is unknown.
        let Some(json_name) = naming.convert_name(owner, name) else {
            trace!("No JSON name for {}.{} on column '{}'", owner, name, column.name);
            return None;
        };

        trace!("Translated {}.{} to JSON key '{}'", owner, name, json_name);
        Some(
            self.factory
                .member_access(instance, self.factory.constant(json_name), return_type),
        )
    }
}

impl MemberTranslator for JsonMemberTranslator {
    fn name(&self) -> &'static str {
        "JsonMember"
    }

    fn translate(
        &self,
        instance: &SqlExpr,
        member: &MemberAccess,
        return_type: &FieldType,
    ) -> Option<SqlExpr> {
        match instance {
            SqlExpr::Column(column) => {
                self.translate_json_mapping(instance, column, member, return_type)
            }
            SqlExpr::JsonTraversal(traversal) => {
                let column = traversal.root_column()?;
                self.translate_json_mapping(instance, column, member, return_type)
            }
            _ => None,
        }
    }
}

use super::expr::{ColumnExpr, FieldType, JsonTraversal, SqlExpr, SqlValue, TypeMapping};
use crate::metadata::{Property, StoreType};

/// Target database of the query compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    PostgreSql,
    Sqlite,
    Generic,
}

/// Builds expressions in the compiler's IR.
#[derive(Debug, Clone, Default)]
pub struct SqlExpressionFactory {
    dialect: Dialect,
}

impl SqlExpressionFactory {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn postgres() -> Self {
        Self::new(Dialect::PostgreSql)
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// A column reference typed by the property's storage mapping.
    pub fn column(&self, table: &str, property: &Property, field_type: FieldType) -> SqlExpr {
        let mut mapping = TypeMapping::new(property.store_type().clone());
        mapping.naming = property.naming();
        self.column_with_mapping(table, property.column_name(), field_type, mapping)
    }

    pub fn column_with_mapping(
        &self,
        table: &str,
        name: &str,
        field_type: FieldType,
        mapping: TypeMapping,
    ) -> SqlExpr {
        SqlExpr::Column(ColumnExpr {
            table: table.to_string(),
            name: name.to_string(),
            field_type,
            mapping,
        })
    }

    pub fn constant(&self, value: impl Into<SqlValue>) -> SqlExpr {
        SqlExpr::Constant(value.into())
    }

    pub fn convert(&self, operand: SqlExpr, field_type: FieldType) -> SqlExpr {
        SqlExpr::Convert {
            operand: Box::new(operand),
            field_type,
        }
    }

    pub fn function(&self, name: &str, args: Vec<SqlExpr>, field_type: FieldType) -> SqlExpr {
        SqlExpr::Function {
            name: name.to_string(),
            args,
            field_type,
        }
    }

    /// Reads `key` from a document-valued expression.
    ///
    /// Documents and lists stay JSON (`->`). Scalars are extracted as text
    /// (`->>`) and cast to `return_type` unless it is text already.
    pub fn member_access(&self, instance: &SqlExpr, key: SqlExpr, return_type: &FieldType) -> SqlExpr {
        let returns_text = return_type.is_scalar();
        let traversal = match instance {
            SqlExpr::JsonTraversal(previous) => {
                previous.append(key, returns_text, return_type.clone())
            }
            other => JsonTraversal {
                base: Box::new(other.clone()),
                path: vec![key],
                returns_text,
                field_type: return_type.clone(),
            },
        };
        let traversal = SqlExpr::JsonTraversal(traversal);

        if returns_text && *return_type != FieldType::Text {
            self.convert(traversal, return_type.clone())
        } else {
            traversal
        }
    }

    /// Element count of a JSON array expression.
    pub fn array_length(&self, instance: &SqlExpr) -> SqlExpr {
        let name = match instance.root_column().map(|c| &c.mapping.store_type) {
            Some(StoreType::Json) => "json_array_length",
            _ => "jsonb_array_length",
        };
        self.function(name, vec![instance.clone()], FieldType::Integer)
    }
}

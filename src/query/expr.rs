//! SQL expression IR produced by member translators.
//!
//! `Display` renders PostgreSQL syntax.

use crate::metadata::StoreType;
use crate::naming::ConvertName;
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

/// Result type of an expression, as seen by the query compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Integer,
    BigInt,
    Real,
    Double,
    Boolean,
    /// A nested document of the named type.
    Document(String),
    List(Box<FieldType>),
}

impl FieldType {
    pub fn list(item: FieldType) -> Self {
        FieldType::List(Box::new(item))
    }

    pub fn document(name: impl Into<String>) -> Self {
        FieldType::Document(name.into())
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, FieldType::Document(_) | FieldType::List(_))
    }

    /// PostgreSQL type name for scalars.
    pub fn sql_name(&self) -> Option<&'static str> {
        match self {
            FieldType::Text => Some("text"),
            FieldType::Integer => Some("integer"),
            FieldType::BigInt => Some("bigint"),
            FieldType::Real => Some("real"),
            FieldType::Double => Some("double precision"),
            FieldType::Boolean => Some("boolean"),
            FieldType::Document(_) | FieldType::List(_) => None,
        }
    }
}

/// Storage type of a column plus the naming rules of its converter.
#[derive(Debug, Clone)]
pub struct TypeMapping {
    pub store_type: StoreType,
    pub naming: Option<Arc<dyn ConvertName>>,
}

impl TypeMapping {
    pub fn new(store_type: StoreType) -> Self {
        Self {
            store_type,
            naming: None,
        }
    }

    pub fn with_naming(mut self, naming: Arc<dyn ConvertName>) -> Self {
        self.naming = Some(naming);
        self
    }

    pub fn is_json(&self) -> bool {
        self.store_type.is_json()
    }
}

impl PartialEq for TypeMapping {
    fn eq(&self, other: &Self) -> bool {
        let same_naming = match (&self.naming, &other.naming) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        self.store_type == other.store_type && same_naming
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnExpr {
    pub table: String,
    pub name: String,
    pub field_type: FieldType,
    pub mapping: TypeMapping,
}

/// `base -> p1 -> p2 ->> pn`; only the last step may return text.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonTraversal {
    pub base: Box<SqlExpr>,
    pub path: Vec<SqlExpr>,
    pub returns_text: bool,
    pub field_type: FieldType,
}

impl JsonTraversal {
    /// The column the traversal starts from, if it starts from one.
    pub fn root_column(&self) -> Option<&ColumnExpr> {
        match self.base.as_ref() {
            SqlExpr::Column(column) => Some(column),
            _ => None,
        }
    }

    pub fn append(&self, step: SqlExpr, returns_text: bool, field_type: FieldType) -> Self {
        let mut path = self.path.clone();
        path.push(step);
        Self {
            base: self.base.clone(),
            path,
            returns_text,
            field_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Text(String),
    Integer(i64),
    Double(f64),
    Boolean(bool),
    Json(JsonValue),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    fn field_type(&self) -> FieldType {
        match self {
            SqlValue::Integer(_) => FieldType::BigInt,
            SqlValue::Double(_) => FieldType::Double,
            SqlValue::Boolean(_) => FieldType::Boolean,
            SqlValue::Null | SqlValue::Text(_) | SqlValue::Json(_) => FieldType::Text,
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Boolean(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqlExpr {
    Column(ColumnExpr),
    Constant(SqlValue),
    JsonTraversal(JsonTraversal),
    Convert {
        operand: Box<SqlExpr>,
        field_type: FieldType,
    },
    Function {
        name: String,
        args: Vec<SqlExpr>,
        field_type: FieldType,
    },
}

impl SqlExpr {
    pub fn field_type(&self) -> FieldType {
        match self {
            SqlExpr::Column(column) => column.field_type.clone(),
            SqlExpr::Constant(value) => value.field_type(),
            SqlExpr::JsonTraversal(traversal) => traversal.field_type.clone(),
            SqlExpr::Convert { field_type, .. } | SqlExpr::Function { field_type, .. } => {
                field_type.clone()
            }
        }
    }

    /// The column this expression reads from, looking through traversals.
    pub fn root_column(&self) -> Option<&ColumnExpr> {
        match self {
            SqlExpr::Column(column) => Some(column),
            SqlExpr::JsonTraversal(traversal) => traversal.root_column(),
            _ => None,
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, quote: char, text: &str) -> fmt::Result {
    write!(f, "{quote}")?;
    for c in text.chars() {
        if c == quote {
            write!(f, "{quote}")?;
        }
        write!(f, "{c}")?;
    }
    write!(f, "{quote}")
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Text(s) => write_quoted(f, '\'', s),
            SqlValue::Integer(i) => write!(f, "{}", i),
            SqlValue::Double(d) => write!(f, "{}", d),
            SqlValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            SqlValue::Json(v) => write_quoted(f, '\'', &v.to_string()),
        }
    }
}

impl fmt::Display for SqlExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlExpr::Column(column) => {
                write_quoted(f, '"', &column.table)?;
                write!(f, ".")?;
                write_quoted(f, '"', &column.name)
            }
            SqlExpr::Constant(value) => write!(f, "{}", value),
            SqlExpr::JsonTraversal(traversal) => {
                write!(f, "{}", traversal.base)?;
                let last = traversal.path.len().saturating_sub(1);
                for (i, step) in traversal.path.iter().enumerate() {
                    let op = if i == last && traversal.returns_text { "->>" } else { "->" };
                    write!(f, "{}{}", op, step)?;
                }
                Ok(())
            }
            SqlExpr::Convert {
                operand,
                field_type,
            } => match field_type.sql_name() {
                Some(name) => write!(f, "CAST({} AS {})", operand, name),
                None => write!(f, "{}", operand),
            },
            SqlExpr::Function { name, args, .. } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

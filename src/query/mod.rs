//! Query translation
//!
//! # Architecture
//!
//! - `expr.rs` - SQL expression IR and its PostgreSQL rendering
//! - `factory.rs` - builds IR nodes for the target dialect
//! - `translator.rs` - member translators, including the JSON one
//! - `plugin.rs` - translator plugins and the registry the compiler queries
//! - `eval.rs` - evaluates IR against stored rows

mod eval;
pub mod expr;
pub mod factory;
pub mod plugin;
pub mod translator;

pub use expr::{ColumnExpr, FieldType, JsonTraversal, SqlExpr, SqlValue, TypeMapping};
pub use factory::{Dialect, SqlExpressionFactory};
pub use plugin::{JsonMemberTranslatorPlugin, MemberTranslatorPlugin, MemberTranslatorRegistry};
pub use translator::{JsonMemberTranslator, MemberAccess, MemberTranslator};

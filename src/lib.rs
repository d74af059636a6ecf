// ============================================================================
// json_columns
// ============================================================================
//
// Stores typed values in `json`/`jsonb` columns with one shared serialization
// config per model or per property, compares them by their JSON form, and
// rewrites member access on such values into PostgreSQL JSON path
// expressions that use the same field names the codec writes.

pub mod error;
pub mod naming;
pub mod config;
pub mod codec;
pub mod value;
pub mod convert;
pub mod compare;
pub mod metadata;
pub mod convention;
pub mod query;
pub mod tracking;
pub mod extension;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use naming::{ConvertName, NamingPolicy};
pub use config::{FieldNameOverride, IgnoreCondition, SerializationConfig, ValueTransform};
pub use codec::JsonCodec;
pub use value::{ModelRef, ModelValue, model_value};

// Converters and comparers
pub use convert::{CustomValueConverter, JsonValueConverter, ValueConverter};
pub use compare::{CustomValueComparer, JsonValueComparer, ReferenceComparer, ValueComparer};

// Model metadata and conventions
pub use metadata::{
    ColumnBinding, ConfigurationSource, EntityType, EntityTypeBuilder, Model, ModelBuilder,
    Property, PropertyBuilder, StoreType, StoredRow, ValueMap, ValueType,
};
pub use convention::{ConventionSet, JsonSerializerConfigConvention, ModelFinalizingConvention};

// Query translation
pub use query::{
    Dialect, FieldType, JsonMemberTranslator, JsonMemberTranslatorPlugin, MemberAccess,
    MemberTranslator, MemberTranslatorPlugin, MemberTranslatorRegistry, SqlExpr,
    SqlExpressionFactory, SqlValue,
};

pub use tracking::{ChangeDetector, EntityEntry, EntityState};
pub use extension::{JsonColumnsExtension, JsonColumnsOptions};

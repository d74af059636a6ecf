#![allow(dead_code)]

use anyhow::{Context, anyhow};
use json_columns::{
    ChangeDetector, CustomValueComparer, CustomValueConverter, EntityEntry, EntityState,
    FieldType, JsonCodec, JsonColumnsExtension, JsonColumnsOptions, MemberAccess,
    MemberTranslatorRegistry, Model, ModelBuilder, NamingPolicy, SerializationConfig, SqlExpr,
    SqlExpressionFactory, SqlValue, StoredRow, ValueMap, ValueTransform, ConventionSet,
    model_value,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const TABLE: &str = "TestModels";
pub const ENTITY: &str = "TestModel";
pub const DATA_TYPE: &str = "TestJsonDataObject";
pub const ATTRIBUTES_TYPE: &str = "TestJsonDataAttributes";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TestJsonDataObject {
    pub name: String,
    pub age: i32,
    pub aliases: Option<Vec<String>>,
    pub description: Option<String>,
    pub dependants: Option<i32>,
    pub attributes: Option<TestJsonDataAttributes>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TestJsonDataAttributes {
    pub occupation: Option<String>,
    pub address: Option<String>,
}

impl TestJsonDataObject {
    pub fn new(name: &str, age: i32) -> Self {
        Self {
            name: name.to_string(),
            age,
            ..Default::default()
        }
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = Some(aliases.iter().map(|a| a.to_string()).collect());
        self
    }

    pub fn with_occupation(mut self, occupation: &str) -> Self {
        self.attributes = Some(TestJsonDataAttributes {
            occupation: Some(occupation.to_string()),
            address: None,
        });
        self
    }
}

/// `Attributes` is always stored as `DEETZ`, whatever the naming policy.
pub fn with_deetz(builder: json_columns::config::SerializationConfigBuilder) -> Arc<SerializationConfig> {
    builder
        .rename_field_of(DATA_TYPE, "Attributes", "DEETZ")
        .build_shared()
}

/// Plain config: declared identifiers, no naming policy.
pub fn plain_config() -> Arc<SerializationConfig> {
    with_deetz(SerializationConfig::builder())
}

/// camelCase names, case-insensitive reads, numbers readable from strings.
pub fn web_config() -> Arc<SerializationConfig> {
    with_deetz(
        SerializationConfig::builder()
            .naming_policy(NamingPolicy::CamelCase)
            .case_insensitive_names(true)
            .transform(ValueTransform::NumbersFromStrings),
    )
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TestModel {
    pub id: i32,
    pub data: Option<TestJsonDataObject>,
    pub data_custom_value_comparer: Option<TestJsonDataObject>,
    pub data_custom_value_converter: Option<TestJsonDataObject>,
    pub data_explicit: Option<TestJsonDataObject>,
    pub data_explicit_no_value_comparer: Option<TestJsonDataObject>,
}

impl TestModel {
    pub fn with_data(data: TestJsonDataObject) -> Self {
        Self {
            data: Some(data),
            ..Default::default()
        }
    }

    /// Every JSON property set, each with a distinct name and age.
    pub fn sample() -> Self {
        Self {
            id: 0,
            data: Some(TestJsonDataObject::new("Data", 1).with_aliases(&["Bits"])),
            data_custom_value_comparer: Some(TestJsonDataObject::new("DataCustomValueComparer", 4)),
            data_custom_value_converter: Some(TestJsonDataObject::new("DataCustomValueConverter", 5)),
            data_explicit: Some(TestJsonDataObject::new("DataExplicit", 2).with_aliases(&["Bobs"])),
            data_explicit_no_value_comparer: Some(TestJsonDataObject::new("DataExplicitNoValueComparer", 3)),
        }
    }

    fn json_properties(&self) -> [(&'static str, &Option<TestJsonDataObject>); 5] {
        [
            ("Data", &self.data),
            ("DataCustomValueComparer", &self.data_custom_value_comparer),
            ("DataCustomValueConverter", &self.data_custom_value_converter),
            ("DataExplicit", &self.data_explicit),
            ("DataExplicitNoValueComparer", &self.data_explicit_no_value_comparer),
        ]
    }

    pub fn to_values(&self) -> ValueMap {
        let mut values = ValueMap::new();
        values.insert("Id".to_string(), Some(model_value(self.id)));
        for (name, value) in self.json_properties() {
            values.insert(name.to_string(), value.clone().map(model_value));
        }
        values
    }

    pub fn from_entry(entry: &EntityEntry) -> anyhow::Result<Self> {
        let data = |name: &str| -> anyhow::Result<Option<TestJsonDataObject>> {
            Ok(entry.get::<TestJsonDataObject>(name)?.cloned())
        };
        Ok(Self {
            id: entry.get::<i32>("Id")?.copied().context("Id is NULL")?,
            data: data("Data")?,
            data_custom_value_comparer: data("DataCustomValueComparer")?,
            data_custom_value_converter: data("DataCustomValueConverter")?,
            data_explicit: data("DataExplicit")?,
            data_explicit_no_value_comparer: data("DataExplicitNoValueComparer")?,
        })
    }
}

pub fn configure_test_model(builder: &mut ModelBuilder) {
    builder.entity(ENTITY, |entity| {
        entity.to_table(TABLE).has_key("Id");
        entity.property::<i32>("Id").has_column_type("integer");
        entity
            .property::<TestJsonDataObject>("Data")
            .has_column_type("jsonb");

        entity
            .property::<TestJsonDataObject>("DataCustomValueComparer")
            .has_column_type("jsonb")
            .has_value_comparer(CustomValueComparer::<TestJsonDataObject>::new(
                |a, b| a == b,
                |value| value.age as u64,
            ));

        let codec = JsonCodec::new(web_config());
        let reader = codec.clone();
        entity
            .property::<TestJsonDataObject>("DataCustomValueConverter")
            .has_column_type("jsonb")
            .has_conversion(CustomValueConverter::<TestJsonDataObject>::new(
                move |value| codec.encode_value(value),
                move |text| reader.decode_value(text),
            ));

        entity
            .property::<TestJsonDataObject>("DataExplicit")
            .has_column_type("jsonb")
            .use_json_serializer_config(Some(web_config()), true);

        entity
            .property::<TestJsonDataObject>("DataExplicitNoValueComparer")
            .has_column_type("jsonb")
            .use_json_serializer_config(Some(web_config()), false);
    });
}

/// In-memory stand-in for a database context: one table of stored rows
/// plus the change tracker's entries.
pub struct TestContext {
    model: Model,
    factory: SqlExpressionFactory,
    translators: MemberTranslatorRegistry,
    table: BTreeMap<i32, StoredRow>,
    entries: BTreeMap<i32, EntityEntry>,
    next_id: i32,
}

impl TestContext {
    pub fn new(options: JsonColumnsOptions) -> anyhow::Result<Self> {
        Self::with_factory(options, SqlExpressionFactory::postgres())
    }

    pub fn with_default_config(config: Arc<SerializationConfig>, use_value_comparer: bool) -> anyhow::Result<Self> {
        Self::new(
            JsonColumnsOptions::new()
                .default_config(config)
                .use_value_comparer(use_value_comparer),
        )
    }

    pub fn with_factory(options: JsonColumnsOptions, factory: SqlExpressionFactory) -> anyhow::Result<Self> {
        options.validate()?;
        let extension = JsonColumnsExtension::new(options);

        let mut conventions = ConventionSet::new();
        extension.apply_conventions(&mut conventions);

        let mut builder = ModelBuilder::new();
        configure_test_model(&mut builder);
        let model = builder.finalize(&conventions)?;

        let mut translators = MemberTranslatorRegistry::new();
        translators.register_plugin(Box::new(extension.member_translator_plugin(&factory)));

        Ok(Self {
            model,
            factory,
            translators,
            table: BTreeMap::new(),
            entries: BTreeMap::new(),
            next_id: 1,
        })
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn factory(&self) -> &SqlExpressionFactory {
        &self.factory
    }

    pub fn translators(&self) -> &MemberTranslatorRegistry {
        &self.translators
    }

    /// Starts tracking `record` as new and returns its id.
    pub fn add(&mut self, mut record: TestModel) -> i32 {
        record.id = self.next_id;
        self.next_id += 1;
        self.entries
            .insert(record.id, EntityEntry::added(ENTITY, record.to_values()));
        record.id
    }

    /// Writes every added or changed entry and returns the number of rows
    /// written.
    pub fn save_changes(&mut self) -> anyhow::Result<usize> {
        let entity = self.model.entity_type(ENTITY)?;
        let detector = ChangeDetector::new();

        let mut affected = 0;
        for (id, entry) in self.entries.iter_mut() {
            detector.detect_changes(entity, entry)?;
            if entry.state() == EntityState::Unchanged {
                continue;
            }
            self.table.insert(*id, entity.to_row(entry.current_values())?);
            entry.accept_changes();
            affected += 1;
        }
        Ok(affected)
    }

    pub fn entry_mut(&mut self, id: i32) -> anyhow::Result<&mut EntityEntry> {
        self.entries
            .get_mut(&id)
            .ok_or_else(|| anyhow!("No tracked entry with id {}", id))
    }

    /// Drops the tracked entry and reads the row back from the table.
    pub fn reload(&mut self, id: i32) -> anyhow::Result<TestModel> {
        let entity = self.model.entity_type(ENTITY)?;
        let values = entity.from_row(self.row(id)?)?;
        let entry = EntityEntry::loaded(ENTITY, values);
        let record = TestModel::from_entry(&entry)?;
        self.entries.insert(id, entry);
        Ok(record)
    }

    pub fn row(&self, id: i32) -> anyhow::Result<&StoredRow> {
        self.table
            .get(&id)
            .ok_or_else(|| anyhow!("No stored row with id {}", id))
    }

    /// Stored text of one column, parsed as JSON.
    pub fn stored_json(&self, id: i32, column: &str) -> anyhow::Result<serde_json::Value> {
        let text = self
            .row(id)?
            .get(column)
            .cloned()
            .flatten()
            .with_context(|| format!("Column '{}' is NULL", column))?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Column expression for a JSON property of the test model.
    pub fn column(&self, property: &str) -> anyhow::Result<SqlExpr> {
        let property = self.model.entity_type(ENTITY)?.property(property)?;
        Ok(self
            .factory
            .column(TABLE, property, FieldType::document(DATA_TYPE)))
    }

    pub fn translate(
        &self,
        instance: &SqlExpr,
        owner: &str,
        member: &str,
        return_type: FieldType,
    ) -> Option<SqlExpr> {
        self.translators
            .translate(instance, &MemberAccess::field(owner, member), &return_type)
    }

    pub fn translate_length(&self, instance: &SqlExpr) -> Option<SqlExpr> {
        self.translators
            .translate(instance, &MemberAccess::length(), &FieldType::Integer)
    }

    /// Evaluates `expr` against the stored row of `id`.
    pub fn select(&self, id: i32, expr: &SqlExpr) -> anyhow::Result<SqlValue> {
        Ok(expr.evaluate(self.row(id)?)?)
    }
}

/// Checks that a rendered expression is valid PostgreSQL.
pub fn assert_parses(expr: &SqlExpr) -> anyhow::Result<()> {
    use sqlparser::dialect::PostgreSqlDialect;
    use sqlparser::parser::Parser;

    let sql = format!("SELECT {} FROM \"{}\"", expr, TABLE);
    let statements = Parser::parse_sql(&PostgreSqlDialect {}, &sql)
        .with_context(|| format!("Failed to parse: {}", sql))?;
    assert_eq!(statements.len(), 1, "{}", sql);
    Ok(())
}

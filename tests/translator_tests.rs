mod common;

use common::{
    ATTRIBUTES_TYPE, DATA_TYPE, TestContext, TestJsonDataObject, TestModel, assert_parses,
    plain_config, web_config,
};
use json_columns::{
    Dialect, FieldType, JsonCodec, JsonColumnsOptions, NamingPolicy, SerializationConfig, SqlExpr,
    SqlExpressionFactory, SqlValue, StoreType,
};
use json_columns::query::TypeMapping;
use serde_json::json;

fn saved(context: &mut TestContext, data: TestJsonDataObject) -> anyhow::Result<i32> {
    let id = context.add(TestModel::with_data(data));
    context.save_changes()?;
    Ok(id)
}

#[test]
fn test_traverse_attributes() -> anyhow::Result<()> {
    let mut context = TestContext::with_default_config(web_config(), true)?;
    let id = saved(&mut context, TestJsonDataObject::new("John Doe", 42).with_occupation("detective"))?;

    let data = context.column("Data")?;
    let attributes = context
        .translate(&data, DATA_TYPE, "Attributes", FieldType::document(ATTRIBUTES_TYPE))
        .expect("Attributes translates");
    let occupation = context
        .translate(&attributes, ATTRIBUTES_TYPE, "Occupation", FieldType::Text)
        .expect("Occupation translates");

    assert_eq!(
        occupation.to_string(),
        r#""TestModels"."Data"->'DEETZ'->>'occupation'"#
    );
    assert_parses(&occupation)?;
    assert_eq!(context.select(id, &occupation)?, SqlValue::Text("detective".into()));
    Ok(())
}

#[test]
fn test_traverse_list_count() -> anyhow::Result<()> {
    let mut context = TestContext::with_default_config(web_config(), true)?;
    let id = saved(&mut context, TestJsonDataObject::new("John Doe", 42).with_aliases(&["JD", "Johnny"]))?;

    let data = context.column("Data")?;
    let aliases = context
        .translate(&data, DATA_TYPE, "Aliases", FieldType::list(FieldType::Text))
        .expect("Aliases translates");
    let count = context.translate_length(&aliases).expect("Count translates");

    assert_eq!(
        count.to_string(),
        r#"jsonb_array_length("TestModels"."Data"->'aliases')"#
    );
    assert_parses(&count)?;
    assert_eq!(context.select(id, &count)?, SqlValue::Integer(2));
    Ok(())
}

#[test]
fn test_camel_case_naming_policy() -> anyhow::Result<()> {
    let mut context = TestContext::with_default_config(web_config(), true)?;
    let id = saved(&mut context, TestJsonDataObject::new("John Doe", 42))?;

    assert_eq!(context.stored_json(id, "Data")?["age"], json!(42));

    let data = context.column("Data")?;
    let age = context
        .translate(&data, DATA_TYPE, "Age", FieldType::Integer)
        .expect("Age translates");
    assert_eq!(age.to_string(), r#"CAST("TestModels"."Data"->>'age' AS integer)"#);
    assert_parses(&age)?;
    assert_eq!(context.select(id, &age)?, SqlValue::Integer(42));
    Ok(())
}

/// With no naming policy and no override there is no configured name, so a
/// member is left untranslated even though the codec writes it under its
/// declared identifier.
#[test]
fn test_default_naming_does_not_translate() -> anyhow::Result<()> {
    let mut context = TestContext::with_default_config(plain_config(), true)?;
    let id = saved(&mut context, TestJsonDataObject::new("John Doe", 42))?;

    // Written under the declared identifier...
    assert_eq!(context.stored_json(id, "Data")?["Age"], json!(42));

    // ...but with no policy and no override the key is not derived.
    let data = context.column("Data")?;
    assert!(context.translate(&data, DATA_TYPE, "Age", FieldType::Integer).is_none());

    // An override still applies.
    let attributes = context.translate(&data, DATA_TYPE, "Attributes", FieldType::document(ATTRIBUTES_TYPE));
    assert_eq!(
        attributes.map(|e| e.to_string()).as_deref(),
        Some(r#""TestModels"."Data"->'DEETZ'"#)
    );
    Ok(())
}

#[test]
fn test_override_wins_over_policy() -> anyhow::Result<()> {
    let config = web_config();
    assert_eq!(config.naming_policy(), Some(&NamingPolicy::CamelCase));

    let mut context = TestContext::with_default_config(config.clone(), true)?;
    let id = saved(&mut context, TestJsonDataObject::new("John Doe", 42).with_occupation("detective"))?;

    let stored = context.stored_json(id, "Data")?;
    assert_eq!(stored["DEETZ"]["occupation"], json!("detective"));
    assert!(stored.get("attributes").is_none());

    let document = JsonCodec::new(config).to_document(&TestJsonDataObject::new("x", 1).with_occupation("y"))?;
    assert!(document.get("DEETZ").is_some());

    let data = context.column("Data")?;
    let attributes = context
        .translate(&data, DATA_TYPE, "Attributes", FieldType::document(ATTRIBUTES_TYPE))
        .expect("Attributes translates");
    assert_eq!(attributes.to_string(), r#""TestModels"."Data"->'DEETZ'"#);
    Ok(())
}

#[test]
fn test_explicit_property_uses_own_config() -> anyhow::Result<()> {
    let upper = SerializationConfig::builder()
        .naming_policy(NamingPolicy::SnakeCaseUpper)
        .build_shared();
    let mut context = TestContext::with_default_config(upper, true)?;
    let id = context.add(TestModel::sample());
    context.save_changes()?;

    let data = context.column("Data")?;
    let explicit = context.column("DataExplicit")?;
    let age = |instance: &SqlExpr| context.translate(instance, DATA_TYPE, "Age", FieldType::Integer);

    assert_eq!(age(&data).map(|e| e.to_string()).as_deref(), Some(r#"CAST("TestModels"."Data"->>'AGE' AS integer)"#));
    let explicit_age = age(&explicit).expect("Age translates");
    assert_eq!(context.select(id, &explicit_age)?, SqlValue::Integer(2));
    Ok(())
}

#[test]
fn test_no_translation_without_json_converter() -> anyhow::Result<()> {
    // No default config: Data has no converter, so nothing names its keys.
    let context = TestContext::new(JsonColumnsOptions::new())?;
    let data = context.column("Data")?;
    assert!(context.translate(&data, DATA_TYPE, "Age", FieldType::Integer).is_none());

    // A custom converter is not a JSON one either.
    let custom = context.column("DataCustomValueConverter")?;
    assert!(context.translate(&custom, DATA_TYPE, "Age", FieldType::Integer).is_none());
    assert!(context.translate_length(&custom).is_none());
    Ok(())
}

#[test]
fn test_no_translation_for_non_json_column() -> anyhow::Result<()> {
    let context = TestContext::with_default_config(web_config(), true)?;
    let id = context.column("Id")?;
    assert!(context.translate(&id, DATA_TYPE, "Age", FieldType::Integer).is_none());

    let text = context.factory().column_with_mapping(
        "t",
        "payload",
        FieldType::Text,
        TypeMapping::new(StoreType::parse("text")).with_naming(web_config()),
    );
    assert!(context.translate(&text, DATA_TYPE, "Age", FieldType::Integer).is_none());
    Ok(())
}

#[test]
fn test_plugin_is_empty_for_other_providers() -> anyhow::Result<()> {
    let context = TestContext::with_factory(
        JsonColumnsOptions::new().default_config(web_config()),
        SqlExpressionFactory::new(Dialect::Sqlite),
    )?;
    assert!(context.translators().is_empty());

    let data = context.column("Data")?;
    assert!(context.translate(&data, DATA_TYPE, "Age", FieldType::Integer).is_none());
    Ok(())
}

#[test]
fn test_json_column_uses_json_array_length() -> anyhow::Result<()> {
    let factory = SqlExpressionFactory::postgres();
    let column = factory.column_with_mapping(
        "t",
        "doc",
        FieldType::document(DATA_TYPE),
        TypeMapping::new(StoreType::Json).with_naming(web_config()),
    );

    let context = TestContext::with_default_config(web_config(), true)?;
    let aliases = context
        .translate(&column, DATA_TYPE, "Aliases", FieldType::list(FieldType::Text))
        .expect("Aliases translates");
    let count = context.translate_length(&aliases).expect("Count translates");
    assert_eq!(count.to_string(), r#"json_array_length("t"."doc"->'aliases')"#);
    assert_parses(&count)?;
    Ok(())
}

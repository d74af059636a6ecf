mod common;

use common::{ENTITY, TestContext, TestJsonDataObject, plain_config, web_config};
use json_columns::{
    ConfigurationSource, CustomValueComparer, CustomValueConverter, JsonColumnsOptions,
    JsonValueComparer, JsonValueConverter, ModelRef, Property,
};
use std::sync::Arc;

fn property<'a>(context: &'a TestContext, name: &str) -> anyhow::Result<&'a Property> {
    Ok(context.model().entity_type(ENTITY)?.property(name)?)
}

fn has_json_converter(property: &Property) -> bool {
    property
        .converter()
        .is_some_and(|c| c.as_any().is::<JsonValueConverter<TestJsonDataObject>>())
}

fn has_json_comparer(property: &Property) -> bool {
    property
        .comparer()
        .is_some_and(|c| c.as_any().is::<JsonValueComparer<TestJsonDataObject>>())
}

#[test]
fn test_default_config_binds_json_columns() -> anyhow::Result<()> {
    let config = plain_config();
    let context = TestContext::with_default_config(config.clone(), true)?;

    let data = property(&context, "Data")?;
    assert!(has_json_converter(data));
    assert!(has_json_comparer(data));
    assert_eq!(data.converter_source(), Some(ConfigurationSource::Convention));

    // Every bound column shares the one config instance.
    let binding = data.binding().expect("Data is JSON-bound");
    assert!(Arc::ptr_eq(&binding.config, &config));
    assert!(binding.uses_value_comparer);

    let id = property(&context, "Id")?;
    assert!(id.converter().is_none());
    assert!(id.binding().is_none());
    Ok(())
}

#[test]
fn test_no_default_config_binds_nothing() -> anyhow::Result<()> {
    for use_value_comparer in [false, true] {
        let context = TestContext::new(JsonColumnsOptions::new().use_value_comparer(use_value_comparer))?;

        let data = property(&context, "Data")?;
        assert!(!has_json_converter(data));
        assert!(!has_json_comparer(data));

        // Explicit configuration does not depend on the default.
        assert!(has_json_converter(property(&context, "DataExplicit")?));
    }
    Ok(())
}

#[test]
fn test_value_comparer_can_be_disabled() -> anyhow::Result<()> {
    let context = TestContext::with_default_config(plain_config(), false)?;

    let data = property(&context, "Data")?;
    assert!(has_json_converter(data));
    assert!(data.comparer().is_none());
    assert!(!data.binding().expect("Data is JSON-bound").uses_value_comparer);
    Ok(())
}

#[test]
fn test_explicit_configuration_is_not_overridden() -> anyhow::Result<()> {
    for use_value_comparer in [false, true] {
        let context = TestContext::with_default_config(plain_config(), use_value_comparer)?;

        let custom_converter = property(&context, "DataCustomValueConverter")?;
        assert!(
            custom_converter
                .converter()
                .is_some_and(|c| c.as_any().is::<CustomValueConverter<TestJsonDataObject>>())
        );
        assert_eq!(custom_converter.converter_source(), Some(ConfigurationSource::Explicit));
        assert!(!has_json_comparer(custom_converter));

        let custom_comparer = property(&context, "DataCustomValueComparer")?;
        assert!(has_json_converter(custom_comparer));
        assert!(
            custom_comparer
                .comparer()
                .is_some_and(|c| c.as_any().is::<CustomValueComparer<TestJsonDataObject>>())
        );

        let explicit = property(&context, "DataExplicit")?;
        assert!(has_json_converter(explicit));
        assert!(has_json_comparer(explicit));
        assert_eq!(
            explicit.binding().map(|b| b.config.as_ref().clone()),
            Some(web_config().as_ref().clone())
        );

        let no_comparer = property(&context, "DataExplicitNoValueComparer")?;
        assert!(has_json_converter(no_comparer));
        assert!(no_comparer.comparer().is_none());
        assert_eq!(no_comparer.comparer_source(), Some(ConfigurationSource::Explicit));
    }
    Ok(())
}

#[test]
fn test_bound_converter_writes_configured_names() -> anyhow::Result<()> {
    let context = TestContext::with_default_config(web_config(), true)?;
    let data = property(&context, "Data")?;

    let value = TestJsonDataObject::new("John Doe", 42).with_occupation("detective");
    let text = data.write_value(Some(&value as ModelRef<'_>))?.expect("value is written");
    let document: serde_json::Value = serde_json::from_str(&text)?;
    assert_eq!(document["name"], "John Doe");
    assert_eq!(document["DEETZ"]["occupation"], "detective");

    let read = data.read_value(Some(text.as_str()))?.expect("value is read");
    assert_eq!(read.downcast_ref::<TestJsonDataObject>(), Some(&value));

    assert_eq!(data.write_value(None)?, None);
    assert!(data.read_value(None)?.is_none());
    Ok(())
}

#[test]
fn test_malformed_stored_text_fails_to_read() -> anyhow::Result<()> {
    let context = TestContext::with_default_config(web_config(), true)?;
    let data = property(&context, "Data")?;

    let err = data.read_value(Some("{\"name\": ")).unwrap_err();
    assert!(err.is_decode());
    let err = data.read_value(Some("[1, 2]")).unwrap_err();
    assert!(err.is_decode());
    Ok(())
}

//! Wiring into a host mapping layer
//!
//! [`JsonColumnsExtension`] carries the model-wide options, installs the
//! JSON convention into a [`ConventionSet`], hands out the member translator
//! plugin, and describes itself for logs and diagnostics.

use crate::config::SerializationConfig;
use crate::convention::{ConventionSet, JsonSerializerConfigConvention};
use crate::error::{Error, Result};
use crate::query::{JsonMemberTranslatorPlugin, MemberTranslatorPlugin, SqlExpressionFactory};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::debug;

const DEBUG_PREFIX: &str = "JsonColumns";

/// Model-wide JSON column options.
#[derive(Debug, Clone)]
pub struct JsonColumnsOptions {
    default_config: Option<Arc<SerializationConfig>>,
    use_value_comparer: bool,
}

impl Default for JsonColumnsOptions {
    fn default() -> Self {
        Self {
            default_config: None,
            use_value_comparer: true,
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct OptionsFile {
    #[serde(default)]
    default_config: Option<SerializationConfig>,
    #[serde(default = "enabled")]
    use_value_comparer: bool,
}

fn enabled() -> bool {
    true
}

impl JsonColumnsOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Config applied by convention to every `json`/`jsonb` property
    pub fn default_config(mut self, config: Arc<SerializationConfig>) -> Self {
        self.default_config = Some(config);
        self
    }

    /// Whether convention-bound properties also get the JSON comparer
    pub fn use_value_comparer(mut self, enabled: bool) -> Self {
        self.use_value_comparer = enabled;
        self
    }

    pub fn get_default_config(&self) -> Option<&Arc<SerializationConfig>> {
        self.default_config.as_ref()
    }

    pub fn uses_value_comparer(&self) -> bool {
        self.use_value_comparer
    }

    pub fn validate(&self) -> Result<()> {
        match &self.default_config {
            Some(config) => config.validate(),
            None => Ok(()),
        }
    }

    /// Loads options from JSON text, e.g.
    /// `{"default_config": {"naming_policy": "camelCase"}, "use_value_comparer": false}`.
    pub fn from_json(text: &str) -> Result<Self> {
        let file: OptionsFile =
            serde_json::from_str(text).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        let options = Self {
            default_config: file.default_config.map(Arc::new),
            use_value_comparer: file.use_value_comparer,
        };
        options.validate()?;
        Ok(options)
    }
}

#[derive(Debug, Clone, Default)]
pub struct JsonColumnsExtension {
    options: JsonColumnsOptions,
}

impl JsonColumnsExtension {
    pub fn new(options: JsonColumnsOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &JsonColumnsOptions {
        &self.options
    }

    /// Replaces the options, keeping the extension.
    pub fn configure(&mut self, default_config: Option<Arc<SerializationConfig>>, use_value_comparer: bool) {
        self.options = JsonColumnsOptions {
            default_config,
            use_value_comparer,
        };
    }

    pub fn apply_conventions(&self, conventions: &mut ConventionSet) {
        conventions.register(Box::new(JsonSerializerConfigConvention::new(
            self.options.default_config.clone(),
            self.options.use_value_comparer,
        )));
    }

    pub fn member_translator_plugin(&self, factory: &SqlExpressionFactory) -> JsonMemberTranslatorPlugin {
        let plugin = JsonMemberTranslatorPlugin::new(factory);
        debug!(
            "JSON member translator plugin for {:?} with {} translator(s)",
            factory.dialect(),
            plugin.translators().len()
        );
        plugin
    }

    fn config_json(&self, pretty: bool) -> String {
        let config = self.options.default_config.as_deref();
        let text = if pretty {
            serde_json::to_string_pretty(&config)
        } else {
            serde_json::to_string(&config)
        };
        text.unwrap_or_else(|e| format!("<{}>", e))
    }

    /// One-line description for logs.
    pub fn log_fragment(&self) -> String {
        format!(
            "{} default_config={} use_value_comparer={}",
            DEBUG_PREFIX,
            self.config_json(false),
            self.options.use_value_comparer
        )
    }

    pub fn populate_debug_info(&self, debug_info: &mut BTreeMap<String, String>) {
        debug_info.insert(
            format!("{}:default_config", DEBUG_PREFIX),
            self.config_json(true),
        );
        debug_info.insert(
            format!("{}:use_value_comparer", DEBUG_PREFIX),
            self.options.use_value_comparer.to_string(),
        );
    }

    /// Consistent with [`Self::should_use_same_service_provider`]: configs
    /// are hashed by identity.
    pub fn service_provider_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.options
            .default_config
            .as_ref()
            .map(|config| Arc::as_ptr(config) as usize)
            .hash(&mut hasher);
        self.options.use_value_comparer.hash(&mut hasher);
        hasher.finish()
    }

    /// Two extensions can share services only when they hold the very same
    /// config instance, not merely equal ones.
    pub fn should_use_same_service_provider(&self, other: &JsonColumnsExtension) -> bool {
        let same_config = match (&self.options.default_config, &other.options.default_config) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        same_config && self.options.use_value_comparer == other.options.use_value_comparer
    }
}

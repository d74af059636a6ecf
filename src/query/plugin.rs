use super::expr::{FieldType, SqlExpr};
use super::factory::{Dialect, SqlExpressionFactory};
use super::translator::{JsonMemberTranslator, MemberAccess, MemberTranslator};
use tracing::debug;

/// Contributes member translators to the query compiler.
pub trait MemberTranslatorPlugin: Send + Sync {
    fn translators(&self) -> &[Box<dyn MemberTranslator>];

    fn into_translators(self: Box<Self>) -> Vec<Box<dyn MemberTranslator>>;
}

/// Provides [`JsonMemberTranslator`] when the factory targets PostgreSQL,
/// and nothing otherwise.
pub struct JsonMemberTranslatorPlugin {
    translators: Vec<Box<dyn MemberTranslator>>,
}

impl JsonMemberTranslatorPlugin {
    pub fn new(factory: &SqlExpressionFactory) -> Self {
        let mut translators: Vec<Box<dyn MemberTranslator>> = Vec::with_capacity(1);
        if factory.dialect() == Dialect::PostgreSql {
            translators.push(Box::new(JsonMemberTranslator::new(factory.clone())));
        }
        Self { translators }
    }
}

impl MemberTranslatorPlugin for JsonMemberTranslatorPlugin {
    fn translators(&self) -> &[Box<dyn MemberTranslator>] {
        &self.translators
    }

    fn into_translators(self: Box<Self>) -> Vec<Box<dyn MemberTranslator>> {
        self.translators
    }
}

/// All member translators known to the compiler, tried in registration order.
#[derive(Default)]
pub struct MemberTranslatorRegistry {
    translators: Vec<Box<dyn MemberTranslator>>,
}

impl MemberTranslatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, translator: Box<dyn MemberTranslator>) {
        debug!("Registered member translator: {}", translator.name());
        self.translators.push(translator);
    }

    /// Takes over every translator the plugin contributes.
    pub fn register_plugin(&mut self, plugin: Box<dyn MemberTranslatorPlugin>) {
        for translator in plugin.into_translators() {
            self.register(translator);
        }
    }

    pub fn len(&self) -> usize {
        self.translators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translators.is_empty()
    }

    /// First successful translation, or `None` when no translator applies.
    pub fn translate(
        &self,
        instance: &SqlExpr,
        member: &MemberAccess,
        return_type: &FieldType,
    ) -> Option<SqlExpr> {
        self.translators
            .iter()
            .find_map(|t| t.translate(instance, member, return_type))
    }
}

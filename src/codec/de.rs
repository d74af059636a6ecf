//! Deserializer reading a `serde_json::Value` written under a config.
//!
//! `deserialize_struct` receives the declared field identifiers, so stored
//! names are mapped back to identifiers by computing each identifier's wire
//! name with the same rules the serializer used. Objects read through
//! `deserialize_any` have no field list; their keys go through
//! [`SerializationConfig::restore_name`] instead.
//!
//! Under `WhenWritingDefault` a declared field missing from the object reads
//! as its default, since the writer left it out for holding one.

use crate::config::{IgnoreCondition, SerializationConfig};
use serde::de::value::StringDeserializer;
use serde::de::{
    self, DeserializeSeed, Error as _, IntoDeserializer, MapAccess, SeqAccess, Unexpected,
    Visitor,
};
use serde::forward_to_deserialize_any;
use serde_json::{Error, Map, Number, Value};
use std::collections::HashMap;

pub(crate) struct WireDeserializer<'a> {
    value: Value,
    config: &'a SerializationConfig,
    numbers_from_strings: bool,
    restore_names: bool,
}

impl<'a> WireDeserializer<'a> {
    pub(crate) fn new(value: Value, config: &'a SerializationConfig) -> Self {
        Self {
            value,
            config,
            numbers_from_strings: config.reads_numbers_from_strings(),
            restore_names: false,
        }
    }

    /// Map keys are always strings on the wire; numeric keys parse from them.
    ///
    /// With `restore_names`, a key requested as an identifier or as any
    /// value is restored to its declared name. Keys requested as strings are
    /// map data and stay as stored.
    fn key(key: String, config: &'a SerializationConfig, restore_names: bool) -> Self {
        Self {
            value: Value::String(key),
            config,
            numbers_from_strings: true,
            restore_names,
        }
    }
}

fn unexpected(value: &Value) -> Unexpected<'_> {
    match value {
        Value::Null => Unexpected::Unit,
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::Number(n) => match (n.as_u64(), n.as_i64(), n.as_f64()) {
            (Some(u), _, _) => Unexpected::Unsigned(u),
            (_, Some(i), _) => Unexpected::Signed(i),
            (_, _, Some(f)) => Unexpected::Float(f),
            _ => Unexpected::Other("number"),
        },
        Value::String(s) => Unexpected::Str(s),
        Value::Array(_) => Unexpected::Seq,
        Value::Object(_) => Unexpected::Map,
    }
}

fn visit_array<'de, V: Visitor<'de>>(
    items: Vec<Value>,
    config: &SerializationConfig,
    visitor: V,
) -> Result<V::Value, Error> {
    let len = items.len();
    let mut access = WireSeqAccess {
        iter: items.into_iter(),
        config,
    };
    let value = visitor.visit_seq(&mut access)?;
    if access.iter.len() == 0 {
        Ok(value)
    } else {
        Err(Error::invalid_length(len, &"fewer elements in array"))
    }
}

fn visit_object<'de, V: Visitor<'de>>(
    map: Map<String, Value>,
    config: &SerializationConfig,
    renames: Option<FieldRenames>,
    visitor: V,
) -> Result<V::Value, Error> {
    let len = map.len();
    let omitted = match &renames {
        Some(renames) if config.ignore_condition() == IgnoreCondition::WhenWritingDefault => {
            renames.missing_from(&map)
        }
        _ => Vec::new(),
    };
    let mut access = WireMapAccess {
        iter: map.into_iter(),
        omitted: omitted.into_iter(),
        value: None,
        config,
        renames,
    };
    let value = visitor.visit_map(&mut access)?;
    if access.iter.len() == 0 {
        Ok(value)
    } else {
        Err(Error::invalid_length(len, &"fewer elements in map"))
    }
}

macro_rules! deserialize_numbers {
    ($($method:ident)*) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
            let numbers_from_strings = self.numbers_from_strings;
            match self.value {
                Value::String(ref s) if numbers_from_strings => {
                    let number: Number = s.parse().map_err(|_| {
                        Error::invalid_value(Unexpected::Str(s), &"a number encoded as a string")
                    })?;
                    de::Deserializer::$method(Value::Number(number), visitor)
                }
                value => de::Deserializer::$method(value, visitor),
            }
        }
    )*};
}

impl<'de> de::Deserializer<'de> for WireDeserializer<'_> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.value {
            Value::Array(items) => visit_array(items, self.config, visitor),
            Value::Object(map) => visit_object(map, self.config, None, visitor),
            Value::String(name) if self.restore_names => {
                visitor.visit_string(self.config.restore_name(&name))
            }
            other => de::Deserializer::deserialize_any(other, visitor),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        de::Deserializer::deserialize_string(self, visitor)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.value {
            Value::String(s) => visitor.visit_string(s),
            other => {
                let inner = WireDeserializer {
                    value: other,
                    config: self.config,
                    numbers_from_strings: self.numbers_from_strings,
                    restore_names: false,
                };
                de::Deserializer::deserialize_any(inner, visitor)
            }
        }
    }

    deserialize_numbers! {
        deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64
        deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64
        deserialize_f32 deserialize_f64
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        match self.value {
            Value::Object(map) => {
                let renames = FieldRenames::new(self.config, name, fields);
                visit_object(map, self.config, Some(renames), visitor)
            }
            Value::Array(items) => visit_array(items, self.config, visitor),
            other => Err(Error::invalid_type(unexpected(&other), &visitor)),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        match self.value {
            Value::String(variant) => {
                let variant = resolve_variant(self.config, variants, variant);
                let access: StringDeserializer<Error> = variant.into_deserializer();
                visitor.visit_enum(access)
            }
            Value::Object(map) if map.len() == 1 => {
                let (variant, value) = map
                    .into_iter()
                    .next()
                    .ok_or_else(|| Error::custom("empty enum object"))?;
                visitor.visit_enum(WireEnumAccess {
                    variant: resolve_variant(self.config, variants, variant),
                    value,
                    config: self.config,
                })
            }
            other => Err(Error::invalid_type(
                unexpected(&other),
                &"a string or an object with a single key",
            )),
        }
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        drop(self);
        visitor.visit_unit()
    }

    forward_to_deserialize_any! {
        bool i128 u128 char bytes byte_buf unit unit_struct seq tuple tuple_struct map
        identifier
    }
}

fn resolve_variant(
    config: &SerializationConfig,
    variants: &'static [&'static str],
    stored: String,
) -> String {
    variants
        .iter()
        .find(|variant| config.variant_name(variant) == stored)
        .map(|variant| (*variant).to_owned())
        .unwrap_or(stored)
}

/// Stored name -> declared identifier for one struct.
struct FieldRenames {
    names: HashMap<String, &'static str>,
    fields: &'static [&'static str],
    case_insensitive: bool,
}

impl FieldRenames {
    fn new(config: &SerializationConfig, owner: &str, fields: &'static [&'static str]) -> Self {
        let case_insensitive = config.case_insensitive_names();
        let names = fields
            .iter()
            .map(|field| {
                let wire = config.wire_name(owner, field);
                let wire = if case_insensitive { wire.to_lowercase() } else { wire };
                (wire, *field)
            })
            .collect();
        Self {
            names,
            fields,
            case_insensitive,
        }
    }

    fn lookup(&self, stored: &str) -> Option<&'static str> {
        let found = if self.case_insensitive {
            self.names.get(&stored.to_lowercase())
        } else {
            self.names.get(stored)
        };
        found.copied()
    }

    fn resolve(&self, stored: String) -> String {
        match self.lookup(&stored) {
            Some(field) => field.to_owned(),
            None => stored,
        }
    }

    /// Declared fields with no entry in `map`.
    fn missing_from(&self, map: &Map<String, Value>) -> Vec<&'static str> {
        self.fields
            .iter()
            .copied()
            .filter(|field| {
                !map.keys()
                    .any(|stored| stored == field || self.lookup(stored) == Some(*field))
            })
            .collect()
    }
}

struct WireSeqAccess<'a> {
    iter: std::vec::IntoIter<Value>,
    config: &'a SerializationConfig,
}

impl<'de> SeqAccess<'de> for WireSeqAccess<'_> {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, Error> {
        match self.iter.next() {
            Some(value) => seed
                .deserialize(WireDeserializer::new(value, self.config))
                .map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

enum PendingValue {
    Stored(Value),
    Omitted(&'static str),
}

struct WireMapAccess<'a> {
    iter: serde_json::map::IntoIter,
    omitted: std::vec::IntoIter<&'static str>,
    value: Option<PendingValue>,
    config: &'a SerializationConfig,
    renames: Option<FieldRenames>,
}

impl<'de> MapAccess<'de> for WireMapAccess<'_> {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, Error> {
        if let Some((key, value)) = self.iter.next() {
            self.value = Some(PendingValue::Stored(value));
            let key = match &self.renames {
                Some(renames) => WireDeserializer::key(renames.resolve(key), self.config, false),
                None => WireDeserializer::key(key, self.config, true),
            };
            return seed.deserialize(key).map(Some);
        }
        match self.omitted.next() {
            Some(field) => {
                self.value = Some(PendingValue::Omitted(field));
                let key = WireDeserializer::key(field.to_owned(), self.config, false);
                seed.deserialize(key).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, Error> {
        match self.value.take() {
            Some(PendingValue::Stored(value)) => {
                seed.deserialize(WireDeserializer::new(value, self.config))
            }
            Some(PendingValue::Omitted(field)) => seed.deserialize(OmittedValue {
                field,
                config: self.config,
            }),
            None => Err(Error::custom("value is missing")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len() + self.omitted.len())
    }
}

struct WireEnumAccess<'a> {
    variant: String,
    value: Value,
    config: &'a SerializationConfig,
}

impl<'de, 'a> de::EnumAccess<'de> for WireEnumAccess<'a> {
    type Error = Error;
    type Variant = WireVariantAccess<'a>;

    fn variant_seed<V: DeserializeSeed<'de>>(
        self,
        seed: V,
    ) -> Result<(V::Value, WireVariantAccess<'a>), Error> {
        let access: StringDeserializer<Error> = self.variant.clone().into_deserializer();
        let variant = seed.deserialize(access)?;
        Ok((
            variant,
            WireVariantAccess {
                variant: self.variant,
                value: self.value,
                config: self.config,
            },
        ))
    }
}

struct WireVariantAccess<'a> {
    variant: String,
    value: Value,
    config: &'a SerializationConfig,
}

impl<'de> de::VariantAccess<'de> for WireVariantAccess<'_> {
    type Error = Error;

    fn unit_variant(self) -> Result<(), Error> {
        match self.value {
            Value::Null => Ok(()),
            other => Err(Error::invalid_type(unexpected(&other), &"unit variant")),
        }
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value, Error> {
        seed.deserialize(WireDeserializer::new(self.value, self.config))
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, Error> {
        match self.value {
            Value::Array(items) => visit_array(items, self.config, visitor),
            other => Err(Error::invalid_type(unexpected(&other), &"tuple variant")),
        }
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        match self.value {
            Value::Object(map) => {
                let renames = FieldRenames::new(self.config, &self.variant, fields);
                visit_object(map, self.config, Some(renames), visitor)
            }
            other => Err(Error::invalid_type(unexpected(&other), &"struct variant")),
        }
    }
}

/// Default value of a field the writer left out of the document.
struct OmittedValue<'a> {
    field: &'static str,
    config: &'a SerializationConfig,
}

macro_rules! deserialize_zero {
    ($($method:ident => $visit:ident($zero:expr),)*) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
            visitor.$visit($zero)
        }
    )*};
}

impl<'de> de::Deserializer<'de> for OmittedValue<'_> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_unit()
    }

    deserialize_zero! {
        deserialize_bool => visit_bool(false),
        deserialize_i8 => visit_i64(0),
        deserialize_i16 => visit_i64(0),
        deserialize_i32 => visit_i64(0),
        deserialize_i64 => visit_i64(0),
        deserialize_i128 => visit_i128(0),
        deserialize_u8 => visit_u64(0),
        deserialize_u16 => visit_u64(0),
        deserialize_u32 => visit_u64(0),
        deserialize_u64 => visit_u64(0),
        deserialize_u128 => visit_u128(0),
        deserialize_f32 => visit_f64(0.0),
        deserialize_f64 => visit_f64(0.0),
        deserialize_char => visit_char('\0'),
        deserialize_str => visit_str(""),
        deserialize_string => visit_str(""),
        deserialize_bytes => visit_bytes(&[]),
        deserialize_byte_buf => visit_bytes(&[]),
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_none()
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Error> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visit_array(Vec::new(), self.config, visitor)
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, Error> {
        visit_array(Vec::new(), self.config, visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Error> {
        visit_array(Vec::new(), self.config, visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visit_object(Map::new(), self.config, None, visitor)
    }

    /// Every field of an omitted struct is itself omitted.
    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        let renames = FieldRenames::new(self.config, name, fields);
        visit_object(Map::new(), self.config, Some(renames), visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Error> {
        Err(Error::missing_field(self.field))
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_str(self.field)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_unit()
    }
}

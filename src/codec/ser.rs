//! Serializer producing a `serde_json::Value` with configured field names.
//!
//! Struct fields are renamed and filtered by the [`SerializationConfig`]; map
//! keys are written as-is.

use crate::config::SerializationConfig;
use serde::ser::{self, Error as _, Serialize};
use serde_json::{Error, Map, Value};

#[derive(Clone, Copy)]
pub(crate) struct WireSerializer<'a> {
    config: &'a SerializationConfig,
}

impl<'a> WireSerializer<'a> {
    pub(crate) fn new(config: &'a SerializationConfig) -> Self {
        Self { config }
    }

    fn number(self, value: Value, text: impl ToString) -> Value {
        if self.config.writes_numbers_as_strings() {
            Value::String(text.to_string())
        } else {
            value
        }
    }
}

macro_rules! serialize_numbers {
    ($($method:ident: $ty:ty),* $(,)?) => {$(
        fn $method(self, v: $ty) -> Result<Value, Error> {
            Ok(self.number(Value::from(v), v))
        }
    )*};
}

impl<'a> ser::Serializer for WireSerializer<'a> {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SeqBuilder<'a>;
    type SerializeTuple = SeqBuilder<'a>;
    type SerializeTupleStruct = SeqBuilder<'a>;
    type SerializeTupleVariant = VariantSeqBuilder<'a>;
    type SerializeMap = MapBuilder<'a>;
    type SerializeStruct = StructBuilder<'a>;
    type SerializeStructVariant = VariantStructBuilder<'a>;

    fn serialize_bool(self, v: bool) -> Result<Value, Error> {
        Ok(Value::Bool(v))
    }

    serialize_numbers! {
        serialize_i8: i8,
        serialize_i16: i16,
        serialize_i32: i32,
        serialize_i64: i64,
        serialize_u8: u8,
        serialize_u16: u16,
        serialize_u32: u32,
        serialize_u64: u64,
        serialize_f32: f32,
        serialize_f64: f64,
    }

    fn serialize_char(self, v: char) -> Result<Value, Error> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value, Error> {
        Ok(Value::String(v.to_owned()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value, Error> {
        Ok(Value::Array(v.iter().map(|b| Value::from(*b)).collect()))
    }

    fn serialize_none(self) -> Result<Value, Error> {
        Ok(Value::Null)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<Value, Error> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value, Error> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value, Error> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value, Error> {
        Ok(Value::String(self.config.variant_name(variant)))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Value, Error> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value, Error> {
        let mut map = Map::new();
        map.insert(self.config.variant_name(variant), value.serialize(self)?);
        Ok(Value::Object(map))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqBuilder<'a>, Error> {
        Ok(SeqBuilder {
            config: self.config,
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqBuilder<'a>, Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SeqBuilder<'a>, Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<VariantSeqBuilder<'a>, Error> {
        Ok(VariantSeqBuilder {
            variant: self.config.variant_name(variant),
            inner: self.serialize_seq(Some(len))?,
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<MapBuilder<'a>, Error> {
        Ok(MapBuilder {
            config: self.config,
            map: Map::new(),
            next_key: None,
        })
    }

    fn serialize_struct(self, name: &'static str, _len: usize) -> Result<StructBuilder<'a>, Error> {
        Ok(StructBuilder {
            config: self.config,
            owner: name,
            map: Map::new(),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<VariantStructBuilder<'a>, Error> {
        Ok(VariantStructBuilder {
            variant: self.config.variant_name(variant),
            inner: StructBuilder {
                config: self.config,
                owner: variant,
                map: Map::new(),
            },
        })
    }
}

pub(crate) struct SeqBuilder<'a> {
    config: &'a SerializationConfig,
    items: Vec<Value>,
}

impl SeqBuilder<'_> {
    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Error> {
        self.items.push(value.serialize(WireSerializer::new(self.config))?);
        Ok(())
    }
}

impl ser::SerializeSeq for SeqBuilder<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Error> {
        self.push(value)
    }

    fn end(self) -> Result<Value, Error> {
        Ok(Value::Array(self.items))
    }
}

impl ser::SerializeTuple for SeqBuilder<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Error> {
        self.push(value)
    }

    fn end(self) -> Result<Value, Error> {
        Ok(Value::Array(self.items))
    }
}

impl ser::SerializeTupleStruct for SeqBuilder<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Error> {
        self.push(value)
    }

    fn end(self) -> Result<Value, Error> {
        Ok(Value::Array(self.items))
    }
}

pub(crate) struct VariantSeqBuilder<'a> {
    variant: String,
    inner: SeqBuilder<'a>,
}

impl ser::SerializeTupleVariant for VariantSeqBuilder<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Error> {
        self.inner.push(value)
    }

    fn end(self) -> Result<Value, Error> {
        let mut map = Map::new();
        map.insert(self.variant, Value::Array(self.inner.items));
        Ok(Value::Object(map))
    }
}

pub(crate) struct MapBuilder<'a> {
    config: &'a SerializationConfig,
    map: Map<String, Value>,
    next_key: Option<String>,
}

impl ser::SerializeMap for MapBuilder<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), Error> {
        let key = match key.serialize(WireSerializer::new(self.config))? {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => {
                return Err(Error::custom(format!(
                    "map key must be a string, number or bool, found {}",
                    other
                )));
            }
        };
        self.next_key = Some(key);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Error> {
        let key = self
            .next_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called before serialize_key"))?;
        self.map.insert(key, value.serialize(WireSerializer::new(self.config))?);
        Ok(())
    }

    fn end(self) -> Result<Value, Error> {
        Ok(Value::Object(self.map))
    }
}

pub(crate) struct StructBuilder<'a> {
    config: &'a SerializationConfig,
    owner: &'static str,
    map: Map<String, Value>,
}

impl StructBuilder<'_> {
    fn field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<(), Error> {
        let value = value.serialize(WireSerializer::new(self.config))?;
        if self.config.should_omit(&value) {
            return Ok(());
        }
        self.map.insert(self.config.wire_name(self.owner, key), value);
        Ok(())
    }
}

impl ser::SerializeStruct for StructBuilder<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Error> {
        self.field(key, value)
    }

    fn end(self) -> Result<Value, Error> {
        Ok(Value::Object(self.map))
    }
}

pub(crate) struct VariantStructBuilder<'a> {
    variant: String,
    inner: StructBuilder<'a>,
}

impl ser::SerializeStructVariant for VariantStructBuilder<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Error> {
        self.inner.field(key, value)
    }

    fn end(self) -> Result<Value, Error> {
        let mut map = Map::new();
        map.insert(self.variant, Value::Object(self.inner.map));
        Ok(Value::Object(map))
    }
}

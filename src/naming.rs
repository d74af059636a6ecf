//! Naming policies
//!
//! A naming policy maps a declared field identifier to the name written in
//! the JSON document. The same policy is consulted by the codec when writing
//! documents and by the member translator when building JSON paths, so both
//! sides always agree on the stored key.

use crate::error::{Error, Result};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Resolves the JSON name of a field for query translation.
pub trait ConvertName: Send + Sync + fmt::Debug {
    /// Returns the stored JSON name of `field` declared on `owner`, or `None`
    /// when no naming rule covers it.
    fn convert_name(&self, owner: &str, field: &str) -> Option<String>;
}

/// Built-in and user-supplied naming policies.
#[derive(Clone)]
pub enum NamingPolicy {
    CamelCase,
    PascalCase,
    SnakeCaseLower,
    SnakeCaseUpper,
    KebabCaseLower,
    KebabCaseUpper,
    Custom(CustomNamingPolicy),
}

/// A named, pure naming function.
#[derive(Clone)]
pub struct CustomNamingPolicy {
    name: String,
    convert: Arc<dyn Fn(&str) -> String + Send + Sync>,
}

impl NamingPolicy {
    pub fn custom<F>(name: impl Into<String>, convert: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        NamingPolicy::Custom(CustomNamingPolicy {
            name: name.into(),
            convert: Arc::new(convert),
        })
    }

    pub fn name(&self) -> &str {
        match self {
            NamingPolicy::CamelCase => "camelCase",
            NamingPolicy::PascalCase => "PascalCase",
            NamingPolicy::SnakeCaseLower => "snake_case_lower",
            NamingPolicy::SnakeCaseUpper => "snake_case_upper",
            NamingPolicy::KebabCaseLower => "kebab-case-lower",
            NamingPolicy::KebabCaseUpper => "kebab-case-upper",
            NamingPolicy::Custom(custom) => &custom.name,
        }
    }

    pub fn apply(&self, identifier: &str) -> String {
        match self {
            NamingPolicy::CamelCase => {
                let mut out = String::with_capacity(identifier.len());
                for (i, word) in split_words(identifier).iter().enumerate() {
                    if i == 0 {
                        out.push_str(&word.to_lowercase());
                    } else {
                        out.push_str(&capitalize(word));
                    }
                }
                out
            }
            NamingPolicy::PascalCase => split_words(identifier)
                .iter()
                .map(|word| capitalize(word))
                .collect(),
            NamingPolicy::SnakeCaseLower => join_words(identifier, '_', false),
            NamingPolicy::SnakeCaseUpper => join_words(identifier, '_', true),
            NamingPolicy::KebabCaseLower => join_words(identifier, '-', false),
            NamingPolicy::KebabCaseUpper => join_words(identifier, '-', true),
            NamingPolicy::Custom(custom) => (custom.convert)(identifier),
        }
    }
}

/// Splits an identifier into words at separators, lower-to-upper case
/// transitions, and the last capital of an acronym (`URLValue` -> `URL`, `Value`).
fn split_words(identifier: &str) -> Vec<String> {
    let chars: Vec<char> = identifier.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|next| next.is_lowercase());
            if prev.is_lowercase() || prev.is_numeric() || (prev.is_uppercase() && next_is_lower) {
                words.push(std::mem::take(&mut current));
            }
        }

        current.push(c);
    }

    if !current.is_empty() {
        words.push(current);
    }

    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn join_words(identifier: &str, separator: char, upper: bool) -> String {
    let words: Vec<String> = split_words(identifier)
        .into_iter()
        .map(|word| if upper { word.to_uppercase() } else { word.to_lowercase() })
        .collect();
    words.join(&separator.to_string())
}

impl PartialEq for NamingPolicy {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NamingPolicy::Custom(a), NamingPolicy::Custom(b)) => {
                a.name == b.name && Arc::ptr_eq(&a.convert, &b.convert)
            }
            (NamingPolicy::Custom(_), _) | (_, NamingPolicy::Custom(_)) => false,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

impl fmt::Debug for NamingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamingPolicy::Custom(custom) => write!(f, "Custom({:?})", custom.name),
            other => f.write_str(other.name()),
        }
    }
}

impl fmt::Display for NamingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NamingPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "camelCase" => Ok(NamingPolicy::CamelCase),
            "PascalCase" => Ok(NamingPolicy::PascalCase),
            "snake_case_lower" => Ok(NamingPolicy::SnakeCaseLower),
            "snake_case_upper" => Ok(NamingPolicy::SnakeCaseUpper),
            "kebab-case-lower" => Ok(NamingPolicy::KebabCaseLower),
            "kebab-case-upper" => Ok(NamingPolicy::KebabCaseUpper),
            other => Err(Error::InvalidConfig(format!(
                "Unknown naming policy '{}' (custom policies cannot be loaded from text)",
                other
            ))),
        }
    }
}

impl Serialize for NamingPolicy {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for NamingPolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(D::Error::custom)
    }
}

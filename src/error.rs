use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Cannot decode {target} from JSON text {text:?}: {source}")]
    Decode {
        target: &'static str,
        text: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot encode {target} as JSON: {source}")]
    Encode {
        target: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Type mismatch: value is not a {expected}")]
    TypeMismatch { expected: &'static str },

    #[error("Entity type '{0}' not found")]
    EntityNotFound(String),

    #[error("Property '{0}' not found on entity type '{1}'")]
    PropertyNotFound(String, String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Evaluation error: {0}")]
    Evaluation(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for failures reading stored text back into a value.
    pub fn is_decode(&self) -> bool {
        matches!(self, Error::Decode { .. })
    }
}

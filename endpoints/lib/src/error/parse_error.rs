//! Response parsing errors.

use thiserror::Error;

/// The response body did not match the call's declared output format.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The body is not valid JSON, or does not fit the target type.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The body is not valid YAML, or does not fit the target type.
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// The body is valid structured data but has the wrong top-level shape.
    #[error("JSON structure is not an {expected} (got {actual})")]
    ShapeMismatch {
        /// The shape the format requires, e.g. `"object"`.
        expected: &'static str,
        /// The shape that was found.
        actual: &'static str,
    },

    /// The body could not be decoded as text in the response's encoding.
    #[error("Body could not be decoded as {encoding}")]
    Decoding {
        /// Name of the text encoding that was attempted.
        encoding: &'static str,
    },

    /// A structured format received no body at all.
    #[error("Empty response body")]
    EmptyBody,
}

impl ParseError {
    /// Returns `true` if the body was syntactically valid but structurally wrong.
    pub fn is_shape_mismatch(&self) -> bool {
        matches!(self, Self::ShapeMismatch { .. })
    }
}

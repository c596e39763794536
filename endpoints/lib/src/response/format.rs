//! Response format trait and implementations.
//!
//! The [`ResponseFormat`] trait defines how a raw response body is turned
//! into a call's declared output type. Each format encodes both the parsing
//! strategy and the output type, so `Call<JsonFormat<User>>` yields a `User`.

use std::marker::PhantomData;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::TextEncoding;
use crate::error::ParseError;

/// Parsing strategy for a call's response body.
///
/// `body` is `None` when the transport delivered no body at all (e.g. a 204
/// or a HEAD request). Structured formats treat that as
/// [`ParseError::EmptyBody`]; text and binary formats produce an empty value.
pub trait ResponseFormat: 'static {
    /// The output type after parsing.
    type Output: Send + 'static;

    /// Parses a response body into the output type.
    fn parse(body: Option<&Bytes>, encoding: TextEncoding) -> Result<Self::Output, ParseError>;

    /// Returns the Content-Type this format expects, used as the `Accept` header.
    fn content_type() -> &'static str;
}

fn non_empty(body: Option<&Bytes>) -> Result<&Bytes, ParseError> {
    match body {
        Some(bytes) if !bytes.is_empty() => Ok(bytes),
        _ => Err(ParseError::EmptyBody),
    }
}

fn shape_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// JSON response format with typed deserialization.
#[derive(Debug, Clone, Copy)]
pub struct JsonFormat<T>(PhantomData<fn() -> T>);

impl<T: DeserializeOwned + Send + 'static> ResponseFormat for JsonFormat<T> {
    type Output = T;

    fn parse(body: Option<&Bytes>, _encoding: TextEncoding) -> Result<T, ParseError> {
        Ok(serde_json::from_slice(non_empty(body)?)?)
    }

    fn content_type() -> &'static str {
        "application/json"
    }
}

/// JSON format whose top-level value must be an object.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonObject;

impl ResponseFormat for JsonObject {
    type Output = Map<String, Value>;

    fn parse(body: Option<&Bytes>, _encoding: TextEncoding) -> Result<Self::Output, ParseError> {
        match serde_json::from_slice(non_empty(body)?)? {
            Value::Object(map) => Ok(map),
            other => Err(ParseError::ShapeMismatch {
                expected: "object",
                actual: shape_of(&other),
            }),
        }
    }

    fn content_type() -> &'static str {
        "application/json"
    }
}

/// JSON format whose top-level value must be an array.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonArray;

impl ResponseFormat for JsonArray {
    type Output = Vec<Value>;

    fn parse(body: Option<&Bytes>, _encoding: TextEncoding) -> Result<Self::Output, ParseError> {
        match serde_json::from_slice(non_empty(body)?)? {
            Value::Array(items) => Ok(items),
            other => Err(ParseError::ShapeMismatch {
                expected: "array",
                actual: shape_of(&other),
            }),
        }
    }

    fn content_type() -> &'static str {
        "application/json"
    }
}

/// YAML response format with typed deserialization.
#[derive(Debug, Clone, Copy)]
pub struct YamlFormat<T>(PhantomData<fn() -> T>);

impl<T: DeserializeOwned + Send + 'static> ResponseFormat for YamlFormat<T> {
    type Output = T;

    fn parse(body: Option<&Bytes>, _encoding: TextEncoding) -> Result<T, ParseError> {
        Ok(serde_yaml::from_slice(non_empty(body)?)?)
    }

    fn content_type() -> &'static str {
        "application/yaml"
    }
}

/// Text format, decoded with the response's charset.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFormat;

impl ResponseFormat for TextFormat {
    type Output = String;

    fn parse(body: Option<&Bytes>, encoding: TextEncoding) -> Result<String, ParseError> {
        match body {
            Some(bytes) => encoding.decode(bytes),
            None => Ok(String::new()),
        }
    }

    fn content_type() -> &'static str {
        "text/plain"
    }
}

/// Binary format returning the raw body.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryFormat;

impl ResponseFormat for BinaryFormat {
    type Output = Bytes;

    fn parse(body: Option<&Bytes>, _encoding: TextEncoding) -> Result<Bytes, ParseError> {
        Ok(body.cloned().unwrap_or_default())
    }

    fn content_type() -> &'static str {
        "application/octet-stream"
    }
}

/// Format for calls whose body is irrelevant, e.g. `204 No Content`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyFormat;

impl ResponseFormat for EmptyFormat {
    type Output = ();

    fn parse(_body: Option<&Bytes>, _encoding: TextEncoding) -> Result<(), ParseError> {
        Ok(())
    }

    fn content_type() -> &'static str {
        "*/*"
    }
}

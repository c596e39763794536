//! Response handling.
//!
//! This module provides the [`ResponseFormat`] trait for typed parsing,
//! [`ResponseMetadata`] for status and headers, and the [`CallResult`]
//! envelope delivered for every executed call.

mod format;
mod metadata;
mod result;

pub use format::{
    BinaryFormat, EmptyFormat, JsonArray, JsonFormat, JsonObject, ResponseFormat, TextFormat,
    YamlFormat,
};
pub use metadata::{ResponseMetadata, TextEncoding};
pub use result::{CallOutput, CallResult, Source};

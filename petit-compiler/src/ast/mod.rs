//! Abstract syntax tree consumed by the native backend.
//!
//! The front end (scanner and parser) lives outside this crate. Programs
//! reach the backend either as Rust values built through the helpers in
//! [`nodes`] or as JSON documents produced by the front end.

pub mod nodes;

pub use nodes::*;

use crate::error::CompileError;

impl Program {
    /// Decode a program from the JSON interchange format.
    pub fn from_json(source: &str) -> Result<Self, CompileError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Encode the program as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, CompileError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

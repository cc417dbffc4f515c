use thiserror::Error;

use crate::verify::VerifyError;

/// Shared error type for the driver and the `petitc` binary.
///
/// Lowering itself never fails; these cover everything around it.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid AST: {0}")]
    InvalidAst(#[from] serde_json::Error),
    #[error("Unknown target: {0} (expected aarch64-macos, x86_64-linux or host)")]
    UnknownTarget(String),
    #[error("Assembly check failed: {0}")]
    VerifyError(#[from] VerifyError),
}

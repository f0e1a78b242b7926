use crate::types::Proto;

/// Hand-written `Display`, kept lighter-weight than `thiserror`'s derive
/// machinery for a layer with only a handful of variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    ProtoMismatch { expected: Proto, got: Proto },
    UnsupportedPair { src: Proto, dst: Proto },
    MalformedToolArguments(String),
}

impl std::fmt::Display for TransformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransformError::ProtoMismatch { expected, got } => {
                write!(f, "expected protocol {expected:?}, got {got:?}")
            }
            TransformError::UnsupportedPair { src, dst } => {
                write!(f, "no adapter from {src:?} to {dst:?}")
            }
            TransformError::MalformedToolArguments(msg) => {
                write!(f, "malformed tool call arguments: {msg}")
            }
        }
    }
}

impl std::error::Error for TransformError {}

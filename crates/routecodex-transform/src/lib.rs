pub mod canonical;
pub mod decode;
pub mod dialect;
pub mod errors;
pub mod ops;
pub mod stream;
pub mod types;

pub use canonical::{
    CanonicalDelta, CanonicalMessage, CanonicalRequest, CanonicalResponse, CanonicalRole,
    CanonicalStopReason, CanonicalTool, CanonicalToolCall, CanonicalToolCallDelta, CanonicalUsage,
};
pub use decode::decode_upstream_event;
pub use errors::TransformError;
pub use ops::{transform_request, transform_response};
pub use stream::{AnthropicStreamEncoder, CodexStreamEncoder, OpenAiStreamEncoder, StreamTransformer};
pub use types::{CompletionRequest, CompletionResponse, Op, Proto, StreamChunk, StreamFormat, stream_format, TransformContext};

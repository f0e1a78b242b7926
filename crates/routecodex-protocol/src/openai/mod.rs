pub mod request;
pub mod response;
pub mod types;

pub use request::ChatCompletionRequest;
pub use response::{ChatCompletionChunk, ChatCompletionResponse};

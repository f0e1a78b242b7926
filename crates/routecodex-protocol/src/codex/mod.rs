pub mod request;
pub mod response;
pub mod types;

pub use request::ResponsesRequest;
pub use response::{ResponseStreamEvent, ResponsesResponse};

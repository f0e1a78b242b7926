pub mod auth;
pub mod error;
pub mod routes;
pub mod sse;
pub mod state;

pub use routes::router;
pub use state::{GatewayState, SHUTDOWN_DRAIN};

pub mod client;
pub mod providers;

pub use client::shared_client;
pub use providers::{DeviceAuthorization, DeviceFlowConfig, DeviceFlowRefresher, RestProvider};

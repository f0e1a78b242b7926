pub mod oauth_device;
pub mod rest;

pub use oauth_device::{DeviceAuthorization, DeviceFlowConfig, DeviceFlowRefresher};
pub use rest::RestProvider;

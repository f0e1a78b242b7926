use std::path::PathBuf;
use std::sync::Arc;

use routecodex_router::RouterState;
use tokio::sync::watch;

/// Shutdown drain window: `POST /shutdown` waits this long for
/// in-flight requests before the process is allowed to exit.
pub const SHUTDOWN_DRAIN: std::time::Duration = std::time::Duration::from_millis(3500);

/// The gateway's handle on the rest of the system. One instance is
/// shared across every axum handler via `State`.
pub struct GatewayState {
    pub router: Arc<RouterState>,
    pub api_key: Option<String>,
    pub user_config_path: PathBuf,
    pub system_config_path: PathBuf,
    pub shutdown_tx: watch::Sender<bool>,
}

impl GatewayState {
    pub fn new(
        router: Arc<RouterState>,
        api_key: Option<String>,
        user_config_path: PathBuf,
        system_config_path: PathBuf,
    ) -> (Arc<Self>, watch::Receiver<bool>) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        (
            Arc::new(Self {
                router,
                api_key,
                user_config_path,
                system_config_path,
                shutdown_tx,
            }),
            shutdown_rx,
        )
    }
}

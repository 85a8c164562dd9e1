use std::time::Duration;

use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::configuration::Settings;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub http: Client,
    pub upstream_host: String,
    pub api_key: Option<String>,
    /// Root token; each in-flight relay stream works under a child of it
    /// so shutdown drains them all.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(settings: &Settings, shutdown: CancellationToken) -> anyhow::Result<Self> {
        // A total-request timeout would cut off long completion streams,
        // so only the connect phase is bounded.
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()?;
        Ok(AppState {
            http,
            upstream_host: settings.upstream.host.clone(),
            api_key: settings.upstream.api_key.clone(),
            shutdown,
        })
    }
}

// HTTP client utilities
use crate::domain::error::WizardError;
use reqwest::Client;
use std::time::Duration;

/// Create the shared HTTP client
pub fn create_client(timeout: Duration) -> Result<Client, WizardError> {
    Ok(Client::builder()
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(30))
        .timeout(timeout)
        .user_agent(concat!("research-wizard/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

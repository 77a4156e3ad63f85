//! Backend health probe.

use std::time::Duration;

use super::ApiClient;

/// Health checks use a short timeout so a dead backend is noticed quickly.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

impl ApiClient {
    /// Returns whether the backend answered `GET /ai/health` with HTTP 200.
    ///
    /// Unlike the other operations this never propagates failure; any error
    /// means "not healthy".
    pub async fn check_health(&self) -> bool {
        let result = self
            .http()
            .get(self.url("/ai/health"))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await;

        match result {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!(error = %e, "health check failed");
                false
            }
        }
    }
}

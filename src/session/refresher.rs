use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::SessionStore;
use crate::client::ApiClient;
use crate::error::ClientError;

/// Background token refresh. Wakes every `interval` and refreshes the access
/// token once it expires within `margin`. Touches nothing but the session
/// store; stops when the session has ended.
pub fn spawn_refresher<S>(
    client: Arc<ApiClient<S>>,
    interval: Duration,
    margin: chrono::Duration,
) -> JoinHandle<()>
where
    S: SessionStore + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let session = match client.store().load().await {
                Ok(Some(session)) => session,
                Ok(None) => {
                    tracing::debug!("no session, token refresher stopping");
                    break;
                }
                Err(e) => {
                    tracing::warn!("token refresher could not read session: {}", e);
                    continue;
                }
            };

            if !session.expires_within(margin) {
                continue;
            }

            match client.refresh().await {
                Ok(_) => tracing::debug!("access token refreshed in background"),
                Err(ClientError::SessionExpired) | Err(ClientError::NotAuthenticated) => {
                    tracing::warn!("session ended, token refresher stopping");
                    break;
                }
                Err(e) => tracing::warn!("background token refresh failed: {}", e),
            }
        }
    })
}

//! Bootstrap steps that run before the controller gets the page.

use std::time::Duration;

use engine_logging::{engine_debug, engine_info};
use tokio::time::Instant;
use wiper_core::SemanticTarget;

use crate::page::{Page, PageError, Scope};
use crate::resolver::SelectorResolver;
use crate::settle::{settle, SettlePolicy};
use crate::WipeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginWait {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for LoginWait {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// Poll the login markers until one resolves, then let the UI stabilize.
/// Lookup errors while the page is still loading count as "not yet".
pub async fn wait_for_login(
    page: &dyn Page,
    resolver: &SelectorResolver,
    wait: LoginWait,
    policy: &SettlePolicy,
) -> Result<(), WipeError> {
    engine_info!("Waiting up to {}s for login", wait.timeout.as_secs());
    let started = Instant::now();
    loop {
        match resolver
            .resolve(page, SemanticTarget::LoginMarker, Scope::Document)
            .await
        {
            Ok(Some(_)) => break,
            Ok(None) => {}
            Err(err) => engine_debug!("Login check failed: {}", err),
        }
        if started.elapsed() >= wait.timeout {
            return Err(WipeError::AuthenticationTimeout {
                waited_secs: wait.timeout.as_secs(),
            });
        }
        tokio::time::sleep(wait.poll_interval).await;
    }

    engine_info!("Login detected");
    settle(policy.stabilize).await;
    Ok(())
}

/// Load a url in the session's page and wait for the view to settle.
pub async fn navigate(page: &dyn Page, url: &str, policy: &SettlePolicy) -> Result<(), WipeError> {
    page.navigate(url).await.map_err(|err| match err {
        PageError::Navigation { reason, .. } => WipeError::Navigation(reason),
        other => WipeError::Navigation(other.to_string()),
    })?;
    settle(policy.navigation).await;
    Ok(())
}

//! Per-request deadline and cancellation
//!
//! Wrapping an engine future in `RequestControl::run` drops it as soon as
//! the token is cancelled or the deadline passes. Dropping the future drops
//! every in-flight provider call it owns.

use crate::types::GeocodeError;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

#[derive(Debug, Clone, Default)]
pub struct RequestControl {
    cancel: CancellationToken,
    deadline: Option<Duration>,
}

impl RequestControl {
    /// No deadline, fresh token
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Deadline from a seconds parameter; `0`, blank or unparsable disables it
    pub fn from_timeout_secs(value: Option<&str>) -> Self {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            None => Self::new(),
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) => Self::new(),
                Ok(secs) => Self::new().with_deadline(Duration::from_secs(secs)),
                Err(_) => {
                    warn!(value = raw, "Ignoring unparsable request timeout");
                    Self::new()
                }
            },
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Drive `fut` to completion unless cancelled or out of time
    pub async fn run<T, F>(&self, fut: F) -> Result<T, GeocodeError>
    where
        F: Future<Output = Result<T, GeocodeError>>,
    {
        let bounded = async {
            match self.deadline {
                Some(limit) => match tokio::time::timeout(limit, fut).await {
                    Ok(result) => result,
                    Err(_) => Err(GeocodeError::DeadlineExceeded(limit)),
                },
                None => fut.await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(GeocodeError::Cancelled),
            result = bounded => result,
        }
    }
}

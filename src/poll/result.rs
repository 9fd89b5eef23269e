//! Deferred result of an asynchronous platform operation.

use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

use super::handler::{PollHandler, PollStatus};
use super::settings::PollSettings;
use crate::client::GoodDataClient;
use crate::error::{GoodDataError, Result};

/// A value obtainable only by polling.
///
/// Many GoodData operations answer with a location URI instead of a
/// result. A `DeferredResult` repeatedly GETs that URI until its
/// [`PollHandler`] classifies a response as done or failed.
///
/// The outcome is computed at most once. After the first resolution every
/// call to [`get`](Self::get) returns the cached value or the cached error
/// without touching the network.
///
/// # Example
///
/// ```no_run
/// use gooddata::{create_project, GoodDataClient, ProjectCreate};
///
/// # async fn example() -> gooddata::Result<()> {
/// let client = GoodDataClient::from_env()?;
/// let pending = create_project(&client, &ProjectCreate::new("Sales", "AUTH_TOKEN")).await?;
/// let project = pending.get().await?;
/// println!("created {}", project.title());
/// # Ok(())
/// # }
/// ```
pub struct DeferredResult<H: PollHandler> {
    client: GoodDataClient,
    handler: H,
    settings: PollSettings,
    cancel: CancellationToken,
    outcome: OnceCell<Result<H::Output>>,
}

impl<H: PollHandler> fmt::Debug for DeferredResult<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredResult")
            .field("uri", &self.handler.uri())
            .field("resolved", &self.is_resolved())
            .finish_non_exhaustive()
    }
}

impl<H: PollHandler> DeferredResult<H> {
    /// Poll with the client's default [`PollSettings`].
    pub fn new(client: &GoodDataClient, handler: H) -> Self {
        Self {
            settings: client.poll_settings().clone(),
            client: client.clone(),
            handler,
            cancel: CancellationToken::new(),
            outcome: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: PollSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Stop polling when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The URI being polled.
    pub fn uri(&self) -> &str {
        self.handler.uri()
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Whether polling has already reached a terminal outcome.
    pub fn is_resolved(&self) -> bool {
        self.outcome.initialized()
    }

    /// Resolve the operation, polling if it has not finished yet.
    ///
    /// # Errors
    ///
    /// Returns the handler's domain error when the operation fails, a
    /// request fails, the poll ceiling is exceeded, or polling is cancelled.
    pub async fn get(&self) -> Result<&H::Output> {
        match self.outcome.get_or_init(|| self.poll()).await {
            Ok(value) => Ok(value),
            Err(e) => Err(e.clone()),
        }
    }

    /// Resolve the operation and take the value.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    pub async fn into_result(mut self) -> Result<H::Output> {
        match self.outcome.take() {
            Some(outcome) => outcome,
            None => self.poll().await,
        }
    }

    async fn poll(&self) -> Result<H::Output> {
        let uri = self.handler.uri();
        let started = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            if self.cancel.is_cancelled() {
                return Err(self.handler.handle_poll_error(self.cancelled()));
            }

            let response = match self.bounded(started, self.client.poll(uri)).await.and_then(|r| r) {
                Ok(response) => response,
                Err(e) => {
                    tracing::debug!(uri, attempt, error = %e, "poll request failed");
                    return Err(self.handler.handle_poll_error(e));
                }
            };

            let status = self.handler.classify(&response);
            tracing::debug!(uri, attempt, http_status = %response.status, ?status, "polled");

            match status {
                PollStatus::Done => {
                    let finish = self.handler.on_finish(&self.client, response);
                    return match self.bounded(started, finish).await {
                        Ok(outcome) => outcome,
                        Err(e) => Err(self.handler.handle_poll_error(e)),
                    };
                }
                PollStatus::Failed => return Err(self.handler.on_poll_failure(&response)),
                PollStatus::Continue => {}
            }

            let mut delay = self.settings.delay_for(attempt);
            if let Some(timeout) = self.settings.timeout {
                let elapsed = started.elapsed();
                if elapsed >= timeout {
                    return Err(self.handler.handle_poll_error(self.timed_out(elapsed)));
                }
                delay = delay.min(timeout - elapsed);
            }

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    return Err(self.handler.handle_poll_error(self.cancelled()));
                }
                () = tokio::time::sleep(delay) => {}
            }

            attempt = attempt.saturating_add(1);
        }
    }

    /// Run one step of the loop within the remaining budget, unless cancelled.
    async fn bounded<F: Future>(&self, started: Instant, step: F) -> Result<F::Output> {
        let deadline = self.settings.timeout.map(|timeout| started + timeout);
        let limited = async {
            match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline.into(), step).await.ok(),
                None => Some(step.await),
            }
        };

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(self.cancelled()),
            output = limited => output.ok_or_else(|| self.timed_out(started.elapsed())),
        }
    }

    fn cancelled(&self) -> GoodDataError {
        GoodDataError::PollCancelled {
            uri: self.handler.uri().to_string(),
        }
    }

    fn timed_out(&self, elapsed: Duration) -> GoodDataError {
        let uri = self.handler.uri();
        tracing::warn!(uri, ?elapsed, "polling timed out");
        GoodDataError::PollTimeout {
            uri: uri.to_string(),
            elapsed,
        }
    }
}

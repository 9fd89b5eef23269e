//! Poll handler strategy.

use std::fmt;
use std::marker::PhantomData;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::client::GoodDataClient;
use crate::error::{GoodDataError, Result};

/// Classification of a single poll response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStatus {
    /// The operation is still running; poll again.
    Continue,
    /// The operation finished; produce the final value.
    Done,
    /// The operation reported a failure; stop polling.
    Failed,
}

/// A successful (2xx) response observed while polling.
#[derive(Debug, Clone)]
pub struct PollResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl PollResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// The body as text, lossily decoded.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Strategy for one asynchronous operation.
///
/// A handler knows which URI to poll, how to read each response, and how
/// to turn the terminal response (or a failure) into the caller-facing
/// value or error. It is owned by a single
/// [`DeferredResult`](crate::DeferredResult).
#[async_trait]
pub trait PollHandler: Send + Sync {
    /// The value produced once the operation is done.
    type Output: Send + Sync;

    /// URI polled with GET, relative to the client host or absolute.
    fn uri(&self) -> &str;

    /// Decide what a response means. Must not have side effects.
    fn classify(&self, response: &PollResponse) -> PollStatus;

    /// Produce the final value from the terminal response.
    ///
    /// Implementations may decode `response` directly or issue a final
    /// request through `client`.
    async fn on_finish(&self, client: &GoodDataClient, response: PollResponse)
        -> Result<Self::Output>;

    /// Build the error for a response classified as [`PollStatus::Failed`].
    fn on_poll_failure(&self, response: &PollResponse) -> GoodDataError;

    /// Map a transport, HTTP status, timeout or cancellation error.
    fn handle_poll_error(&self, error: GoodDataError) -> GoodDataError {
        error
    }
}

type Classifier = Box<dyn Fn(&PollResponse) -> PollStatus + Send + Sync>;

/// Default classification: 200 is done, 202 keeps polling.
pub fn default_classify(response: &PollResponse) -> PollStatus {
    match response.status {
        StatusCode::OK => PollStatus::Done,
        StatusCode::ACCEPTED => PollStatus::Continue,
        _ => PollStatus::Failed,
    }
}

/// A poll handler that decodes the finished response body as JSON.
///
/// # Example
///
/// ```
/// use gooddata::{PollStatus, SimplePollHandler, StatusCode};
///
/// #[derive(serde::Deserialize)]
/// struct Task {
///     state: String,
/// }
///
/// let handler = SimplePollHandler::<Task>::new("/gdc/tasks/1", "run task")
///     .with_classifier(|r| match r.status {
///         StatusCode::OK => PollStatus::Done,
///         StatusCode::ACCEPTED | StatusCode::NO_CONTENT => PollStatus::Continue,
///         _ => PollStatus::Failed,
///     });
/// ```
pub struct SimplePollHandler<T> {
    uri: String,
    operation: &'static str,
    classifier: Classifier,
    _output: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for SimplePollHandler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimplePollHandler")
            .field("uri", &self.uri)
            .field("operation", &self.operation)
            .finish_non_exhaustive()
    }
}

impl<T> SimplePollHandler<T> {
    /// Poll `uri` for the named operation using [`default_classify`].
    pub fn new(uri: impl Into<String>, operation: &'static str) -> Self {
        Self {
            uri: uri.into(),
            operation,
            classifier: Box::new(default_classify),
            _output: PhantomData,
        }
    }

    /// Replace the classification function.
    #[must_use]
    pub fn with_classifier<F>(mut self, classifier: F) -> Self
    where
        F: Fn(&PollResponse) -> PollStatus + Send + Sync + 'static,
    {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }
}

#[async_trait]
impl<T> PollHandler for SimplePollHandler<T>
where
    T: DeserializeOwned + Send + Sync,
{
    type Output = T;

    fn uri(&self) -> &str {
        &self.uri
    }

    fn classify(&self, response: &PollResponse) -> PollStatus {
        (self.classifier)(response)
    }

    async fn on_finish(&self, _client: &GoodDataClient, response: PollResponse) -> Result<T> {
        response.json().map_err(|e| {
            GoodDataError::operation_caused_by(
                self.operation,
                format!("Unable to {}: cannot read result", self.operation),
                e,
            )
        })
    }

    fn on_poll_failure(&self, response: &PollResponse) -> GoodDataError {
        GoodDataError::operation(
            self.operation,
            format!(
                "Unable to {}: unexpected HTTP response code {}",
                self.operation, response.status
            ),
        )
    }

    fn handle_poll_error(&self, error: GoodDataError) -> GoodDataError {
        GoodDataError::operation_caused_by(
            self.operation,
            format!("Unable to {}", self.operation),
            error,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_classify() {
        assert_eq!(
            default_classify(&PollResponse::new(StatusCode::OK, "{}")),
            PollStatus::Done
        );
        assert_eq!(
            default_classify(&PollResponse::new(StatusCode::ACCEPTED, "")),
            PollStatus::Continue
        );
        assert_eq!(
            default_classify(&PollResponse::new(StatusCode::NO_CONTENT, "")),
            PollStatus::Failed
        );
    }

    #[test]
    fn test_custom_classifier_sees_body() {
        let handler = SimplePollHandler::<serde_json::Value>::new("/gdc/x", "test")
            .with_classifier(|r| {
                if r.text().contains("RUNNING") {
                    PollStatus::Continue
                } else {
                    PollStatus::Done
                }
            });

        let running = PollResponse::new(StatusCode::OK, r#"{"status":"RUNNING"}"#);
        let finished = PollResponse::new(StatusCode::OK, r#"{"status":"OK"}"#);
        assert_eq!(handler.classify(&running), PollStatus::Continue);
        assert_eq!(handler.classify(&finished), PollStatus::Done);
    }

    #[test]
    fn test_failure_message_names_operation_and_status() {
        let handler = SimplePollHandler::<serde_json::Value>::new("/gdc/x", "load data");
        let err = handler.on_poll_failure(&PollResponse::new(StatusCode::NO_CONTENT, ""));
        let msg = err.to_string();
        assert!(msg.contains("load data"));
        assert!(msg.contains("204"));
    }

    #[test]
    fn test_poll_errors_are_wrapped() {
        let handler = SimplePollHandler::<serde_json::Value>::new("/gdc/x", "load data");
        let err = handler.handle_poll_error(GoodDataError::PollCancelled {
            uri: "/gdc/x".into(),
        });
        assert!(matches!(
            err,
            GoodDataError::Operation {
                operation: "load data",
                ..
            }
        ));
        assert!(matches!(err.root_cause(), GoodDataError::PollCancelled { .. }));
    }
}

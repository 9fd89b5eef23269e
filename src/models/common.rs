//! Envelope types shared by several endpoints.

use serde::{Deserialize, Serialize};

/// `{"uri": "..."}` answer of endpoints that start asynchronous work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UriResponse {
    pub uri: String,
}

/// Last path segment of a platform URI, e.g. the project ID of
/// `/gdc/projects/{id}`.
pub(crate) fn last_segment(uri: &str) -> Option<&str> {
    uri.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
}

//! Get trait for fetching single entities.

use async_trait::async_trait;

use crate::client::GoodDataClient;
use crate::error::Result;

/// Fetch a single entity by ID.
///
/// Implement this trait for entity types that can be fetched individually
/// by a unique identifier (a project ID, or the URI of the resource).
///
/// # Example
///
/// ```no_run
/// use gooddata::{GoodDataClient, Get, Project};
///
/// # async fn example() -> gooddata::Result<()> {
/// let client = GoodDataClient::from_env()?;
/// let project = Project::get(&client, "PROJECT_ID".to_string()).await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Get: Sized {
    /// The ID type for this entity.
    type Id;

    /// Fetch the entity by ID.
    ///
    /// # Arguments
    ///
    /// * `client` - The GoodData API client
    /// * `id` - The entity identifier
    ///
    /// # Errors
    ///
    /// Returns [`GoodDataError::NotFound`](crate::GoodDataError::NotFound)
    /// if the entity does not exist, or another error if the request fails.
    async fn get(client: &GoodDataClient, id: Self::Id) -> Result<Self>;
}

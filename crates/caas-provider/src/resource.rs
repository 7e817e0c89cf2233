//! The host-facing resource interface.

use async_trait::async_trait;

use crate::error::{ResourceError, Result};

/// CRUD operations the host invokes on a resource.
///
/// Operations mutate the persisted state in place, so an identifier assigned
/// before a later step fails is still recorded for the next apply.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Declared configuration plus everything persisted for the resource.
    type State: Send + Sync;

    /// Resource kind used in errors, e.g. `cluster`.
    fn kind(&self) -> &'static str;

    /// Create the remote resource and populate `state`.
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails. `state` keeps whatever was
    /// recorded before the failure.
    async fn create(&self, state: &mut Self::State) -> Result<()>;

    /// Refresh `state` from the remote resource.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::NotFound` if the resource no longer exists.
    async fn read(&self, state: &mut Self::State) -> Result<()>;

    /// Apply the configuration in `state`, which previously was `previous`.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::UpdateNotSupported` unless the resource
    /// supports in-place changes.
    async fn update(&self, state: &mut Self::State, previous: &Self::State) -> Result<()> {
        let _ = (state, previous);
        Err(ResourceError::UpdateNotSupported(self.kind()))
    }

    /// Delete the remote resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the deletion could not be confirmed; the
    /// identifier in `state` is then kept.
    async fn delete(&self, state: &mut Self::State) -> Result<()>;
}

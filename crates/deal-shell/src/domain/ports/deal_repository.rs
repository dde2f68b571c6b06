//! Port for the backing store the shell talks to.
//!
//! The [`DealRepository`] trait is the whole capability set a store must
//! offer: create a deal, list deals through a filter query, and append a
//! comment. Payloads are opaque JSON bytes (see [`crate::domain::payload`]);
//! every call resolves exactly once with either a payload or an error.

use async_trait::async_trait;

use crate::domain::DealId;
use crate::domain::payload::PayloadError;

use super::define_port_error;

define_port_error! {
    /// Errors raised by deal repository adapters.
    pub enum DealRepositoryError {
        /// The store refused the request (for example while failure is forced).
        Rejected => "deal repository rejected the request",
        /// The referenced deal does not exist in the store.
        NotFound { deal_id: DealId } => "deal {deal_id} not found",
        /// A request or response payload could not be decoded.
        Decode { message: String } => "deal payload could not be decoded: {message}",
        /// Any other store or transport failure.
        Backend { message: String } => "deal repository failed: {message}",
    }
}

impl From<PayloadError> for DealRepositoryError {
    fn from(value: PayloadError) -> Self {
        Self::decode(value.to_string())
    }
}

/// Port for deal storage.
///
/// # Contract
///
/// - `create_deal` receives a deal without an id, assigns one and echoes every
///   submitted field back.
/// - `view_deals` decodes `query` with
///   [`DealFilter::from_query`](crate::domain::DealFilter::from_query) and
///   returns the matching deals in store order. No match is an empty list,
///   never an error.
/// - `add_comment` assigns a comment id and returns the stored comment;
///   unknown deals are [`DealRepositoryError::NotFound`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DealRepository: Send + Sync {
    /// Store a new deal and return it with its assigned id.
    async fn create_deal(&self, payload: Vec<u8>) -> Result<Vec<u8>, DealRepositoryError>;

    /// List the deals matching the filter encoded in `query`.
    async fn view_deals(&self, query: Option<String>) -> Result<Vec<u8>, DealRepositoryError>;

    /// Append a comment to a stored deal and return the stored comment.
    async fn add_comment(
        &self,
        deal_id: DealId,
        payload: Vec<u8>,
    ) -> Result<Vec<u8>, DealRepositoryError>;
}

#[async_trait]
impl<R> DealRepository for std::sync::Arc<R>
where
    R: DealRepository + ?Sized,
{
    async fn create_deal(&self, payload: Vec<u8>) -> Result<Vec<u8>, DealRepositoryError> {
        (**self).create_deal(payload).await
    }

    async fn view_deals(&self, query: Option<String>) -> Result<Vec<u8>, DealRepositoryError> {
        (**self).view_deals(query).await
    }

    async fn add_comment(
        &self,
        deal_id: DealId,
        payload: Vec<u8>,
    ) -> Result<Vec<u8>, DealRepositoryError> {
        (**self).add_comment(deal_id, payload).await
    }
}

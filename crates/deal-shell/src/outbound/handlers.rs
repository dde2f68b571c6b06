//! Repository assembled from injected handler functions.
//!
//! Handy when a caller already has plain functions for creating and listing
//! deals (a fake server, a fixture table, a thin wrapper over another
//! client) and wants them to speak the [`DealRepository`] port. The adapter
//! owns payload decoding, filtering and the success switch; the handlers only
//! deal in domain values.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use crate::domain::payload;
use crate::domain::ports::{DealRepository, DealRepositoryError};
use crate::domain::{Comment, CommentId, Deal, DealFilter, DealId};

type CreateHandler = Box<dyn Fn(Deal) -> Deal + Send + Sync>;
type IndexHandler = Box<dyn Fn() -> Vec<Deal> + Send + Sync>;
type CommentHandler = Box<dyn Fn(DealId, Comment) -> Option<Comment> + Send + Sync>;

/// Deal repository delegating to handler closures.
///
/// # Examples
/// ```
/// use deal_shell::domain::{Deal, DealId};
/// use deal_shell::outbound::HandlerDealRepository;
///
/// let repository = HandlerDealRepository::new(
///     |deal: Deal| deal.with_id(DealId::new(1)),
///     Vec::new,
/// );
/// assert!(repository.is_successful());
/// ```
pub struct HandlerDealRepository {
    create: CreateHandler,
    index: IndexHandler,
    comment: CommentHandler,
    successful_response: AtomicBool,
}

impl HandlerDealRepository {
    /// Build a repository from a create handler and an index handler.
    ///
    /// Comments are accepted for any deal and receive sequential ids starting
    /// at 1 until [`HandlerDealRepository::with_comment_handler`] replaces
    /// that behaviour.
    pub fn new<C, I>(create: C, index: I) -> Self
    where
        C: Fn(Deal) -> Deal + Send + Sync + 'static,
        I: Fn() -> Vec<Deal> + Send + Sync + 'static,
    {
        let next_comment_id = AtomicU64::new(1);
        Self {
            create: Box::new(create),
            index: Box::new(index),
            comment: Box::new(move |_: DealId, comment: Comment| {
                let id = next_comment_id.fetch_add(1, Ordering::SeqCst);
                Some(comment.with_id(CommentId::new(id)))
            }),
            successful_response: AtomicBool::new(true),
        }
    }

    /// Replace the comment handler. Returning `None` reports an unknown deal.
    #[must_use]
    pub fn with_comment_handler<H>(mut self, handler: H) -> Self
    where
        H: Fn(DealId, Comment) -> Option<Comment> + Send + Sync + 'static,
    {
        self.comment = Box::new(handler);
        self
    }

    /// Builder-style toggle of the success switch.
    #[must_use]
    pub fn with_successful_response(self, successful: bool) -> Self {
        self.set_successful_response(successful);
        self
    }

    /// While `successful` is false every call is rejected.
    pub fn set_successful_response(&self, successful: bool) {
        self.successful_response.store(successful, Ordering::SeqCst);
    }

    /// Return true while calls are allowed to succeed.
    pub fn is_successful(&self) -> bool {
        self.successful_response.load(Ordering::SeqCst)
    }

    fn ensure_successful(&self) -> Result<(), DealRepositoryError> {
        if self.is_successful() {
            Ok(())
        } else {
            Err(DealRepositoryError::rejected())
        }
    }
}

impl fmt::Debug for HandlerDealRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDealRepository")
            .field("successful_response", &self.is_successful())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DealRepository for HandlerDealRepository {
    async fn create_deal(&self, payload: Vec<u8>) -> Result<Vec<u8>, DealRepositoryError> {
        self.ensure_successful()?;
        let submitted = payload::decode_deal(&payload)?;
        let created = (self.create)(submitted);
        if created.id.is_none() {
            return Err(DealRepositoryError::backend(
                "create handler returned a deal without an id",
            ));
        }
        Ok(payload::encode_deal(&created)?)
    }

    async fn view_deals(&self, query: Option<String>) -> Result<Vec<u8>, DealRepositoryError> {
        self.ensure_successful()?;
        let filter = DealFilter::from_query(query.as_deref());
        let matching = filter.apply((self.index)());
        debug!(%filter, count = matching.len(), "handler deals listed");
        Ok(payload::encode_deals(&matching)?)
    }

    async fn add_comment(
        &self,
        deal_id: DealId,
        payload: Vec<u8>,
    ) -> Result<Vec<u8>, DealRepositoryError> {
        self.ensure_successful()?;
        let comment = payload::decode_comment(&payload)?;
        let stored = (self.comment)(deal_id, comment)
            .ok_or_else(|| DealRepositoryError::not_found(deal_id))?;
        Ok(payload::encode_comment(&stored)?)
    }
}

/// Shared backing list for handler repositories that need to remember what
/// their create handler stored.
///
/// # Examples
/// ```
/// use deal_shell::outbound::DealLedger;
///
/// let ledger = DealLedger::default();
/// let repository = ledger.repository();
/// assert!(ledger.deals().is_empty());
/// # drop(repository);
/// ```
#[derive(Debug, Default, Clone)]
pub struct DealLedger {
    inner: Arc<Mutex<LedgerState>>,
}

#[derive(Debug, Default)]
struct LedgerState {
    deals: Vec<Deal>,
    next_deal_id: u64,
    next_comment_id: u64,
}

impl DealLedger {
    /// Copy of the recorded deals.
    pub fn deals(&self) -> Vec<Deal> {
        self.lock().deals.clone()
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Build a handler repository whose handlers read and write this ledger.
    pub fn repository(&self) -> HandlerDealRepository {
        let create_ledger = self.clone();
        let index_ledger = self.clone();
        let comment_ledger = self.clone();
        HandlerDealRepository::new(
            move |deal: Deal| {
                let mut state = create_ledger.lock();
                state.next_deal_id += 1;
                let created = deal.with_id(DealId::new(state.next_deal_id));
                state.deals.push(created.clone());
                created
            },
            move || index_ledger.deals(),
        )
        .with_comment_handler(move |deal_id, comment: Comment| {
            let mut state = comment_ledger.lock();
            let position = state
                .deals
                .iter()
                .position(|deal| deal.id == Some(deal_id))?;
            state.next_comment_id += 1;
            let stored = comment.with_id(CommentId::new(state.next_comment_id));
            state.deals.get_mut(position)?.comments.push(stored.clone());
            Some(stored)
        })
    }
}

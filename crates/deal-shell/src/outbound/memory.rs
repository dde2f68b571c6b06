//! In-memory reference implementation of the deal repository port.
//!
//! Every conforming repository must be indistinguishable from this one
//! through the [`DealRepository`] contract. Each instance owns its own id
//! sequences; nothing is shared between instances.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::domain::payload;
use crate::domain::ports::{DealRepository, DealRepositoryError};
use crate::domain::{CommentId, Deal, DealFilter, DealId};

/// Reasons a seed list cannot populate the reference repository.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeedError {
    /// Two seeded deals share an id.
    #[error("deal id {deal_id} is seeded more than once")]
    DuplicateDealId {
        /// Repeated id.
        deal_id: DealId,
    },
    /// A seeded deal id leaves no room for the next assigned id.
    #[error("deal id {deal_id} is too large to seed")]
    DealIdExhausted {
        /// Offending id.
        deal_id: DealId,
    },
    /// A seeded comment id leaves no room for the next assigned id.
    #[error("comment id {comment_id} is too large to seed")]
    CommentIdExhausted {
        /// Offending id.
        comment_id: u64,
    },
}

#[derive(Debug)]
struct Store {
    deals: Vec<Deal>,
    next_deal_id: u64,
    next_comment_id: u64,
}

impl Store {
    const fn empty() -> Self {
        Self {
            deals: Vec::new(),
            next_deal_id: 1,
            next_comment_id: 1,
        }
    }

    fn allocate_deal_id(&mut self) -> Result<DealId, DealRepositoryError> {
        let id = self.next_deal_id;
        self.next_deal_id = id
            .checked_add(1)
            .ok_or_else(|| DealRepositoryError::backend("deal ids exhausted"))?;
        Ok(DealId::new(id))
    }

    fn allocate_comment_id(&mut self) -> Result<CommentId, DealRepositoryError> {
        let id = self.next_comment_id;
        self.next_comment_id = id
            .checked_add(1)
            .ok_or_else(|| DealRepositoryError::backend("comment ids exhausted"))?;
        Ok(CommentId::new(id))
    }

    /// Load `deals` in order, keeping both id sequences ahead of every stored
    /// id. Nothing is stored unless the whole list is accepted.
    fn seed(&mut self, deals: impl IntoIterator<Item = Deal>) -> Result<(), SeedError> {
        let deals: Vec<Deal> = deals.into_iter().collect();
        let mut seen = HashSet::new();
        let mut next_deal_id = self.next_deal_id;
        let mut next_comment_id = self.next_comment_id;

        for deal in &deals {
            if let Some(id) = deal.id {
                if !seen.insert(id) {
                    return Err(SeedError::DuplicateDealId { deal_id: id });
                }
                let after = id
                    .get()
                    .checked_add(1)
                    .ok_or(SeedError::DealIdExhausted { deal_id: id })?;
                next_deal_id = next_deal_id.max(after);
            }
            for comment_id in deal.comments.iter().filter_map(|comment| comment.id) {
                let after = comment_id
                    .get()
                    .checked_add(1)
                    .ok_or(SeedError::CommentIdExhausted {
                        comment_id: comment_id.get(),
                    })?;
                next_comment_id = next_comment_id.max(after);
            }
        }

        // Deals seeded without an id take the ids following the highest one.
        let unassigned = deals.iter().filter(|deal| deal.id.is_none()).count();
        let unassigned = u64::try_from(unassigned).unwrap_or(u64::MAX);
        let sequence_end = next_deal_id
            .checked_add(unassigned)
            .ok_or(SeedError::DealIdExhausted {
                deal_id: DealId::new(next_deal_id),
            })?;

        let mut assign = next_deal_id..sequence_end;
        for mut deal in deals {
            if deal.id.is_none() {
                deal.id = assign.next().map(DealId::new);
            }
            self.deals.push(deal);
        }
        self.next_deal_id = sequence_end;
        self.next_comment_id = next_comment_id;
        Ok(())
    }
}

/// Reference repository backed by a vector guarded by a mutex.
///
/// # Examples
/// ```
/// use deal_shell::outbound::InMemoryDealRepository;
///
/// let repository = InMemoryDealRepository::new();
/// assert!(repository.snapshot().is_empty());
/// repository.set_force_failure(true);
/// assert!(repository.is_forcing_failure());
/// ```
#[derive(Debug)]
pub struct InMemoryDealRepository {
    store: Mutex<Store>,
    force_failure: AtomicBool,
}

impl Default for InMemoryDealRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDealRepository {
    /// Create an empty repository whose ids start at 1.
    pub const fn new() -> Self {
        Self {
            store: Mutex::new(Store::empty()),
            force_failure: AtomicBool::new(false),
        }
    }

    /// Create a repository pre-populated with `deals`, in order.
    ///
    /// Deals without an id receive one; id sequences continue after the
    /// highest seeded id.
    ///
    /// # Errors
    ///
    /// Returns [`SeedError`] when two deals share an id or a seeded id leaves
    /// no room for the next one.
    pub fn with_deals(deals: impl IntoIterator<Item = Deal>) -> Result<Self, SeedError> {
        let repository = Self::new();
        repository.lock_store().seed(deals)?;
        Ok(repository)
    }

    /// Builder-style toggle of the failure flag.
    #[must_use]
    pub fn with_force_failure(self, force_failure: bool) -> Self {
        self.set_force_failure(force_failure);
        self
    }

    /// Make every subsequent call fail with [`DealRepositoryError::Rejected`]
    /// while `force_failure` is true.
    pub fn set_force_failure(&self, force_failure: bool) {
        self.force_failure.store(force_failure, Ordering::SeqCst);
    }

    /// Return true while failures are forced.
    pub fn is_forcing_failure(&self) -> bool {
        self.force_failure.load(Ordering::SeqCst)
    }

    /// Copy of every stored deal, in store order.
    pub fn snapshot(&self) -> Vec<Deal> {
        self.lock_store().deals.clone()
    }

    fn lock_store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_available(&self) -> Result<(), DealRepositoryError> {
        if self.is_forcing_failure() {
            return Err(DealRepositoryError::rejected());
        }
        Ok(())
    }
}

#[async_trait]
impl DealRepository for InMemoryDealRepository {
    async fn create_deal(&self, payload: Vec<u8>) -> Result<Vec<u8>, DealRepositoryError> {
        self.ensure_available()?;
        let submitted = payload::decode_deal(&payload)?;
        let stored = {
            let mut store = self.lock_store();
            let stored = submitted.with_id(store.allocate_deal_id()?);
            store.deals.push(stored.clone());
            stored
        };
        debug!(deal_id = ?stored.id, "in-memory deal stored");
        Ok(payload::encode_deal(&stored)?)
    }

    async fn view_deals(&self, query: Option<String>) -> Result<Vec<u8>, DealRepositoryError> {
        self.ensure_available()?;
        let filter = DealFilter::from_query(query.as_deref());
        let matching = filter.apply(self.snapshot());
        debug!(%filter, count = matching.len(), "in-memory deals listed");
        Ok(payload::encode_deals(&matching)?)
    }

    async fn add_comment(
        &self,
        deal_id: DealId,
        payload: Vec<u8>,
    ) -> Result<Vec<u8>, DealRepositoryError> {
        self.ensure_available()?;
        let comment = payload::decode_comment(&payload)?;
        let stored = {
            let mut store = self.lock_store();
            let position = store
                .deals
                .iter()
                .position(|deal| deal.id == Some(deal_id))
                .ok_or_else(|| DealRepositoryError::not_found(deal_id))?;
            let stored = comment.with_id(store.allocate_comment_id()?);
            if let Some(deal) = store.deals.get_mut(position) {
                deal.comments.push(stored.clone());
            }
            stored
        };
        debug!(%deal_id, comment_id = ?stored.id, "in-memory comment stored");
        Ok(payload::encode_comment(&stored)?)
    }
}

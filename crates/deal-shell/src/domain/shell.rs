//! The deal shell: a stateful orchestrator over a [`DealRepository`].
//!
//! Each public operation issues at most one repository call and then commits
//! one state transition. Every commit publishes the new snapshot to the
//! registered subscriber exactly once.
//!
//! Update discipline:
//! - `create_deal` and `view_deals` are pessimistic: state changes only after
//!   the repository answers successfully.
//! - `add_comment` is optimistic: the local snapshot is updated before the
//!   repository call is issued and the call's outcome is not applied back.
//!
//! Create failures and comment results are discarded (only logged). This is
//! inherited behaviour and callers cannot observe why a create failed.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use super::payload;
use super::ports::{DealRepository, DealRepositoryError};
use super::{
    Comment, CommentText, Deal, DealFilter, DealId, RequirementSize, ShellError, ShellState,
    TenantName,
};

/// Callback receiving every published snapshot.
pub type Subscriber = Arc<dyn Fn(&ShellState) + Send + Sync>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Client-side shell managing deals through a repository.
///
/// The shell can be shared behind an [`Arc`] and driven from several tasks.
/// Completions of overlapping calls are applied atomically but in whatever
/// order they arrive; callers needing strict ordering must await each call
/// before issuing the next.
pub struct DealShell<R> {
    repository: Arc<R>,
    state: Mutex<ShellState>,
    subscriber: Mutex<Option<Subscriber>>,
}

impl<R> DealShell<R> {
    /// Create a shell with an empty snapshot.
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            state: Mutex::new(ShellState::default()),
            subscriber: Mutex::new(None),
        }
    }

    /// Repository the shell talks to.
    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Copy of the current snapshot.
    pub fn state(&self) -> ShellState {
        lock(&self.state).clone()
    }

    /// Register the subscriber, replacing any previous one.
    ///
    /// The callback runs synchronously on every commit, after the state lock
    /// has been released, so it may read the shell.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&ShellState) + Send + Sync + 'static,
    {
        *lock(&self.subscriber) = Some(Arc::new(callback));
    }

    /// Remove the subscriber.
    pub fn unsubscribe(&self) {
        *lock(&self.subscriber) = None;
    }

    /// Apply `transition` atomically and publish the resulting snapshot once.
    fn commit<T>(&self, transition: impl FnOnce(&mut ShellState) -> T) -> T {
        let (outcome, snapshot) = {
            let mut state = lock(&self.state);
            let outcome = transition(&mut state);
            (outcome, state.clone())
        };
        self.publish(&snapshot);
        outcome
    }

    fn publish(&self, snapshot: &ShellState) {
        let subscriber = lock(&self.subscriber).clone();
        if let Some(subscriber) = subscriber {
            subscriber(snapshot);
        }
    }
}

impl<R> DealShell<R>
where
    R: DealRepository,
{
    /// Submit a new deal and append the stored copy to `deals`.
    ///
    /// On failure the snapshot is left untouched and nothing is published.
    pub async fn create_deal(&self, requirement_size: RequirementSize, tenant_name: TenantName) {
        let draft = Deal::draft(requirement_size, tenant_name);
        match self.submit_deal(&draft).await {
            Ok(created) => {
                debug!(deal_id = ?created.id, "deal created");
                self.commit(|state| {
                    state.push_deal(created);
                    state.clear_error();
                });
            }
            Err(error) => {
                warn!(%error, tenant = %draft.tenant_name, "deal creation discarded");
            }
        }
    }

    /// Replace `deals` with the repository's deals matching `filter`.
    ///
    /// On failure the snapshot is left untouched and nothing is published.
    pub async fn view_deals(&self, filter: &DealFilter) {
        match self.fetch_deals(filter).await {
            Ok(deals) => {
                debug!(%filter, count = deals.len(), "deals listed");
                self.commit(|state| {
                    state.replace_deals(deals);
                    state.clear_error();
                });
            }
            Err(error) => {
                warn!(%error, %filter, "deal listing failed; keeping previous deals");
            }
        }
    }

    /// Append a comment to a deal held in the snapshot.
    ///
    /// The snapshot is updated and published before the repository is asked
    /// to store the comment; the repository's answer is only logged. When the
    /// deal is not in the snapshot the error is surfaced through the snapshot
    /// and no repository call is made.
    ///
    /// # Cancellation
    ///
    /// The commit and the first poll of the repository call happen in the
    /// same poll of this future. Dropping the future after that point keeps
    /// the local update but abandons the in-flight repository call, so
    /// whether the store applied the comment is up to the store.
    pub async fn add_comment(&self, text: CommentText, deal_id: DealId) {
        let comment = Comment::new(text);
        let applied = self.commit(|state| {
            let Some(original) = state.deal(deal_id).cloned() else {
                state.set_error(ShellError::CommentTargetMissing { deal_id });
                return false;
            };
            state.replace_and_select(original.with_comment(comment.clone()));
            state.clear_error();
            true
        });

        if !applied {
            debug!(%deal_id, "comment target missing from snapshot");
            return;
        }

        match self.send_comment(deal_id, &comment).await {
            Ok(stored) => debug!(%deal_id, comment_id = ?stored.id, "comment stored"),
            Err(error) => warn!(%error, %deal_id, "comment was not stored"),
        }
    }

    async fn submit_deal(&self, draft: &Deal) -> Result<Deal, DealRepositoryError> {
        let body = payload::encode_deal(draft)?;
        let response = self.repository.create_deal(body).await?;
        Ok(payload::decode_deal(&response)?)
    }

    async fn fetch_deals(&self, filter: &DealFilter) -> Result<Vec<Deal>, DealRepositoryError> {
        let response = self.repository.view_deals(filter.to_query()).await?;
        Ok(payload::decode_deals(&response)?)
    }

    async fn send_comment(
        &self,
        deal_id: DealId,
        comment: &Comment,
    ) -> Result<Comment, DealRepositoryError> {
        let body = payload::encode_comment(comment)?;
        let response = self.repository.add_comment(deal_id, body).await?;
        Ok(payload::decode_comment(&response)?)
    }
}

impl<R> fmt::Debug for DealShell<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DealShell")
            .field("state", &*lock(&self.state))
            .field("subscribed", &lock(&self.subscriber).is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "shell_tests.rs"]
mod tests;

//! Test utilities for the deal-shell crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`), and
//! usable by any crate that implements [`DealRepository`] and wants to prove
//! it behaves like the reference store. Compiled for tests and behind the
//! `test-support` feature.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::ports::{DealRepository, DealRepositoryError};
use crate::domain::{DealId, DealShell, ShellState};

/// Records every snapshot a shell publishes.
#[derive(Debug, Clone, Default)]
pub struct SnapshotRecorder {
    snapshots: Arc<Mutex<Vec<ShellState>>>,
}

impl SnapshotRecorder {
    fn lock(&self) -> MutexGuard<'_, Vec<ShellState>> {
        self.snapshots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register this recorder as the shell's subscriber.
    pub fn attach<R>(&self, shell: &DealShell<R>) {
        let sink = self.clone();
        shell.subscribe(move |state| sink.lock().push(state.clone()));
    }

    /// Number of snapshots received.
    pub fn count(&self) -> usize {
        self.lock().len()
    }

    /// Most recent snapshot.
    pub fn last(&self) -> Option<ShellState> {
        self.lock().last().cloned()
    }

    /// Every snapshot received, oldest first.
    pub fn snapshots(&self) -> Vec<ShellState> {
        self.lock().clone()
    }
}

/// Repository wrapper counting issued and resolved calls.
///
/// A conforming repository resolves every call exactly once, so after all
/// calls have been awaited [`CompletionProbe::issued`] equals
/// [`CompletionProbe::resolved`].
#[derive(Debug, Default)]
pub struct CompletionProbe<R> {
    inner: R,
    issued: AtomicUsize,
    resolved: AtomicUsize,
}

impl<R> CompletionProbe<R> {
    /// Wrap `inner`.
    pub const fn new(inner: R) -> Self {
        Self {
            inner,
            issued: AtomicUsize::new(0),
            resolved: AtomicUsize::new(0),
        }
    }

    /// Wrapped repository.
    pub const fn inner(&self) -> &R {
        &self.inner
    }

    /// Calls started so far.
    pub fn issued(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }

    /// Calls that produced a result so far.
    pub fn resolved(&self) -> usize {
        self.resolved.load(Ordering::SeqCst)
    }

    async fn track<T>(&self, call: impl Future<Output = T>) -> T {
        self.issued.fetch_add(1, Ordering::SeqCst);
        let outcome = call.await;
        self.resolved.fetch_add(1, Ordering::SeqCst);
        outcome
    }
}

#[async_trait]
impl<R> DealRepository for CompletionProbe<R>
where
    R: DealRepository,
{
    async fn create_deal(&self, payload: Vec<u8>) -> Result<Vec<u8>, DealRepositoryError> {
        self.track(self.inner.create_deal(payload)).await
    }

    async fn view_deals(&self, query: Option<String>) -> Result<Vec<u8>, DealRepositoryError> {
        self.track(self.inner.view_deals(query)).await
    }

    async fn add_comment(
        &self,
        deal_id: DealId,
        payload: Vec<u8>,
    ) -> Result<Vec<u8>, DealRepositoryError> {
        self.track(self.inner.add_comment(deal_id, payload)).await
    }
}

/// Whether a contract factory should build a healthy or a failing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Calls succeed normally.
    Healthy,
    /// The store's failure switch is on.
    Forced,
}

pub mod contract {
    //! Black-box checks every [`DealRepository`] implementation must pass.
    //!
    //! Each check takes a factory `Fn(FailureMode) -> R` so the same suite
    //! runs against the reference store and any production adapter. Checks
    //! panic with a descriptive message on violation.

    use std::time::Duration;

    use super::{CompletionProbe, FailureMode};
    use crate::domain::payload;
    use crate::domain::ports::{DealRepository, DealRepositoryError};
    use crate::domain::{
        Comment, CommentText, Deal, DealFilter, DealId, RequirementSize, TenantName,
    };

    /// Upper bound for a single repository call.
    pub const CALL_TIMEOUT: Duration = Duration::from_secs(5);

    async fn settle<T>(what: &str, call: impl Future<Output = T>) -> T {
        match tokio::time::timeout(CALL_TIMEOUT, call).await {
            Ok(outcome) => outcome,
            Err(_) => panic!("{what} did not complete within {CALL_TIMEOUT:?}"),
        }
    }

    fn draft(size: u64, tenant: &str) -> Deal {
        let size = RequirementSize::new(size)
            .unwrap_or_else(|err| panic!("contract fixture size invalid: {err}"));
        let tenant = TenantName::new(tenant)
            .unwrap_or_else(|err| panic!("contract fixture tenant invalid: {err}"));
        Deal::draft(size, tenant)
    }

    async fn create<R: DealRepository>(repository: &R, deal: &Deal) -> Deal {
        let body = payload::encode_deal(deal)
            .unwrap_or_else(|err| panic!("contract fixture failed to encode: {err}"));
        let response = settle("create_deal", repository.create_deal(body))
            .await
            .unwrap_or_else(|err| panic!("create_deal failed: {err}"));
        payload::decode_deal(&response)
            .unwrap_or_else(|err| panic!("create_deal returned an invalid deal: {err}"))
    }

    async fn view<R: DealRepository>(repository: &R, filter: &DealFilter) -> Vec<Deal> {
        let response = settle("view_deals", repository.view_deals(filter.to_query()))
            .await
            .unwrap_or_else(|err| panic!("view_deals({filter}) failed: {err}"));
        payload::decode_deals(&response)
            .unwrap_or_else(|err| panic!("view_deals returned an invalid list: {err}"))
    }

    fn ids(deals: &[Deal]) -> Vec<Option<DealId>> {
        deals.iter().map(|deal| deal.id).collect()
    }

    /// Created deals carry an id and echo every submitted field.
    pub async fn create_echoes_submitted_fields<R, F>(factory: F)
    where
        R: DealRepository,
        F: Fn(FailureMode) -> R,
    {
        let repository = factory(FailureMode::Healthy);
        let submitted = draft(1000, "Test Tenant");

        let created = create(&repository, &submitted).await;

        assert!(created.id.is_some(), "created deal must carry an id");
        assert_eq!(created.requirement_size, submitted.requirement_size);
        assert_eq!(created.tenant_name, submitted.tenant_name);
        assert!(created.comments.is_empty(), "new deals have no comments");
    }

    /// Viewing with "match all" returns exactly the created identities.
    pub async fn view_all_returns_created_deals<R, F>(factory: F)
    where
        R: DealRepository,
        F: Fn(FailureMode) -> R,
    {
        let repository = factory(FailureMode::Healthy);
        let mut created = Vec::new();
        for (size, tenant) in [(100, "Tenant 1"), (200, "Tenant 2"), (300, "Tenant 1")] {
            created.push(create(&repository, &draft(size, tenant)).await);
        }

        let listed = view(&repository, &DealFilter::All).await;

        assert_eq!(ids(&listed), ids(&created), "view all must list created deals");
    }

    /// A tenant filter returns exactly that tenant's subsequence, in order.
    pub async fn tenant_filter_returns_exact_subsequence<R, F>(factory: F)
    where
        R: DealRepository,
        F: Fn(FailureMode) -> R,
    {
        let repository = factory(FailureMode::Healthy);
        let mut created = Vec::new();
        for (size, tenant) in [
            (100, "Tenant 1"),
            (200, "Tenant 2"),
            (300, "tenant 2"),
            (400, "Tenant 2"),
        ] {
            created.push(create(&repository, &draft(size, tenant)).await);
        }
        let tenant = TenantName::new("Tenant 2")
            .unwrap_or_else(|err| panic!("contract fixture tenant invalid: {err}"));
        let filter = DealFilter::TenantName(tenant);

        let listed = view(&repository, &filter).await;

        let expected: Vec<Deal> = filter.apply(created);
        assert_eq!(ids(&listed), ids(&expected));
        assert!(listed.iter().all(|deal| filter.matches(deal)));
    }

    /// A filter matching nothing yields an empty list, not an error.
    pub async fn unmatched_filter_returns_empty<R, F>(factory: F)
    where
        R: DealRepository,
        F: Fn(FailureMode) -> R,
    {
        let repository = factory(FailureMode::Healthy);
        create(&repository, &draft(100, "Tenant 1")).await;
        let tenant = TenantName::new("Tenant 3")
            .unwrap_or_else(|err| panic!("contract fixture tenant invalid: {err}"));

        let listed = view(&repository, &DealFilter::TenantName(tenant)).await;

        assert!(listed.is_empty(), "unexpected deals: {listed:?}");
    }

    /// Comments come back with the submitted text and an id.
    pub async fn add_comment_assigns_id<R, F>(factory: F)
    where
        R: DealRepository,
        F: Fn(FailureMode) -> R,
    {
        let repository = factory(FailureMode::Healthy);
        let created = create(&repository, &draft(100, "Tenant 1")).await;
        let deal_id = created
            .id
            .unwrap_or_else(|| panic!("created deal must carry an id"));
        let text = CommentText::new("note")
            .unwrap_or_else(|err| panic!("contract fixture text invalid: {err}"));
        let body = payload::encode_comment(&Comment::new(text.clone()))
            .unwrap_or_else(|err| panic!("contract fixture failed to encode: {err}"));

        let response = settle("add_comment", repository.add_comment(deal_id, body))
            .await
            .unwrap_or_else(|err| panic!("add_comment failed: {err}"));
        let stored = payload::decode_comment(&response)
            .unwrap_or_else(|err| panic!("add_comment returned an invalid comment: {err}"));

        assert_eq!(stored.text, text);
        assert!(stored.id.is_some(), "stored comment must carry an id");
    }

    /// Creating while failure is forced is rejected.
    pub async fn forced_failure_rejects_create<R, F>(factory: F)
    where
        R: DealRepository,
        F: Fn(FailureMode) -> R,
    {
        let repository = factory(FailureMode::Forced);
        let body = payload::encode_deal(&draft(100, "Tenant 1"))
            .unwrap_or_else(|err| panic!("contract fixture failed to encode: {err}"));

        let outcome = settle("create_deal", repository.create_deal(body)).await;

        assert_eq!(outcome, Err(DealRepositoryError::rejected()));
    }

    /// Every call resolves exactly once, successful or not.
    pub async fn every_call_completes_once<R, F>(factory: F)
    where
        R: DealRepository,
        F: Fn(FailureMode) -> R,
    {
        for mode in [FailureMode::Healthy, FailureMode::Forced] {
            let probe = CompletionProbe::new(factory(mode));
            let body = payload::encode_deal(&draft(100, "Tenant 1"))
                .unwrap_or_else(|err| panic!("contract fixture failed to encode: {err}"));
            let comment = CommentText::new("note")
                .map(Comment::new)
                .unwrap_or_else(|err| panic!("contract fixture text invalid: {err}"));
            let comment_body = payload::encode_comment(&comment)
                .unwrap_or_else(|err| panic!("contract fixture failed to encode: {err}"));

            let _created = settle("create_deal", probe.create_deal(body)).await;
            let _listed = settle("view_deals", probe.view_deals(None)).await;
            let _stored = settle(
                "add_comment",
                probe.add_comment(DealId::new(1), comment_body),
            )
            .await;

            assert_eq!(probe.issued(), 3, "{mode:?}: three calls issued");
            assert_eq!(probe.resolved(), 3, "{mode:?}: every call resolved once");
        }
    }

    /// Run every check against `factory`.
    pub async fn run_all<R, F>(factory: F)
    where
        R: DealRepository,
        F: Fn(FailureMode) -> R,
    {
        create_echoes_submitted_fields(&factory).await;
        view_all_returns_created_deals(&factory).await;
        tenant_filter_returns_exact_subsequence(&factory).await;
        unmatched_filter_returns_empty(&factory).await;
        add_comment_assigns_id(&factory).await;
        forced_failure_rejects_create(&factory).await;
        every_call_completes_once(&factory).await;
    }
}

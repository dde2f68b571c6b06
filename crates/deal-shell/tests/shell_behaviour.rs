//! Behavioural tests for the deal shell over real repositories.

use std::sync::Arc;

use deal_shell::domain::{
    CommentText, Deal, DealFilter, DealId, DealShell, RequirementSize, TenantName,
};
use deal_shell::outbound::{DealLedger, HandlerDealRepository, InMemoryDealRepository};
use deal_shell::test_support::SnapshotRecorder;
use rstest::{fixture, rstest};

fn size(raw: u64) -> RequirementSize {
    RequirementSize::new(raw).expect("valid size")
}

fn tenant(name: &str) -> TenantName {
    TenantName::new(name).expect("valid tenant")
}

fn tenants(deals: &[Deal]) -> Vec<&str> {
    deals.iter().map(|deal| deal.tenant_name.as_str()).collect()
}

/// Reference store holding deal 1 for "Tenant 1" and deal 2 for "Tenant 2".
fn two_tenants() -> Arc<InMemoryDealRepository> {
    Arc::new(InMemoryDealRepository::with_deals([
        Deal::draft(size(100), tenant("Tenant 1")),
        Deal::draft(size(200), tenant("Tenant 2")),
    ])
    .expect("seed is valid"))
}

async fn loaded_shell(
    repository: Arc<InMemoryDealRepository>,
) -> (DealShell<InMemoryDealRepository>, SnapshotRecorder) {
    let shell = DealShell::new(repository);
    shell.view_deals(&DealFilter::All).await;
    let recorder = SnapshotRecorder::default();
    recorder.attach(&shell);
    (shell, recorder)
}

#[rstest]
#[case(1, "Tenant 1")]
#[case(1000, "Test Tenant")]
#[case(u64::MAX, "A&B C")]
#[tokio::test]
async fn created_deal_is_appended_with_an_id(#[case] raw_size: u64, #[case] name: &str) {
    let (shell, recorder) = loaded_shell(two_tenants()).await;

    shell.create_deal(size(raw_size), tenant(name)).await;

    let state = shell.state();
    assert_eq!(state.deal_count(), 3);
    let last = state.deals().last().expect("created deal");
    assert_eq!(last.requirement_size, size(raw_size));
    assert_eq!(last.tenant_name, tenant(name));
    assert_eq!(last.id, Some(DealId::new(3)));
    assert_eq!(recorder.count(), 1);
}

#[rstest]
#[tokio::test]
async fn forced_failure_create_leaves_deals_untouched() {
    let (shell, recorder) = loaded_shell(two_tenants()).await;
    let before = shell.state();
    shell.repository().set_force_failure(true);

    shell.create_deal(size(500), tenant("Tenant 5")).await;

    assert_eq!(shell.state(), before);
    assert_eq!(recorder.count(), 0);
}

#[rstest]
#[tokio::test]
async fn view_all_replaces_with_the_full_set_in_order() {
    let repository = two_tenants();
    let shell = DealShell::new(Arc::clone(&repository));
    shell.create_deal(size(300), tenant("Tenant 3")).await;
    assert_eq!(shell.state().deal_count(), 1);

    shell.view_deals(&DealFilter::All).await;

    assert_eq!(shell.state().deals(), repository.snapshot().as_slice());
    assert_eq!(
        tenants(shell.state().deals()),
        vec!["Tenant 1", "Tenant 2", "Tenant 3"]
    );
}

#[rstest]
#[case("Tenant 2", vec!["Tenant 2"])]
#[case("Tenant 3", vec![])]
#[case("tenant 2", vec![])]
#[tokio::test]
async fn tenant_filter_narrows_the_snapshot(#[case] name: &str, #[case] expected: Vec<&str>) {
    let (shell, recorder) = loaded_shell(two_tenants()).await;

    shell.view_deals(&DealFilter::from(tenant(name))).await;

    assert_eq!(tenants(shell.state().deals()), expected);
    assert!(shell.state().error().is_none());
    assert_eq!(recorder.count(), 1);
}

#[rstest]
#[tokio::test]
async fn add_comment_updates_deal_and_selection() {
    let (shell, recorder) = loaded_shell(two_tenants()).await;

    shell
        .add_comment(CommentText::new("note").expect("valid text"), DealId::new(1))
        .await;

    let state = shell.state();
    let deal = state.deal(DealId::new(1)).expect("deal 1");
    assert_eq!(deal.comments.len(), 1);
    assert_eq!(deal.comments[0].text.as_str(), "note");
    assert_eq!(state.selected_deal(), Some(deal));
    assert_eq!(recorder.count(), 1);
    assert_eq!(recorder.last(), Some(state.clone()));

    let stored = shell.repository().snapshot();
    assert_eq!(stored[0].comments.len(), 1, "store received the comment");
}

#[rstest]
#[tokio::test]
async fn add_comment_to_unknown_deal_sets_the_error() {
    let (shell, recorder) = loaded_shell(two_tenants()).await;
    let before = shell.state();

    shell
        .add_comment(CommentText::new("note").expect("valid text"), DealId::new(999))
        .await;

    let state = shell.state();
    assert_eq!(state.deals(), before.deals());
    assert_eq!(state.selected_deal(), None);
    assert_eq!(
        state.error_message().as_deref(),
        Some("unable to add comment")
    );
    assert_eq!(recorder.count(), 1);
}

#[rstest]
#[tokio::test]
async fn published_snapshot_serialises_the_error_message() {
    let (shell, recorder) = loaded_shell(two_tenants()).await;

    shell
        .add_comment(CommentText::new("note").expect("valid text"), DealId::new(999))
        .await;

    let published = recorder.last().expect("one snapshot");
    let json = serde_json::to_value(&published).expect("snapshot serialises");
    assert_eq!(json["errorMessage"], "unable to add comment");
    assert_eq!(json["deals"].as_array().map(Vec::len), Some(2));
}

#[rstest]
#[case(DealFilter::All)]
#[case(DealFilter::from(tenant("A&B C")))]
fn filter_round_trips_through_its_query(#[case] filter: DealFilter) {
    let query = filter.to_query();
    assert_eq!(DealFilter::from_query(query.as_deref()), filter);
}

#[rstest]
#[tokio::test]
async fn every_mutating_call_notifies_once() {
    let shell = DealShell::new(two_tenants());
    let recorder = SnapshotRecorder::default();
    recorder.attach(&shell);

    shell.view_deals(&DealFilter::All).await;
    assert_eq!(recorder.count(), 1);
    shell.create_deal(size(300), tenant("Tenant 3")).await;
    assert_eq!(recorder.count(), 2);
    shell
        .add_comment(CommentText::new("note").expect("valid text"), DealId::new(3))
        .await;
    assert_eq!(recorder.count(), 3);

    let counts: Vec<usize> = recorder
        .snapshots()
        .iter()
        .map(|state| state.deal_count())
        .collect();
    assert_eq!(counts, vec![2, 3, 3]);
}

#[rstest]
#[tokio::test]
async fn overlapping_calls_each_apply_atomically() {
    let shell = DealShell::new(Arc::new(InMemoryDealRepository::new()));
    let recorder = SnapshotRecorder::default();
    recorder.attach(&shell);

    tokio::join!(
        shell.create_deal(size(1), tenant("First")),
        shell.create_deal(size(2), tenant("Second")),
        shell.create_deal(size(3), tenant("Third")),
    );

    let state = shell.state();
    assert_eq!(state.deal_count(), 3);
    let mut ids: Vec<u64> = state
        .deals()
        .iter()
        .filter_map(|deal| deal.id.map(DealId::get))
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3]);
    let sizes: Vec<usize> = recorder
        .snapshots()
        .iter()
        .map(|state| state.deal_count())
        .collect();
    assert_eq!(sizes, vec![1, 2, 3]);
}

#[fixture]
fn ledger() -> DealLedger {
    DealLedger::default()
}

fn handler_shell(ledger: &DealLedger) -> DealShell<HandlerDealRepository> {
    DealShell::new(Arc::new(ledger.repository()))
}

#[rstest]
#[tokio::test]
async fn handler_repository_drives_the_shell(ledger: DealLedger) {
    let shell = handler_shell(&ledger);

    shell.create_deal(size(100), tenant("Tenant 1")).await;
    shell.create_deal(size(200), tenant("Tenant 2")).await;
    shell.view_deals(&DealFilter::from(tenant("Tenant 2"))).await;

    assert_eq!(tenants(shell.state().deals()), vec!["Tenant 2"]);
    assert_eq!(ledger.deals().len(), 2);
}

#[rstest]
#[tokio::test]
async fn unsuccessful_handler_keeps_the_snapshot(ledger: DealLedger) {
    let shell = handler_shell(&ledger);
    shell.create_deal(size(100), tenant("Tenant 1")).await;
    let before = shell.state();
    shell.repository().set_successful_response(false);

    shell.create_deal(size(200), tenant("Tenant 2")).await;
    shell.view_deals(&DealFilter::All).await;

    assert_eq!(shell.state(), before);
    assert_eq!(ledger.deals().len(), 1);
}

#[rstest]
#[tokio::test]
async fn optimistic_comment_survives_a_failing_handler(ledger: DealLedger) {
    let shell = handler_shell(&ledger);
    shell.create_deal(size(100), tenant("Tenant 1")).await;
    shell.repository().set_successful_response(false);

    shell
        .add_comment(CommentText::new("kept").expect("valid text"), DealId::new(1))
        .await;

    let state = shell.state();
    let deal = state.deal(DealId::new(1)).expect("deal 1");
    assert_eq!(deal.comments.len(), 1);
    assert!(
        ledger.deals()[0].comments.is_empty(),
        "store never saw the comment"
    );
}

//! Observable shell snapshot.

use serde::{Serialize, Serializer};
use thiserror::Error;

use super::{Deal, DealId};

/// Errors the shell surfaces through its snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShellError {
    /// A comment targeted a deal missing from the current snapshot.
    #[error("unable to add comment")]
    CommentTargetMissing {
        /// Deal the comment was meant for.
        deal_id: DealId,
    },
}

/// Full observable state of a shell at one point in time.
///
/// ## Invariants
/// - Deals are unique by id once the repository has assigned one.
/// - The selection is a reference into `deals`, never a separate copy, so
///   [`ShellState::selected_deal`] always returns the entry held in `deals`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellState {
    deals: Vec<Deal>,
    selected_deal_id: Option<DealId>,
    #[serde(rename = "errorMessage", serialize_with = "serialize_error")]
    error: Option<ShellError>,
}

fn serialize_error<S>(error: &Option<ShellError>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match error {
        Some(err) => serializer.collect_str(err),
        None => serializer.serialize_none(),
    }
}

impl ShellState {
    /// Deals in display order.
    pub fn deals(&self) -> &[Deal] {
        &self.deals
    }

    /// Number of deals held.
    pub fn deal_count(&self) -> usize {
        self.deals.len()
    }

    /// Find a deal by id.
    pub fn deal(&self, id: DealId) -> Option<&Deal> {
        self.deals.iter().find(|deal| deal.id == Some(id))
    }

    /// Return true when a deal with `id` is held.
    pub fn has_deal(&self, id: DealId) -> bool {
        self.deal(id).is_some()
    }

    /// The currently selected deal, resolved against `deals`.
    pub fn selected_deal(&self) -> Option<&Deal> {
        self.selected_deal_id.and_then(|id| self.deal(id))
    }

    /// Last surfaced error, if any.
    pub fn error(&self) -> Option<&ShellError> {
        self.error.as_ref()
    }

    /// Human-readable form of [`ShellState::error`].
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    pub(crate) fn push_deal(&mut self, deal: Deal) {
        self.deals.push(deal);
    }

    pub(crate) fn replace_deals(&mut self, deals: Vec<Deal>) {
        self.deals = deals;
    }

    /// Swap the entry sharing `deal`'s id for `deal` and select it.
    pub(crate) fn replace_and_select(&mut self, deal: Deal) {
        let Some(id) = deal.id else {
            return;
        };
        if let Some(slot) = self.deals.iter_mut().find(|entry| entry.id == Some(id)) {
            *slot = deal;
            self.selected_deal_id = Some(id);
        }
    }

    pub(crate) fn set_error(&mut self, error: ShellError) {
        self.error = Some(error);
    }

    pub(crate) fn clear_error(&mut self) {
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;
    use crate::domain::{Comment, CommentText, RequirementSize, TenantName};

    #[fixture]
    fn state() -> ShellState {
        let mut state = ShellState::default();
        for (id, tenant) in [(1, "Tenant 1"), (2, "Tenant 2")] {
            state.push_deal(
                Deal::draft(
                    RequirementSize::new(100).expect("valid size"),
                    TenantName::new(tenant).expect("valid tenant"),
                )
                .with_id(DealId::new(id)),
            );
        }
        state
    }

    #[rstest]
    fn selection_follows_the_entry_in_deals(mut state: ShellState) {
        let original = state.deal(DealId::new(2)).cloned().expect("deal 2");
        let updated =
            original.with_comment(Comment::new(CommentText::new("note").expect("valid text")));

        state.replace_and_select(updated.clone());

        assert_eq!(state.selected_deal(), Some(&updated));
        assert_eq!(state.deal(DealId::new(2)), Some(&updated));
        assert_eq!(state.deal_count(), 2);
    }

    #[rstest]
    fn replacing_deals_drops_a_stale_selection(mut state: ShellState) {
        let deal = state.deal(DealId::new(1)).cloned().expect("deal 1");
        state.replace_and_select(deal);

        state.replace_deals(Vec::new());

        assert!(state.selected_deal().is_none());
    }

    #[rstest]
    fn unknown_deal_is_not_selected(mut state: ShellState) {
        let stranger = Deal::draft(
            RequirementSize::new(5).expect("valid size"),
            TenantName::new("Nobody").expect("valid tenant"),
        )
        .with_id(DealId::new(77));

        state.replace_and_select(stranger);

        assert!(state.selected_deal().is_none());
        assert!(!state.has_deal(DealId::new(77)));
    }

    #[rstest]
    fn serialises_error_as_message(mut state: ShellState) {
        state.replace_deals(Vec::new());
        state.set_error(ShellError::CommentTargetMissing {
            deal_id: DealId::new(999),
        });

        let value = serde_json::to_value(&state).expect("serialise state");

        assert_eq!(
            value,
            json!({
                "deals": [],
                "selectedDealId": null,
                "errorMessage": "unable to add comment",
            })
        );
    }
}

//! Deal filters and their query-string encoding.
//!
//! The same [`DealFilter`] value is used as an in-process predicate and as
//! the query fragment the shell sends to a repository. Encoding and decoding
//! obey a round-trip law: decoding an encoded filter yields the original.

use std::fmt;

use url::form_urlencoded;

use super::{Deal, TenantName};

/// Query key carrying the tenant name.
pub const TENANT_NAME_KEY: &str = "tenantName";

/// Predicate over deals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DealFilter {
    /// Every deal matches.
    #[default]
    All,
    /// Deals whose tenant name equals the value exactly (case-sensitive).
    TenantName(TenantName),
}

impl DealFilter {
    /// Encode the filter as a query fragment.
    ///
    /// [`DealFilter::All`] has no fragment at all rather than an empty one.
    ///
    /// # Examples
    /// ```
    /// use deal_shell::domain::{DealFilter, TenantName};
    ///
    /// let tenant = TenantName::new("A&B C").expect("named tenant");
    /// let filter = DealFilter::TenantName(tenant);
    /// let query = filter.to_query();
    /// assert_eq!(query.as_deref(), Some("tenantName=A%26B+C"));
    /// assert_eq!(DealFilter::from_query(query.as_deref()), filter);
    /// assert_eq!(DealFilter::All.to_query(), None);
    /// ```
    pub fn to_query(&self) -> Option<String> {
        match self {
            Self::All => None,
            Self::TenantName(name) => Some(
                form_urlencoded::Serializer::new(String::new())
                    .append_pair(TENANT_NAME_KEY, name.as_str())
                    .finish(),
            ),
        }
    }

    /// Decode a raw query string into a filter.
    ///
    /// Missing, empty or unusable input decodes to [`DealFilter::All`].
    /// Unrelated keys are ignored and the first `tenantName` pair wins.
    pub fn from_query(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::All;
        };
        let raw = raw.strip_prefix('?').unwrap_or(raw);

        form_urlencoded::parse(raw.as_bytes())
            .find(|(key, _)| key == TENANT_NAME_KEY)
            .and_then(|(_, value)| TenantName::new(value.into_owned()).ok())
            .map_or(Self::All, Self::TenantName)
    }

    /// Return true when `deal` satisfies the filter.
    pub fn matches(&self, deal: &Deal) -> bool {
        match self {
            Self::All => true,
            Self::TenantName(name) => deal.tenant_name == *name,
        }
    }

    /// Keep the deals that satisfy the filter, preserving their order.
    pub fn apply(&self, deals: impl IntoIterator<Item = Deal>) -> Vec<Deal> {
        deals.into_iter().filter(|deal| self.matches(deal)).collect()
    }
}

impl From<TenantName> for DealFilter {
    fn from(value: TenantName) -> Self {
        Self::TenantName(value)
    }
}

impl fmt::Display for DealFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::TenantName(name) => write!(f, "tenantName={name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;
    use crate::domain::RequirementSize;

    fn tenant_filter(name: &str) -> DealFilter {
        DealFilter::TenantName(TenantName::new(name).expect("valid tenant"))
    }

    fn deal(name: &str) -> Deal {
        Deal::draft(
            RequirementSize::new(100).expect("valid size"),
            TenantName::new(name).expect("valid tenant"),
        )
    }

    #[rstest]
    #[case::all(DealFilter::All)]
    #[case::plain(tenant_filter("Tenant 2"))]
    #[case::reserved(tenant_filter("A&B C"))]
    #[case::equals_and_plus(tenant_filter("x=y+z%"))]
    #[case::unicode(tenant_filter("Café Zürich 東京"))]
    fn decode_inverts_encode(#[case] filter: DealFilter) {
        let query = filter.to_query();
        assert_eq!(DealFilter::from_query(query.as_deref()), filter);
    }

    #[rstest]
    fn match_all_has_no_fragment() {
        assert!(DealFilter::All.to_query().is_none());
    }

    #[rstest]
    fn reserved_characters_are_escaped() {
        let query = tenant_filter("A&B=C").to_query().expect("fragment");
        assert_eq!(query, "tenantName=A%26B%3DC");
    }

    #[rstest]
    #[case::absent(None)]
    #[case::empty(Some(""))]
    #[case::question_mark(Some("?"))]
    #[case::unrelated(Some("page=2&sort=asc"))]
    #[case::blank_value(Some("tenantName="))]
    #[case::key_without_value(Some("tenantName"))]
    fn unusable_queries_decode_to_all(#[case] raw: Option<&str>) {
        assert_eq!(DealFilter::from_query(raw), DealFilter::All);
    }

    #[rstest]
    fn first_tenant_pair_wins() {
        let decoded = DealFilter::from_query(Some("tenantName=First&tenantName=Second"));
        assert_eq!(decoded, tenant_filter("First"));
    }

    #[rstest]
    fn unrelated_keys_are_ignored() {
        let decoded = DealFilter::from_query(Some("?page=3&tenantName=Tenant%202&sort=size"));
        assert_eq!(decoded, tenant_filter("Tenant 2"));
    }

    #[rstest]
    fn tenant_match_is_exact_and_case_sensitive() {
        let filter = tenant_filter("Tenant 2");
        assert!(filter.matches(&deal("Tenant 2")));
        assert!(!filter.matches(&deal("tenant 2")));
        assert!(!filter.matches(&deal("Tenant 22")));
        assert!(!filter.matches(&deal("Tenant")));
    }

    #[rstest]
    fn apply_preserves_order() {
        let deals = vec![deal("B"), deal("A"), deal("B"), deal("C")];

        let kept = tenant_filter("B").apply(deals.clone());

        assert_eq!(kept, vec![deal("B"), deal("B")]);
        assert_eq!(DealFilter::All.apply(deals.clone()), deals);
    }
}

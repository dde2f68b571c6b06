//! Client-side deal shell.
//!
//! A [`DealShell`](domain::DealShell) manages leasing deals through the
//! [`DealRepository`](domain::ports::DealRepository) port, applies filter
//! semantics shared with the store, and publishes a snapshot of its state to
//! one subscriber after every transition.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use deal_shell::domain::{DealFilter, DealShell, RequirementSize, TenantName};
//! use deal_shell::outbound::InMemoryDealRepository;
//!
//! # tokio::runtime::Builder::new_current_thread().build().expect("runtime").block_on(async {
//! let shell = DealShell::new(Arc::new(InMemoryDealRepository::new()));
//! shell.subscribe(|state| println!("{} deal(s)", state.deal_count()));
//!
//! let size = RequirementSize::new(1000).expect("positive size");
//! let tenant = TenantName::new("Acme").expect("named tenant");
//! shell.create_deal(size, tenant).await;
//! shell.view_deals(&DealFilter::All).await;
//!
//! assert_eq!(shell.state().deal_count(), 1);
//! # });
//! ```

pub mod config;
pub mod domain;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

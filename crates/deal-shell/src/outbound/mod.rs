//! Driven adapters implementing the deal repository port.
//!
//! - [`InMemoryDealRepository`]: the reference store every implementation is
//!   measured against.
//! - [`HandlerDealRepository`]: a store assembled from handler closures, with
//!   [`DealLedger`] as a ready-made shared backing list.

mod handlers;
mod memory;

pub use handlers::{DealLedger, HandlerDealRepository};
pub use memory::{InMemoryDealRepository, SeedError};

//! Domain ports defining the edge between the shell and its backing stores.

mod macros;
pub(crate) use macros::define_port_error;

mod deal_repository;

#[cfg(test)]
pub use deal_repository::MockDealRepository;
pub use deal_repository::{DealRepository, DealRepositoryError};

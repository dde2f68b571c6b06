//! Domain primitives, the repository port, and the deal shell.
//!
//! Purpose: keep the shell's state machine independent of any particular
//! store. Domain values are immutable from the shell's point of view and
//! document their serialisation contract in their Rustdoc.
//!
//! Public surface:
//! - Deal, Comment and their validated field types.
//! - DealFilter: predicate and query-fragment codec.
//! - DealShell: orchestrator publishing [`ShellState`] snapshots.
//! - ports::DealRepository: the port every backing store implements.

mod deal;
mod filter;
pub mod payload;
pub mod ports;
mod shell;
mod state;

pub use self::deal::{
    Comment, CommentId, CommentText, Deal, DealId, DealValidationError, RequirementSize,
    TenantName,
};
pub use self::filter::{DealFilter, TENANT_NAME_KEY};
pub use self::shell::{DealShell, Subscriber};
pub use self::state::{ShellError, ShellState};

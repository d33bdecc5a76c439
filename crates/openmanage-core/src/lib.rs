//! Idempotent operation engine on top of `openmanage-api`.
//!
//! Every device task in this workspace follows the same shape: read the
//! current state, compare it with the desired state, mutate only when the
//! two differ, and report a uniform result.
//!
//! - **[`diff`]**: partial, type-tolerant comparison of desired vs observed
//!   state and the [`Plan`] derived from it (`Noop`, `WouldChange`, `Apply`).
//!
//! - **[`interpret`]**: [`SuccessPredicate`] decides whether a response
//!   counts as success; [`interpret()`] maps it onto an [`OperationResult`].
//!
//! - **[`OperationResult`]**: the `{changed, failed, msg, ...}` contract
//!   every caller consumes. Failures never report `changed = true`.
//!
//! - **[`lifecycle`]**: [`run_operation`] opens a session, runs one
//!   [`Operation`], and closes the session on every exit path.
//!
//! - **[`ops`]**: the concrete Lifecycle Controller, power, OME and OMEVV
//!   operations.

pub mod config;
pub mod diff;
pub mod error;
pub mod interpret;
pub mod lifecycle;
pub mod ops;
pub mod result;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::ModuleParams;
pub use diff::{Action, Diff, Plan, plan};
pub use error::CoreError;
pub use interpret::{SuccessPredicate, interpret, require};
pub use lifecycle::{Operation, OperationContext, run_operation, with_session};
pub use result::OperationResult;

//! Costwatch assistant core — pure domain logic, zero sqlx, zero axum.
//!
//! Two cooperating pieces form this crate:
//!
//! 1. **Scope resolution** ([`context`]): an authenticated [`Session`] is
//!    translated, fresh on every request, into an immutable [`QueryContext`]
//!    describing which organizations the caller may query.
//! 2. **Template execution** ([`executor`]): a closed registry of read-only
//!    query templates ([`registry`]) is gated by that context, parameters
//!    are org-scoped and validated ([`params`]), and the call is dispatched
//!    to a [`ports::ReadStore`] implementation.
//!
//! The executor is the tenant-isolation boundary: it re-validates every
//! invocation regardless of entry point, so it is safe to call from both the
//! direct query endpoint and the chat-driven pipeline.

pub mod context;
pub mod error;
pub mod executor;
pub mod params;
pub mod ports;
pub mod registry;
pub mod types;

pub use context::{resolve_context, QueryContext, Scope, Session, SessionClaims, AllowedOrgs};
pub use error::CostwatchError;
pub use executor::QueryExecutor;
pub use ports::ReadStore;
pub use registry::TemplateName;
pub use types::{OrgId, QueryData, QueryResult};

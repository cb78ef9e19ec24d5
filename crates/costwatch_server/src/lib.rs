//! Costwatch assistant REST server — axum with JWT auth.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;

//! PostgreSQL adapter for the Costwatch assistant core — implements the
//! `ReadStore` port with runtime-checked sqlx queries.

pub mod rows;
pub mod store;

pub use store::PgReadStore;

//! Materialized `SQLite` cache.
//!
//! The cache is a projection of the event logs: every row in it was
//! produced by applying events, and the whole database can be deleted and
//! rebuilt without losing data. Queries, pagination, and full-text search
//! all run here so reads never touch the logs.

pub mod connection;
pub mod migrations;
pub mod repos;
pub mod row_types;

pub use connection::{ConnectionPool, PooledConnection};

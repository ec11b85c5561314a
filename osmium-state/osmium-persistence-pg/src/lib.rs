//! Postgres-backed implementations of the Osmium store and lock contracts.

pub mod db;
mod entities;
mod mapping;
mod trait_impl;

pub use db::PgStateDb;
pub use trait_impl::lock::PgLockService;

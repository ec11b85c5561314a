//! osmium-common
//!
//! Shared building blocks for the Osmium task scheduler:
//! - task: the durable task entity, statuses, history and body codec
//! - registry: per-type decoder/handler/registrator maps, built once at boot
//! - state: the task store contract plus an in-memory implementation
//! - lock: the advisory lock contract and the per-task lock client
//! - error: crate-level error types

pub mod error;
pub mod lock;
pub mod registry;
pub mod state;
pub mod task;

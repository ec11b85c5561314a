//! osmium-scheduler
//!
//! The scheduling side of Osmium: the periodic tick that selects runnable
//! tasks, the dependency resolver that gates them, the worker that executes
//! one attempt, and the registrator driver that synthesises new tasks.

pub mod config;
pub mod dispatch;
pub mod registrator;
pub mod resolver;
pub mod scheduler;
pub mod worker;

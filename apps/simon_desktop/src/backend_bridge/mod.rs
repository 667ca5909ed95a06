//! Backend worker: tokio runtime hosting the round controller.

pub mod commands;
pub mod runtime;

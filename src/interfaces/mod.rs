//! Outer adapters: command model and CSV input/output.

pub mod command;
pub mod csv;

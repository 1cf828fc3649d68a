#![doc = include_str!("../README.md")]

pub mod catalog;
pub mod cli;
pub mod config;
mod error;
pub mod events;
pub mod payload;
pub mod report;
pub mod runtime;

pub use crate::config::RuntimeConfig;
pub use crate::error::RuntimeError;
pub use crate::report::RunReport;
pub use crate::runtime::DroveRuntime;

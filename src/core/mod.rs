//! Paths, configuration, error type and interrupt handling shared by every module.

pub mod config;
pub mod document;
pub mod error;
pub mod interrupt;
pub mod paths;

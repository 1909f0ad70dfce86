//! Core types and trait definitions for the Canvass survey manager.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Every other crate in the workspace depends on it.

pub mod actor;
pub mod clock;
pub mod error;
pub mod policy;
pub mod response;
pub mod store;
pub mod survey;

pub use error::{Error, Result};

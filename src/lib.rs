//! Weather DB - per-station weather measurement store
//!
//! Synchronizes station readings from an external source into one document
//! per station and answers per-sensor average queries over it.

pub mod averages;
pub mod common;
pub mod config;
pub mod entity;
pub mod error;
pub mod routes;
pub mod source;
pub mod store;
pub mod sync;

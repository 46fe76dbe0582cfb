//! gametracker-common - shared library for the GameTracker backend
//!
//! Holds the domain model (game records and their status lifecycle), the
//! common error type, configuration resolution, and the SQLite access layer
//! used by the API service.

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};

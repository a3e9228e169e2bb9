//! Nutrition targets, progress rollups and a logging client for athletes
//! trying to gain or lose weight.
//!
//! The calculation modules ([`targets`], [`aggregate`], [`evaluator`],
//! [`estimate`]) are pure and take everything they need as arguments.
//! [`client::AthleteClient`] fetches logs from the backend and feeds them in.

pub mod aggregate;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod estimate;
pub mod evaluator;
pub mod models;
pub mod store;
pub mod targets;

pub use error::{Error, Result};

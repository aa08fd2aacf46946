//! Data models for the LuminaHealth backend.
//!
//! These models match the frontend TypeScript interfaces for seamless interoperability.

mod application;
mod appointment;
mod homepage;

pub use application::*;
pub use appointment::*;
pub use homepage::*;

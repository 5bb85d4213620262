//! Route handlers.

pub mod api;
pub mod health;
pub mod quiz;

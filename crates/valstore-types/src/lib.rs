//! Valstore Types - Shared domain types
//!
//! This crate contains domain types used across valstore crates:
//! - Upstream routing regions
//! - The typed storefront projection

pub mod region;
pub mod storefront;

pub use region::*;
pub use storefront::*;

//! Application services.
//!
//! Logic shared by several handlers that doesn't belong to a single
//! database table or to the pure study engine.

pub mod batch;
pub mod optimistic;
pub mod study;

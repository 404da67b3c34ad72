//! Domain logic and core data structures
//!
//! This module contains pure grid and geometry logic that is independent
//! of any windowing system.

pub mod core;
pub mod geometry;
pub mod grid;
pub mod selection;

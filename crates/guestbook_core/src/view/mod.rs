//! Book view projections.
//!
//! # Responsibility
//! - Map the ordered note collection onto double pages.
//! - Format visible note slots for the renderer.

pub mod display;
pub mod pagination;

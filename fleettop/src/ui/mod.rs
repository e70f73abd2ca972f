//! UI module root: exposes drawing functions for individual panels.

pub mod availability;
pub mod cards;
pub mod detail;
pub mod gpu;
pub mod header;
pub mod processes;
pub mod theme;
pub mod util;

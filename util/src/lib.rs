//! Utility library for the Breadcrumbs terrain router

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod logger;
pub mod maths;
pub mod params;
pub mod session;
pub mod time;

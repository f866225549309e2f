//! # Breadcrumbs library
//!
//! Routes trails across a terrain elevation raster through an ordered list of waypoints, trading
//! off distance, elevation change, slope and per-cell extra costs.
//!
//! The library is split into:
//!
//! - [`map`] - the terrain map the router searches over and the accumulation of extra costs.
//! - [`nav`] - cost functions, the waypoint router and parameter sweeps.
//! - [`params`] - the route parameter document.
//! - [`raster`] - reading and writing grids and previews.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Terrain map, grid points and cost layer accumulation
pub mod map;

/// Navigation - the waypoint router and weight sweeps
pub mod nav;

/// Route parameter document
pub mod params;

/// Raster input and output
pub mod raster;

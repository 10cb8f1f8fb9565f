//! # lattice-core
//!
//! Core data structures for the lattice grid/formula engine.
//!
//! This crate provides the types shared by every consumer of the engine:
//! - [`CellAddress`] and [`CellRange`] - Cell addressing and inclusive ranges
//! - [`Value`] - Runtime values produced by formula evaluation
//! - [`Error`] and [`Result`] - Addressing/range errors
//!
//! ## Example
//!
//! ```rust
//! use lattice_core::{CellAddress, CellRange};
//!
//! let range = CellRange::new(CellAddress::new(0, 0), CellAddress::new(1, 1));
//! let cells: Vec<_> = range.cells().collect();
//! assert_eq!(cells.len(), 4);
//! ```

pub mod address;
pub mod error;
pub mod value;

// Re-exports for convenience
pub use address::{CellAddress, CellRange, CellRangeIterator};
pub use error::{Error, Result};
pub use value::Value;

/// Default number of rows in a grid
pub const DEFAULT_ROWS: u32 = 8;

/// Default number of columns in a grid
pub const DEFAULT_COLS: u16 = 8;

//! # lattice-formula
//!
//! The lattice formula language: lexer, parser, AST, and the two tree
//! walkers (evaluator and serializer), plus the grid of cells they run
//! against.
//!
//! This crate provides:
//! - Lexing (text → tokens) and parsing (tokens → AST)
//! - Evaluation (AST + grid → value)
//! - Serialization (AST → canonical text)
//! - The [`Grid`] storing each cell's source, AST, value and canonical text
//!
//! ## Example
//!
//! ```rust
//! use lattice_formula::{parse_formula, Grid};
//!
//! let mut grid = Grid::default();
//! let ast = parse_formula("(5 + 2) * 3 % 4").unwrap();
//! grid.set_cell(0, 0, "(5 + 2) * 3 % 4", ast).unwrap();
//!
//! let ast = parse_formula("#[0, 0] + 3").unwrap();
//! grid.set_cell(0, 1, "#[0, 0] + 3", ast).unwrap();
//! ```

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod grid;
pub mod lexer;
pub mod parser;
pub mod serializer;

pub use ast::{BinaryOp, Expr, StatOp, UnaryOp};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{evaluate, EvaluationContext};
pub use grid::{Cell, Grid, RangeCell};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{parse_formula, Parser};
pub use serializer::serialize;

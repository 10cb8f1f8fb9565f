//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur during lexing, parsing or evaluation
///
/// None of these are recovered internally; a front end catches them at the
/// formula boundary. A failed evaluation never corrupts already-written
/// cells.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormulaError {
    /// Unrecognized character in the source text
    #[error("unexpected character '{ch}' at byte {at}")]
    Lex { ch: char, at: usize },

    /// A required token was absent
    #[error("parse error: {0}")]
    Parse(String),

    /// Operand kind mismatch during evaluation
    #[error("type error: {0}")]
    Type(String),

    /// Read of a never-written cell
    #[error("cell not defined at ({row}, {col})")]
    UndefinedCell { row: u32, col: u16 },

    /// Address outside the grid's declared bounds
    #[error("cell address ({row}, {col}) is outside the grid")]
    InvalidAddress { row: i64, col: i64 },

    /// Statistic range with unordered or out-of-bounds endpoints
    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// Integer division or modulo by zero
    #[error("division by zero")]
    DivisionByZero,

    /// Shift amount outside 0..64
    #[error("shift amount {0} out of range")]
    ShiftOutOfRange(i64),

    /// Integer arithmetic overflowed
    #[error("integer overflow in {0}")]
    Overflow(&'static str),

    /// Max/min over a range holding no numeric values
    #[error("range contains no numeric values")]
    NoNumericValues,
}

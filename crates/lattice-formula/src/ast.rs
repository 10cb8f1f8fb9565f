//! Formula Abstract Syntax Tree types
//!
//! One closed expression enum covers every node family; visitors
//! (evaluator, serializer) match on it exhaustively, so adding a variant
//! is a compile error in every visitor. Binary and unary families share a
//! single node shape keyed by an operator tag.

/// Formula expression AST
///
/// Nodes are immutable after construction and each tree is owned by
/// exactly one cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // === Literals ===
    /// Integer literal
    Int(i64),
    /// Float literal
    Float(f64),
    /// Boolean literal
    Boolean(bool),
    /// String literal (no source syntax; built through the API)
    Str(String),

    /// Cell address primitive with computed row/column components
    CellAddress { row: Box<Expr>, col: Box<Expr> },

    // === Operators ===
    /// Binary operation
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Unary operation (including the casts, which use call syntax)
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Range statistic over the inclusive rectangle between two addresses
    Statistic {
        op: StatOp,
        start: Box<Expr>,
        end: Box<Expr>,
    },

    // === Cell references ===
    /// An address used as a reference target: `[row, col]`
    LValue { row: Box<Expr>, col: Box<Expr> },
    /// An address dereferenced to the stored cell value: `#[row, col]`
    RValue { row: Box<Expr>, col: Box<Expr> },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Exponent,

    // Logical
    LogicalAnd,
    LogicalOr,

    // Bitwise
    BitwiseAnd,
    BitwiseOr,
    Xor,
    LeftShift,
    RightShift,

    // Relational
    Equals,
    NotEquals,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
}

impl BinaryOp {
    /// The operator's source spelling
    ///
    /// `Exponent` and `Xor` share `^`; the grammar gives them a single
    /// token and distinguishes them by parse level.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Exponent => "^",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::LogicalOr => "||",
            BinaryOp::BitwiseAnd => "&",
            BinaryOp::BitwiseOr => "|",
            BinaryOp::Xor => "^",
            BinaryOp::LeftShift => "<<",
            BinaryOp::RightShift => ">>",
            BinaryOp::Equals => "==",
            BinaryOp::NotEquals => "!=",
            BinaryOp::LessThan => "<",
            BinaryOp::LessOrEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterOrEqual => ">=",
        }
    }

    /// Human-readable operation name for error messages
    pub fn describe(&self) -> &'static str {
        match self {
            BinaryOp::Add => "addition",
            BinaryOp::Subtract => "subtraction",
            BinaryOp::Multiply => "multiplication",
            BinaryOp::Divide => "division",
            BinaryOp::Modulo => "modulo",
            BinaryOp::Exponent => "exponentiation",
            BinaryOp::LogicalAnd => "logical AND",
            BinaryOp::LogicalOr => "logical OR",
            BinaryOp::BitwiseAnd => "bitwise AND",
            BinaryOp::BitwiseOr => "bitwise OR",
            BinaryOp::Xor => "bitwise XOR",
            BinaryOp::LeftShift => "left shift",
            BinaryOp::RightShift => "right shift",
            BinaryOp::Equals => "equality",
            BinaryOp::NotEquals => "inequality",
            BinaryOp::LessThan | BinaryOp::LessOrEqual | BinaryOp::GreaterThan
            | BinaryOp::GreaterOrEqual => "comparison",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic sign flip
    Negate,
    /// Logical negation
    Not,
    /// Bitwise complement (no grammar production; built through the API)
    BitwiseNot,
    /// Truncate a float toward zero (serialized as `int(x)`)
    FloatToInt,
    /// Widen an integer exactly (serialized as `float(x)`)
    IntToFloat,
}

/// Range statistic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatOp {
    Max,
    Min,
    Mean,
    Sum,
}

impl StatOp {
    /// The statistic's call-syntax name
    pub fn name(&self) -> &'static str {
        match self {
            StatOp::Max => "max",
            StatOp::Min => "min",
            StatOp::Mean => "mean",
            StatOp::Sum => "sum",
        }
    }
}

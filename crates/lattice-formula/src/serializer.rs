//! Formula serializer
//!
//! Renders an AST back to canonical source text: fully parenthesized
//! infix for every binary construct, bracket syntax for cell references,
//! call syntax for casts and statistics. The output of every node with a
//! grammar production re-lexes to an equivalent tree.

use crate::ast::{Expr, UnaryOp};

/// Serialize an expression to canonical, fully-parenthesized source text
///
/// # Example
/// ```rust
/// use lattice_formula::{parse_formula, serialize};
///
/// let ast = parse_formula("1+2 * 3").unwrap();
/// assert_eq!(serialize(&ast), "(1 + (2 * 3))");
/// ```
pub fn serialize(expr: &Expr) -> String {
    match expr {
        Expr::Int(v) => v.to_string(),
        // {:?} keeps the decimal point on round values, so the text
        // re-lexes as a float literal
        Expr::Float(v) => format!("{:?}", v),
        Expr::Boolean(v) => v.to_string(),
        Expr::Str(v) => v.clone(),

        Expr::CellAddress { row, col } | Expr::LValue { row, col } => {
            format!("[{}, {}]", serialize(row), serialize(col))
        }
        Expr::RValue { row, col } => format!("#[{}, {}]", serialize(row), serialize(col)),

        Expr::Binary { op, left, right } => {
            format!("({} {} {})", serialize(left), op.symbol(), serialize(right))
        }

        Expr::Unary { op, operand } => match op {
            UnaryOp::Negate => format!("-({})", serialize(operand)),
            UnaryOp::Not => format!("!{}", serialize(operand)),
            UnaryOp::BitwiseNot => format!("~{}", serialize(operand)),
            UnaryOp::FloatToInt => format!("int({})", serialize(operand)),
            UnaryOp::IntToFloat => format!("float({})", serialize(operand)),
        },

        Expr::Statistic { op, start, end } => {
            format!("{}({}, {})", op.name(), serialize(start), serialize(end))
        }
    }
}

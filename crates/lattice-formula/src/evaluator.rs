//! Formula evaluator
//!
//! Walks an AST and produces a single runtime [`Value`]. The evaluation
//! payload is an [`EvaluationContext`] carrying the grid; every
//! address- and range-based node resolves through it.

use crate::ast::{BinaryOp, Expr, StatOp, UnaryOp};
use crate::error::{FormulaError, FormulaResult};
use crate::grid::{Grid, RangeCell};
use lattice_core::{CellAddress, Value};

/// Context for formula evaluation
///
/// Carries the grid that address and range expressions resolve against.
pub struct EvaluationContext<'a> {
    /// The grid cell references read from
    pub grid: &'a Grid,
}

impl<'a> EvaluationContext<'a> {
    /// Create a new evaluation context
    pub fn new(grid: &'a Grid) -> Self {
        Self { grid }
    }
}

/// Evaluate a formula expression to a runtime value
pub fn evaluate(expr: &Expr, ctx: &EvaluationContext<'_>) -> FormulaResult<Value> {
    match expr {
        // === Literals ===
        Expr::Int(v) => Ok(Value::Int(*v)),
        Expr::Float(v) => Ok(Value::Float(*v)),
        Expr::Boolean(v) => Ok(Value::Boolean(*v)),
        Expr::Str(v) => Ok(Value::Str(v.clone())),

        // === Addresses ===
        Expr::CellAddress { row, col } | Expr::LValue { row, col } => {
            let addr = resolve_address(row, col, ctx)?;
            Ok(Value::Address(addr))
        }

        Expr::RValue { row, col } => {
            let addr = resolve_address(row, col, ctx)?;
            match ctx.grid.cell_at(addr) {
                Some(cell) => Ok(cell.value.clone()),
                None => Err(FormulaError::UndefinedCell {
                    row: addr.row,
                    col: addr.col,
                }),
            }
        }

        // === Operators ===
        Expr::Binary { op, left, right } => {
            // both operands evaluate before the operator applies; there is
            // no short-circuit even for the logical operators
            let left = evaluate(left, ctx)?;
            let right = evaluate(right, ctx)?;
            eval_binary(*op, left, right)
        }

        Expr::Unary { op, operand } => {
            let value = evaluate(operand, ctx)?;
            eval_unary(*op, value)
        }

        // === Statistics ===
        Expr::Statistic { op, start, end } => {
            let start = as_range_endpoint(evaluate(start, ctx)?, *op)?;
            let end = as_range_endpoint(evaluate(end, ctx)?, *op)?;
            let cells = ctx.grid.cells_between(start, end)?;
            eval_statistic(*op, &cells)
        }
    }
}

/// Evaluate row/column components to integers and validate the pair
/// against the grid's bounds
fn resolve_address(
    row: &Expr,
    col: &Expr,
    ctx: &EvaluationContext<'_>,
) -> FormulaResult<CellAddress> {
    let row = as_index(evaluate(row, ctx)?, "row")?;
    let col = as_index(evaluate(col, ctx)?, "column")?;

    ctx.grid
        .cell_address(row, col)
        .ok_or(FormulaError::InvalidAddress { row, col })
}

fn as_index(value: Value, which: &str) -> FormulaResult<i64> {
    value.as_int().ok_or_else(|| {
        FormulaError::Type(format!(
            "cell {} component must be an integer, got {}",
            which,
            value.type_name()
        ))
    })
}

fn as_range_endpoint(value: Value, op: StatOp) -> FormulaResult<CellAddress> {
    value.as_address().ok_or_else(|| {
        FormulaError::Type(format!(
            "{} requires cell address operands, got {}",
            op.name(),
            value.type_name()
        ))
    })
}

// === Binary operators ===

fn eval_binary(op: BinaryOp, left: Value, right: Value) -> FormulaResult<Value> {
    match op {
        BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide => {
            eval_arithmetic(op, left, right)
        }
        BinaryOp::Modulo => eval_modulo(left, right),
        BinaryOp::Exponent => eval_exponent(left, right),

        BinaryOp::LogicalAnd | BinaryOp::LogicalOr => {
            let (l, r) = match (left.as_bool(), right.as_bool()) {
                (Some(l), Some(r)) => (l, r),
                _ => {
                    return Err(FormulaError::Type(format!(
                        "{} requires boolean operands",
                        op.describe()
                    )))
                }
            };
            let result = match op {
                BinaryOp::LogicalAnd => l && r,
                _ => l || r,
            };
            Ok(Value::Boolean(result))
        }

        BinaryOp::BitwiseAnd | BinaryOp::BitwiseOr | BinaryOp::Xor => {
            let (l, r) = int_operands(op, &left, &right)?;
            let result = match op {
                BinaryOp::BitwiseAnd => l & r,
                BinaryOp::BitwiseOr => l | r,
                _ => l ^ r,
            };
            Ok(Value::Int(result))
        }

        BinaryOp::LeftShift | BinaryOp::RightShift => {
            let (l, r) = int_operands(op, &left, &right)?;
            if !(0..64).contains(&r) {
                return Err(FormulaError::ShiftOutOfRange(r));
            }
            // plain i64 two's-complement shifts; right shift is
            // arithmetic (sign-extending)
            let result = match op {
                BinaryOp::LeftShift => l << r,
                _ => l >> r,
            };
            Ok(Value::Int(result))
        }

        BinaryOp::Equals => Ok(Value::Boolean(values_equal(&left, &right))),
        BinaryOp::NotEquals => Ok(Value::Boolean(!values_equal(&left, &right))),

        BinaryOp::LessThan | BinaryOp::LessOrEqual | BinaryOp::GreaterThan
        | BinaryOp::GreaterOrEqual => eval_ordering(op, left, right),
    }
}

/// Add, subtract, multiply, divide on numeric operands; integers stay
/// integers until a float operand appears
fn eval_arithmetic(op: BinaryOp, left: Value, right: Value) -> FormulaResult<Value> {
    match (&left, &right) {
        (Value::Int(l), Value::Int(r)) => {
            let (l, r) = (*l, *r);
            let result = match op {
                BinaryOp::Add => l.checked_add(r).ok_or(FormulaError::Overflow("addition"))?,
                BinaryOp::Subtract => l
                    .checked_sub(r)
                    .ok_or(FormulaError::Overflow("subtraction"))?,
                BinaryOp::Multiply => l
                    .checked_mul(r)
                    .ok_or(FormulaError::Overflow("multiplication"))?,
                _ => {
                    if r == 0 {
                        return Err(FormulaError::DivisionByZero);
                    }
                    l.checked_div(r).ok_or(FormulaError::Overflow("division"))?
                }
            };
            Ok(Value::Int(result))
        }
        _ => {
            let (l, r) = number_operands(op, &left, &right)?;
            let result = match op {
                BinaryOp::Add => l + r,
                BinaryOp::Subtract => l - r,
                BinaryOp::Multiply => l * r,
                // IEEE semantics once a float is involved
                _ => l / r,
            };
            Ok(Value::Float(result))
        }
    }
}

/// Remainder, truncated to an integer afterwards
fn eval_modulo(left: Value, right: Value) -> FormulaResult<Value> {
    match (&left, &right) {
        (Value::Int(l), Value::Int(r)) => {
            if *r == 0 {
                return Err(FormulaError::DivisionByZero);
            }
            let result = l.checked_rem(*r).ok_or(FormulaError::Overflow("modulo"))?;
            Ok(Value::Int(result))
        }
        _ => {
            let (l, r) = number_operands(BinaryOp::Modulo, &left, &right)?;
            let rem = l % r;
            if !rem.is_finite() {
                return Err(FormulaError::DivisionByZero);
            }
            Ok(Value::Int(rem as i64))
        }
    }
}

fn eval_exponent(left: Value, right: Value) -> FormulaResult<Value> {
    match (&left, &right) {
        (Value::Int(l), Value::Int(r)) if *r >= 0 => {
            let exp = u32::try_from(*r).map_err(|_| FormulaError::Overflow("exponentiation"))?;
            let result = l
                .checked_pow(exp)
                .ok_or(FormulaError::Overflow("exponentiation"))?;
            Ok(Value::Int(result))
        }
        _ => {
            let (l, r) = number_operands(BinaryOp::Exponent, &left, &right)?;
            Ok(Value::Float(l.powf(r)))
        }
    }
}

fn eval_ordering(op: BinaryOp, left: Value, right: Value) -> FormulaResult<Value> {
    let ordering = match (&left, &right) {
        (Value::Str(l), Value::Str(r)) => l.cmp(r),
        _ if left.is_numeric() && right.is_numeric() => {
            let l = left.as_number().unwrap_or(f64::NAN);
            let r = right.as_number().unwrap_or(f64::NAN);
            match l.partial_cmp(&r) {
                Some(ordering) => ordering,
                // NaN compares false under every ordering operator
                None => return Ok(Value::Boolean(false)),
            }
        }
        _ => {
            return Err(FormulaError::Type(format!(
                "comparison requires two numbers or two strings, got {} and {}",
                left.type_name(),
                right.type_name()
            )))
        }
    };

    let result = match op {
        BinaryOp::LessThan => ordering.is_lt(),
        BinaryOp::LessOrEqual => ordering.is_le(),
        BinaryOp::GreaterThan => ordering.is_gt(),
        _ => ordering.is_ge(),
    };
    Ok(Value::Boolean(result))
}

/// Equality across kinds: integers and floats compare numerically, any
/// other kind mismatch is simply unequal
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Int(l), Value::Float(r)) | (Value::Float(r), Value::Int(l)) => *l as f64 == *r,
        _ => left == right,
    }
}

fn number_operands(op: BinaryOp, left: &Value, right: &Value) -> FormulaResult<(f64, f64)> {
    match (left.as_number(), right.as_number()) {
        (Some(l), Some(r)) => Ok((l, r)),
        _ => Err(FormulaError::Type(format!(
            "{} requires numeric operands",
            op.describe()
        ))),
    }
}

fn int_operands(op: BinaryOp, left: &Value, right: &Value) -> FormulaResult<(i64, i64)> {
    match (left.as_int(), right.as_int()) {
        (Some(l), Some(r)) => Ok((l, r)),
        _ => Err(FormulaError::Type(format!(
            "{} requires integer operands",
            op.describe()
        ))),
    }
}

// === Unary operators ===

fn eval_unary(op: UnaryOp, value: Value) -> FormulaResult<Value> {
    match op {
        UnaryOp::Negate => match value {
            Value::Int(i) => i
                .checked_neg()
                .map(Value::Int)
                .ok_or(FormulaError::Overflow("negation")),
            Value::Float(f) => Ok(Value::Float(-f)),
            other => Err(FormulaError::Type(format!(
                "negation requires a numeric operand, got {}",
                other.type_name()
            ))),
        },

        UnaryOp::Not => match value {
            Value::Boolean(b) => Ok(Value::Boolean(!b)),
            // recoverable path: warn and negate the value's truthiness;
            // every non-boolean runtime value is truthy
            other => {
                log::warn!("logical NOT applied to non-boolean value {}", other);
                Ok(Value::Boolean(false))
            }
        },

        UnaryOp::BitwiseNot => match value.as_int() {
            Some(i) => Ok(Value::Int(!i)),
            None => Err(FormulaError::Type(format!(
                "bitwise NOT requires an integer operand, got {}",
                value.type_name()
            ))),
        },

        UnaryOp::FloatToInt => match value {
            Value::Float(f) => {
                let truncated = f.trunc();
                if !truncated.is_finite()
                    || truncated < i64::MIN as f64
                    || truncated > i64::MAX as f64
                {
                    return Err(FormulaError::Overflow("float to integer cast"));
                }
                Ok(Value::Int(truncated as i64))
            }
            Value::Int(i) => Ok(Value::Int(i)),
            other => Err(FormulaError::Type(format!(
                "int() requires a numeric operand, got {}",
                other.type_name()
            ))),
        },

        UnaryOp::IntToFloat => match value {
            Value::Int(i) => Ok(Value::Float(i as f64)),
            Value::Float(f) => Ok(Value::Float(f)),
            other => Err(FormulaError::Type(format!(
                "float() requires a numeric operand, got {}",
                other.type_name()
            ))),
        },
    }
}

// === Statistics ===

fn eval_statistic(op: StatOp, cells: &[RangeCell<'_>]) -> FormulaResult<Value> {
    match op {
        StatOp::Sum => sum_cells(cells),
        StatOp::Mean => {
            // divides by the total cell count of the range, not the count
            // of numeric cells; a valid range is never empty
            let count = cells.len() as i64;
            match sum_cells(cells)? {
                Value::Int(total) => Ok(Value::Int(total / count)),
                Value::Float(total) => Ok(Value::Float(total / count as f64)),
                other => Ok(other),
            }
        }
        StatOp::Max => best_cell(cells, |candidate, best| candidate > best),
        StatOp::Min => best_cell(cells, |candidate, best| candidate < best),
    }
}

/// Numeric values accumulate; non-numeric and unwritten cells contribute
/// zero. The total stays an integer until a float value appears.
fn sum_cells(cells: &[RangeCell<'_>]) -> FormulaResult<Value> {
    let mut int_total: i64 = 0;
    let mut float_total: f64 = 0.0;
    let mut is_float = false;

    for rc in cells {
        let value = match rc.cell {
            Some(cell) => &cell.value,
            None => continue,
        };
        match value {
            Value::Int(i) => {
                if is_float {
                    float_total += *i as f64;
                } else {
                    int_total = int_total
                        .checked_add(*i)
                        .ok_or(FormulaError::Overflow("sum"))?;
                }
            }
            Value::Float(f) => {
                if !is_float {
                    is_float = true;
                    float_total = int_total as f64;
                }
                float_total += f;
            }
            _ => {}
        }
    }

    if is_float {
        Ok(Value::Float(float_total))
    } else {
        Ok(Value::Int(int_total))
    }
}

/// Scan the range's numeric values for the best one under `wins`; ties
/// keep the earliest cell in row-major order
fn best_cell(
    cells: &[RangeCell<'_>],
    wins: fn(candidate: f64, best: f64) -> bool,
) -> FormulaResult<Value> {
    let mut best: Option<(f64, Value)> = None;

    for rc in cells {
        let value = match rc.cell {
            Some(cell) => &cell.value,
            None => continue,
        };
        let key = match value.as_number() {
            Some(key) => key,
            None => continue,
        };
        match &best {
            Some((best_key, _)) if !wins(key, *best_key) => {}
            _ => best = Some((key, value.clone())),
        }
    }

    best.map(|(_, value)| value)
        .ok_or(FormulaError::NoNumericValues)
}

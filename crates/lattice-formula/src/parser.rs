//! Formula parser
//!
//! A recursive descent parser with precedence climbing. Every binary
//! level is left-associative across its whole operator set; a missing
//! required token is a fatal parse error naming the token, with no
//! recovery and no partial tree.
//!
//! Precedence, loosest to tightest:
//! 1. Logical: `&&`, `||`
//! 2. Relational: `==`, `!=`, `<`, `<=`, `>`, `>=`
//! 3. Bitwise: `&`, `|`, `^`, `<<`, `>>`
//! 4. Additive: `+`, `-`
//! 5. Multiplicative: `*`, `/`, `%`
//! 6. Exponent: a single `^` per node
//! 7. Unary: `!`, negation
//! 8. Primary: literals, `(e)`, `#[e, e]`, `[e, e]`, statistics, `float(e)`
//!
//! `^` is one token. The exponent level consumes the first `^` after a
//! unary; any further `^` reaching the bitwise level parses as xor, so
//! `a ^ b ^ c` is `Xor(Exponent(a, b), c)`.

use crate::ast::{BinaryOp, Expr, StatOp, UnaryOp};
use crate::error::{FormulaError, FormulaResult};
use crate::lexer::{Lexer, Token, TokenKind};

/// Lex and parse a formula source string into an AST
///
/// # Example
/// ```rust
/// use lattice_formula::parse_formula;
///
/// let ast = parse_formula("1 + 2 * 3").unwrap();
/// let ast = parse_formula("sum([0, 0], [2, 1])").unwrap();
/// let ast = parse_formula("#[1, 0] < #[1, 1]").unwrap();
/// ```
pub fn parse_formula(source: &str) -> FormulaResult<Expr> {
    let tokens = Lexer::new(source).lex()?;
    Parser::new(tokens).parse()
}

/// Formula parser over a token stream
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Create a parser over lexed tokens
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Parse one expression spanning the whole stream
    pub fn parse(mut self) -> FormulaResult<Expr> {
        let expr = self.expression()?;

        if let Some(token) = self.tokens.get(self.pos) {
            return Err(FormulaError::Parse(format!(
                "unexpected trailing token '{}'",
                token.text
            )));
        }

        Ok(expr)
    }

    // === Helpers ===

    fn peek_kind(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    fn has(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind, name: &str) -> FormulaResult<()> {
        if self.has(kind) {
            self.advance();
            Ok(())
        } else {
            Err(FormulaError::Parse(format!("missing '{}'", name)))
        }
    }

    fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    // === Precedence levels ===

    fn expression(&mut self) -> FormulaResult<Expr> {
        self.logical()
    }

    fn logical(&mut self) -> FormulaResult<Expr> {
        let mut left = self.relational()?;

        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::LogicAnd) => BinaryOp::LogicalAnd,
                Some(TokenKind::LogicOr) => BinaryOp::LogicalOr,
                _ => break,
            };

            self.advance();
            let right = self.relational()?;
            left = Self::binary(op, left, right);
        }

        Ok(left)
    }

    fn relational(&mut self) -> FormulaResult<Expr> {
        let mut left = self.bitwise()?;

        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Equal) => BinaryOp::Equals,
                Some(TokenKind::NotEqual) => BinaryOp::NotEquals,
                Some(TokenKind::LessThan) => BinaryOp::LessThan,
                Some(TokenKind::LessEqual) => BinaryOp::LessOrEqual,
                Some(TokenKind::GreaterThan) => BinaryOp::GreaterThan,
                Some(TokenKind::GreaterEqual) => BinaryOp::GreaterOrEqual,
                _ => break,
            };

            self.advance();
            let right = self.bitwise()?;
            left = Self::binary(op, left, right);
        }

        Ok(left)
    }

    fn bitwise(&mut self) -> FormulaResult<Expr> {
        let mut left = self.additive()?;

        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::BitAnd) => BinaryOp::BitwiseAnd,
                Some(TokenKind::BitOr) => BinaryOp::BitwiseOr,
                Some(TokenKind::Xor) => BinaryOp::Xor,
                Some(TokenKind::LShift) => BinaryOp::LeftShift,
                Some(TokenKind::RShift) => BinaryOp::RightShift,
                _ => break,
            };

            self.advance();
            let right = self.additive()?;
            left = Self::binary(op, left, right);
        }

        Ok(left)
    }

    fn additive(&mut self) -> FormulaResult<Expr> {
        let mut left = self.multiplicative()?;

        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Subtract,
                _ => break,
            };

            self.advance();
            let right = self.multiplicative()?;
            left = Self::binary(op, left, right);
        }

        Ok(left)
    }

    fn multiplicative(&mut self) -> FormulaResult<Expr> {
        let mut left = self.exponent()?;

        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => BinaryOp::Multiply,
                Some(TokenKind::Slash) => BinaryOp::Divide,
                Some(TokenKind::Percent) => BinaryOp::Modulo,
                _ => break,
            };

            self.advance();
            let right = self.exponent()?;
            left = Self::binary(op, left, right);
        }

        Ok(left)
    }

    /// At most one `^` is consumed here; the level does not recurse on
    /// itself, so `^` chains fall through to the bitwise level as xor.
    fn exponent(&mut self) -> FormulaResult<Expr> {
        let left = self.unary()?;

        if self.has(TokenKind::Xor) {
            self.advance();
            let right = self.unary()?;
            return Ok(Self::binary(BinaryOp::Exponent, left, right));
        }

        Ok(left)
    }

    fn unary(&mut self) -> FormulaResult<Expr> {
        let op = match self.peek_kind() {
            Some(TokenKind::Exclamation) => UnaryOp::Not,
            Some(TokenKind::Negation) => UnaryOp::Negate,
            _ => return self.primary(),
        };

        self.advance();
        let operand = self.unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    // === Primary ===

    fn primary(&mut self) -> FormulaResult<Expr> {
        match self.peek_kind() {
            Some(TokenKind::Integer) => {
                let token = &self.tokens[self.pos];
                let value = token.text.parse::<i64>().map_err(|_| {
                    FormulaError::Parse(format!("invalid integer literal '{}'", token.text))
                })?;
                self.advance();
                Ok(Expr::Int(value))
            }

            Some(TokenKind::Float) => {
                let token = &self.tokens[self.pos];
                let value = token.text.parse::<f64>().map_err(|_| {
                    FormulaError::Parse(format!("invalid float literal '{}'", token.text))
                })?;
                self.advance();
                Ok(Expr::Float(value))
            }

            Some(TokenKind::False) => {
                self.advance();
                Ok(Expr::Boolean(false))
            }

            Some(TokenKind::LParen) => {
                self.advance();
                let expr = self.expression()?;
                self.expect(TokenKind::RParen, ")")?;
                Ok(expr)
            }

            // `#[row, col]` reads a cell
            Some(TokenKind::Pound) => {
                self.advance();
                let (row, col) = self.address_body()?;
                Ok(Expr::RValue {
                    row: Box::new(row),
                    col: Box::new(col),
                })
            }

            // `[row, col]` is an address literal
            Some(TokenKind::LBracket) => {
                let (row, col) = self.address_body()?;
                Ok(Expr::LValue {
                    row: Box::new(row),
                    col: Box::new(col),
                })
            }

            Some(TokenKind::Max) => self.statistic(StatOp::Max),
            Some(TokenKind::Min) => self.statistic(StatOp::Min),
            Some(TokenKind::Mean) => self.statistic(StatOp::Mean),
            Some(TokenKind::Sum) => self.statistic(StatOp::Sum),

            Some(TokenKind::CastFloat) => {
                self.advance();
                self.expect(TokenKind::LParen, "(")?;
                let operand = self.expression()?;
                self.expect(TokenKind::RParen, ")")?;
                Ok(Expr::Unary {
                    op: UnaryOp::IntToFloat,
                    operand: Box::new(operand),
                })
            }

            Some(_) => {
                let token = &self.tokens[self.pos];
                Err(FormulaError::Parse(format!(
                    "unexpected token '{}'",
                    token.text
                )))
            }
            None => Err(FormulaError::Parse("unexpected end of input".into())),
        }
    }

    /// `[expr, expr]` with the opening bracket still pending
    fn address_body(&mut self) -> FormulaResult<(Expr, Expr)> {
        self.expect(TokenKind::LBracket, "[")?;
        let row = self.expression()?;
        self.expect(TokenKind::Comma, ",")?;
        let col = self.expression()?;
        self.expect(TokenKind::RBracket, "]")?;
        Ok((row, col))
    }

    /// `name(expr, expr)` with the keyword still pending
    fn statistic(&mut self, op: StatOp) -> FormulaResult<Expr> {
        self.advance();
        self.expect(TokenKind::LParen, "(")?;
        let start = self.expression()?;
        self.expect(TokenKind::Comma, ",")?;
        let end = self.expression()?;
        self.expect(TokenKind::RParen, ")")?;
        Ok(Expr::Statistic {
            op,
            start: Box::new(start),
            end: Box::new(end),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn int(v: i64) -> Box<Expr> {
        Box::new(Expr::Int(v))
    }

    #[test]
    fn test_parse_literals() {
        assert_eq!(parse_formula("42").unwrap(), Expr::Int(42));
        assert_eq!(parse_formula("3.25").unwrap(), Expr::Float(3.25));
        assert_eq!(parse_formula("false").unwrap(), Expr::Boolean(false));
    }

    #[test]
    fn test_parse_precedence() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        assert_eq!(
            parse_formula("1 + 2 * 3").unwrap(),
            Expr::Binary {
                op: BinaryOp::Add,
                left: int(1),
                right: Box::new(Expr::Binary {
                    op: BinaryOp::Multiply,
                    left: int(2),
                    right: int(3),
                }),
            }
        );

        // bitwise binds looser than additive
        assert_eq!(
            parse_formula("1 & 2 + 3").unwrap(),
            Expr::Binary {
                op: BinaryOp::BitwiseAnd,
                left: int(1),
                right: Box::new(Expr::Binary {
                    op: BinaryOp::Add,
                    left: int(2),
                    right: int(3),
                }),
            }
        );

        // relational binds looser than bitwise
        assert_eq!(
            parse_formula("1 << 2 < 3").unwrap(),
            Expr::Binary {
                op: BinaryOp::LessThan,
                left: Box::new(Expr::Binary {
                    op: BinaryOp::LeftShift,
                    left: int(1),
                    right: int(2),
                }),
                right: int(3),
            }
        );
    }

    #[test]
    fn test_left_associative_across_level() {
        // a && b || c parses as (a && b) || c
        let expr = parse_formula("false && false || false").unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::LogicalOr,
                left: Box::new(Expr::Binary {
                    op: BinaryOp::LogicalAnd,
                    left: Box::new(Expr::Boolean(false)),
                    right: Box::new(Expr::Boolean(false)),
                }),
                right: Box::new(Expr::Boolean(false)),
            }
        );

        // 1 - 2 + 3 parses as (1 - 2) + 3
        assert_eq!(
            parse_formula("1 - 2 + 3").unwrap(),
            Expr::Binary {
                op: BinaryOp::Add,
                left: Box::new(Expr::Binary {
                    op: BinaryOp::Subtract,
                    left: int(1),
                    right: int(2),
                }),
                right: int(3),
            }
        );
    }

    #[test]
    fn test_exponent_and_xor_share_the_token() {
        // the first '^' is exponentiation
        assert_eq!(
            parse_formula("2 ^ 3").unwrap(),
            Expr::Binary {
                op: BinaryOp::Exponent,
                left: int(2),
                right: int(3),
            }
        );

        // a second '^' falls through to the bitwise level as xor
        assert_eq!(
            parse_formula("2 ^ 3 ^ 4").unwrap(),
            Expr::Binary {
                op: BinaryOp::Xor,
                left: Box::new(Expr::Binary {
                    op: BinaryOp::Exponent,
                    left: int(2),
                    right: int(3),
                }),
                right: int(4),
            }
        );
    }

    #[test]
    fn test_parse_unary() {
        assert_eq!(
            parse_formula("-3").unwrap(),
            Expr::Unary {
                op: UnaryOp::Negate,
                operand: int(3),
            }
        );

        assert_eq!(
            parse_formula("!false").unwrap(),
            Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(Expr::Boolean(false)),
            }
        );

        // unary chains are right-recursive
        assert_eq!(
            parse_formula("!!false").unwrap(),
            Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(Expr::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(Expr::Boolean(false)),
                }),
            }
        );
    }

    #[test]
    fn test_parse_cell_references() {
        assert_eq!(
            parse_formula("#[0, 0]").unwrap(),
            Expr::RValue {
                row: int(0),
                col: int(0),
            }
        );

        assert_eq!(
            parse_formula("[1, 2]").unwrap(),
            Expr::LValue {
                row: int(1),
                col: int(2),
            }
        );

        // components are full expressions
        assert_eq!(
            parse_formula("#[1 - 1, 0]").unwrap(),
            Expr::RValue {
                row: Box::new(Expr::Binary {
                    op: BinaryOp::Subtract,
                    left: int(1),
                    right: int(1),
                }),
                col: int(0),
            }
        );
    }

    #[test]
    fn test_parse_statistics() {
        assert_eq!(
            parse_formula("sum([0, 0], [2, 1])").unwrap(),
            Expr::Statistic {
                op: StatOp::Sum,
                start: Box::new(Expr::LValue {
                    row: int(0),
                    col: int(0),
                }),
                end: Box::new(Expr::LValue {
                    row: int(2),
                    col: int(1),
                }),
            }
        );

        assert!(matches!(
            parse_formula("max([0, 0], [1, 1])").unwrap(),
            Expr::Statistic { op: StatOp::Max, .. }
        ));
        assert!(matches!(
            parse_formula("min([0, 0], [1, 1])").unwrap(),
            Expr::Statistic { op: StatOp::Min, .. }
        ));
        assert!(matches!(
            parse_formula("mean([0, 0], [1, 1])").unwrap(),
            Expr::Statistic { op: StatOp::Mean, .. }
        ));
    }

    #[test]
    fn test_parse_float_cast() {
        assert_eq!(
            parse_formula("float(10)").unwrap(),
            Expr::Unary {
                op: UnaryOp::IntToFloat,
                operand: int(10),
            }
        );
    }

    #[test]
    fn test_missing_tokens() {
        let err = parse_formula("#[0, 0").unwrap_err();
        assert_eq!(err, FormulaError::Parse("missing ']'".into()));

        let err = parse_formula("(1 + 2").unwrap_err();
        assert_eq!(err, FormulaError::Parse("missing ')'".into()));

        let err = parse_formula("#[0 0]").unwrap_err();
        assert_eq!(err, FormulaError::Parse("missing ','".into()));

        let err = parse_formula("sum [0, 0], [1, 1])").unwrap_err();
        assert_eq!(err, FormulaError::Parse("missing '('".into()));

        let err = parse_formula("#0, 0]").unwrap_err();
        assert_eq!(err, FormulaError::Parse("missing '['".into()));
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        let err = parse_formula("1 2").unwrap_err();
        assert_eq!(
            err,
            FormulaError::Parse("unexpected trailing token '2'".into())
        );
    }

    #[test]
    fn test_empty_input() {
        let err = parse_formula("").unwrap_err();
        assert_eq!(err, FormulaError::Parse("unexpected end of input".into()));
    }

    #[test]
    fn test_tilde_has_no_production() {
        // '~' lexes but no grammar production consumes it
        assert!(parse_formula("~1").is_err());
    }

    #[test]
    fn test_parenthesized_grouping() {
        assert_eq!(
            parse_formula("(1 + 2) * 3").unwrap(),
            Expr::Binary {
                op: BinaryOp::Multiply,
                left: Box::new(Expr::Binary {
                    op: BinaryOp::Add,
                    left: int(1),
                    right: int(2),
                }),
                right: int(3),
            }
        );
    }
}

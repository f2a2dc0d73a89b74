use std::fmt;

/// Binary operators of the plural expression language, C semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Remainder => "%",
        }
    }

    fn apply(&self, left: u64, right: u64) -> u64 {
        match self {
            BinaryOp::Or => (left != 0 || right != 0) as u64,
            BinaryOp::And => (left != 0 && right != 0) as u64,
            BinaryOp::Equal => (left == right) as u64,
            BinaryOp::NotEqual => (left != right) as u64,
            BinaryOp::Less => (left < right) as u64,
            BinaryOp::LessEqual => (left <= right) as u64,
            BinaryOp::Greater => (left > right) as u64,
            BinaryOp::GreaterEqual => (left >= right) as u64,
            BinaryOp::Add => left.wrapping_add(right),
            BinaryOp::Subtract => left.wrapping_sub(right),
            BinaryOp::Multiply => left.wrapping_mul(right),
            // A divisor computed from n can still be zero at runtime.
            BinaryOp::Divide => left.checked_div(right).unwrap_or(0),
            BinaryOp::Remainder => left.checked_rem(right).unwrap_or(0),
        }
    }
}

/// Compiled plural expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// The count `n`
    Variable,
    Literal(u64),
    Not(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Conditional {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

impl Expr {
    /// Evaluate the expression for the count `n`. Total for every `n`.
    pub fn evaluate(&self, n: u64) -> u64 {
        match self {
            Expr::Variable => n,
            Expr::Literal(value) => *value,
            Expr::Not(inner) => (inner.evaluate(n) == 0) as u64,
            Expr::Binary(BinaryOp::Or, left, right) => {
                (left.evaluate(n) != 0 || right.evaluate(n) != 0) as u64
            }
            Expr::Binary(BinaryOp::And, left, right) => {
                (left.evaluate(n) != 0 && right.evaluate(n) != 0) as u64
            }
            Expr::Binary(op, left, right) => op.apply(left.evaluate(n), right.evaluate(n)),
            Expr::Conditional {
                condition,
                then,
                otherwise,
            } => {
                if condition.evaluate(n) != 0 {
                    then.evaluate(n)
                } else {
                    otherwise.evaluate(n)
                }
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Variable => write!(f, "n"),
            Expr::Literal(value) => write!(f, "{}", value),
            Expr::Not(inner) => write!(f, "!{}", inner),
            Expr::Binary(op, left, right) => write!(f, "({} {} {})", left, op.symbol(), right),
            Expr::Conditional {
                condition,
                then,
                otherwise,
            } => write!(f, "({} ? {} : {})", condition, then, otherwise),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary(op, Box::new(left), Box::new(right))
    }

    #[test]
    fn test_evaluate_not_equal() {
        let expr = binary(BinaryOp::NotEqual, Expr::Variable, Expr::Literal(1));
        assert_eq!(expr.evaluate(0), 1);
        assert_eq!(expr.evaluate(1), 0);
        assert_eq!(expr.evaluate(2), 1);
    }

    #[test]
    fn test_runtime_zero_divisor_yields_zero() {
        let divisor = binary(BinaryOp::Subtract, Expr::Variable, Expr::Variable);
        let expr = binary(BinaryOp::Remainder, Expr::Literal(7), divisor);
        assert_eq!(expr.evaluate(3), 0);
    }

    #[test]
    fn test_display() {
        let expr = Expr::Conditional {
            condition: Box::new(binary(BinaryOp::Equal, Expr::Variable, Expr::Literal(1))),
            then: Box::new(Expr::Literal(0)),
            otherwise: Box::new(Expr::Not(Box::new(Expr::Literal(0)))),
        };
        assert_eq!(expr.to_string(), "((n == 1) ? 0 : !0)");
    }
}

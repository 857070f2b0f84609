//! Errors produced while parsing or evaluating a dice expression.

use thiserror::Error;

use crate::parser::Rule;

/// Can't parse a string as any variant of some fixed-name enum (operator,
/// ordering symbol, function name, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ParseEnumError;

/// A dice expression failed to parse.
///
/// Carries the production that could not be completed and the byte
/// position the parser had reached, so a caller can point a user at the
/// offending spot. No partial AST is ever produced alongside this error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("failed to parse `{production}` at position {position}: {message}")]
pub struct ParseError {
    /// Name of the grammar production the parser was trying to complete.
    pub production: String,
    /// Byte offset into the input where parsing stalled.
    pub position: usize,
    /// Human-readable detail, usually pest's own rendering of expected tokens.
    pub message: String,
}

impl ParseError {
    pub(crate) fn overflow(production: &str, position: usize, text: &str) -> Self {
        Self {
            production: production.to_owned(),
            position,
            message: format!("`{text}` does not fit in an i64"),
        }
    }
}

impl From<pest::error::Error<Rule>> for ParseError {
    fn from(err: pest::error::Error<Rule>) -> Self {
        let position = match &err.location {
            pest::error::InputLocation::Pos(p) => *p,
            pest::error::InputLocation::Span((s, _)) => *s,
        };
        let production = match &err.variant {
            pest::error::ErrorVariant::ParsingError { positives, .. } => positives
                .first()
                .map(|r| format!("{r:?}"))
                .unwrap_or_else(|| "expression".to_owned()),
            pest::error::ErrorVariant::CustomError { .. } => "expression".to_owned(),
        };
        Self { production, position, message: err.to_string() }
    }
}

/// A dice expression parsed fine but failed during evaluation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// Cumulative random draws would exceed [`crate::MAX_RNG`], including
    /// draws spent on failed reroll chains.
    #[error("rng budget exceeded: limit is {limit}, evaluation needed {observed}")]
    RngBudgetExceeded {
        /// The budget, i.e. [`crate::MAX_RNG`].
        limit: i64,
        /// How many draws this evaluation would have performed.
        observed: i64,
    },
    /// Integer division where the divisor evaluated to zero.
    #[error("division by zero")]
    DivisionByZero,
    /// `^` with a negative exponent.
    #[error("negative exponent")]
    NegativeExponent,
    /// A `Die(b)` bound evaluated to fewer than 1 side.
    #[error("die bound `{base_printed}` evaluated to {n}, a die needs at least 1 side")]
    InvalidDieBound {
        /// Pretty-printed form of the bound expression, for error messages.
        base_printed: String,
        /// The offending value.
        n: i64,
    },
    /// `Dice.count` evaluated to a negative number.
    #[error("dice count evaluated to a negative number: {0}")]
    NegativeDiceCount(i64),
    /// `fact` applied to an input larger than [`crate::FACT_LIMIT`].
    #[error("factorial input {n} exceeds the limit of {limit}")]
    FactorialInputTooLarge {
        /// The offending input.
        n: i64,
        /// The limit, i.e. [`crate::FACT_LIMIT`].
        limit: i64,
    },
    /// A function node named something outside the fixed registry.
    ///
    /// Unreachable through [`crate::parse`] (the grammar only accepts the
    /// four known names); only reachable by hand-constructing an AST.
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    /// Internal postcondition violation: a dice roll produced zero results.
    ///
    /// Unreachable in practice since [`crate::ast::Dice::count`] is checked
    /// non-negative before rolling, but is still a distinct, named error
    /// rather than a panic.
    #[error("tried to show empty set of results")]
    EmptyResultSet,
}

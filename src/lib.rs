//! Arithmetic calculator extended with dice rolls.
//!
//! Parses TRPG-style expressions (`3d6 + 2`, `4d6kh3`, `2d{1,2,3}rr<2`),
//! evaluates them against a seedable random source, and pretty-prints an
//! AST back into source that reparses to the same tree. Evaluation also
//! produces an annotated trace of every roll and the number of random
//! draws it spent.

// ===== lint config =====

#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![deny(missing_debug_implementations, rust_2018_idioms)]
#![deny(missing_docs)]
#![deny(warnings)]
#![allow(
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::non_ascii_literal
)]

// ===== mods =====

pub mod ast;
mod config;
pub mod error;
mod eval;
mod functions;
mod parser;
mod pretty;
pub mod rng;

// ===== pub uses =====

pub use ast::Expr;
pub use config::{FACT_LIMIT, MAX_RNG};
pub use error::{EvalError, ParseError};
pub use rng::{Rng, WyRng};

/// Parse a dice expression into its AST.
///
/// ## Errors
///
/// When `s` is not valid syntax, naming the production and byte position
/// where parsing stalled.
pub fn parse(s: &str) -> Result<Expr, ParseError> {
    parser::parse(s)
}

/// Evaluate `expr` against `rng`.
///
/// Returns the resulting value, a trace string describing every dice roll
/// encountered (empty if the expression rolled no dice), and the number
/// of random draws performed.
///
/// ## Errors
///
/// When evaluation hits a runtime condition the language forbids:
/// division by zero, a negative exponent, an invalid die, a negative
/// dice count, a factorial input over [`FACT_LIMIT`], or a cumulative
/// random-draw count over [`MAX_RNG`].
pub fn eval<R: Rng + ?Sized>(expr: &Expr, rng: &mut R) -> Result<(i64, String, i64), EvalError> {
    eval::eval(expr, rng)
}

/// Render `expr` back into source text.
///
/// `parse(&pretty(e))` always reparses to a tree that prints identically
/// to `pretty(e)` itself.
#[must_use]
pub fn pretty(expr: &Expr) -> String {
    pretty::pretty(expr)
}

/// The names of every unary function this language supports, in the
/// fixed order they are tried as a prefix keyword.
#[must_use]
pub fn supported_functions() -> &'static [&'static str] {
    &functions::NAMES
}

/// Parse, evaluate with a fresh [`WyRng`] seeded from OS entropy, and
/// pretty-print in one call — the common case for a caller that just
/// wants to roll an expression once.
///
/// ## Errors
///
/// See [`parse`] and [`eval`].
pub fn roll(s: &str) -> Result<RollOutcome, RollError> {
    let expr = parse(s).map_err(RollError::Parse)?;
    let mut rng = WyRng::from_entropy();
    let (value, trace, rng_draws) = eval(&expr, &mut rng).map_err(RollError::Eval)?;
    Ok(RollOutcome { pretty: pretty(&expr), value, trace, rng_draws })
}

/// Result of [`roll`]: the reprinted expression alongside its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollOutcome {
    /// `expr`, reprinted through [`pretty`].
    pub pretty: String,
    /// The final numeric result.
    pub value: i64,
    /// Annotated trace of every dice roll, empty if none were rolled.
    pub trace: String,
    /// Number of random draws spent.
    pub rng_draws: i64,
}

/// Either half of what [`roll`] can fail with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RollError {
    /// Failed to parse.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Parsed fine but failed during evaluation.
    #[error(transparent)]
    Eval(#[from] EvalError),
}

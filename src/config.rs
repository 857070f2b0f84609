//! Crate-wide limits.
//!
//! These are fixed constants rather than a runtime-configurable struct:
//! the specification treats them as part of the language definition (an
//! adversarial `1001d10` is always a budget error, never a matter of
//! caller policy), so there is nothing here for a collaborator to tune.

/// Maximum number of random draws a single [`crate::eval`] call may spend.
///
/// Any evaluation whose cumulative draw count would exceed this, including
/// draws burned on reroll chains that eventually get replaced, fails with
/// [`crate::error::EvalError::RngBudgetExceeded`]. Also used as the cap on
/// a `Dice.count` value (strictly greater-or-equal is already over budget).
pub const MAX_RNG: i64 = 150;

/// Largest input `fact` will accept.
///
/// `fact` applied to an input larger than this fails with
/// [`crate::error::EvalError::FactorialInputTooLarge`] at the evaluator
/// level; the function table itself clamps to this value only to stay
/// total if ever invoked directly.
pub const FACT_LIMIT: i64 = 50;

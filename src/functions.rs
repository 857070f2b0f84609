//! Fixed registry of unary integer functions.

use crate::{
    ast::FuncName,
    config::FACT_LIMIT,
    error::EvalError,
};

/// The four supported function names, in registry order.
///
/// This is also the order [`crate::supported_functions`] returns.
pub const NAMES: [&str; 4] = ["abs", "id", "fact", "negate"];

/// Apply `name` to `x`, guarding `fact`'s domain.
///
/// The evaluator-level guard here (rejecting `x > FACT_LIMIT` outright) is
/// the user-visible contract; [`fact_value`]'s own clamp exists only so the
/// table stays total if it is ever called directly.
pub(crate) fn apply(name: FuncName, x: i64) -> Result<i64, EvalError> {
    match name {
        FuncName::Id => Ok(x),
        FuncName::Abs => Ok(x.abs()),
        FuncName::Negate => Ok(-x),
        FuncName::Fact => {
            if x > FACT_LIMIT {
                return Err(EvalError::FactorialInputTooLarge { n: x, limit: FACT_LIMIT });
            }
            Ok(fact_value(x))
        }
    }
}

/// `0` for negative input, `1` for zero, `x * fact(x - 1)` otherwise,
/// clamped at [`FACT_LIMIT`] so the function stays total.
///
/// Multiplies with [`i64::saturating_mul`] rather than a plain `product()`:
/// every input up to `FACT_LIMIT` (50) is legal here once the evaluator-level
/// guard in [`apply`] has passed, but `21!` already overflows `i64`, so a
/// wrapping or panicking multiply would misbehave on perfectly valid input.
fn fact_value(x: i64) -> i64 {
    if x < 0 {
        return 0;
    }
    (1..=x.min(FACT_LIMIT)).fold(1i64, i64::saturating_mul)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fact_matches_spec_definition() {
        assert_eq!(fact_value(-3), 0);
        assert_eq!(fact_value(0), 1);
        assert_eq!(fact_value(1), 1);
        assert_eq!(fact_value(5), 120);
    }

    #[test]
    fn fact_clamps_at_limit() {
        assert_eq!(fact_value(FACT_LIMIT), fact_value(FACT_LIMIT + 10));
    }

    #[test]
    fn fact_saturates_instead_of_overflowing() {
        // 21! already exceeds i64::MAX; every input up to FACT_LIMIT (50) is
        // legal once `apply`'s guard has passed, so this must not panic.
        assert_eq!(fact_value(21), i64::MAX);
        assert_eq!(fact_value(FACT_LIMIT), i64::MAX);
    }

    #[test]
    fn apply_rejects_over_limit_fact() {
        assert!(matches!(
            apply(FuncName::Fact, FACT_LIMIT + 1),
            Err(EvalError::FactorialInputTooLarge { n, limit }) if n == FACT_LIMIT + 1 && limit == FACT_LIMIT
        ));
    }

    #[test]
    fn abs_and_negate() {
        assert_eq!(apply(FuncName::Abs, -7).unwrap(), 7);
        assert_eq!(apply(FuncName::Negate, 7).unwrap(), -7);
        assert_eq!(apply(FuncName::Id, 7).unwrap(), 7);
    }
}

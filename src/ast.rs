//! Abstract syntax tree, one variant per precedence level.
//!
//! Boxing only happens at the three genuinely recursive points
//! (`NumBase::Paren`, `Base::DiceBase`, `Expo::Expo`, `DieOpRecur`'s tail);
//! everything else is a plain value, since pest already hands us an owned
//! tree with no sharing.

use std::str::FromStr;

use crate::error::ParseEnumError;

/// Three-way comparison used by `ro`/`rr`/`w` dice operators.
///
/// Named `Cmp` rather than `Ordering` to avoid shadowing `std::cmp::Ordering`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cmp {
    /// `<`
    Lt,
    /// `=`
    Eq,
    /// `>`
    Gt,
}

impl Cmp {
    /// Does `lhs <cmp> rhs` hold?
    #[must_use]
    pub fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Self::Lt => lhs < rhs,
            Self::Eq => lhs == rhs,
            Self::Gt => lhs > rhs,
        }
    }

    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Eq => "=",
            Self::Gt => ">",
        }
    }
}

impl FromStr for Cmp {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "<" => Self::Lt,
            "=" => Self::Eq,
            ">" => Self::Gt,
            _ => return Err(ParseEnumError),
        })
    }
}

/// One of the four fixed unary functions a [`Func`] node may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FuncName {
    /// The implicit "no function" marker; printed as nothing at all.
    Id,
    /// Absolute value.
    Abs,
    /// Unary negation as a named function (distinct from the `Negation` AST level).
    Negate,
    /// Factorial, guarded by [`crate::FACT_LIMIT`] at evaluation time.
    Fact,
}

impl FuncName {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Abs => "abs",
            Self::Negate => "negate",
            Self::Fact => "fact",
        }
    }
}

impl FromStr for FuncName {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "id" => Self::Id,
            "abs" => Self::Abs,
            "negate" => Self::Negate,
            "fact" => Self::Fact,
            _ => return Err(ParseEnumError),
        })
    }
}

/// `Keep` or `Drop` half of a [`DieOpOption::KeepDrop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeepOrDrop {
    /// Selected dice remain kept; the rest become dropped.
    Keep,
    /// Selected dice become dropped; the rest remain kept.
    Drop,
}

/// Selector for a `KeepDrop` dice operator: lowest/highest N, or a predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LowHighWhere {
    /// Lowest `n` (by current head value) among currently-kept dice.
    Low(i64),
    /// Highest `n` (by current head value) among currently-kept dice.
    High(i64),
    /// Every currently-kept die whose head satisfies `cmp limit`.
    Where(Cmp, i64),
}

/// A single dice-roll modifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DieOpOption {
    /// Reroll dice whose head satisfies `cmp limit`.
    Reroll {
        /// `true` = reroll at most once per die; `false` = reroll until it no longer matches.
        once: bool,
        /// Comparison applied to the die's current head.
        cmp: Cmp,
        /// Right-hand side of the comparison.
        limit: i64,
    },
    /// Keep or drop a selection of dice.
    KeepDrop {
        /// Whether the selection is kept or dropped.
        kd: KeepOrDrop,
        /// How the selection is chosen.
        sel: LowHighWhere,
    },
}

/// Cons-list of [`DieOpOption`]s, applied in written order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DieOpRecur(pub DieOpOption, pub Option<Box<DieOpRecur>>);

impl DieOpRecur {
    /// Iterate the chain in written order.
    pub fn iter(&self) -> DieOpIter<'_> {
        DieOpIter(Some(self))
    }
}

/// Iterator over a [`DieOpRecur`] chain, in written order.
pub struct DieOpIter<'a>(Option<&'a DieOpRecur>);

impl<'a> Iterator for DieOpIter<'a> {
    type Item = &'a DieOpOption;

    fn next(&mut self) -> Option<Self::Item> {
        let DieOpRecur(op, rest) = self.0?;
        self.0 = rest.as_deref();
        Some(op)
    }
}

/// A die: either a uniform `[1..=n]` range or a uniform draw from a fixed list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Die {
    /// `d<nbase>`: uniform over `[1..=n]` where `n` is `nbase`'s evaluated value.
    Die(NumBase),
    /// `d{v1,v2,...}`: uniform draw (with replacement) from a fixed, non-empty list.
    CustomDie(Vec<i64>),
}

/// A dice-roll expression: `count` rolls of `die`, with modifiers applied in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dice {
    /// How many times to roll. May itself be another `Dice` expression (folded left).
    pub count: Base,
    /// The die being rolled.
    pub die: Die,
    /// Modifiers applied in written order, if any.
    pub ops: Option<DieOpRecur>,
}

/// Lowest non-function, non-arithmetic precedence level: a dice roll or a plain number/paren.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Base {
    /// A non-dice numeric base.
    NBase(NumBase),
    /// A dice-roll expression.
    DiceBase(Box<Dice>),
}

/// A parenthesized expression or a non-negative integer literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumBase {
    /// `(expr)`.
    Paren(Box<Expr>),
    /// A non-negative integer literal; negation lives at the [`Negation`] level.
    Value(i64),
}

/// `base (^ expo)?`, right-associative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expo {
    /// `base ^ expo`.
    Expo(Base, Box<Expo>),
    /// Just a `base`, no exponent.
    NoExpo(Base),
}

/// Optional unary minus in front of an [`Expo`]. At most one level; `--5` does not parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Negation {
    /// `-expo`.
    Neg(Expo),
    /// Just `expo`, not negated.
    NoNeg(Expo),
}

/// One of the four fixed unary functions applied to a [`Negation`].
///
/// `"id"` is the implicit wrapper parsed when no function name is written;
/// the pretty-printer omits it rather than printing `id ...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Func {
    /// Which function this node applies.
    pub name: FuncName,
    /// The operand.
    pub arg: Negation,
}

/// `func (* | /) term`, right-associative, evaluated left-to-right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// `func * term`.
    Mul(Func, Box<Term>),
    /// `func / term`, integer division truncating toward zero.
    Div(Func, Box<Term>),
    /// Just a `func`.
    NoTerm(Func),
}

/// `term (+ | -) expr`, right-associative, evaluated left-to-right. Top of the grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// `term + expr`.
    Add(Term, Box<Expr>),
    /// `term - expr`.
    Sub(Term, Box<Expr>),
    /// Just a `term`.
    NoExpr(Term),
}

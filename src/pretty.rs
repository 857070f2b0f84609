//! Structural pretty-printer.
//!
//! Plain recursive functions rather than `Display` impls: the evaluator
//! also needs to pretty-print *sub*-expressions (a die's bound, in error
//! messages) independently of building a trace, so printing is kept as
//! its own reusable traversal instead of being folded into `eval`.

use crate::ast::{
    Base, Dice, Die, DieOpOption, DieOpRecur, Expo, Expr, Func, FuncName, LowHighWhere, Negation,
    NumBase, Term,
};

/// Render an expression back into a string that [`crate::parse`] can read
/// and re-evaluate to the same value (the round-trip law).
#[must_use]
pub fn pretty(expr: &Expr) -> String {
    pretty_expr(expr)
}

pub(crate) fn pretty_expr(e: &Expr) -> String {
    match e {
        Expr::Add(t, rest) => format!("{} + {}", pretty_term(t), pretty_expr(rest)),
        Expr::Sub(t, rest) => format!("{} - {}", pretty_term(t), pretty_expr(rest)),
        Expr::NoExpr(t) => pretty_term(t),
    }
}

pub(crate) fn pretty_term(t: &Term) -> String {
    match t {
        Term::Mul(f, rest) => format!("{} * {}", pretty_func(f), pretty_term(rest)),
        Term::Div(f, rest) => format!("{} / {}", pretty_func(f), pretty_term(rest)),
        Term::NoTerm(f) => pretty_func(f),
    }
}

pub(crate) fn pretty_func(f: &Func) -> String {
    let arg = pretty_negation(&f.arg);
    match f.name {
        FuncName::Id => arg,
        other => format!("{} {}", other.as_str(), arg),
    }
}

pub(crate) fn pretty_negation(n: &Negation) -> String {
    match n {
        Negation::Neg(e) => format!("-{}", pretty_expo(e)),
        Negation::NoNeg(e) => pretty_expo(e),
    }
}

pub(crate) fn pretty_expo(e: &Expo) -> String {
    match e {
        Expo::Expo(b, rest) => format!("{} ^ {}", pretty_base(b), pretty_expo(rest)),
        Expo::NoExpo(b) => pretty_base(b),
    }
}

pub(crate) fn pretty_base(b: &Base) -> String {
    match b {
        Base::NBase(n) => pretty_nbase(n),
        Base::DiceBase(d) => pretty_dice(d),
    }
}

pub(crate) fn pretty_nbase(n: &NumBase) -> String {
    match n {
        NumBase::Paren(e) => format!("({})", pretty_expr(e)),
        NumBase::Value(v) => v.to_string(),
    }
}

pub(crate) fn pretty_die(d: &Die) -> String {
    match d {
        Die::Die(b) => format!("d{}", pretty_nbase(b)),
        Die::CustomDie(vs) => {
            let joined = vs.iter().map(i64::to_string).collect::<Vec<_>>().join(",");
            format!("d{{{joined}}}")
        }
    }
}

pub(crate) fn pretty_dice(d: &Dice) -> String {
    let ops = d.ops.as_ref().map(pretty_dieops).unwrap_or_default();
    format!("{}{}{}", pretty_base(&d.count), pretty_die(&d.die), ops)
}

fn pretty_dieops(ops: &DieOpRecur) -> String {
    ops.iter().map(pretty_dieop).collect::<Vec<_>>().join("")
}

fn pretty_dieop(op: &DieOpOption) -> String {
    match op {
        DieOpOption::Reroll { once, cmp, limit } => {
            let tag = if *once { "ro" } else { "rr" };
            format!("{tag}{}{limit}", cmp.as_str())
        }
        DieOpOption::KeepDrop { kd, sel } => {
            let tag = match kd {
                crate::ast::KeepOrDrop::Keep => "k",
                crate::ast::KeepOrDrop::Drop => "d",
            };
            format!("{tag}{}", pretty_lhw(sel))
        }
    }
}

fn pretty_lhw(sel: &LowHighWhere) -> String {
    match sel {
        LowHighWhere::Low(n) => format!("l{n}"),
        LowHighWhere::High(n) => format!("h{n}"),
        LowHighWhere::Where(cmp, n) => format!("w{}{n}", cmp.as_str()),
    }
}

//! Recursive-descent parser.
//!
//! Built on `pest`, whose PEG ordered-choice engine already performs the
//! backtracking the grammar needs (try `dice` before falling back to
//! `nbase`, restoring position on failure) without any manual bookkeeping.
//! Converting the resulting `Pair` tree into the AST follows the same
//! fold-as-you-go style the teacher crate uses to build its `Add`/`Sub`
//! chain out of pest pairs.

use pest::iterators::Pair;
use pest_derive::Parser;

use crate::{
    ast::{
        Base, Cmp, Dice, Die, DieOpOption, DieOpRecur, Expo, Expr, Func, FuncName, KeepOrDrop,
        LowHighWhere, Negation, NumBase, Term,
    },
    error::ParseError,
};

#[derive(Parser)]
#[grammar = "grammar.pest"]
struct DiceGrammar;

/// Parse a dice expression, or fail naming the production and byte
/// position that stalled. Never returns a partial AST alongside an error.
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    use pest::Parser as _;

    let mut pairs = DiceGrammar::parse(Rule::program, input)?;
    let program = pairs.next().ok_or_else(|| ParseError {
        production: "program".to_owned(),
        position: 0,
        message: "empty input".to_owned(),
    })?;
    let expr_pair = program
        .into_inner()
        .next()
        .ok_or_else(|| ParseError { production: "expr".to_owned(), position: 0, message: "missing expression".to_owned() })?;
    build_expr(expr_pair)
}

fn build_integer(pair: Pair<'_, Rule>) -> Result<i64, ParseError> {
    let text = pair.as_str();
    text.parse::<i64>()
        .map_err(|_| ParseError::overflow("integer", pair.as_span().start(), text))
}

fn build_pos_integer(pair: Pair<'_, Rule>) -> Result<i64, ParseError> {
    let text = pair.as_str();
    text.parse::<i64>()
        .map_err(|_| ParseError::overflow("pos_integer", pair.as_span().start(), text))
}

fn build_cmp(pair: Pair<'_, Rule>) -> Cmp {
    let inner = pair.into_inner().next().expect("ordering always has one child");
    match inner.as_rule() {
        Rule::ord_lt => Cmp::Lt,
        Rule::ord_eq => Cmp::Eq,
        Rule::ord_gt => Cmp::Gt,
        r => unreachable!("unexpected ordering child {r:?}"),
    }
}

fn build_lhw(pair: Pair<'_, Rule>) -> Result<LowHighWhere, ParseError> {
    let inner = pair.into_inner().next().expect("lhw always has one child");
    match inner.as_rule() {
        Rule::lhw_h => {
            let n = build_integer(inner.into_inner().next().expect("lhw_h has an integer"))?;
            Ok(LowHighWhere::High(n))
        }
        Rule::lhw_l => {
            let n = build_integer(inner.into_inner().next().expect("lhw_l has an integer"))?;
            Ok(LowHighWhere::Low(n))
        }
        Rule::lhw_w => {
            let mut p = inner.into_inner();
            let cmp = build_cmp(p.next().expect("lhw_w has an ordering"));
            let n = build_integer(p.next().expect("lhw_w has an integer"))?;
            Ok(LowHighWhere::Where(cmp, n))
        }
        r => unreachable!("unexpected lhw child {r:?}"),
    }
}

fn build_dieop(pair: Pair<'_, Rule>) -> Result<DieOpOption, ParseError> {
    let inner = pair.into_inner().next().expect("dieop always has one child");
    match inner.as_rule() {
        Rule::dieop_ro | Rule::dieop_rr => {
            let once = inner.as_rule() == Rule::dieop_ro;
            let mut p = inner.into_inner();
            let cmp = build_cmp(p.next().expect("reroll op has an ordering"));
            let limit = build_integer(p.next().expect("reroll op has an integer"))?;
            Ok(DieOpOption::Reroll { once, cmp, limit })
        }
        Rule::dieop_k | Rule::dieop_d => {
            let kd = if inner.as_rule() == Rule::dieop_k { KeepOrDrop::Keep } else { KeepOrDrop::Drop };
            let lhw_pair = inner.into_inner().next().expect("keep/drop op has a selector");
            Ok(DieOpOption::KeepDrop { kd, sel: build_lhw(lhw_pair)? })
        }
        r => unreachable!("unexpected dieop child {r:?}"),
    }
}

fn build_dieops(pair: Pair<'_, Rule>) -> Result<DieOpRecur, ParseError> {
    let ops = pair.into_inner().map(build_dieop).collect::<Result<Vec<_>, _>>()?;
    let mut acc: Option<Box<DieOpRecur>> = None;
    for op in ops.into_iter().rev() {
        acc = Some(Box::new(DieOpRecur(op, acc)));
    }
    Ok(*acc.expect("dieops always has at least one dieop"))
}

fn build_die(pair: Pair<'_, Rule>) -> Result<Die, ParseError> {
    let inner = pair.into_inner().next().expect("die always has one child");
    match inner.as_rule() {
        Rule::custom_die => {
            let values = inner.into_inner().map(build_integer).collect::<Result<Vec<_>, _>>()?;
            Ok(Die::CustomDie(values))
        }
        Rule::nbase => Ok(Die::Die(build_nbase(inner)?)),
        r => unreachable!("unexpected die child {r:?}"),
    }
}

fn build_dice(pair: Pair<'_, Rule>) -> Result<Dice, ParseError> {
    let mut inner = pair.into_inner().peekable();

    let count = if matches!(inner.peek().map(pest::iterators::Pair::as_rule), Some(Rule::nbase)) {
        Base::NBase(build_nbase(inner.next().expect("peeked"))?)
    } else {
        Base::NBase(NumBase::Value(1))
    };

    let mut tails = Vec::new();
    for die_tail in inner {
        let mut tail_inner = die_tail.into_inner();
        let die = build_die(tail_inner.next().expect("die_tail always has a die"))?;
        let ops = match tail_inner.next() {
            Some(p) => Some(build_dieops(p)?),
            None => None,
        };
        tails.push((die, ops));
    }

    let mut tails = tails.into_iter();
    let (first_die, first_ops) = tails.next().expect("die_tail+ guarantees at least one tail");
    let mut dice = Dice { count, die: first_die, ops: first_ops };
    for (die, ops) in tails {
        dice = Dice { count: Base::DiceBase(Box::new(dice)), die, ops };
    }
    Ok(dice)
}

fn build_nbase(pair: Pair<'_, Rule>) -> Result<NumBase, ParseError> {
    let inner = pair.into_inner().next().expect("nbase always has one child");
    match inner.as_rule() {
        Rule::expr => Ok(NumBase::Paren(Box::new(build_expr(inner)?))),
        Rule::pos_integer => Ok(NumBase::Value(build_pos_integer(inner)?)),
        r => unreachable!("unexpected nbase child {r:?}"),
    }
}

fn build_base(pair: Pair<'_, Rule>) -> Result<Base, ParseError> {
    let inner = pair.into_inner().next().expect("base always has one child");
    match inner.as_rule() {
        Rule::dice => Ok(Base::DiceBase(Box::new(build_dice(inner)?))),
        Rule::nbase => Ok(Base::NBase(build_nbase(inner)?)),
        r => unreachable!("unexpected base child {r:?}"),
    }
}

fn build_expo(pair: Pair<'_, Rule>) -> Result<Expo, ParseError> {
    let mut inner = pair.into_inner();
    let base = build_base(inner.next().expect("expo always has a base"))?;
    match inner.next() {
        Some(op) if op.as_rule() == Rule::op_exp => {
            let rest = build_expo(inner.next().expect("op_exp is followed by an expo"))?;
            Ok(Expo::Expo(base, Box::new(rest)))
        }
        Some(r) => unreachable!("unexpected expo child {r:?}"),
        None => Ok(Expo::NoExpo(base)),
    }
}

fn build_negation(pair: Pair<'_, Rule>) -> Result<Negation, ParseError> {
    let mut inner = pair.into_inner();
    let first = inner.next().expect("negation always has a child");
    match first.as_rule() {
        Rule::op_neg => {
            let expo = build_expo(inner.next().expect("op_neg is followed by an expo"))?;
            Ok(Negation::Neg(expo))
        }
        Rule::expo => Ok(Negation::NoNeg(build_expo(first)?)),
        r => unreachable!("unexpected negation child {r:?}"),
    }
}

fn build_func(pair: Pair<'_, Rule>) -> Result<Func, ParseError> {
    let mut inner = pair.into_inner().peekable();
    let name = if matches!(inner.peek().map(pest::iterators::Pair::as_rule), Some(Rule::func_name)) {
        let p = inner.next().expect("peeked");
        p.as_str().parse::<FuncName>().expect("grammar only admits known function names")
    } else {
        FuncName::Id
    };
    let arg = build_negation(inner.next().expect("func always ends in a negation"))?;
    Ok(Func { name, arg })
}

fn build_term(pair: Pair<'_, Rule>) -> Result<Term, ParseError> {
    let mut inner = pair.into_inner();
    let func = build_func(inner.next().expect("term always has a func"))?;
    match inner.next() {
        Some(op) => {
            let rest = build_term(inner.next().expect("operator is followed by a term"))?;
            match op.as_rule() {
                Rule::op_mul => Ok(Term::Mul(func, Box::new(rest))),
                Rule::op_div => Ok(Term::Div(func, Box::new(rest))),
                r => unreachable!("unexpected term operator {r:?}"),
            }
        }
        None => Ok(Term::NoTerm(func)),
    }
}

fn build_expr(pair: Pair<'_, Rule>) -> Result<Expr, ParseError> {
    let mut inner = pair.into_inner();
    let term = build_term(inner.next().expect("expr always has a term"))?;
    match inner.next() {
        Some(op) => {
            let rest = build_expr(inner.next().expect("operator is followed by an expr"))?;
            match op.as_rule() {
                Rule::op_add => Ok(Expr::Add(term, Box::new(rest))),
                Rule::op_sub => Ok(Expr::Sub(term, Box::new(rest))),
                r => unreachable!("unexpected expr operator {r:?}"),
            }
        }
        None => Ok(Expr::NoExpr(term)),
    }
}

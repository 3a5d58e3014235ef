//! Propositional formulas with a next operator
//!
//! This module provides [`GR1Expression`], the formula type used for initial
//! conditions, safety and progress formulas of a GR(1) specification. Formulas
//! are built as a tree and rendered by a single [`Display`](fmt::Display)
//! implementation into the surface syntax that reactive synthesis tools like
//! TuLiP / omega expect:
//!
//! | node                 | rendering              |
//! |----------------------|------------------------|
//! | `True` / `False`     | `True` / `False`       |
//! | `IntEq(x, 3)`        | `x=3`                  |
//! | `BoolVar(a)`         | `a`                    |
//! | `Not`                | `!a`, `!False`, `!(x=3)`, `!( a \|\| b )` |
//! | `And` / `Or`         | `a && b` / `a \|\| b`  |
//! | `Implies` / `Iff`    | `a -> b` / `a <-> b`   |
//! | `Next`               | `X (a \|\| b)`         |
//! | `AnyOf` / `AllOf`    | `( a \|\| b )` / `( a && b )` |
//!
//! An empty [`GR1Expression::AnyOf`] renders as `False` and an empty
//! [`GR1Expression::AllOf`] as `True`, so a goal without any satisfying state
//! never produces malformed syntax.

use std::{
    collections::BTreeSet,
    fmt,
    ops::{BitAnd, BitOr, Not},
};

use serde::{Serialize, Serializer};

/// Formula over integer and boolean variables with a next operator
///
/// # Example
///
/// ```
/// use mrpp_gr1::expression::GR1Expression;
///
/// // loc=5 -> X (loc=1 || loc=2)
/// let transition = GR1Expression::implies(
///     GR1Expression::int_eq("loc", 5),
///     GR1Expression::next(GR1Expression::any_of([
///         GR1Expression::int_eq("loc", 1),
///         GR1Expression::int_eq("loc", 2),
///     ])),
/// );
/// assert_eq!(transition.to_string(), "loc=5 -> X (loc=1 || loc=2)");
///
/// let goal = !GR1Expression::any_of([GR1Expression::int_eq("loc", 3)]);
/// assert_eq!(goal.to_string(), "!( loc=3 )");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GR1Expression {
    /// Always true
    True,
    /// Always false
    False,
    /// Integer variable equals a constant
    IntEq(String, i64),
    /// Boolean variable
    BoolVar(String),
    /// Negation
    Not(Box<GR1Expression>),
    /// Conjunction of two formulas
    And(Box<GR1Expression>, Box<GR1Expression>),
    /// Disjunction of two formulas
    Or(Box<GR1Expression>, Box<GR1Expression>),
    /// Implication
    Implies(Box<GR1Expression>, Box<GR1Expression>),
    /// Equivalence
    Iff(Box<GR1Expression>, Box<GR1Expression>),
    /// Value in the next step
    Next(Box<GR1Expression>),
    /// Flat disjunction over an arbitrary number of formulas
    AnyOf(Vec<GR1Expression>),
    /// Flat conjunction over an arbitrary number of formulas
    AllOf(Vec<GR1Expression>),
}

impl GR1Expression {
    /// Create the atom `var=value`
    pub fn int_eq(var: impl ToString, value: impl Into<i64>) -> Self {
        GR1Expression::IntEq(var.to_string(), value.into())
    }

    /// Create a boolean variable atom
    pub fn bool_var(var: impl ToString) -> Self {
        GR1Expression::BoolVar(var.to_string())
    }

    /// Create `X (expr)`
    pub fn next(expr: GR1Expression) -> Self {
        GR1Expression::Next(Box::new(expr))
    }

    /// Create `lhs -> rhs`
    pub fn implies(lhs: GR1Expression, rhs: GR1Expression) -> Self {
        GR1Expression::Implies(Box::new(lhs), Box::new(rhs))
    }

    /// Create `lhs <-> rhs`
    pub fn iff(lhs: GR1Expression, rhs: GR1Expression) -> Self {
        GR1Expression::Iff(Box::new(lhs), Box::new(rhs))
    }

    /// Create a flat disjunction over `exprs`
    pub fn any_of(exprs: impl IntoIterator<Item = GR1Expression>) -> Self {
        GR1Expression::AnyOf(exprs.into_iter().collect())
    }

    /// Create a flat conjunction over `exprs`
    pub fn all_of(exprs: impl IntoIterator<Item = GR1Expression>) -> Self {
        GR1Expression::AllOf(exprs.into_iter().collect())
    }

    /// Check whether the formula is syntactically unsatisfiable, i.e., it is
    /// `False` or an empty disjunction
    pub fn is_false(&self) -> bool {
        match self {
            GR1Expression::False => true,
            GR1Expression::AnyOf(exprs) => exprs.is_empty(),
            _ => false,
        }
    }

    /// Check whether the formula contains the next operator
    ///
    /// # Example
    ///
    /// ```
    /// use mrpp_gr1::expression::GR1Expression;
    ///
    /// let expr = GR1Expression::int_eq("loc", 1);
    /// assert!(!expr.contains_next());
    ///
    /// let expr = GR1Expression::implies(expr.clone(), GR1Expression::next(expr));
    /// assert!(expr.contains_next());
    /// ```
    pub fn contains_next(&self) -> bool {
        match self {
            GR1Expression::Next(_) => true,
            GR1Expression::True
            | GR1Expression::False
            | GR1Expression::IntEq(_, _)
            | GR1Expression::BoolVar(_) => false,
            GR1Expression::Not(expr) => expr.contains_next(),
            GR1Expression::And(lhs, rhs)
            | GR1Expression::Or(lhs, rhs)
            | GR1Expression::Implies(lhs, rhs)
            | GR1Expression::Iff(lhs, rhs) => lhs.contains_next() || rhs.contains_next(),
            GR1Expression::AnyOf(exprs) | GR1Expression::AllOf(exprs) => {
                exprs.iter().any(|e| e.contains_next())
            }
        }
    }

    /// Names of all variables appearing in the formula
    pub fn variables(&self) -> BTreeSet<&str> {
        let mut vars = BTreeSet::new();
        self.collect_variables(&mut vars);
        vars
    }

    fn collect_variables<'a>(&'a self, vars: &mut BTreeSet<&'a str>) {
        match self {
            GR1Expression::True | GR1Expression::False => (),
            GR1Expression::IntEq(var, _) | GR1Expression::BoolVar(var) => {
                vars.insert(var);
            }
            GR1Expression::Not(expr) | GR1Expression::Next(expr) => expr.collect_variables(vars),
            GR1Expression::And(lhs, rhs)
            | GR1Expression::Or(lhs, rhs)
            | GR1Expression::Implies(lhs, rhs)
            | GR1Expression::Iff(lhs, rhs) => {
                lhs.collect_variables(vars);
                rhs.collect_variables(vars);
            }
            GR1Expression::AnyOf(exprs) | GR1Expression::AllOf(exprs) => {
                exprs.iter().for_each(|e| e.collect_variables(vars))
            }
        }
    }

    /// Whether the node renders as `True` or `False`
    fn is_literal(&self) -> bool {
        match self {
            GR1Expression::True | GR1Expression::False => true,
            GR1Expression::AnyOf(exprs) | GR1Expression::AllOf(exprs) => exprs.is_empty(),
            _ => false,
        }
    }

    /// Whether the rendering of this node is enclosed in parentheses
    fn is_parenthesized(&self) -> bool {
        match self {
            GR1Expression::AnyOf(exprs) | GR1Expression::AllOf(exprs) => !exprs.is_empty(),
            _ => false,
        }
    }

    /// Whether the node is a binary connective that needs parentheses when
    /// used as an operand
    fn is_binary(&self) -> bool {
        matches!(
            self,
            GR1Expression::And(_, _)
                | GR1Expression::Or(_, _)
                | GR1Expression::Implies(_, _)
                | GR1Expression::Iff(_, _)
        )
    }
}

/// Write `expr` as operand of a connective
fn fmt_operand(expr: &GR1Expression, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if expr.is_binary() {
        return write!(f, "( {expr} )");
    }
    write!(f, "{expr}")
}

/// Write the operands of a flat disjunction / conjunction without enclosing
/// parentheses
fn fmt_joined(exprs: &[GR1Expression], sep: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, expr) in exprs.iter().enumerate() {
        if i > 0 {
            write!(f, " {sep} ")?;
        }
        fmt_operand(expr, f)?;
    }
    Ok(())
}

impl fmt::Display for GR1Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GR1Expression::True => write!(f, "True"),
            GR1Expression::False => write!(f, "False"),
            GR1Expression::IntEq(var, value) => write!(f, "{var}={value}"),
            GR1Expression::BoolVar(var) => write!(f, "{var}"),
            GR1Expression::Not(expr) => match expr.as_ref() {
                GR1Expression::BoolVar(_) => write!(f, "!{expr}"),
                e if e.is_literal() || e.is_parenthesized() => write!(f, "!{expr}"),
                _ => write!(f, "!({expr})"),
            },
            GR1Expression::And(lhs, rhs) => {
                fmt_operand(lhs, f)?;
                write!(f, " && ")?;
                fmt_operand(rhs, f)
            }
            GR1Expression::Or(lhs, rhs) => {
                fmt_operand(lhs, f)?;
                write!(f, " || ")?;
                fmt_operand(rhs, f)
            }
            GR1Expression::Implies(lhs, rhs) => {
                fmt_operand(lhs, f)?;
                write!(f, " -> ")?;
                fmt_operand(rhs, f)
            }
            GR1Expression::Iff(lhs, rhs) => {
                fmt_operand(lhs, f)?;
                write!(f, " <-> ")?;
                fmt_operand(rhs, f)
            }
            GR1Expression::Next(expr) => {
                write!(f, "X (")?;
                match expr.as_ref() {
                    GR1Expression::AnyOf(exprs) if !exprs.is_empty() => {
                        fmt_joined(exprs, "||", f)?
                    }
                    GR1Expression::AllOf(exprs) if !exprs.is_empty() => {
                        fmt_joined(exprs, "&&", f)?
                    }
                    e => write!(f, "{e}")?,
                }
                write!(f, ")")
            }
            GR1Expression::AnyOf(exprs) => {
                if exprs.is_empty() {
                    return write!(f, "False");
                }
                write!(f, "( ")?;
                fmt_joined(exprs, "||", f)?;
                write!(f, " )")
            }
            GR1Expression::AllOf(exprs) => {
                if exprs.is_empty() {
                    return write!(f, "True");
                }
                write!(f, "( ")?;
                fmt_joined(exprs, "&&", f)?;
                write!(f, " )")
            }
        }
    }
}

impl Serialize for GR1Expression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Not for GR1Expression {
    type Output = Self;

    fn not(self) -> Self::Output {
        GR1Expression::Not(Box::new(self))
    }
}

impl BitAnd for GR1Expression {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        GR1Expression::And(Box::new(self), Box::new(rhs))
    }
}

impl BitOr for GR1Expression {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        GR1Expression::Or(Box::new(self), Box::new(rhs))
    }
}

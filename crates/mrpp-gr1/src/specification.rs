//! GR(1) specifications
//!
//! A GR(1) specification consists of variable declarations for the
//! environment and the system, and for both players a set of initial
//! conditions, safety formulas (must hold in every step) and progress formulas
//! (must hold infinitely often).
//!
//! Use the [`GR1SpecificationBuilder`] to assemble a [`GR1Specification`]. The
//! builder is passed around by value, collects all formulas and guarantees
//! that formulas only reference declared variables.

use std::{
    collections::{BTreeMap, HashSet},
    error, fmt,
};

use log::trace;
use serde::Serialize;

use crate::expression::GR1Expression;

/// Domain of a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableDomain {
    /// Boolean variable
    Boolean,
    /// Integer variable ranging over `[lower, upper]`
    Integer {
        /// Smallest value of the variable
        lower: i64,
        /// Largest value of the variable
        upper: i64,
    },
}

impl VariableDomain {
    /// Check whether `value` is a value of the domain
    ///
    /// Boolean domains do not contain any integer value.
    pub fn contains(&self, value: i64) -> bool {
        match self {
            VariableDomain::Boolean => false,
            VariableDomain::Integer { lower, upper } => *lower <= value && value <= *upper,
        }
    }
}

impl fmt::Display for VariableDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableDomain::Boolean => write!(f, "boolean"),
            VariableDomain::Integer { lower, upper } => write!(f, "[{lower}, {upper}]"),
        }
    }
}

/// Player a variable or formula belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Player {
    /// Environment (uncontrolled)
    Environment,
    /// System (controlled)
    System,
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::Environment => write!(f, "env"),
            Player::System => write!(f, "sys"),
        }
    }
}

/// Part of a GR(1) specification a formula belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    /// Initial condition
    Init,
    /// Safety formula, must hold at every step
    Safety,
    /// Progress formula, must hold infinitely often
    Progress,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Init => write!(f, "init"),
            Section::Safety => write!(f, "safety"),
            Section::Progress => write!(f, "prog"),
        }
    }
}

/// Formulas of one player
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PlayerFormulas {
    /// Declared variables and their domains
    vars: BTreeMap<String, VariableDomain>,
    /// Initial conditions
    init: Vec<GR1Expression>,
    /// Safety formulas
    safety: Vec<GR1Expression>,
    /// Progress formulas
    prog: Vec<GR1Expression>,
}

impl PlayerFormulas {
    /// Declared variables and their domains
    pub fn variables(&self) -> &BTreeMap<String, VariableDomain> {
        &self.vars
    }

    /// Formulas of a section
    pub fn section(&self, section: Section) -> &[GR1Expression] {
        match section {
            Section::Init => &self.init,
            Section::Safety => &self.safety,
            Section::Progress => &self.prog,
        }
    }

    fn section_mut(&mut self, section: Section) -> &mut Vec<GR1Expression> {
        match section {
            Section::Init => &mut self.init,
            Section::Safety => &mut self.safety,
            Section::Progress => &mut self.prog,
        }
    }
}

/// GR(1) specification
///
/// Use the [`GR1SpecificationBuilder`] to create a specification.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct GR1Specification {
    /// Environment variables and formulas
    env: PlayerFormulas,
    /// System variables and formulas
    sys: PlayerFormulas,
}

impl GR1Specification {
    /// Variables and formulas of `player`
    pub fn player(&self, player: Player) -> &PlayerFormulas {
        match player {
            Player::Environment => &self.env,
            Player::System => &self.sys,
        }
    }

    /// Formulas of `player` in `section`
    pub fn formulas(&self, player: Player, section: Section) -> &[GR1Expression] {
        self.player(player).section(section)
    }

    /// Domain of a variable declared by either player
    pub fn domain_of(&self, var: &str) -> Option<&VariableDomain> {
        self.env.vars.get(var).or_else(|| self.sys.vars.get(var))
    }

    /// Total number of formulas in the specification
    pub fn num_formulas(&self) -> usize {
        [&self.env, &self.sys]
            .iter()
            .map(|p| p.init.len() + p.safety.len() + p.prog.len())
            .sum()
    }
}

impl fmt::Display for GR1Specification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indent = "    ";

        for (i, player) in [Player::Environment, Player::System].iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let formulas = self.player(*player);

            writeln!(f, "{player}_vars({}) {{", formulas.vars.len())?;
            for (name, domain) in formulas.vars.iter() {
                writeln!(f, "{indent}{name}: {domain};")?;
            }
            writeln!(f, "}}")?;

            for section in [Section::Init, Section::Safety, Section::Progress] {
                let exprs = formulas.section(section);
                writeln!(f, "{player}_{section}({}) {{", exprs.len())?;
                for expr in exprs {
                    writeln!(f, "{indent}{expr};")?;
                }
                writeln!(f, "}}")?;
            }
        }

        Ok(())
    }
}

/// Builder for a [`GR1Specification`]
///
/// Variables have to be declared before formulas referencing them can be
/// added. Adding a formula that is already contained in the same section has
/// no effect.
///
/// # Example
///
/// ```
/// use mrpp_gr1::expression::GR1Expression;
/// use mrpp_gr1::specification::{GR1SpecificationBuilder, Player, Section, VariableDomain};
///
/// let mut builder = GR1SpecificationBuilder::new();
/// builder
///     .declare_variable(Player::System, "loc", VariableDomain::Integer { lower: 0, upper: 3 })
///     .unwrap();
/// builder
///     .add_formula(Player::System, Section::Init, GR1Expression::int_eq("loc", 1))
///     .unwrap();
/// builder
///     .add_formula(
///         Player::System,
///         Section::Progress,
///         GR1Expression::any_of([GR1Expression::int_eq("loc", 2)]),
///     )
///     .unwrap();
///
/// let spec = builder.build();
/// assert_eq!(spec.formulas(Player::System, Section::Progress).len(), 1);
///
/// // unknown variables are rejected
/// let mut builder = GR1SpecificationBuilder::new();
/// assert!(builder
///     .add_formula(Player::System, Section::Init, GR1Expression::int_eq("loc", 1))
///     .is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct GR1SpecificationBuilder {
    spec: GR1Specification,
    /// Formulas already added, per player and section
    added: HashSet<(Player, Section, GR1Expression)>,
}

impl GR1SpecificationBuilder {
    /// Create a new empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a new variable of `player`
    ///
    /// Returns an error if a variable with the same name has already been
    /// declared by either player or the integer domain is empty.
    pub fn declare_variable(
        &mut self,
        player: Player,
        name: impl ToString,
        domain: VariableDomain,
    ) -> Result<&mut Self, GR1SpecificationBuilderError> {
        let name = name.to_string();

        if self.spec.domain_of(&name).is_some() {
            return Err(GR1SpecificationBuilderError::DuplicateVariable { name });
        }

        if let VariableDomain::Integer { lower, upper } = domain
            && lower > upper
        {
            return Err(GR1SpecificationBuilderError::EmptyDomain { name, lower, upper });
        }

        trace!("Declared {player} variable '{name}' with domain {domain}");
        self.player_mut(player).vars.insert(name, domain);
        Ok(self)
    }

    /// Add a formula to `section` of `player`
    ///
    /// Returns an error if the formula references an undeclared variable, uses
    /// a boolean variable as integer (or vice versa), or compares an integer
    /// variable with a value outside of its domain.
    pub fn add_formula(
        &mut self,
        player: Player,
        section: Section,
        expr: GR1Expression,
    ) -> Result<&mut Self, GR1SpecificationBuilderError> {
        self.validate_formula(&expr)
            .map_err(|err| err.into_builder_error(player, section, expr.clone()))?;

        if !self.added.insert((player, section, expr.clone())) {
            trace!("Skipping duplicate {player}_{section} formula '{expr}'");
            return Ok(self);
        }

        self.player_mut(player).section_mut(section).push(expr);
        Ok(self)
    }

    /// Add multiple formulas to `section` of `player`
    pub fn add_formulas(
        &mut self,
        player: Player,
        section: Section,
        exprs: impl IntoIterator<Item = GR1Expression>,
    ) -> Result<&mut Self, GR1SpecificationBuilderError> {
        for expr in exprs {
            self.add_formula(player, section, expr)?;
        }
        Ok(self)
    }

    /// Build the specification
    pub fn build(self) -> GR1Specification {
        self.spec
    }

    fn player_mut(&mut self, player: Player) -> &mut PlayerFormulas {
        match player {
            Player::Environment => &mut self.spec.env,
            Player::System => &mut self.spec.sys,
        }
    }

    /// Check that all atoms of the formula are well-typed and declared
    fn validate_formula(&self, expr: &GR1Expression) -> Result<(), InternalBuilderError> {
        match expr {
            GR1Expression::True | GR1Expression::False => Ok(()),
            GR1Expression::IntEq(var, value) => match self.spec.domain_of(var) {
                None => Err(InternalBuilderError::UnknownVariable(var.clone())),
                Some(VariableDomain::Boolean) => {
                    Err(InternalBuilderError::TypeMismatch(var.clone()))
                }
                Some(domain) if !domain.contains(*value) => {
                    Err(InternalBuilderError::ValueOutOfDomain(var.clone(), *value))
                }
                Some(_) => Ok(()),
            },
            GR1Expression::BoolVar(var) => match self.spec.domain_of(var) {
                None => Err(InternalBuilderError::UnknownVariable(var.clone())),
                Some(VariableDomain::Integer { .. }) => {
                    Err(InternalBuilderError::TypeMismatch(var.clone()))
                }
                Some(VariableDomain::Boolean) => Ok(()),
            },
            GR1Expression::Not(expr) | GR1Expression::Next(expr) => self.validate_formula(expr),
            GR1Expression::And(lhs, rhs)
            | GR1Expression::Or(lhs, rhs)
            | GR1Expression::Implies(lhs, rhs)
            | GR1Expression::Iff(lhs, rhs) => {
                self.validate_formula(lhs)?;
                self.validate_formula(rhs)
            }
            GR1Expression::AnyOf(exprs) | GR1Expression::AllOf(exprs) => {
                exprs.iter().try_for_each(|e| self.validate_formula(e))
            }
        }
    }
}

/// Errors that can occur when building a [`GR1Specification`]
#[derive(Debug, Clone, PartialEq)]
pub enum GR1SpecificationBuilderError {
    /// A variable with the same name has already been declared
    DuplicateVariable {
        /// Name of the variable
        name: String,
    },
    /// Integer domain with lower bound larger than upper bound
    EmptyDomain {
        /// Name of the variable
        name: String,
        /// Lower bound
        lower: i64,
        /// Upper bound
        upper: i64,
    },
    /// Formula references a variable that has not been declared
    UnknownVariable {
        /// Player the formula was added for
        player: Player,
        /// Section the formula was added to
        section: Section,
        /// Formula containing the unknown variable
        expr: Box<GR1Expression>,
        /// Name of the unknown variable
        var: String,
    },
    /// Boolean variable used as integer or vice versa
    TypeMismatch {
        /// Player the formula was added for
        player: Player,
        /// Section the formula was added to
        section: Section,
        /// Formula containing the ill-typed atom
        expr: Box<GR1Expression>,
        /// Name of the variable
        var: String,
    },
    /// Integer variable compared with a value outside of its domain
    ValueOutOfDomain {
        /// Player the formula was added for
        player: Player,
        /// Section the formula was added to
        section: Section,
        /// Formula containing the comparison
        expr: Box<GR1Expression>,
        /// Name of the variable
        var: String,
        /// Value the variable is compared with
        value: i64,
    },
}

/// Internal error type without the information where the formula was added
enum InternalBuilderError {
    UnknownVariable(String),
    TypeMismatch(String),
    ValueOutOfDomain(String, i64),
}

impl InternalBuilderError {
    fn into_builder_error(
        self,
        player: Player,
        section: Section,
        expr: GR1Expression,
    ) -> GR1SpecificationBuilderError {
        let expr = Box::new(expr);
        match self {
            InternalBuilderError::UnknownVariable(var) => {
                GR1SpecificationBuilderError::UnknownVariable {
                    player,
                    section,
                    expr,
                    var,
                }
            }
            InternalBuilderError::TypeMismatch(var) => GR1SpecificationBuilderError::TypeMismatch {
                player,
                section,
                expr,
                var,
            },
            InternalBuilderError::ValueOutOfDomain(var, value) => {
                GR1SpecificationBuilderError::ValueOutOfDomain {
                    player,
                    section,
                    expr,
                    var,
                    value,
                }
            }
        }
    }
}

impl fmt::Display for GR1SpecificationBuilderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GR1SpecificationBuilderError::DuplicateVariable { name } => {
                write!(f, "Variable '{name}' is declared twice")
            }
            GR1SpecificationBuilderError::EmptyDomain { name, lower, upper } => write!(
                f,
                "Domain [{lower}, {upper}] of variable '{name}' does not contain any value"
            ),
            GR1SpecificationBuilderError::UnknownVariable {
                player,
                section,
                expr,
                var,
            } => write!(
                f,
                "Unknown variable '{var}' in {player}_{section} formula '{expr}'"
            ),
            GR1SpecificationBuilderError::TypeMismatch {
                player,
                section,
                expr,
                var,
            } => write!(
                f,
                "Variable '{var}' is used with the wrong type in {player}_{section} formula '{expr}'"
            ),
            GR1SpecificationBuilderError::ValueOutOfDomain {
                player,
                section,
                expr,
                var,
                value,
            } => write!(
                f,
                "Value {value} is outside of the domain of variable '{var}' in {player}_{section} formula '{expr}'"
            ),
        }
    }
}

impl error::Error for GR1SpecificationBuilderError {}

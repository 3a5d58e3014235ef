//! Encoding with one position variable pair per robot
//!
//! Instead of packing the joint state into a single integer, every robot `r`
//! (named starting from 1) gets its own column variable `x<r>`, row variable
//! `y<r>` and one boolean action proposition per move (`right<r>`, `up<r>`,
//! `left<r>`, `down<r>` and, if staying is allowed, `stop<r>`). The number of
//! formulas grows polynomially in the number of robots instead of
//! exponentially.
//!
//! The system safety formulas consist of
//! - boundary constraints, e.g., `x1=0 -> !left1`,
//! - exactly-one-action constraints, e.g., `left1 <-> ( !right1 && !up1 && ... )`,
//! - movement constraints, e.g., `( x1=2 && right1 ) -> X (x1=3)`,
//! - pairwise collision avoidance, e.g., `!( x1=0 && y1=0 && x2=0 && y2=0 )`,
//! - pairwise swap avoidance between neighbouring cells.
//!
//! With [`StructuredEncoder::with_delay`] the environment owns the positions
//! and may delay a move. Every robot gets a boolean `delay<r>` and a clock
//! `d<r>` in `[-1, max_delay + 1]` that counts the delays. A delayed robot keeps
//! its cell, e.g., `( x1=0 && right1 ) -> ( X (x1=1 && !delay1) || X (x1=0 && delay1) )`.
//! The clocks must stay in `[0, max_delay]` and every robot is undelayed
//! infinitely often.

use log::{debug, info, warn};
use mrpp_gr1::{
    expression::GR1Expression,
    specification::{
        GR1Specification, GR1SpecificationBuilder, GR1SpecificationBuilderError, Player, Section,
        VariableDomain,
    },
};
use mrpp_grid::{
    Cell, Workspace,
    moves::{Move, MoveSet},
};

use crate::{
    constraints::ThresholdSemantics,
    enumerate::Combinations,
    goals::{Goal, GoalPredicate},
};

/// Name of the column variable of `robot`
pub fn x_var(robot: usize) -> String {
    format!("x{}", robot + 1)
}

/// Name of the row variable of `robot`
pub fn y_var(robot: usize) -> String {
    format!("y{}", robot + 1)
}

/// Name of the action proposition of `mv` for `robot`
pub fn action_var(mv: Move, robot: usize) -> String {
    format!("{mv}{}", robot + 1)
}

/// Name of the delay proposition of `robot`
pub fn delay_var(robot: usize) -> String {
    format!("delay{}", robot + 1)
}

/// Name of the delay clock of `robot`
pub fn clock_var(robot: usize) -> String {
    format!("d{}", robot + 1)
}

/// Encoder for the per-robot encoding of a workspace
#[derive(Debug, Clone)]
pub struct StructuredEncoder<'a> {
    workspace: &'a Workspace,
    moves: MoveSet,
    semantics: ThresholdSemantics,
    max_delay: Option<u32>,
}

impl<'a> StructuredEncoder<'a> {
    /// Create an encoder for `workspace` where each robot picks a move of
    /// `moves` in every step
    pub fn new(workspace: &'a Workspace, moves: MoveSet) -> Self {
        Self {
            workspace,
            moves,
            semantics: ThresholdSemantics::default(),
            max_delay: None,
        }
    }

    /// Use `semantics` for threshold goals
    pub fn with_semantics(mut self, semantics: ThresholdSemantics) -> Self {
        self.semantics = semantics;
        self
    }

    /// Let the environment delay moves, each clock counts at most
    /// `max_delay` delays
    pub fn with_delay(mut self, max_delay: u32) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// Player that owns the position variables
    pub fn position_owner(&self) -> Player {
        match self.max_delay {
            Some(_) => Player::Environment,
            None => Player::System,
        }
    }

    /// Build the specification for robots starting in `initial` with `goals`
    ///
    /// `initial` must contain one cell of the grid per robot.
    pub fn encode(
        &self,
        initial: &[Cell],
        goals: &[Goal],
    ) -> Result<GR1Specification, GR1SpecificationBuilderError> {
        info!("Building structured specification for {}", self.workspace);

        let mut builder = GR1SpecificationBuilder::new();
        self.declare_variables(&mut builder)?;

        let owner = self.position_owner();
        builder
            .add_formulas(owner, Section::Init, self.init_formulas(initial))?
            .add_formulas(Player::System, Section::Safety, self.boundary_formulas())?
            .add_formulas(Player::System, Section::Safety, self.action_formulas())?
            .add_formulas(owner, Section::Safety, self.movement_formulas())?
            .add_formulas(Player::System, Section::Safety, self.collision_formulas())?
            .add_formulas(Player::System, Section::Safety, self.swap_formulas())?;

        if let Some(max_delay) = self.max_delay {
            debug!("Robots may be delayed, clocks count up to {max_delay} delays");
            builder
                .add_formulas(
                    Player::Environment,
                    Section::Init,
                    self.delay_init_formulas(),
                )?
                .add_formulas(
                    Player::Environment,
                    Section::Safety,
                    self.clock_formulas(max_delay),
                )?
                .add_formulas(
                    Player::Environment,
                    Section::Safety,
                    self.delay_bound_formulas(max_delay),
                )?
                .add_formulas(
                    Player::Environment,
                    Section::Progress,
                    self.delay_progress_formulas(),
                )?;
        }

        for goal in goals {
            for (section, expr) in self.goal_formulas(goal) {
                builder.add_formula(Player::System, section, expr)?;
            }
        }

        let spec = builder.build();
        debug!("Structured specification contains {} formulas", spec.num_formulas());
        Ok(spec)
    }

    /// Declare the position and action variables of all robots, and the
    /// delay variables if moves can be delayed
    pub fn declare_variables(
        &self,
        builder: &mut GR1SpecificationBuilder,
    ) -> Result<(), GR1SpecificationBuilderError> {
        let grid = self.workspace.grid();
        let owner = self.position_owner();

        for robot in 0..self.workspace.num_robots() {
            builder
                .declare_variable(
                    owner,
                    x_var(robot),
                    VariableDomain::Integer {
                        lower: 0,
                        upper: grid.num_cols() as i64 - 1,
                    },
                )?
                .declare_variable(
                    owner,
                    y_var(robot),
                    VariableDomain::Integer {
                        lower: 0,
                        upper: grid.num_rows() as i64 - 1,
                    },
                )?;

            for mv in self.moves.moves() {
                builder.declare_variable(
                    Player::System,
                    action_var(*mv, robot),
                    VariableDomain::Boolean,
                )?;
            }

            if let Some(max_delay) = self.max_delay {
                builder
                    .declare_variable(
                        Player::Environment,
                        delay_var(robot),
                        VariableDomain::Boolean,
                    )?
                    .declare_variable(
                        Player::Environment,
                        clock_var(robot),
                        VariableDomain::Integer {
                            lower: -1,
                            upper: i64::from(max_delay) + 1,
                        },
                    )?;
            }
        }

        Ok(())
    }

    /// Robot `robot` is in `cell`, i.e., `( x<r>=col && y<r>=row )`
    pub fn at(&self, robot: usize, cell: Cell) -> GR1Expression {
        let (row, col) = self.workspace.grid().coordinate_of(cell);
        GR1Expression::all_of([
            GR1Expression::int_eq(x_var(robot), col as i64),
            GR1Expression::int_eq(y_var(robot), row as i64),
        ])
    }

    /// Initial position of every robot
    pub fn init_formulas(&self, initial: &[Cell]) -> Vec<GR1Expression> {
        let grid = self.workspace.grid();

        initial
            .iter()
            .enumerate()
            .flat_map(|(robot, cell)| {
                let (row, col) = grid.coordinate_of(*cell);
                [
                    GR1Expression::int_eq(x_var(robot), col as i64),
                    GR1Expression::int_eq(y_var(robot), row as i64),
                ]
            })
            .collect()
    }

    /// Robots on the border of the grid must not move across it
    pub fn boundary_formulas(&self) -> Vec<GR1Expression> {
        let grid = self.workspace.grid();
        let mut formulas = Vec::new();

        for robot in 0..self.workspace.num_robots() {
            let borders = [
                (x_var(robot), 0, Move::Left),
                (x_var(robot), grid.num_cols() - 1, Move::Right),
                (y_var(robot), 0, Move::Up),
                (y_var(robot), grid.num_rows() - 1, Move::Down),
            ];

            for (var, value, mv) in borders {
                formulas.push(GR1Expression::implies(
                    GR1Expression::int_eq(var, value as i64),
                    !GR1Expression::bool_var(action_var(mv, robot)),
                ));
            }
        }

        formulas
    }

    /// Every robot executes exactly one action per step
    pub fn action_formulas(&self) -> Vec<GR1Expression> {
        let moves = self.moves.moves();
        let mut formulas = Vec::new();

        for robot in 0..self.workspace.num_robots() {
            for mv in moves {
                let others = moves
                    .iter()
                    .filter(|other| *other != mv)
                    .map(|other| !GR1Expression::bool_var(action_var(*other, robot)));

                formulas.push(GR1Expression::iff(
                    GR1Expression::bool_var(action_var(*mv, robot)),
                    GR1Expression::all_of(others),
                ));
            }
        }

        formulas
    }

    /// Effect of the actions on the position variables
    pub fn movement_formulas(&self) -> Vec<GR1Expression> {
        let grid = self.workspace.grid();
        let mut formulas = Vec::new();

        for robot in 0..self.workspace.num_robots() {
            for mv in self.moves.moves() {
                for col in 0..grid.num_cols() {
                    if let Some(next) = column_after(*mv, col, grid.num_cols()) {
                        formulas.push(self.movement(x_var(robot), col, next, *mv, robot));
                    }
                }

                for row in 0..grid.num_rows() {
                    if let Some(next) = row_after(*mv, row, grid.num_rows()) {
                        formulas.push(self.movement(y_var(robot), row, next, *mv, robot));
                    }
                }
            }
        }

        formulas
    }

    /// `( <var>=<from> && <mv><r> ) -> X (<var>=<to>)`
    ///
    /// If moves can be delayed and `from != to`, the robot either reaches `to`
    /// undelayed or stays in `from` delayed.
    fn movement(
        &self,
        var: String,
        from: usize,
        to: usize,
        mv: Move,
        robot: usize,
    ) -> GR1Expression {
        let trigger = GR1Expression::all_of([
            GR1Expression::int_eq(var.clone(), from as i64),
            GR1Expression::bool_var(action_var(mv, robot)),
        ]);

        let effect = match self.max_delay {
            Some(_) if from != to => {
                let delayed = GR1Expression::bool_var(delay_var(robot));
                GR1Expression::next(GR1Expression::all_of([
                    GR1Expression::int_eq(var.clone(), to as i64),
                    !delayed.clone(),
                ])) | GR1Expression::next(GR1Expression::all_of([
                    GR1Expression::int_eq(var, from as i64),
                    delayed,
                ]))
            }
            _ => GR1Expression::next(GR1Expression::int_eq(var, to as i64)),
        };

        GR1Expression::implies(trigger, effect)
    }

    /// Robots start undelayed with a clock of zero
    pub fn delay_init_formulas(&self) -> Vec<GR1Expression> {
        (0..self.workspace.num_robots())
            .flat_map(|robot| {
                [
                    GR1Expression::int_eq(clock_var(robot), 0),
                    !GR1Expression::bool_var(delay_var(robot)),
                ]
            })
            .collect()
    }

    /// Relation between the delays and the clocks
    ///
    /// If some robot with a full clock is delayed in the next step, the clocks
    /// of undelayed robots decrease and all others are kept. Otherwise the
    /// clocks of delayed robots increase and all others are kept.
    pub fn clock_formulas(&self, max_delay: u32) -> Vec<GR1Expression> {
        let robots = 0..self.workspace.num_robots();
        let max_delay = i64::from(max_delay);

        let saturated = any(robots
            .clone()
            .map(|robot| {
                GR1Expression::all_of([
                    GR1Expression::next(GR1Expression::bool_var(delay_var(robot))),
                    GR1Expression::int_eq(clock_var(robot), max_delay),
                ])
            })
            .collect());

        // clock update of `robot` at value `d` given whether it is delayed
        let update = |robot: usize, d: i64, delayed: bool, next: i64| {
            let delay = GR1Expression::bool_var(delay_var(robot));
            GR1Expression::implies(
                GR1Expression::all_of([
                    GR1Expression::next(if delayed { delay } else { !delay }),
                    GR1Expression::int_eq(clock_var(robot), d),
                ]),
                GR1Expression::next(GR1Expression::int_eq(clock_var(robot), next)),
            )
        };

        let mut on_saturation = Vec::new();
        let mut otherwise = Vec::new();
        for robot in robots {
            for d in 0..=max_delay {
                on_saturation.push(update(robot, d, false, d - 1));
                on_saturation.push(update(robot, d, true, d));
                otherwise.push(update(robot, d, true, d + 1));
                otherwise.push(update(robot, d, false, d));
            }
        }

        vec![
            GR1Expression::implies(saturated.clone(), GR1Expression::all_of(on_saturation)),
            GR1Expression::implies(!saturated, GR1Expression::all_of(otherwise)),
        ]
    }

    /// Clocks never leave `[0, max_delay]`
    pub fn delay_bound_formulas(&self, max_delay: u32) -> Vec<GR1Expression> {
        (0..self.workspace.num_robots())
            .flat_map(|robot| {
                [
                    !GR1Expression::int_eq(clock_var(robot), -1),
                    !GR1Expression::int_eq(clock_var(robot), i64::from(max_delay) + 1),
                ]
            })
            .collect()
    }

    /// Every robot is undelayed infinitely often
    pub fn delay_progress_formulas(&self) -> Vec<GR1Expression> {
        (0..self.workspace.num_robots())
            .map(|robot| !GR1Expression::bool_var(delay_var(robot)))
            .collect()
    }

    /// No two robots occupy the same cell
    pub fn collision_formulas(&self) -> Vec<GR1Expression> {
        let mut formulas = Vec::new();

        for pair in Combinations::new(self.workspace.num_robots(), 2) {
            let (i, j) = (pair[0], pair[1]);
            for cell in self.workspace.grid().cells() {
                formulas.push(!(self.both_at(i, cell, j, cell)));
            }
        }

        formulas
    }

    /// No two robots exchange their cells
    pub fn swap_formulas(&self) -> Vec<GR1Expression> {
        let grid = self.workspace.grid();
        let mut formulas = Vec::new();

        for pair in Combinations::new(self.workspace.num_robots(), 2) {
            let (i, j) = (pair[0], pair[1]);
            for cell in grid.cells() {
                for neighbour in Move::NEIGHBOURS.iter().filter_map(|mv| mv.apply(cell, grid)) {
                    let mut atoms = self.both_at_atoms(i, cell, j, neighbour);
                    atoms.push(GR1Expression::next(self.both_at(i, neighbour, j, cell)));
                    formulas.push(!GR1Expression::all_of(atoms));
                }
            }
        }

        formulas
    }

    /// Formulas of `goal` with the section they belong to
    ///
    /// Cells outside of the grid are ignored. Robot predicates referring to a
    /// robot that does not exist yield `False`.
    pub fn goal_formulas(&self, goal: &Goal) -> Vec<(Section, GR1Expression)> {
        let num_robots = self.workspace.num_robots();
        let cells = self.grid_cells(goal.predicate.cells());

        let predicates = match &goal.predicate {
            GoalPredicate::Threshold { count, .. } => {
                vec![self.threshold(&cells, *count)]
            }
            GoalPredicate::Robot { .. } => goal
                .predicate
                .robots(num_robots)
                .into_iter()
                .map(|robot| {
                    if robot >= num_robots {
                        warn!("Robot {robot} does not exist, there are only {num_robots} robots");
                        return GR1Expression::False;
                    }
                    self.in_cells(robot, &cells)
                })
                .collect(),
        };

        goal.apply_kind(predicates)
    }

    /// `count` robots are in `cells`
    fn threshold(&self, cells: &[Cell], count: usize) -> GR1Expression {
        let num_robots = self.workspace.num_robots();
        if count > num_robots || count > cells.len() {
            return GR1Expression::any_of([]);
        }

        any(Combinations::new(num_robots, count)
            .map(|chosen| {
                all((0..num_robots)
                    .filter_map(|robot| {
                        if chosen.contains(&robot) {
                            return Some(self.in_cells(robot, cells));
                        }
                        match self.semantics {
                            ThresholdSemantics::AtLeast => None,
                            ThresholdSemantics::Exactly => Some(!self.in_cells(robot, cells)),
                        }
                    })
                    .collect())
            })
            .collect())
    }

    /// `robot` is in one of `cells`
    fn in_cells(&self, robot: usize, cells: &[Cell]) -> GR1Expression {
        any(cells.iter().map(|cell| self.at(robot, *cell)).collect())
    }

    /// Robot `i` is in `cell_i` and robot `j` is in `cell_j`
    fn both_at(&self, i: usize, cell_i: Cell, j: usize, cell_j: Cell) -> GR1Expression {
        GR1Expression::all_of(self.both_at_atoms(i, cell_i, j, cell_j))
    }

    fn both_at_atoms(&self, i: usize, cell_i: Cell, j: usize, cell_j: Cell) -> Vec<GR1Expression> {
        let (row_i, col_i) = self.workspace.grid().coordinate_of(cell_i);
        let (row_j, col_j) = self.workspace.grid().coordinate_of(cell_j);
        vec![
            GR1Expression::int_eq(x_var(i), col_i as i64),
            GR1Expression::int_eq(y_var(i), row_i as i64),
            GR1Expression::int_eq(x_var(j), col_j as i64),
            GR1Expression::int_eq(y_var(j), row_j as i64),
        ]
    }

    /// Sorted cells of `cells` inside of the grid without duplicates
    fn grid_cells(&self, cells: &[Cell]) -> Vec<Cell> {
        let grid = self.workspace.grid();
        let mut in_grid = cells
            .iter()
            .copied()
            .filter(|cell| {
                let contained = grid.contains(*cell);
                if !contained {
                    warn!("Ignoring cell {cell}, it is not part of the {grid}");
                }
                contained
            })
            .collect::<Vec<_>>();
        in_grid.sort_unstable();
        in_grid.dedup();
        in_grid
    }
}

/// Disjunction of `exprs`, a single formula is returned unwrapped
fn any(mut exprs: Vec<GR1Expression>) -> GR1Expression {
    if exprs.len() == 1 {
        return exprs.remove(0);
    }
    GR1Expression::any_of(exprs)
}

/// Conjunction of `exprs`, a single formula is returned unwrapped
fn all(mut exprs: Vec<GR1Expression>) -> GR1Expression {
    if exprs.len() == 1 {
        return exprs.remove(0);
    }
    GR1Expression::all_of(exprs)
}

/// Column after executing `mv` in column `col`
fn column_after(mv: Move, col: usize, num_cols: usize) -> Option<usize> {
    match mv {
        Move::Right => (col + 1 < num_cols).then_some(col + 1),
        Move::Left => col.checked_sub(1),
        Move::Up | Move::Down | Move::Stay => Some(col),
    }
}

/// Row after executing `mv` in row `row`
fn row_after(mv: Move, row: usize, num_rows: usize) -> Option<usize> {
    match mv {
        Move::Down => (row + 1 < num_rows).then_some(row + 1),
        Move::Up => row.checked_sub(1),
        Move::Left | Move::Right | Move::Stay => Some(row),
    }
}

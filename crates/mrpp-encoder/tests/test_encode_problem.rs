//! Integration tests encoding the two robot problem on a 3x3 grid
use std::collections::BTreeSet;

use mrpp_encoder::{
    goals::{Goal, GoalPredicate},
    problem::{EncoderOptions, MotionPlanningProblem, ProblemEncoder},
    transitions::{TransitionGenerator, TransitionOptions},
};
use mrpp_gr1::specification::{Player, Section, VariableDomain};
use mrpp_grid::{Grid, Workspace, codec::has_collision};

fn workspace() -> Workspace {
    Workspace::new(Grid::new(3, 3).unwrap(), 2).unwrap()
}

/// Two robots have to visit the bottom row together and each robot has to
/// visit the top right corner, while no robot may ever enter cell 1
fn problem() -> MotionPlanningProblem {
    let goals = vec![
        Goal::recurrence(GoalPredicate::Threshold {
            cells: vec![6, 7, 8],
            count: 2,
        }),
        Goal::recurrence(GoalPredicate::Robot {
            cells: vec![2],
            robot: None,
        }),
        Goal::avoidance(GoalPredicate::Threshold {
            cells: vec![1],
            count: 1,
        }),
    ];
    MotionPlanningProblem::new(workspace(), vec![0, 3], goals).unwrap()
}

#[test]
fn test_packed_specification() {
    let spec = ProblemEncoder::default().encode(&problem()).unwrap();

    assert_eq!(
        spec.domain_of("loc"),
        Some(&VariableDomain::Integer {
            lower: 0,
            upper: 80
        })
    );
    assert_eq!(
        spec.formulas(Player::System, Section::Init)
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>(),
        vec!["loc=27"]
    );

    let progress = spec
        .formulas(Player::System, Section::Progress)
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>();
    assert_eq!(progress.len(), 3);
    // both robots in the bottom row: 3 * 2 placements
    assert_eq!(progress[0].matches("loc=").count(), 6);
    // robot 0 in cell 2, robot 1 in any of the other 8 cells
    assert_eq!(progress[1].matches("loc=").count(), 8);
    assert!(progress[1].starts_with("( loc=2 || loc=11 || loc=29"));
    // robot 1 in cell 2
    assert!(progress[2].starts_with("( loc=18 || loc=19 || loc=21"));

    let safety = spec.formulas(Player::System, Section::Safety);
    let avoid = safety.last().unwrap().to_string();
    assert!(avoid.starts_with("!( loc=1 || "));
    assert_eq!(avoid.matches("loc=").count(), 16);

    let relation = TransitionGenerator::new(&workspace(), TransitionOptions::default()).generate();
    assert_eq!(safety.len(), relation.len() + 1);
    assert!(relation.dead_states().is_empty());
}

#[test]
fn test_transitions_are_symmetric_and_collision_free() {
    let ws = workspace();
    let relation = TransitionGenerator::new(&ws, TransitionOptions::default()).generate();

    // 9 * 8 collision-free joint states, each with at least one successor
    assert_eq!(relation.len(), 72);

    for transition in relation.transitions() {
        assert!(!has_collision(&ws.decode(transition.source())));

        for successor in transition.successors() {
            assert!(!has_collision(&ws.decode(*successor)));
            assert_ne!(*successor, transition.source());

            // without staying every move can be reversed
            assert!(
                relation
                    .successors_of(*successor)
                    .unwrap()
                    .contains(&transition.source())
            );
        }
    }
}

#[test]
fn test_parallel_specification_equals_sequential() {
    let sequential = ProblemEncoder::default().encode(&problem()).unwrap();
    let parallel = ProblemEncoder::new(EncoderOptions {
        transitions: TransitionOptions {
            parallel: true,
            ..Default::default()
        },
        ..Default::default()
    })
    .encode(&problem())
    .unwrap();

    assert_eq!(sequential, parallel);
    assert_eq!(sequential.to_string(), parallel.to_string());
}

#[test]
fn test_json_export() {
    let spec = ProblemEncoder::default().encode(&problem()).unwrap();
    let json = serde_json::to_value(&spec).unwrap();

    assert_eq!(
        json["sys"]["vars"],
        serde_json::json!({ "loc": { "integer": { "lower": 0, "upper": 80 } } })
    );
    assert_eq!(json["sys"]["init"], serde_json::json!(["loc=27"]));
    assert_eq!(json["env"]["safety"], serde_json::json!([]));

    let safety = json["sys"]["safety"].as_array().unwrap();
    assert!(
        safety
            .iter()
            .all(|f| f.as_str().unwrap().starts_with("loc=") || f.as_str().unwrap().starts_with("!"))
    );

    let unique = safety
        .iter()
        .map(|f| f.as_str().unwrap())
        .collect::<BTreeSet<_>>();
    assert_eq!(unique.len(), safety.len());
}

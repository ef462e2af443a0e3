//! End-to-end workouts driven through the strategy compiler on a manual clock.
mod common;

use common::Harness;
use workout_core::{
    BlockKey, Fragment, FragmentValue, MemoryTag, OutputKind, OutputStatement, RoundsValue,
    TimerValue, Timestamp,
};
use workout_runtime::behaviors::{
    CompleteOnNext, Display, RepScheme, RoundAdvance, RoundCompletion, RoundInit, TimerTick,
};
use workout_runtime::{
    Block, CompiledStatement, Diagnostic, RuntimeError, StatementId, StrategyCompiler, presets,
};

fn statement(id: u32, values: Vec<FragmentValue>) -> CompiledStatement {
    CompiledStatement::new(id, values.into_iter().map(Fragment::parsed).collect())
}

fn effort(id: u32, name: &str) -> CompiledStatement {
    statement(id, vec![FragmentValue::Effort(name.into())])
}

fn rounds_of(h: &Harness, key: BlockKey) -> Option<RoundsValue> {
    h.runtime
        .memory()
        .read_tag(key, MemoryTag::ROUNDS)
        .and_then(|fragments| fragments.first())
        .and_then(|fragment| fragment.value.as_rounds().copied())
}

fn timer_of(h: &Harness, key: BlockKey) -> Option<TimerValue> {
    h.runtime
        .memory()
        .read_tag(key, MemoryTag::TIMER)
        .and_then(|fragments| fragments.first())
        .and_then(|fragment| fragment.value.as_timer().cloned())
}

fn completion_of(h: &Harness, key: BlockKey) -> &OutputStatement {
    h.runtime
        .outputs()
        .iter()
        .find(|o| o.owner == key && o.kind == OutputKind::Completion)
        .expect("completion output")
}

fn recorded(output: &OutputStatement, kind: workout_core::FragmentKind) -> Option<&FragmentValue> {
    workout_core::find_kind(&output.fragments, kind).map(|f| &f.value)
}

#[test]
fn amrap_counts_rounds_until_the_countdown_expires() {
    let mut h = Harness::with_compiler(StrategyCompiler::new([
        statement(
            1,
            vec![
                FragmentValue::Label("Cindy".into()),
                FragmentValue::Action("AMRAP".into()),
                FragmentValue::Timer(TimerValue::countdown(1_200_000)),
            ],
        )
        .with_children(vec![vec![StatementId(2)]]),
        statement(
            2,
            vec![FragmentValue::Rep(5), FragmentValue::Effort("Pullups".into())],
        ),
    ]));

    let amrap = h.runtime.start(&[StatementId(1)]).unwrap();
    assert_eq!(h.labels(), ["Cindy", "Pullups"]);
    assert_eq!(
        timer_of(&h, amrap).and_then(|timer| timer.remaining(Timestamp::ZERO)),
        Some(1_200_000)
    );
    assert_eq!(rounds_of(&h, amrap).map(|r| r.current), Some(1));

    h.clock.set(Timestamp(45_000));
    h.runtime.advance();
    assert_eq!(rounds_of(&h, amrap).map(|r| r.current), Some(2));
    assert_eq!(h.labels(), ["Cindy", "Pullups"]);

    let milestones: Vec<&OutputStatement> = h
        .runtime
        .outputs()
        .iter()
        .filter(|o| o.kind == OutputKind::Milestone)
        .collect();
    assert_eq!(milestones.len(), 1);
    assert_eq!(milestones[0].span.end, Some(Timestamp(45_000)));

    h.tick_at(600_000);
    assert_eq!(h.labels().len(), 2);

    h.tick_at(1_200_000);
    assert!(h.runtime.is_finished());

    let done = completion_of(&h, amrap);
    assert_eq!(
        recorded(done, workout_core::FragmentKind::Elapsed),
        Some(&FragmentValue::Elapsed(1_200_000))
    );
    assert_eq!(
        recorded(done, workout_core::FragmentKind::Rounds),
        Some(&FragmentValue::Rounds(RoundsValue {
            current: 2,
            total: None
        }))
    );
    assert!(h.diagnostics.is_empty(), "{:?}", h.diagnostics.entries());
}

#[test]
fn paused_amrap_does_not_expire_on_wall_time() {
    let mut h = Harness::with_compiler(StrategyCompiler::new([
        statement(
            1,
            vec![
                FragmentValue::Action("AMRAP".into()),
                FragmentValue::Timer(TimerValue::countdown(60_000)),
            ],
        )
        .with_children(vec![vec![StatementId(2)]]),
        effort(2, "Burpees"),
    ]));
    let amrap = h.runtime.start(&[StatementId(1)]).unwrap();

    h.clock.set(Timestamp(10_000));
    h.runtime.pause();
    h.tick_at(70_000);
    assert!(!h.runtime.is_finished());

    h.runtime.resume();
    assert_eq!(
        timer_of(&h, amrap).and_then(|timer| timer.remaining(Timestamp(70_000))),
        Some(50_000)
    );
    h.tick_at(120_000);
    assert!(h.runtime.is_finished());
}

#[test]
fn emom_runs_each_interval_and_stops_after_the_last() {
    let mut h = Harness::with_compiler(StrategyCompiler::new([
        statement(
            1,
            vec![
                FragmentValue::Action("EMOM".into()),
                FragmentValue::Rounds(RoundsValue::new(Some(10))),
                FragmentValue::Timer(TimerValue::countdown(60_000)),
            ],
        )
        .with_children(vec![vec![StatementId(2)]]),
        effort(2, "Burpees"),
    ]));
    let emom = h.runtime.start(&[StatementId(1)]).unwrap();

    for minute in 1..=10u64 {
        let boundary = minute * 60_000;
        assert_eq!(rounds_of(&h, emom).map(|r| r.current), Some(minute as u32));
        assert_eq!(h.labels(), ["EMOM", "Burpees"], "minute {minute}");

        // Athlete finishes early and waits for the boundary.
        h.clock.set(Timestamp(boundary - 20_000));
        h.runtime.advance();
        assert_eq!(h.labels(), ["EMOM"]);

        h.tick_at(boundary - 1);
        assert!(!h.runtime.is_finished());

        h.tick_at(boundary);
        if minute < 10 {
            let timer = timer_of(&h, emom).unwrap();
            assert_eq!(timer.first_span_start(), Some(Timestamp(boundary)));
        }
    }

    assert!(h.runtime.is_finished());
    let done = completion_of(&h, emom);
    assert_eq!(
        recorded(done, workout_core::FragmentKind::Elapsed),
        Some(&FragmentValue::Elapsed(600_000))
    );
    let milestones = h
        .runtime
        .outputs()
        .iter()
        .filter(|o| o.owner == emom && o.kind == OutputKind::Milestone)
        .count();
    assert_eq!(milestones, 10);
}

#[test]
fn emom_without_a_round_bound_keeps_going() {
    let mut h = Harness::with_compiler(StrategyCompiler::new([
        statement(
            1,
            vec![
                FragmentValue::Action("EMOM".into()),
                FragmentValue::Rounds(RoundsValue::new(None)),
                FragmentValue::Timer(TimerValue::countdown(60_000)),
            ],
        )
        .with_children(vec![vec![StatementId(2)]]),
        effort(2, "Burpees"),
    ]));
    let emom = h.runtime.start(&[StatementId(1)]).unwrap();

    h.clock.set(Timestamp(30_000));
    h.runtime.advance();
    h.tick_at(60_000);
    assert!(!h.runtime.is_finished());
    assert_eq!(h.labels(), ["EMOM", "Burpees"]);

    // Burpees still running; later boundaries keep counting.
    h.tick_at(120_000);
    h.tick_at(180_000);
    assert!(!h.runtime.is_finished());
    assert_eq!(
        rounds_of(&h, emom),
        Some(RoundsValue {
            current: 4,
            total: None
        })
    );

    // The rewound cycle pushes one more group when the running child pops.
    h.runtime.skip();
    assert_eq!(h.labels(), ["EMOM", "Burpees"]);
    h.runtime.skip();
    assert_eq!(h.labels(), ["EMOM"]);
    h.runtime.skip();
    assert!(h.runtime.is_finished());
}

#[test]
fn emom_with_zero_rounds_completes_on_mount() {
    let mut h = Harness::with_compiler(StrategyCompiler::new([effort(2, "Burpees")]));
    let block = presets::emom("EMOM 0", vec![], Some(0), 60_000, vec![vec![StatementId(2)]])
        .unwrap();

    let emom = h.runtime.push(block).unwrap();
    assert!(h.labels().is_empty());
    assert!(h.runtime.is_finished());
    assert!(h.runtime.outputs().iter().all(|o| o.owner == emom));
    assert!(h.diagnostics.is_empty(), "{:?}", h.diagnostics.entries());
}

#[test]
fn rounds_with_zero_rounds_completes_on_mount() {
    let mut h = Harness::with_compiler(StrategyCompiler::new([effort(2, "Burpees")]));
    let block = presets::rounds("0 Rounds", vec![], Some(0), None, vec![vec![StatementId(2)]])
        .unwrap();

    let rounds = h.runtime.push(block).unwrap();
    assert!(h.labels().is_empty());
    assert!(h.runtime.is_finished());
    assert!(h.runtime.outputs().iter().all(|o| o.owner == rounds));
    assert!(h.diagnostics.is_empty(), "{:?}", h.diagnostics.entries());
}

#[test]
fn rep_scheme_flows_into_each_leaf() {
    let mut h = Harness::with_compiler(StrategyCompiler::new([
        statement(
            1,
            vec![
                FragmentValue::Label("Fran".into()),
                FragmentValue::RepScheme(vec![21, 15, 9]),
            ],
        )
        .with_children(vec![vec![StatementId(2)], vec![StatementId(3)]]),
        effort(2, "Thrusters"),
        effort(3, "Pullups"),
    ]));
    let fran = h.runtime.start(&[StatementId(1)]).unwrap();

    let mut leaves = Vec::new();
    while let Some(leaf) = h.runtime.current().filter(|block| block.key() != fran) {
        leaves.push(leaf.label().to_owned());
        let reps = leaf
            .fragments()
            .iter()
            .find_map(|fragment| fragment.value.as_rep());
        assert!(reps.is_some(), "{} has no rep target", leaf.label());
        h.runtime.advance();
    }

    assert_eq!(
        leaves,
        [
            "21 Thrusters",
            "21 Pullups",
            "15 Thrusters",
            "15 Pullups",
            "9 Thrusters",
            "9 Pullups",
        ]
    );
    assert!(h.runtime.is_finished());
    assert_eq!(
        recorded(completion_of(&h, fran), workout_core::FragmentKind::Rounds),
        Some(&FragmentValue::Rounds(RoundsValue {
            current: 4,
            total: Some(3)
        }))
    );
}

#[test]
fn rep_targets_cycle_round_robin_past_the_scheme() {
    let mut h = Harness::new();
    let block = Block::builder("Ladder")
        .behavior(RoundInit::new(Some(5)))
        .behavior(RoundAdvance)
        .behavior(RoundCompletion)
        .behavior(RepScheme::new(vec![21, 15, 9]).unwrap())
        .behavior(Display)
        .build();
    let key = h.runtime.push(block).unwrap();

    let target = |h: &Harness| {
        h.runtime
            .memory()
            .read_tag(key, MemoryTag::REP_TARGET)
            .and_then(|fragments| fragments.first())
            .and_then(|fragment| fragment.value.as_rep())
    };

    let mut targets = vec![target(&h).unwrap()];
    for _ in 1..5 {
        h.runtime.advance();
        targets.push(target(&h).unwrap());
    }
    assert_eq!(targets, [21, 15, 9, 21, 15]);

    h.runtime.advance();
    assert!(h.runtime.is_finished());
}

#[test]
fn invalid_composition_is_rejected_before_push() {
    let mut h = Harness::new();
    let block = Block::builder("broken")
        .behavior(TimerTick::default())
        .behavior(CompleteOnNext)
        .build();

    let result = h.runtime.push(block);
    assert!(matches!(result, Err(RuntimeError::Composition(_))));
    assert!(h.runtime.stack().is_empty());
    assert!(!h.runtime.is_finished());
    assert!(matches!(
        h.diagnostics.entries().as_slice(),
        [Diagnostic::CompositionRejected { label, .. }] if label == "broken"
    ));
}

#[test]
fn unknown_child_statement_leaves_parent_waiting() {
    let mut h = Harness::with_compiler(StrategyCompiler::new([statement(
        1,
        vec![FragmentValue::Label("Warmup".into())],
    )
    .with_children(vec![vec![StatementId(99)]])]));

    h.runtime.start(&[StatementId(1)]).unwrap();
    assert_eq!(h.labels(), ["Warmup"]);
    assert!(matches!(
        h.diagnostics.entries().as_slice(),
        [Diagnostic::CompileFailed { .. }]
    ));

    h.runtime.skip();
    assert!(h.runtime.is_finished());
}

#[test]
fn start_without_compiler_is_an_error() {
    let mut h = Harness::new();
    assert!(matches!(
        h.runtime.start(&[StatementId(1)]),
        Err(RuntimeError::MissingCompiler)
    ));
}

#[test]
fn identical_statements_compile_to_identical_behavior_order() {
    let script = || {
        StrategyCompiler::new([
            statement(
                1,
                vec![
                    FragmentValue::Action("AMRAP".into()),
                    FragmentValue::Timer(TimerValue::countdown(600_000)),
                ],
            )
            .with_children(vec![vec![StatementId(2)]]),
            effort(2, "Row"),
        ])
    };

    let mut first = Harness::with_compiler(script());
    let mut second = Harness::with_compiler(script());
    first.runtime.start(&[StatementId(1)]).unwrap();
    second.runtime.start(&[StatementId(1)]).unwrap();

    let names = |h: &Harness| -> Vec<Vec<&'static str>> {
        h.runtime.stack().iter().map(Block::behavior_names).collect()
    };
    assert_eq!(names(&first), names(&second));
}

#[test]
fn snapshot_serializes_stack_and_visible_memory() {
    let mut h = Harness::with_compiler(StrategyCompiler::new([statement(
        1,
        vec![
            FragmentValue::Label("Run".into()),
            FragmentValue::Timer(TimerValue::countdown(300_000)),
        ],
    )]));
    h.runtime.start(&[StatementId(1)]).unwrap();
    h.clock.set(Timestamp(1_000));

    let snapshot = h.runtime.snapshot();
    assert_eq!(snapshot.now, Timestamp(1_000));
    assert_eq!(snapshot.innermost().map(|f| f.label.as_str()), Some("Run"));

    let json = snapshot.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["stack"][0]["label"], "Run");
    assert!(
        value["memory"]
            .as_array()
            .is_some_and(|locations| locations.iter().any(|l| l["tag"] == "timer"))
    );
}

//! Stack lifecycle: hook ordering, exactly-once teardown, sweep cascade and
//! absorbed failures.
mod common;

use common::{FaultyMount, Harness, LateCompleter, Recorder, entries, journal};
use workout_core::{BlockKey, Event, OutputKind, Timestamp};
use workout_runtime::actions::{MarkCompleteAction, NextBlockAction, PushBlockAction};
use workout_runtime::behaviors::{CompleteOnEvent, CompleteOnNext};
use workout_runtime::{Block, BoxedAction, Diagnostic, HandlerScope, HookKind, NextTrigger, presets};

#[test]
fn child_completion_resumes_parent_then_tears_down_once() {
    let mut h = Harness::new();
    let log = journal();

    let parent = Block::builder("parent")
        .behavior(Recorder::new(&log))
        .behavior(CompleteOnNext)
        .build();
    let child = Block::builder("child")
        .behavior(Recorder::new(&log))
        .behavior(CompleteOnNext)
        .build();

    h.runtime.push(parent).unwrap();
    h.runtime.do_action(Box::new(PushBlockAction { block: child }));
    assert_eq!(h.labels(), ["parent", "child"]);

    h.runtime.advance();

    assert_eq!(
        entries(&log),
        [
            "parent:mount",
            "child:mount",
            "child:next",
            "child:unmount:advanced",
            "child:dispose",
            "parent:next",
            "parent:unmount:advanced",
            "parent:dispose",
        ]
    );
    assert!(h.runtime.is_finished());
    assert!(h.diagnostics.is_empty(), "{:?}", h.diagnostics.entries());
}

#[test]
fn completed_root_sweeps_every_descendant_innermost_first() {
    let mut h = Harness::new();
    let log = journal();

    let root = Block::builder("root")
        .behavior(Recorder::new(&log))
        .behavior(
            CompleteOnEvent::new("finish")
                .unwrap()
                .with_scope(HandlerScope::Bubble),
        )
        .build();
    h.runtime.push(root).unwrap();
    for label in ["mid", "leaf"] {
        let block = Block::builder(label)
            .behavior(Recorder::new(&log))
            .behavior(CompleteOnNext)
            .build();
        h.runtime.push(block).unwrap();
    }

    h.clock.set(Timestamp(5_000));
    h.runtime.handle(Event::new("finish", Timestamp(5_000)));

    assert_eq!(
        entries(&log)[3..],
        [
            "leaf:unmount:parent-completed",
            "leaf:dispose",
            "mid:unmount:parent-completed",
            "mid:dispose",
            "root:unmount:event:finish",
            "root:dispose",
        ]
    );
    assert!(h.runtime.stack().is_empty());
}

#[test]
fn failed_hook_is_absorbed_and_its_actions_dropped() {
    let mut h = Harness::new();
    let log = journal();

    let block = Block::builder("fragile")
        .behavior(FaultyMount)
        .behavior(Recorder::new(&log))
        .behavior(CompleteOnNext)
        .build();
    let key = h.runtime.push(block).unwrap();

    // The completion queued by the failing hook never ran.
    assert_eq!(h.runtime.current().map(Block::key), Some(key));
    assert!(!h.runtime.current().unwrap().is_complete());
    assert_eq!(entries(&log), ["fragile:mount"]);

    let diagnostics = h.diagnostics.entries();
    assert!(matches!(
        diagnostics.as_slice(),
        [Diagnostic::HookFailed {
            behavior: "faulty_mount",
            hook: HookKind::Mount,
            ..
        }]
    ));

    h.runtime.advance();
    assert!(h.runtime.is_finished());
}

#[test]
fn group_without_children_completes_on_mount() {
    let mut h = Harness::new();

    h.runtime
        .push(presets::group("Empty", Vec::new(), Vec::new()))
        .unwrap();

    assert!(h.runtime.is_finished());
    let kinds: Vec<OutputKind> = h.runtime.outputs().iter().map(|o| o.kind).collect();
    assert_eq!(kinds, [OutputKind::Segment, OutputKind::Completion]);
}

#[test]
fn next_on_unknown_or_completed_blocks_is_harmless() {
    let mut h = Harness::new();
    let log = journal();

    let block = Block::builder("only")
        .behavior(Recorder::new(&log))
        .behavior(CompleteOnNext)
        .build();
    h.runtime.push(block).unwrap();

    h.runtime.do_action(Box::new(NextBlockAction {
        key: BlockKey::new(),
        trigger: NextTrigger::External,
    }));
    assert!(matches!(
        h.diagnostics.entries().as_slice(),
        [Diagnostic::ActionFailed {
            action: "next_block",
            ..
        }]
    ));
    assert_eq!(h.labels(), ["only"]);

    // Nothing left to advance once the stack is empty.
    h.runtime.advance();
    h.runtime.advance();
    assert!(h.runtime.is_finished());
    assert_eq!(
        entries(&log),
        ["only:mount", "only:next", "only:unmount:advanced", "only:dispose"]
    );
}

#[test]
fn first_completion_reason_sticks() {
    let mut h = Harness::new();
    let log = journal();

    let root = Block::builder("root")
        .behavior(Recorder::new(&log))
        .behavior(CompleteOnNext)
        .build();
    h.runtime.push(root).unwrap();
    let child = Block::builder("child")
        .behavior(Recorder::new(&log))
        .behavior(CompleteOnNext)
        .build();
    let key = h.runtime.push(child).unwrap();

    h.runtime.do_all(vec![
        Box::new(MarkCompleteAction {
            key,
            reason: "first".into(),
        }) as BoxedAction,
        Box::new(MarkCompleteAction {
            key,
            reason: "second".into(),
        }) as BoxedAction,
    ]);

    assert_eq!(
        entries(&log)[2..],
        [
            "child:unmount:first",
            "child:dispose",
            "root:next",
            "root:unmount:advanced",
            "root:dispose",
        ]
    );
    assert!(h.runtime.is_finished());
}

#[test]
fn stack_depth_limit_rejects_further_pushes() {
    let mut h = Harness::new();
    let limit = h.runtime.config().max_stack_depth;

    for depth in 0..limit {
        let block = Block::builder(format!("level {depth}"))
            .behavior(CompleteOnNext)
            .build();
        h.runtime.push(block).unwrap();
    }
    let overflow = Block::builder("one too many")
        .behavior(CompleteOnNext)
        .build();
    assert!(matches!(
        h.runtime.push(overflow),
        Err(workout_runtime::RuntimeError::StackOverflow { .. })
    ));
}

#[test]
fn actions_queued_during_dispose_never_run() {
    let mut h = Harness::new();
    let log = journal();

    let parent = h
        .runtime
        .push(Block::builder("parent").behavior(Recorder::new(&log)).build())
        .unwrap();
    let child = Block::builder("child")
        .behavior(CompleteOnNext)
        .behavior(LateCompleter { target: parent })
        .build();
    h.runtime.push(child).unwrap();

    h.runtime.advance();

    assert_eq!(h.labels(), ["parent"]);
    assert!(h.runtime.current().is_some_and(|block| !block.is_complete()));
    assert_eq!(entries(&log), ["parent:mount", "parent:next"]);
    assert!(h.diagnostics.is_empty(), "{:?}", h.diagnostics.entries());
}

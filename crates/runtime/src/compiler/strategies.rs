//! Reference compiler: statement table plus pattern-matching strategies.
//!
//! Strategies are tried in priority order (lower first); the first whose
//! `matches` accepts the statement builds the block through a preset.
use std::collections::HashMap;

use tracing::debug;
use workout_core::{
    BlockKey, Fragment, FragmentKind, FragmentValue, MemoryTag, find_kind, merge_fragments,
};

use super::{BlockCompiler, CompileContext, CompileError, StatementId};
use crate::block::Block;
use crate::presets::{self, ChildGroups};

/// One compiled statement as produced by the script parser.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledStatement {
    pub id: StatementId,
    pub fragments: Vec<Fragment>,
    /// Child statement groups, each pushed as one block.
    pub children: ChildGroups,
}

impl CompiledStatement {
    pub fn new(id: u32, fragments: Vec<Fragment>) -> Self {
        Self {
            id: StatementId(id),
            fragments,
            children: Vec::new(),
        }
    }

    /// Adds child groups, one statement id per inner vector entry.
    #[must_use]
    pub fn with_children(mut self, groups: ChildGroups) -> Self {
        self.children = groups;
        self
    }

    pub fn value(&self, kind: FragmentKind) -> Option<&FragmentValue> {
        find_kind(&self.fragments, kind).map(|fragment| &fragment.value)
    }

    pub fn has(&self, kind: FragmentKind) -> bool {
        self.value(kind).is_some()
    }

    /// Whether an `Action` fragment names `keyword` (case-insensitive).
    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.fragments.iter().any(|fragment| {
            matches!(&fragment.value, FragmentValue::Action(action) if action.eq_ignore_ascii_case(keyword))
        })
    }

    pub fn timer_duration(&self) -> Option<u64> {
        self.value(FragmentKind::Timer)
            .and_then(FragmentValue::as_timer)
            .and_then(|timer| timer.duration_ms)
    }

    pub fn rounds_total(&self) -> Option<u32> {
        self.value(FragmentKind::Rounds)
            .and_then(FragmentValue::as_rounds)
            .and_then(|rounds| rounds.total)
    }

    pub fn rep_scheme(&self) -> Option<Vec<u32>> {
        match self.value(FragmentKind::RepScheme) {
            Some(FragmentValue::RepScheme(reps)) => Some(reps.clone()),
            _ => None,
        }
    }

    /// Best human-readable name for the block.
    pub fn label(&self) -> String {
        [FragmentKind::Label, FragmentKind::Effort, FragmentKind::Action]
            .into_iter()
            .find_map(|kind| self.value(kind).and_then(FragmentValue::as_text))
            .map_or_else(|| self.id.to_string(), str::to_owned)
    }
}

/// Builds one kind of block from a statement.
pub trait BlockStrategy: Send {
    fn name(&self) -> &'static str;

    /// Lower values are tried first.
    fn priority(&self) -> i32 {
        0
    }

    fn matches(&self, statement: &CompiledStatement) -> bool;

    fn build(
        &self,
        statement: &CompiledStatement,
        ctx: &CompileContext<'_>,
    ) -> Result<Block, CompileError>;
}

/// `EMOM`: rounds of a fixed interval.
#[derive(Debug, Default)]
pub struct IntervalStrategy;

impl BlockStrategy for IntervalStrategy {
    fn name(&self) -> &'static str {
        "interval"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn matches(&self, statement: &CompiledStatement) -> bool {
        statement.has_keyword("emom") && statement.has(FragmentKind::Timer)
    }

    fn build(&self, statement: &CompiledStatement, _ctx: &CompileContext<'_>) -> Result<Block, CompileError> {
        let block = presets::emom(
            statement.label(),
            statement.fragments.clone(),
            statement.rounds_total(),
            statement.timer_duration().unwrap_or(0),
            statement.children.clone(),
        )?;
        Ok(block)
    }
}

/// `AMRAP`: rounds until a countdown runs out.
#[derive(Debug, Default)]
pub struct AmrapStrategy;

impl BlockStrategy for AmrapStrategy {
    fn name(&self) -> &'static str {
        "amrap"
    }

    fn priority(&self) -> i32 {
        20
    }

    fn matches(&self, statement: &CompiledStatement) -> bool {
        statement.has_keyword("amrap") && statement.has(FragmentKind::Timer)
    }

    fn build(&self, statement: &CompiledStatement, _ctx: &CompileContext<'_>) -> Result<Block, CompileError> {
        let block = presets::amrap(
            statement.label(),
            statement.fragments.clone(),
            statement.timer_duration().unwrap_or(0),
            statement.children.clone(),
        )?;
        Ok(block)
    }
}

/// Bounded rounds and rep schemes (`3 rounds`, `21-15-9`).
#[derive(Debug, Default)]
pub struct RoundsStrategy;

impl BlockStrategy for RoundsStrategy {
    fn name(&self) -> &'static str {
        "rounds"
    }

    fn priority(&self) -> i32 {
        30
    }

    fn matches(&self, statement: &CompiledStatement) -> bool {
        statement.has(FragmentKind::Rounds) || statement.has(FragmentKind::RepScheme)
    }

    fn build(&self, statement: &CompiledStatement, _ctx: &CompileContext<'_>) -> Result<Block, CompileError> {
        let block = presets::rounds(
            statement.label(),
            statement.fragments.clone(),
            statement.rounds_total(),
            statement.rep_scheme(),
            statement.children.clone(),
        )?;
        Ok(block)
    }
}

/// Plain countdowns and stopwatches.
#[derive(Debug, Default)]
pub struct TimerStrategy;

impl BlockStrategy for TimerStrategy {
    fn name(&self) -> &'static str {
        "timer"
    }

    fn priority(&self) -> i32 {
        40
    }

    fn matches(&self, statement: &CompiledStatement) -> bool {
        statement.has(FragmentKind::Timer)
    }

    fn build(&self, statement: &CompiledStatement, _ctx: &CompileContext<'_>) -> Result<Block, CompileError> {
        let block = presets::timer(
            statement.label(),
            statement.fragments.clone(),
            statement.timer_duration(),
            statement.children.clone(),
        )?;
        Ok(block)
    }
}

/// Statements that only structure their children.
#[derive(Debug, Default)]
pub struct GroupStrategy;

impl BlockStrategy for GroupStrategy {
    fn name(&self) -> &'static str {
        "group"
    }

    fn priority(&self) -> i32 {
        50
    }

    fn matches(&self, statement: &CompiledStatement) -> bool {
        !statement.children.is_empty()
    }

    fn build(&self, statement: &CompiledStatement, _ctx: &CompileContext<'_>) -> Result<Block, CompileError> {
        Ok(presets::group(
            statement.label(),
            statement.fragments.clone(),
            statement.children.clone(),
        ))
    }
}

/// Leaf movements. Picks up the rep target promoted by an enclosing block.
#[derive(Debug, Default)]
pub struct EffortStrategy;

impl BlockStrategy for EffortStrategy {
    fn name(&self) -> &'static str {
        "effort"
    }

    fn priority(&self) -> i32 {
        100
    }

    fn matches(&self, _statement: &CompiledStatement) -> bool {
        true
    }

    fn build(&self, statement: &CompiledStatement, ctx: &CompileContext<'_>) -> Result<Block, CompileError> {
        let key = BlockKey::new();
        let inherited: Vec<Fragment> = ctx
            .read_inherited(MemoryTag::REP_TARGET)
            .and_then(|fragments| fragments.iter().find_map(|f| f.value.as_rep()))
            .map(|reps| Fragment::runtime(FragmentValue::Rep(reps), key, ctx.now))
            .into_iter()
            .collect();

        let fragments = merge_fragments(&statement.fragments, &inherited);
        let label = match inherited.first().and_then(|f| f.value.as_rep()) {
            Some(reps) => format!("{reps} {}", statement.label()),
            None => statement.label(),
        };

        // The inherited fragment already names the key, so pin it.
        Ok(presets::effort_builder(label, fragments).key(key).build())
    }
}

/// Statement table plus strategies.
pub struct StrategyCompiler {
    statements: HashMap<StatementId, CompiledStatement>,
    strategies: Vec<Box<dyn BlockStrategy>>,
}

impl StrategyCompiler {
    pub fn new(statements: impl IntoIterator<Item = CompiledStatement>) -> Self {
        let mut compiler = Self {
            statements: HashMap::new(),
            strategies: Self::default_strategies(),
        };
        for statement in statements {
            compiler.insert(statement);
        }
        compiler
    }

    pub fn default_strategies() -> Vec<Box<dyn BlockStrategy>> {
        vec![
            Box::new(IntervalStrategy),
            Box::new(AmrapStrategy),
            Box::new(RoundsStrategy),
            Box::new(TimerStrategy),
            Box::new(GroupStrategy),
            Box::new(EffortStrategy),
        ]
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: impl BlockStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self.strategies.sort_by_key(|strategy| strategy.priority());
        self
    }

    pub fn insert(&mut self, statement: CompiledStatement) {
        self.statements.insert(statement.id, statement);
    }

    pub fn statement(&self, id: StatementId) -> Option<&CompiledStatement> {
        self.statements.get(&id)
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    fn compile_one(&self, id: StatementId, ctx: &CompileContext<'_>) -> Result<Block, CompileError> {
        let statement = self
            .statements
            .get(&id)
            .ok_or(CompileError::UnknownStatement(id))?;
        let strategy = self
            .strategies
            .iter()
            .find(|strategy| strategy.matches(statement))
            .ok_or(CompileError::NoStrategy(id))?;

        debug!(
            target: "runtime::compiler",
            statement = %id,
            strategy = strategy.name(),
            depth = ctx.depth,
            "Compiling statement"
        );
        strategy.build(statement, ctx)
    }
}

impl BlockCompiler for StrategyCompiler {
    fn compile(
        &mut self,
        statements: &[StatementId],
        ctx: &CompileContext<'_>,
    ) -> Result<Block, CompileError> {
        match statements {
            [] => Err(CompileError::EmptyGroup),
            [id] => self.compile_one(*id, ctx),
            ids => {
                let mut labels = Vec::with_capacity(ids.len());
                for id in ids {
                    let statement = self
                        .statements
                        .get(id)
                        .ok_or(CompileError::UnknownStatement(*id))?;
                    labels.push(statement.label());
                }
                let children = ids.iter().map(|id| vec![*id]).collect();
                Ok(presets::group(labels.join(" + "), Vec::new(), children))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use workout_core::{MemoryStore, RoundsValue, TimerValue, Timestamp};

    use super::*;

    fn statement(id: u32, values: Vec<FragmentValue>) -> CompiledStatement {
        CompiledStatement::new(id, values.into_iter().map(Fragment::parsed).collect())
    }

    #[test]
    fn strategies_pick_the_most_specific_shape() {
        let mut compiler = StrategyCompiler::new([
            statement(
                1,
                vec![
                    FragmentValue::Action("AMRAP".into()),
                    FragmentValue::Timer(TimerValue::countdown(1_200_000)),
                ],
            )
            .with_children(vec![vec![StatementId(2)]]),
            statement(2, vec![FragmentValue::Rep(5), FragmentValue::Effort("Pullups".into())]),
            statement(
                3,
                vec![FragmentValue::Rounds(RoundsValue::new(Some(3)))],
            ),
        ]);
        let memory = MemoryStore::new();
        let ctx = CompileContext::root(Timestamp::ZERO, &memory);

        let amrap = compiler.compile(&[StatementId(1)], &ctx).unwrap();
        assert!(amrap.behavior_names().contains(&"round_advance"));
        assert_eq!(amrap.label(), "AMRAP");

        let leaf = compiler.compile(&[StatementId(2)], &ctx).unwrap();
        assert_eq!(leaf.label(), "Pullups");
        assert!(leaf.behavior_names().contains(&"complete_on_next"));

        let rounds = compiler.compile(&[StatementId(3)], &ctx).unwrap();
        assert!(rounds.behavior_names().contains(&"round_completion"));
    }

    #[test]
    fn unknown_and_empty_groups_are_errors() {
        let mut compiler = StrategyCompiler::new(Vec::new());
        let memory = MemoryStore::new();
        let ctx = CompileContext::root(Timestamp::ZERO, &memory);

        assert!(matches!(
            compiler.compile(&[], &ctx),
            Err(CompileError::EmptyGroup)
        ));
        assert!(matches!(
            compiler.compile(&[StatementId(9)], &ctx),
            Err(CompileError::UnknownStatement(StatementId(9)))
        ));
    }

    #[test]
    fn multi_statement_groups_run_each_statement_in_turn() {
        let mut compiler = StrategyCompiler::new([
            statement(1, vec![FragmentValue::Effort("Thrusters".into())]),
            statement(2, vec![FragmentValue::Effort("Pullups".into())]),
        ]);
        let memory = MemoryStore::new();
        let ctx = CompileContext::root(Timestamp::ZERO, &memory);

        let block = compiler
            .compile(&[StatementId(1), StatementId(2)], &ctx)
            .unwrap();
        assert_eq!(block.label(), "Thrusters + Pullups");
        assert!(block.behavior_names().contains(&"children_completion"));
    }
}

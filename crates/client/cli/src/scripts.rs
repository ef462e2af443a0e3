//! Demo workouts, already compiled into statements.
use workout_core::{Fragment, FragmentValue, RoundsValue, TimerValue};
use workout_runtime::{CompiledStatement, StatementId, StrategyCompiler};

/// Built-in demo scripts.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Script {
    /// 20 minute AMRAP of 5 pullups, 10 pushups, 15 squats.
    Amrap,
    /// 10 minute EMOM of 10 burpees.
    Emom,
    /// 21-15-9 thrusters and pullups.
    #[default]
    Fran,
}

impl Script {
    /// Statement table plus the root group to start.
    pub fn compile(self) -> (StrategyCompiler, Vec<StatementId>) {
        let statements = match self {
            Self::Amrap => vec![
                statement(
                    1,
                    vec![
                        FragmentValue::Label("Cindy".into()),
                        FragmentValue::Action("AMRAP".into()),
                        FragmentValue::Timer(TimerValue::countdown(20 * 60_000)),
                    ],
                )
                .with_children(vec![
                    vec![StatementId(2)],
                    vec![StatementId(3)],
                    vec![StatementId(4)],
                ]),
                movement(2, 5, "Pullups"),
                movement(3, 10, "Pushups"),
                movement(4, 15, "Air squats"),
            ],
            Self::Emom => vec![
                statement(
                    1,
                    vec![
                        FragmentValue::Action("EMOM".into()),
                        FragmentValue::Rounds(RoundsValue::new(Some(10))),
                        FragmentValue::Timer(TimerValue::countdown(60_000)),
                    ],
                )
                .with_children(vec![vec![StatementId(2)]]),
                movement(2, 10, "Burpees"),
            ],
            Self::Fran => vec![
                statement(
                    1,
                    vec![
                        FragmentValue::Label("Fran".into()),
                        FragmentValue::RepScheme(vec![21, 15, 9]),
                    ],
                )
                .with_children(vec![vec![StatementId(2)], vec![StatementId(3)]]),
                statement(2, vec![FragmentValue::Effort("Thrusters".into())]),
                statement(3, vec![FragmentValue::Effort("Pullups".into())]),
            ],
        };
        (StrategyCompiler::new(statements), vec![StatementId(1)])
    }
}

fn statement(id: u32, values: Vec<FragmentValue>) -> CompiledStatement {
    CompiledStatement::new(id, values.into_iter().map(Fragment::parsed).collect())
}

fn movement(id: u32, reps: u32, name: &str) -> CompiledStatement {
    statement(id, vec![FragmentValue::Rep(reps), FragmentValue::Effort(name.into())])
}

//! Pre-activation checks on a block's behavior list.
//!
//! Errors block activation: a behavior missing a required co-located
//! capability, two behaviors in the same exclusive group, or a consumer
//! ordered before a producer of the same memory tag. Warnings are reported
//! but do not block.
use thiserror::Error;
use workout_core::{ErrorSeverity, MemoryTag, WorkoutError};

use super::{Behavior, Capability};

/// Capabilities of which at most one behavior may provide any member.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExclusiveGroup {
    pub name: &'static str,
    pub members: &'static [Capability],
}

impl ExclusiveGroup {
    pub const fn new(name: &'static str, members: &'static [Capability]) -> Self {
        Self { name, members }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("{behavior} requires {requirement} (any of {any_of:?})")]
    MissingDependency {
        behavior: &'static str,
        requirement: &'static str,
        any_of: &'static [Capability],
    },

    #[error("exclusive group `{group}` has several members: {behaviors:?}")]
    ExclusivityViolation {
        group: &'static str,
        behaviors: Vec<&'static str>,
    },

    #[error("{consumer} reads `{tag}` before {producer} writes it")]
    Misordered {
        consumer: &'static str,
        producer: &'static str,
        tag: MemoryTag,
    },

    #[error("block has no behaviors")]
    EmptyBlock,

    #[error("capability {capability} is provided by {behaviors:?}")]
    DuplicateCapability {
        capability: Capability,
        behaviors: Vec<&'static str>,
    },

    #[error("no behavior can complete the block")]
    NoCompletion,

    #[error("{behavior} reads `{tag}` but no co-located behavior writes it")]
    UnproducedTag {
        behavior: &'static str,
        tag: MemoryTag,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

/// A block was rejected before activation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("block `{label}` failed composition validation: {}", summarize(.errors))]
pub struct CompositionError {
    pub label: String,
    pub errors: Vec<ValidationIssue>,
}

fn summarize(errors: &[ValidationIssue]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl WorkoutError for CompositionError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        "COMPOSITION_INVALID"
    }
}

#[derive(Clone, Debug)]
pub struct CompositionValidator {
    groups: Vec<ExclusiveGroup>,
}

impl Default for CompositionValidator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_GROUPS.to_vec())
    }
}

impl CompositionValidator {
    /// Exclusive groups of the built-in behavior library.
    pub const DEFAULT_GROUPS: &'static [ExclusiveGroup] = &[
        ExclusiveGroup::new("primary-timer", &[Capability::Timer]),
        ExclusiveGroup::new("round-source", &[Capability::RoundSource]),
        ExclusiveGroup::new("child-runner", &[Capability::ChildRunner]),
        ExclusiveGroup::new("round-driver", &[Capability::RoundAdvance, Capability::Interval]),
        ExclusiveGroup::new("timer-expiry", &[Capability::TimerCompletion, Capability::Interval]),
    ];

    pub fn new(groups: Vec<ExclusiveGroup>) -> Self {
        Self { groups }
    }

    #[must_use]
    pub fn with_group(mut self, group: ExclusiveGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn groups(&self) -> &[ExclusiveGroup] {
        &self.groups
    }

    pub fn validate(&self, behaviors: &[Box<dyn Behavior>]) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if behaviors.is_empty() {
            warnings.push(ValidationIssue::EmptyBlock);
            return ValidationResult {
                valid: true,
                errors,
                warnings,
            };
        }

        let provided: Vec<Capability> = behaviors
            .iter()
            .flat_map(|b| b.capabilities().iter().copied())
            .collect();

        for behavior in behaviors {
            for requirement in behavior.requirements() {
                if !requirement.any_of.iter().any(|cap| provided.contains(cap)) {
                    errors.push(ValidationIssue::MissingDependency {
                        behavior: behavior.name(),
                        requirement: requirement.name,
                        any_of: requirement.any_of,
                    });
                }
            }
        }

        for group in &self.groups {
            let members: Vec<&'static str> = behaviors
                .iter()
                .filter(|b| b.capabilities().iter().any(|cap| group.members.contains(cap)))
                .map(|b| b.name())
                .collect();
            if members.len() > 1 {
                errors.push(ValidationIssue::ExclusivityViolation {
                    group: group.name,
                    behaviors: members,
                });
            }
        }

        for (index, consumer) in behaviors.iter().enumerate() {
            for tag in consumer.consumes() {
                let later_producer = behaviors[index + 1..]
                    .iter()
                    .find(|producer| producer.produces().contains(tag));
                if let Some(producer) = later_producer {
                    errors.push(ValidationIssue::Misordered {
                        consumer: consumer.name(),
                        producer: producer.name(),
                        tag: *tag,
                    });
                }

                let produced = behaviors.iter().any(|b| b.produces().contains(tag));
                if !produced {
                    warnings.push(ValidationIssue::UnproducedTag {
                        behavior: consumer.name(),
                        tag: *tag,
                    });
                }
            }
        }

        let mut seen: Vec<Capability> = Vec::new();
        for capability in &provided {
            if seen.contains(capability) || self.is_grouped(*capability) {
                continue;
            }
            seen.push(*capability);
            let owners: Vec<&'static str> = behaviors
                .iter()
                .filter(|b| b.capabilities().contains(capability))
                .map(|b| b.name())
                .collect();
            if owners.len() > 1 {
                warnings.push(ValidationIssue::DuplicateCapability {
                    capability: *capability,
                    behaviors: owners,
                });
            }
        }

        if !provided.iter().any(|cap| cap.is_completing()) {
            warnings.push(ValidationIssue::NoCompletion);
        }

        ValidationResult {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    fn is_grouped(&self, capability: Capability) -> bool {
        self.groups
            .iter()
            .any(|group| group.members.contains(&capability))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::{Requirement, stage};

    struct Probe {
        name: &'static str,
        caps: &'static [Capability],
        reqs: &'static [Requirement],
        produces: &'static [MemoryTag],
        consumes: &'static [MemoryTag],
    }

    impl Probe {
        fn new(name: &'static str, caps: &'static [Capability]) -> Self {
            Self {
                name,
                caps,
                reqs: &[],
                produces: &[],
                consumes: &[],
            }
        }
    }

    impl Behavior for Probe {
        fn name(&self) -> &'static str {
            self.name
        }
        fn capabilities(&self) -> &'static [Capability] {
            self.caps
        }
        fn requirements(&self) -> &'static [Requirement] {
            self.reqs
        }
        fn priority(&self) -> i32 {
            stage::PROMOTION
        }
        fn produces(&self) -> &'static [MemoryTag] {
            self.produces
        }
        fn consumes(&self) -> &'static [MemoryTag] {
            self.consumes
        }
    }

    fn boxed(probes: Vec<Probe>) -> Vec<Box<dyn Behavior>> {
        probes
            .into_iter()
            .map(|p| Box::new(p) as Box<dyn Behavior>)
            .collect()
    }

    const NEEDS_TIMER: &[Requirement] = &[Requirement::new("a timer", &[Capability::Timer])];

    #[test]
    fn missing_dependency_is_an_error() {
        let mut tick = Probe::new("tick", &[Capability::TimerTick, Capability::TimerCompletion]);
        tick.reqs = NEEDS_TIMER;

        let result = CompositionValidator::default().validate(&boxed(vec![tick]));

        assert!(!result.valid);
        assert!(matches!(
            result.errors.as_slice(),
            [ValidationIssue::MissingDependency { behavior: "tick", .. }]
        ));
    }

    #[test]
    fn exclusive_group_allows_one_member() {
        let behaviors = boxed(vec![
            Probe::new("advance", &[Capability::RoundAdvance]),
            Probe::new("interval", &[Capability::Interval]),
        ]);

        let result = CompositionValidator::default().validate(&behaviors);

        assert!(!result.valid);
        assert!(result.errors.contains(&ValidationIssue::ExclusivityViolation {
            group: "round-driver",
            behaviors: vec!["advance", "interval"],
        }));
    }

    #[test]
    fn consumer_before_producer_is_misordered() {
        let mut reader = Probe::new("reader", &[Capability::LeafCompletion]);
        reader.consumes = &[MemoryTag::ROUNDS];
        let mut writer = Probe::new("writer", &[]);
        writer.produces = &[MemoryTag::ROUNDS];

        let result = CompositionValidator::default().validate(&boxed(vec![reader, writer]));

        assert_eq!(
            result.errors,
            vec![ValidationIssue::Misordered {
                consumer: "reader",
                producer: "writer",
                tag: MemoryTag::ROUNDS,
            }]
        );
    }

    #[test]
    fn warnings_do_not_invalidate() {
        let mut reader = Probe::new("reader", &[Capability::Display]);
        reader.consumes = &[MemoryTag::REP_TARGET];
        let behaviors = boxed(vec![reader, Probe::new("again", &[Capability::Display])]);

        let result = CompositionValidator::default().validate(&behaviors);

        assert!(result.valid);
        assert!(result.warnings.contains(&ValidationIssue::NoCompletion));
        assert!(result.warnings.iter().any(|w| matches!(w, ValidationIssue::UnproducedTag { .. })));
        assert!(result.warnings.iter().any(|w| matches!(
            w,
            ValidationIssue::DuplicateCapability { capability: Capability::Display, .. }
        )));
    }

    #[test]
    fn presentation_behaviors_declare_what_they_read() {
        use crate::behaviors::{Display, RoundInit, SegmentOutput, TimerInit};

        let behaviors: Vec<Box<dyn Behavior>> = vec![
            Box::new(SegmentOutput),
            Box::new(Display),
            Box::new(RoundInit::new(Some(3))),
            Box::new(TimerInit::count_up(None).unwrap()),
        ];

        let result = CompositionValidator::default().validate(&behaviors);

        assert!(!result.valid);
        let misordered: Vec<(&str, MemoryTag)> = result
            .errors
            .iter()
            .filter_map(|issue| match issue {
                ValidationIssue::Misordered { consumer, tag, .. } => Some((*consumer, *tag)),
                _ => None,
            })
            .collect();
        assert_eq!(
            misordered,
            [
                ("segment_output", MemoryTag::TIMER),
                ("segment_output", MemoryTag::ROUNDS),
                ("display", MemoryTag::ROUNDS),
            ]
        );
    }

    #[test]
    fn empty_block_only_warns() {
        let result = CompositionValidator::default().validate(&[]);
        assert!(result.valid);
        assert_eq!(result.warnings, vec![ValidationIssue::EmptyBlock]);
    }
}

//! Per-exercise training frequency.
//!
//! Frequencies are a fixed table keyed by exercise id. Each row also records
//! the exercise title it was originally keyed on, so title lookups keep
//! working for callers that only know the title.

use crate::{Exercise, Recurrence};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Frequency used for any exercise missing from the table
pub const DEFAULT_RECURRENCE: Recurrence = Recurrence::new(1, 3);

/// (exercise id, title, recurrence)
const BUILTIN_FREQUENCIES: &[(&str, &str, Recurrence)] = &[
    ("isometric_tension", "Isometric muscle tension", Recurrence::new(3, 7)),
    ("neuroplastic_gymnastics", "Neuroplastic gymnastics", Recurrence::new(2, 5)),
    ("passive_joint_mobilization", "Passive joint mobilization", Recurrence::new(2, 6)),
    ("breathing_exercises", "Breathing exercises", Recurrence::new(5, 7)),
    ("fine_motor_training", "Fine motor skills training", Recurrence::new(2, 7)),
    ("achilles_stretch", "Achilles tendon stretch", Recurrence::new(1, 3)),
    ("shoulder_stabilization", "Shoulder joint stabilization", Recurrence::new(2, 4)),
    ("abdominal_recovery", "Abdominal muscle recovery", Recurrence::new(3, 5)),
    ("resistance_breathing", "Resistance breathing", Recurrence::new(4, 7)),
    ("aqua_aerobics", "Aqua aerobics", Recurrence::new(1, 3)),
    ("balance_therapy", "Balance therapy", Recurrence::new(2, 5)),
];

static BUILTIN_TABLE: Lazy<RecurrenceTable> = Lazy::new(|| RecurrenceTable {
    by_id: BUILTIN_FREQUENCIES
        .iter()
        .map(|(id, _, r)| (id.to_string(), *r))
        .collect(),
    default: DEFAULT_RECURRENCE,
});

/// Exercise id -> recurrence, with a fallback for unknown ids
#[derive(Clone, Debug)]
pub struct RecurrenceTable {
    by_id: BTreeMap<String, Recurrence>,
    default: Recurrence,
}

impl RecurrenceTable {
    /// The built-in table
    pub fn builtin() -> &'static RecurrenceTable {
        &BUILTIN_TABLE
    }

    /// An empty table that resolves everything to the default
    pub fn empty() -> Self {
        Self {
            by_id: BTreeMap::new(),
            default: DEFAULT_RECURRENCE,
        }
    }

    /// Add or replace the row for `exercise_id`
    pub fn with(mut self, exercise_id: impl Into<String>, recurrence: Recurrence) -> Self {
        self.by_id.insert(exercise_id.into(), recurrence);
        self
    }

    /// Built-in table with configured rows layered on top
    pub fn with_overrides(overrides: &BTreeMap<String, Recurrence>) -> Self {
        let mut table = Self::builtin().clone();
        for (id, recurrence) in overrides {
            tracing::debug!("Frequency override for '{}': {:?}", id, recurrence);
            table.by_id.insert(id.clone(), *recurrence);
        }
        table
    }

    /// Recurrence for an exercise id; never fails
    pub fn resolve(&self, exercise_id: &str) -> Recurrence {
        self.by_id.get(exercise_id).copied().unwrap_or(self.default)
    }

    pub fn for_exercise(&self, exercise: &Exercise) -> Recurrence {
        self.resolve(&exercise.id)
    }
}

/// Built-in recurrence looked up by exercise title
pub fn resolve_by_title(title: &str) -> Recurrence {
    BUILTIN_FREQUENCIES
        .iter()
        .find(|(_, t, _)| *t == title)
        .map(|(_, _, r)| *r)
        .unwrap_or(DEFAULT_RECURRENCE)
}

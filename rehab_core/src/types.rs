//! Core domain types for the rehabilitation tracker.
//!
//! This module defines the records kept in the store:
//! - Users and their credentials
//! - Intake questionnaires
//! - Exercises and their recurrence descriptors
//! - Schedules and the training sessions they own
//! - Free-form exercise history

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// ============================================================================
// Users
// ============================================================================

/// A registered user, as stored
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
}

/// Public view of a user (never carries the hash)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        UserProfile {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

// ============================================================================
// Questionnaire
// ============================================================================

/// Fields a user submits on the intake questionnaire
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuestionnaireInput {
    pub name: String,
    pub gender: String,
    pub weight: f64,
    pub height: f64,
    pub main_injury_type: String,
    pub specific_injury: String,
    pub pain_level: u8,
    /// Preferred time of day. Stored, not used by schedule generation.
    pub training_time: String,
}

/// A stored questionnaire; at most one per user
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Questionnaire {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(flatten)]
    pub answers: QuestionnaireInput,
}

// ============================================================================
// Exercises
// ============================================================================

/// A catalog exercise
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Injury label -> guidance specific to that injury
    #[serde(default)]
    pub injury_guidance: BTreeMap<String, String>,
    pub suitable_for: Vec<String>,
    pub max_discomfort_level: u8,
    pub steps: Vec<String>,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
}

impl Exercise {
    /// True when `specific_injury` occurs inside any suitable-for label
    pub fn suits(&self, specific_injury: &str) -> bool {
        self.suitable_for
            .iter()
            .any(|label| label.contains(specific_injury))
    }
}

/// How often an exercise should be trained
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recurrence {
    pub times_per_day: u32,
    pub days_per_week: u32,
}

impl Recurrence {
    pub const fn new(times_per_day: u32, days_per_week: u32) -> Self {
        Self {
            times_per_day,
            days_per_week,
        }
    }
}

// ============================================================================
// Schedules and trainings
// ============================================================================

/// A generated training schedule
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Schedule {
    pub id: Uuid,
    pub user_id: Uuid,
    pub questionnaire_id: Uuid,
    pub injury_type: String,
    pub specific_injury: String,
    pub generated_at: DateTime<Utc>,
    pub is_active: bool,
}

/// One dated, timed session of an exercise within a schedule
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Training {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub exercise_id: String,
    pub date: NaiveDate,
    /// `HH:MM`; the hour may exceed 23 on crowded days
    pub time: String,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Training {
    /// Set the completion flag, keeping `completed_at` in step with it
    pub fn set_completed(&mut self, is_completed: bool, now: DateTime<Utc>) {
        if is_completed && !self.is_completed {
            self.completed_at = Some(now);
        } else if !is_completed {
            self.completed_at = None;
        }
        self.is_completed = is_completed;
    }
}

/// A schedule together with its trainings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScheduleWithTrainings {
    #[serde(flatten)]
    pub schedule: Schedule,
    pub trainings: Vec<Training>,
}

/// Fields for an ad hoc training
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewTraining {
    pub exercise_id: String,
    pub date: NaiveDate,
    pub time: String,
    #[serde(default)]
    pub is_completed: bool,
}

/// Partial update of a training; `None` leaves a field unchanged
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TrainingUpdate {
    pub exercise_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub is_completed: Option<bool>,
}

// ============================================================================
// Exercise history
// ============================================================================

/// Fields for a free-form history entry
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewHistoryEntry {
    pub user_id: Uuid,
    pub exercise_name: String,
    pub performed_at: DateTime<Utc>,
    pub duration_seconds: u32,
    pub notes: Option<String>,
    #[serde(default = "default_sets")]
    pub sets: u32,
    #[serde(default)]
    pub pain_level: u8,
}

fn default_sets() -> u32 {
    1
}

/// A stored history entry
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    #[serde(flatten)]
    pub entry: NewHistoryEntry,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn training() -> Training {
        Training {
            id: Uuid::new_v4(),
            schedule_id: Uuid::new_v4(),
            exercise_id: "balance_therapy".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
            time: "09:30".into(),
            is_completed: false,
            completed_at: None,
        }
    }

    #[test]
    fn test_set_completed_stamps_and_clears() {
        let now = Utc::now();
        let mut t = training();

        t.set_completed(true, now);
        assert!(t.is_completed);
        assert_eq!(t.completed_at, Some(now));

        t.set_completed(false, now);
        assert!(!t.is_completed);
        assert_eq!(t.completed_at, None);
    }

    #[test]
    fn test_set_completed_twice_keeps_first_stamp() {
        let first = Utc::now();
        let later = first + Duration::minutes(5);
        let mut t = training();

        t.set_completed(true, first);
        t.set_completed(true, later);
        assert_eq!(t.completed_at, Some(first));
    }

    #[test]
    fn test_suits_is_substring_match() {
        let exercise = Exercise {
            id: "x".into(),
            title: "X".into(),
            description: String::new(),
            injury_guidance: BTreeMap::new(),
            suitable_for: vec!["Torn ligaments (knee)".into()],
            max_discomfort_level: 3,
            steps: vec![],
            tags: vec![],
            image_url: None,
        };

        assert!(exercise.suits("Torn ligaments"));
        assert!(exercise.suits("ligaments (knee)"));
        assert!(!exercise.suits("torn ligaments"));
    }

    #[test]
    fn test_questionnaire_flattens_answers() {
        let q = Questionnaire {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            answers: QuestionnaireInput {
                name: "Ann".into(),
                gender: "female".into(),
                weight: 61.5,
                height: 168.0,
                main_injury_type: "Trauma".into(),
                specific_injury: "Shoulder dislocation".into(),
                pain_level: 4,
                training_time: "morning".into(),
            },
        };

        let value = serde_json::to_value(&q).unwrap();
        assert_eq!(value["specific_injury"], "Shoulder dislocation");
        assert_eq!(value["pain_level"], 4);
    }
}

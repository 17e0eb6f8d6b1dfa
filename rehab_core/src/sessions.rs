//! Training session operations scoped under an owned schedule.
//!
//! Every operation first checks that the schedule exists and belongs to the
//! requester, then that the training belongs to the schedule. Either failure
//! is reported as `NotFound` so a caller cannot tell foreign schedules from
//! missing ones.

use crate::calendar::is_valid_slot_time;
use crate::store::{RecordStore, Tables};
use crate::{Error, NewTraining, Result, Training, TrainingUpdate};
use chrono::{DateTime, Utc};
use uuid::Uuid;

fn check_schedule(tables: &Tables, schedule_id: Uuid, requester: Uuid) -> Result<()> {
    tables
        .owned_schedule(schedule_id, requester)
        .map(|_| ())
        .ok_or_else(|| Error::NotFound(format!("Schedule {}", schedule_id)))
}

fn training_in_schedule<'t>(
    tables: &'t mut Tables,
    schedule_id: Uuid,
    training_id: Uuid,
) -> Result<&'t mut Training> {
    tables
        .trainings
        .get_mut(&training_id)
        .filter(|t| t.schedule_id == schedule_id)
        .ok_or_else(|| Error::NotFound(format!("Training {}", training_id)))
}

fn check_fields(tables: &Tables, exercise_id: Option<&str>, time: Option<&str>) -> Result<()> {
    if let Some(id) = exercise_id {
        if !tables.exercises.contains_key(id) {
            return Err(Error::NotFound(format!("Exercise '{}'", id)));
        }
    }
    if let Some(time) = time {
        if !is_valid_slot_time(time) {
            return Err(Error::Validation(format!(
                "time '{}' is not in HH:MM form",
                time
            )));
        }
    }
    Ok(())
}

/// Set or clear the completion flag of a training
pub fn mark_completed<S: RecordStore>(
    store: &S,
    schedule_id: Uuid,
    training_id: Uuid,
    is_completed: bool,
    requester: Uuid,
    now: DateTime<Utc>,
) -> Result<Training> {
    store.transaction(|tables| {
        check_schedule(tables, schedule_id, requester)?;
        let training = training_in_schedule(tables, schedule_id, training_id)?;
        training.set_completed(is_completed, now);

        tracing::info!(
            "Training {} marked {}",
            training_id,
            if is_completed { "completed" } else { "not completed" }
        );
        Ok(training.clone())
    })
}

/// Trainings of an owned schedule, by date then time
pub fn list_sessions<S: RecordStore>(
    store: &S,
    schedule_id: Uuid,
    requester: Uuid,
) -> Result<Vec<Training>> {
    store.read(|tables| {
        check_schedule(tables, schedule_id, requester)?;
        Ok(tables.trainings_for_schedule(schedule_id))
    })
}

/// Add an ad hoc training to an owned schedule
pub fn add_session<S: RecordStore>(
    store: &S,
    schedule_id: Uuid,
    new: NewTraining,
    requester: Uuid,
    now: DateTime<Utc>,
) -> Result<Training> {
    store.transaction(|tables| {
        check_schedule(tables, schedule_id, requester)?;
        check_fields(tables, Some(&new.exercise_id), Some(&new.time))?;

        let mut training = Training {
            id: Uuid::new_v4(),
            schedule_id,
            exercise_id: new.exercise_id,
            date: new.date,
            time: new.time,
            is_completed: false,
            completed_at: None,
        };
        training.set_completed(new.is_completed, now);
        tables.insert_training(training.clone())?;

        tracing::info!(
            "Added training {} ({} on {} {}) to schedule {}",
            training.id,
            training.exercise_id,
            training.date,
            training.time,
            schedule_id
        );
        Ok(training)
    })
}

/// Overwrite the given fields of a training
pub fn replace_session_fields<S: RecordStore>(
    store: &S,
    schedule_id: Uuid,
    training_id: Uuid,
    update: TrainingUpdate,
    requester: Uuid,
    now: DateTime<Utc>,
) -> Result<Training> {
    store.transaction(|tables| {
        check_schedule(tables, schedule_id, requester)?;
        check_fields(tables, update.exercise_id.as_deref(), update.time.as_deref())?;

        let training = training_in_schedule(tables, schedule_id, training_id)?;
        if let Some(exercise_id) = update.exercise_id {
            training.exercise_id = exercise_id;
        }
        if let Some(date) = update.date {
            training.date = date;
        }
        if let Some(time) = update.time {
            training.time = time;
        }
        if let Some(is_completed) = update.is_completed {
            training.set_completed(is_completed, now);
        }

        tracing::info!("Updated training {}", training_id);
        Ok(training.clone())
    })
}

/// Delete a training from an owned schedule
pub fn remove_session<S: RecordStore>(
    store: &S,
    schedule_id: Uuid,
    training_id: Uuid,
    requester: Uuid,
) -> Result<Training> {
    store.transaction(|tables| {
        check_schedule(tables, schedule_id, requester)?;
        training_in_schedule(tables, schedule_id, training_id)?;

        let removed = tables
            .trainings
            .remove(&training_id)
            .ok_or_else(|| Error::NotFound(format!("Training {}", training_id)))?;

        tracing::info!("Removed training {} from schedule {}", training_id, schedule_id);
        Ok(removed)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::seed_default_catalog;
    use crate::store::MemoryStore;
    use crate::Schedule;
    use chrono::{Duration, NaiveDate};

    struct Fixture {
        store: MemoryStore,
        owner: Uuid,
        schedule_id: Uuid,
        training_id: Uuid,
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::new();
        seed_default_catalog(&store).unwrap();

        let owner = Uuid::new_v4();
        let schedule = Schedule {
            id: Uuid::new_v4(),
            user_id: owner,
            questionnaire_id: Uuid::new_v4(),
            injury_type: "Neurology".into(),
            specific_injury: "Stroke".into(),
            generated_at: Utc::now(),
            is_active: true,
        };
        let training = Training {
            id: Uuid::new_v4(),
            schedule_id: schedule.id,
            exercise_id: "breathing_exercises".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            time: "09:30".into(),
            is_completed: false,
            completed_at: None,
        };
        let (schedule_id, training_id) = (schedule.id, training.id);

        store
            .transaction(|tables| {
                tables.schedules.insert(schedule.id, schedule);
                tables.insert_training(training)
            })
            .unwrap();

        Fixture {
            store,
            owner,
            schedule_id,
            training_id,
        }
    }

    fn new_training(exercise_id: &str, time: &str) -> NewTraining {
        NewTraining {
            exercise_id: exercise_id.into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            time: time.into(),
            is_completed: false,
        }
    }

    #[test]
    fn test_complete_then_undo() {
        let f = fixture();
        let now = Utc::now();

        let done =
            mark_completed(&f.store, f.schedule_id, f.training_id, true, f.owner, now).unwrap();
        assert!(done.is_completed);
        assert_eq!(done.completed_at, Some(now));

        let undone =
            mark_completed(&f.store, f.schedule_id, f.training_id, false, f.owner, now).unwrap();
        assert!(!undone.is_completed);
        assert_eq!(undone.completed_at, None);
    }

    #[test]
    fn test_completing_twice_keeps_first_timestamp() {
        let f = fixture();
        let first = Utc::now();
        let later = first + Duration::hours(1);

        mark_completed(&f.store, f.schedule_id, f.training_id, true, f.owner, first).unwrap();
        let again =
            mark_completed(&f.store, f.schedule_id, f.training_id, true, f.owner, later).unwrap();
        assert_eq!(again.completed_at, Some(first));
    }

    #[test]
    fn test_foreign_schedule_is_not_found_and_unchanged() {
        let f = fixture();
        let stranger = Uuid::new_v4();

        let result =
            mark_completed(&f.store, f.schedule_id, f.training_id, true, stranger, Utc::now());
        assert!(matches!(result, Err(Error::NotFound(_))));

        let trainings = list_sessions(&f.store, f.schedule_id, f.owner).unwrap();
        assert!(!trainings[0].is_completed);
    }

    #[test]
    fn test_training_from_other_schedule_is_not_found() {
        let f = fixture();
        let other = fixture();
        // Move the other fixture's schedule into this store under the same owner
        let schedule = Schedule {
            id: other.schedule_id,
            user_id: f.owner,
            questionnaire_id: Uuid::new_v4(),
            injury_type: "x".into(),
            specific_injury: "y".into(),
            generated_at: Utc::now(),
            is_active: true,
        };
        f.store
            .transaction(|tables| {
                tables.schedules.insert(schedule.id, schedule);
                Ok(())
            })
            .unwrap();

        let result =
            mark_completed(&f.store, other.schedule_id, f.training_id, true, f.owner, Utc::now());
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_add_session_validates_exercise_and_time() {
        let f = fixture();
        let now = Utc::now();

        let added = add_session(
            &f.store,
            f.schedule_id,
            new_training("balance_therapy", "11:00"),
            f.owner,
            now,
        )
        .unwrap();
        assert_eq!(added.schedule_id, f.schedule_id);

        let unknown = add_session(
            &f.store,
            f.schedule_id,
            new_training("moonwalk", "11:00"),
            f.owner,
            now,
        );
        assert!(matches!(unknown, Err(Error::NotFound(_))));

        let bad_time = add_session(
            &f.store,
            f.schedule_id,
            new_training("balance_therapy", "11h00"),
            f.owner,
            now,
        );
        assert!(matches!(bad_time, Err(Error::Validation(_))));

        assert_eq!(list_sessions(&f.store, f.schedule_id, f.owner).unwrap().len(), 2);
    }

    #[test]
    fn test_add_completed_session_is_stamped() {
        let f = fixture();
        let now = Utc::now();
        let mut new = new_training("balance_therapy", "11:00");
        new.is_completed = true;

        let added = add_session(&f.store, f.schedule_id, new, f.owner, now).unwrap();
        assert_eq!(added.completed_at, Some(now));
    }

    #[test]
    fn test_replace_fields_partially() {
        let f = fixture();
        let now = Utc::now();
        let update = TrainingUpdate {
            time: Some("12:30".into()),
            is_completed: Some(true),
            ..Default::default()
        };

        let updated =
            replace_session_fields(&f.store, f.schedule_id, f.training_id, update, f.owner, now)
                .unwrap();
        assert_eq!(updated.time, "12:30");
        assert_eq!(updated.exercise_id, "breathing_exercises");
        assert_eq!(updated.completed_at, Some(now));

        let bad = TrainingUpdate {
            exercise_id: Some("moonwalk".into()),
            ..Default::default()
        };
        let result =
            replace_session_fields(&f.store, f.schedule_id, f.training_id, bad, f.owner, now);
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_remove_session() {
        let f = fixture();

        remove_session(&f.store, f.schedule_id, f.training_id, f.owner).unwrap();
        assert!(list_sessions(&f.store, f.schedule_id, f.owner).unwrap().is_empty());

        let again = remove_session(&f.store, f.schedule_id, f.training_id, f.owner);
        assert!(matches!(again, Err(Error::NotFound(_))));
    }
}

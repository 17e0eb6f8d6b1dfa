//! Schedule generation.
//!
//! Turns a questionnaire into a schedule of dated, timed trainings:
//!
//! 1. **Selection**: every catalog exercise whose suitable-for labels contain
//!    the questionnaire's specific injury as a substring
//! 2. **Expansion**: for each day of the horizon, for each selected exercise,
//!    emit a training when the exercise's recurrence is due that day
//! 3. **Time slots**: the k-th due exercise of a day is placed
//!    `k * slot_minutes` after the day start (first one at 09:30 by default)
//!
//! The schedule row and all of its trainings are committed in one
//! transaction.

use crate::calendar::{is_due, slot_time};
use crate::config::ScheduleConfig;
use crate::recurrence::RecurrenceTable;
use crate::store::RecordStore;
use crate::{Error, Exercise, Questionnaire, Result, Schedule, ScheduleWithTrainings, Training};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

/// Runtime inputs for schedule generation
#[derive(Clone, Debug)]
pub struct ScheduleContext<'a> {
    /// Generation timestamp stored on the schedule
    pub now: DateTime<Utc>,
    /// First day of the horizon, in the caller's time zone
    pub today: NaiveDate,
    pub recurrence: &'a RecurrenceTable,
    pub settings: &'a ScheduleConfig,
}

/// Exercises suitable for `specific_injury`, in catalog order
pub fn eligible_exercises<'a, I>(catalog: I, specific_injury: &str) -> Vec<&'a Exercise>
where
    I: IntoIterator<Item = &'a Exercise>,
{
    catalog
        .into_iter()
        .filter(|ex| ex.suits(specific_injury))
        .collect()
}

/// Expand a schedule over the horizon starting at `start`
pub fn expand_trainings(
    schedule_id: Uuid,
    exercises: &[&Exercise],
    start: NaiveDate,
    ctx: &ScheduleContext<'_>,
) -> Vec<Training> {
    let settings = ctx.settings;
    let mut trainings = Vec::new();

    for day in 0..i64::from(settings.horizon_days) {
        let date = start + Duration::days(day);
        let mut due_today = 0u32;

        for exercise in exercises {
            let recurrence = ctx.recurrence.for_exercise(exercise);
            if !is_due(date, recurrence) {
                continue;
            }

            due_today += 1;
            trainings.push(Training {
                id: Uuid::new_v4(),
                schedule_id,
                exercise_id: exercise.id.clone(),
                date,
                time: slot_time(
                    settings.day_start_hour,
                    due_today.saturating_mul(settings.slot_minutes),
                ),
                is_completed: false,
                completed_at: None,
            });
        }
    }

    trainings
}

/// Generate and persist a schedule from a questionnaire owned by `requester`
///
/// Fails with `NotFound` when the questionnaire is missing or owned by someone
/// else, or when no exercise suits its specific injury. Out-of-range
/// settings are a `Config` error. A failed write is reported as `Internal`
/// and leaves nothing behind.
pub fn generate_schedule<S: RecordStore>(
    store: &S,
    ctx: &ScheduleContext<'_>,
    questionnaire_id: Uuid,
    requester: Uuid,
) -> Result<ScheduleWithTrainings> {
    ctx.settings.validate()?;

    let (questionnaire, exercises) = store.read(|tables| {
        let questionnaire = tables
            .questionnaires
            .get(&questionnaire_id)
            .filter(|q| q.user_id == requester)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Questionnaire {}", questionnaire_id)))?;

        let exercises: Vec<Exercise> =
            eligible_exercises(tables.exercises.values(), &questionnaire.answers.specific_injury)
                .into_iter()
                .cloned()
                .collect();

        Ok((questionnaire, exercises))
    })?;

    tracing::info!(
        "Questionnaire {} (injury '{}', specific '{}'): {} suitable exercises",
        questionnaire.id,
        questionnaire.answers.main_injury_type,
        questionnaire.answers.specific_injury,
        exercises.len()
    );

    if exercises.is_empty() {
        return Err(Error::NotFound(format!(
            "Suitable exercises for '{}'",
            questionnaire.answers.specific_injury
        )));
    }

    let schedule = new_schedule(&questionnaire, ctx.now);
    let selected: Vec<&Exercise> = exercises.iter().collect();
    let trainings = expand_trainings(schedule.id, &selected, ctx.today, ctx);

    store
        .transaction(|tables| {
            tables.schedules.insert(schedule.id, schedule.clone());
            for training in &trainings {
                tables.insert_training(training.clone())?;
            }
            Ok(())
        })
        .map_err(|e| {
            tracing::error!("Schedule generation for {} rolled back: {}", requester, e);
            Error::internal("failed to persist generated schedule", e)
        })?;

    tracing::info!(
        "Generated schedule {} with {} trainings from {} over {} days",
        schedule.id,
        trainings.len(),
        ctx.today,
        ctx.settings.horizon_days
    );

    Ok(ScheduleWithTrainings {
        schedule,
        trainings,
    })
}

/// Schedule row with the questionnaire's labels copied at this instant
fn new_schedule(questionnaire: &Questionnaire, now: DateTime<Utc>) -> Schedule {
    Schedule {
        id: Uuid::new_v4(),
        user_id: questionnaire.user_id,
        questionnaire_id: questionnaire.id,
        injury_type: questionnaire.answers.main_injury_type.clone(),
        specific_injury: questionnaire.answers.specific_injury.clone(),
        generated_at: now,
        is_active: true,
    }
}

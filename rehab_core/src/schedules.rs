//! Listing and maintenance of generated schedules.

use crate::store::{sort_trainings, RecordStore};
use crate::{Error, Result, Schedule, ScheduleWithTrainings, Training};
use chrono::{Days, NaiveDate};
use uuid::Uuid;

/// A user's active schedules with their trainings, oldest first
pub fn list_schedules<S: RecordStore>(
    store: &S,
    user_id: Uuid,
    requester: Uuid,
) -> Result<Vec<ScheduleWithTrainings>> {
    if user_id != requester {
        return Err(Error::Forbidden(
            "cannot list another user's schedules".into(),
        ));
    }

    store.read(|tables| {
        let mut schedules: Vec<&Schedule> = tables
            .schedules
            .values()
            .filter(|s| s.user_id == user_id && s.is_active)
            .collect();
        schedules.sort_by_key(|s| (s.generated_at, s.id));

        Ok(schedules
            .into_iter()
            .map(|s| ScheduleWithTrainings {
                schedule: s.clone(),
                trainings: tables.trainings_for_schedule(s.id),
            })
            .collect())
    })
}

/// Activate or deactivate an owned schedule
pub fn set_schedule_active<S: RecordStore>(
    store: &S,
    schedule_id: Uuid,
    active: bool,
    requester: Uuid,
) -> Result<Schedule> {
    store.transaction(|tables| {
        let schedule = tables
            .schedules
            .get_mut(&schedule_id)
            .filter(|s| s.user_id == requester)
            .ok_or_else(|| Error::NotFound(format!("Schedule {}", schedule_id)))?;

        schedule.is_active = active;
        tracing::info!(
            "Schedule {} {}",
            schedule_id,
            if active { "activated" } else { "deactivated" }
        );
        Ok(schedule.clone())
    })
}

/// Delete an owned schedule and all of its trainings
///
/// Returns the number of trainings removed.
pub fn delete_schedule<S: RecordStore>(
    store: &S,
    schedule_id: Uuid,
    requester: Uuid,
) -> Result<usize> {
    store.transaction(|tables| {
        if tables.owned_schedule(schedule_id, requester).is_none() {
            return Err(Error::NotFound(format!("Schedule {}", schedule_id)));
        }

        let (_, removed) = tables
            .remove_schedule(schedule_id)
            .ok_or_else(|| Error::NotFound(format!("Schedule {}", schedule_id)))?;

        tracing::info!(
            "Deleted schedule {} and {} trainings",
            schedule_id,
            removed
        );
        Ok(removed)
    })
}

/// Trainings of the requester's active schedules within `[from, from + days)`
///
/// A window reaching past the last representable date is a `Validation`
/// error.
pub fn agenda<S: RecordStore>(
    store: &S,
    requester: Uuid,
    from: NaiveDate,
    days: u32,
) -> Result<Vec<Training>> {
    let until = from
        .checked_add_days(Days::new(u64::from(days)))
        .ok_or_else(|| {
            Error::Validation(format!("agenda of {} days from {} is out of range", days, from))
        })?;

    store.read(|tables| {
        let mut trainings: Vec<Training> = tables
            .trainings
            .values()
            .filter(|t| t.date >= from && t.date < until)
            .filter(|t| {
                tables
                    .owned_schedule(t.schedule_id, requester)
                    .is_some_and(|s| s.is_active)
            })
            .cloned()
            .collect();

        sort_trainings(&mut trainings);
        Ok(trainings)
    })
}

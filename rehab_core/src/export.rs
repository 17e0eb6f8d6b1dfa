//! CSV export of a schedule's trainings.

use crate::store::RecordStore;
use crate::{Error, Result, Training};
use std::fs::File;
use std::path::Path;
use uuid::Uuid;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    training_id: String,
    date: String,
    time: String,
    exercise_id: String,
    exercise_title: String,
    is_completed: bool,
    completed_at: Option<String>,
}

impl CsvRow {
    fn new(training: &Training, exercise_title: String) -> Self {
        CsvRow {
            training_id: training.id.to_string(),
            date: training.date.format("%Y-%m-%d").to_string(),
            time: training.time.clone(),
            exercise_id: training.exercise_id.clone(),
            exercise_title,
            is_completed: training.is_completed,
            completed_at: training.completed_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Write an owned schedule's trainings to `path` as CSV
///
/// The file is replaced, written with a header row and fsynced. Returns the
/// number of trainings written.
pub fn export_schedule_csv<S: RecordStore>(
    store: &S,
    schedule_id: Uuid,
    requester: Uuid,
    path: &Path,
) -> Result<usize> {
    let rows = store.read(|tables| {
        if tables.owned_schedule(schedule_id, requester).is_none() {
            return Err(Error::NotFound(format!("Schedule {}", schedule_id)));
        }

        Ok(tables
            .trainings_for_schedule(schedule_id)
            .iter()
            .map(|t| {
                // Exercises can disappear from a hand-edited catalog
                let title = tables
                    .exercises
                    .get(&t.exercise_id)
                    .map(|e| e.title.clone())
                    .unwrap_or_default();
                CsvRow::new(t, title)
            })
            .collect::<Vec<_>>())
    })?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(file);

    for row in &rows {
        writer.serialize(row)?;
    }

    // Flush and sync to disk
    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!(
        "Exported {} trainings of schedule {} to {:?}",
        rows.len(),
        schedule_id,
        path
    );
    Ok(rows.len())
}

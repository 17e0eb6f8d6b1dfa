//! Default exercise catalog and read access to the stored catalog.
//!
//! The built-in exercises are seeded into an empty store on first open.
//! After that the store is the source of truth.

use crate::store::RecordStore;
use crate::{Error, Exercise, Result};
use once_cell::sync::Lazy;
use std::collections::BTreeSet;

/// Cached default catalog, built once
static DEFAULT_EXERCISES: Lazy<Vec<Exercise>> = Lazy::new(build_default_exercises);

/// Get a reference to the built-in exercises
pub fn default_exercises() -> &'static [Exercise] {
    &DEFAULT_EXERCISES
}

#[allow(clippy::too_many_arguments)]
fn exercise(
    id: &str,
    title: &str,
    description: &str,
    guidance: &[(&str, &str)],
    suitable_for: &[&str],
    max_discomfort_level: u8,
    steps: &[&str],
    tags: &[&str],
    image_url: &str,
) -> Exercise {
    Exercise {
        id: id.into(),
        title: title.into(),
        description: description.into(),
        injury_guidance: guidance
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        suitable_for: suitable_for.iter().map(|s| s.to_string()).collect(),
        max_discomfort_level,
        steps: steps.iter().map(|s| s.to_string()).collect(),
        tags: tags.iter().map(|s| s.to_string()).collect(),
        image_url: Some(image_url.into()),
    }
}

fn build_default_exercises() -> Vec<Exercise> {
    vec![
        exercise(
            "isometric_tension",
            "Isometric muscle tension",
            "Strengthens muscles without moving the joint",
            &[
                (
                    "Limb fracture",
                    "Keeps muscle tone without risking displacement of bone fragments. \
                     Recommended while the limb is immobilized.",
                ),
                (
                    "Joint replacement",
                    "Prepares the muscles for load after surgery and lowers the risk of \
                     post-operative complications.",
                ),
            ],
            &["Limb fracture", "Joint replacement"],
            3,
            &[
                "Tense the muscles of the limb for 5-7 seconds",
                "Relax for 10 seconds",
                "Repeat 10 times for each muscle group",
            ],
            &["No movement", "Early stage"],
            "https://alfagym.ru/wp-content/uploads/0/f/7/0f7116f26b4589c244b0dbea5a85868f.png",
        ),
        exercise(
            "neuroplastic_gymnastics",
            "Neuroplastic gymnastics",
            "Restores neuromuscular control",
            &[
                (
                    "Stroke",
                    "Stimulates brain neuroplasticity through repeated movement and helps \
                     recover lost motor function.",
                ),
                (
                    "Traumatic brain injury",
                    "Improves interhemispheric coordination and reduces spasticity after \
                     long immobilization.",
                ),
            ],
            &["Stroke", "Traumatic brain injury"],
            2,
            &[
                "Cross-body movements of arms and legs",
                "Mirror drawing with both hands",
                "Exercises on a balance cushion",
            ],
            &["Neurology", "Rehabilitation"],
            "https://fs-thb02.getcourse.ru/fileservice/file/thumbnail/h/f7cf7029e510f783d145a7dfbf012b3a.jpg/s/f1200x/a/27502/sc/236",
        ),
        exercise(
            "passive_joint_mobilization",
            "Passive joint mobilization",
            "Restores mobility after immobilization",
            &[],
            &["Torn ligaments", "Joint replacement"],
            4,
            &[
                "Slowly bend and straighten the joint with help from an instructor or the healthy limb",
                "10 repetitions in each direction",
                "2 sessions a day",
            ],
            &["Range of motion"],
            "https://www.garant.ru/files/4/4/1198144/pict159-71833482.png",
        ),
        exercise(
            "breathing_exercises",
            "Breathing exercises",
            "Prevents complications after spinal surgery and supports stroke recovery",
            &[],
            &["Spinal surgery", "Stroke"],
            2,
            &[
                "Breathe in deeply through the nose for 4 seconds",
                "Breathe out slowly through the mouth for 6 seconds",
                "10 cycles 3 times a day",
            ],
            &["Breathing", "Prevention"],
            "https://avatars.dzeninfra.ru/get-zen_doc/271828/pub_66878cc2e419264ab4d17cea_668791de1cbd0d0f23a4b89e/scale_1200",
        ),
        exercise(
            "fine_motor_training",
            "Fine motor skills training",
            "Stroke recovery",
            &[],
            &["Stroke"],
            3,
            &[
                "Pick up small objects with the fingers",
                "Draw in sand",
                "Fasten and unfasten buttons",
                "15 minutes twice a day",
            ],
            &["Motor skills", "Rehabilitation"],
            "https://www.maam.ru/upload/blogs/detsad-242319-1488213676.jpg",
        ),
        exercise(
            "achilles_stretch",
            "Achilles tendon stretch",
            "Recovery after a rupture",
            &[],
            &["Achilles tendon rupture"],
            5,
            &[
                "Stand facing a wall, hands on the wall",
                "Place the injured leg behind",
                "Slowly bend the knees until you feel the stretch",
                "Hold for 30 seconds, 5 sets",
            ],
            &["Stretching", "Recovery"],
            "https://zdorovko.info/wp-content/uploads/2016/01/rastyajka_ahillovogo_suhojyliya_vozle_stenki.jpg",
        ),
        exercise(
            "shoulder_stabilization",
            "Shoulder joint stabilization",
            "After a shoulder dislocation",
            &[],
            &["Shoulder dislocation"],
            4,
            &[
                "Use an elastic band",
                "External and internal shoulder rotation",
                "3 sets of 15 repetitions with controlled range",
            ],
            &["Stability", "Rehabilitation"],
            "https://4youngmama.ru/wp-content/uploads/7/9/c/79cb777bbd1047ee0d583746b1edc5e6.jpeg",
        ),
        exercise(
            "abdominal_recovery",
            "Abdominal muscle recovery",
            "After a caesarean section",
            &[],
            &["Caesarean section"],
            3,
            &[
                "Lying on your back with bent knees, slowly tense the pelvic floor",
                "Hold for 5 seconds, 10 repetitions",
                "3 times a day",
            ],
            &["Postpartum", "Core muscles"],
            "https://mens-physic.ru/images/2021/04/img_16193987794077-1-1024x576.jpg",
        ),
        exercise(
            "resistance_breathing",
            "Resistance breathing",
            "After abdominal surgery",
            &[],
            &["Appendectomy", "Laparoscopic surgery"],
            2,
            &[
                "Use a breathing trainer",
                "Breathe in slowly against the resistance",
                "10 repetitions every 2 hours",
                "Watch for pain",
            ],
            &["Breathing", "Rehabilitation"],
            "https://avatars.mds.yandex.net/i?id=f6ecad553610d5c32bea670c60233dc2-4231472-images-thumbs&n=13",
        ),
        exercise(
            "aqua_aerobics",
            "Aqua aerobics",
            "Helps with arthritis",
            &[],
            &["Arthritis"],
            3,
            &[
                "Light exercises in the pool",
                "Slow leg swings",
                "Circular joint movements",
                "30 minutes 3 times a week",
            ],
            &["Pool", "Low impact"],
            "https://sun9-18.userapi.com/impg/BV58GjcI4fD0jdhBF-8IPvJOGBCOHeTF1jpZDA/un1NfC95nn4.jpg",
        ),
        exercise(
            "balance_therapy",
            "Balance therapy",
            "For multiple sclerosis",
            &[],
            &["Multiple sclerosis"],
            2,
            &[
                "Stand next to a support",
                "Shift your weight from one leg to the other",
                "Hold your balance on one leg",
                "10 minutes twice a day",
            ],
            &["Balance", "Coordination"],
            "https://i.pinimg.com/originals/3b/1d/cb/3b1dcbdb6afa51ca53a25f0706a6983e.jpg",
        ),
    ]
}

/// Validate a set of exercises for consistency and completeness
///
/// Returns a list of validation errors, or empty Vec if valid.
pub fn validate_exercises(exercises: &[Exercise]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = BTreeSet::new();

    for ex in exercises {
        if ex.id.is_empty() {
            errors.push(format!("Exercise '{}' has empty ID", ex.title));
        }
        if !seen.insert(ex.id.as_str()) {
            errors.push(format!("Duplicate exercise ID '{}'", ex.id));
        }
        if ex.title.is_empty() {
            errors.push(format!("Exercise '{}' has empty title", ex.id));
        }
        if ex.steps.is_empty() {
            errors.push(format!("Exercise '{}' has no steps", ex.id));
        }
        if ex.max_discomfort_level > 10 {
            errors.push(format!(
                "Exercise '{}': max discomfort {} > 10",
                ex.id, ex.max_discomfort_level
            ));
        }
        if !ex.injury_guidance.is_empty() && ex.suitable_for.is_empty() {
            errors.push(format!(
                "Exercise '{}' has injury guidance but no suitable injuries",
                ex.id
            ));
        }
        for injury in ex.injury_guidance.keys() {
            if !ex.suitable_for.contains(injury) {
                errors.push(format!(
                    "Exercise '{}' has guidance for unlisted injury '{}'",
                    ex.id, injury
                ));
            }
        }
    }

    errors
}

/// Seed the built-in exercises into a store that has none
///
/// Returns the number of exercises inserted (0 if the catalog already exists).
pub fn seed_default_catalog<S: RecordStore>(store: &S) -> Result<usize> {
    let errors = validate_exercises(default_exercises());
    if !errors.is_empty() {
        return Err(Error::CatalogValidation(errors.join("; ")));
    }

    if store.read(|tables| Ok(!tables.exercises.is_empty()))? {
        return Ok(0);
    }

    store.transaction(|tables| {
        if !tables.exercises.is_empty() {
            return Ok(0);
        }
        for ex in default_exercises() {
            tables.exercises.insert(ex.id.clone(), ex.clone());
        }
        tracing::info!("Seeded {} default exercises", tables.exercises.len());
        Ok(tables.exercises.len())
    })
}

/// List exercises, optionally only those listing `injury` (case-insensitive)
pub fn list_exercises<S: RecordStore>(store: &S, injury: Option<&str>) -> Result<Vec<Exercise>> {
    store.read(|tables| {
        let all = tables.exercises.values();
        let exercises: Vec<_> = match injury {
            Some(injury) => {
                let wanted = injury.to_lowercase();
                all.filter(|ex| {
                    ex.suitable_for
                        .iter()
                        .any(|label| label.to_lowercase() == wanted)
                })
                .cloned()
                .collect()
            }
            None => all.cloned().collect(),
        };
        tracing::debug!("Listing {} exercises (filter: {:?})", exercises.len(), injury);
        Ok(exercises)
    })
}

pub fn get_exercise<S: RecordStore>(store: &S, id: &str) -> Result<Exercise> {
    store.read(|tables| {
        tables
            .exercises
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Exercise '{}'", id)))
    })
}

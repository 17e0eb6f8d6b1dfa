//! Intake questionnaire storage. One questionnaire per user.

use crate::store::RecordStore;
use crate::{Error, Questionnaire, QuestionnaireInput, Result};
use uuid::Uuid;

/// Highest pain level accepted on the intake form
pub const MAX_PAIN_LEVEL: u8 = 10;

fn validate(input: &QuestionnaireInput) -> Result<()> {
    if input.specific_injury.trim().is_empty() {
        return Err(Error::Validation("specific_injury must not be empty".into()));
    }
    if input.pain_level > MAX_PAIN_LEVEL {
        return Err(Error::Validation(format!(
            "pain_level {} is above {}",
            input.pain_level, MAX_PAIN_LEVEL
        )));
    }
    if !(input.weight.is_finite() && input.height.is_finite()) {
        return Err(Error::Validation("weight and height must be numbers".into()));
    }
    Ok(())
}

/// Create or overwrite the requester's questionnaire
///
/// Resubmitting keeps the questionnaire id, so schedules generated from
/// earlier answers still point at it.
pub fn submit_questionnaire<S: RecordStore>(
    store: &S,
    requester: Uuid,
    input: QuestionnaireInput,
) -> Result<Questionnaire> {
    validate(&input)?;

    store.transaction(|tables| {
        if !tables.users.contains_key(&requester) {
            return Err(Error::NotFound(format!("User {}", requester)));
        }

        let id = match tables.questionnaire_for_user(requester) {
            Some(existing) => {
                tracing::info!("Updating questionnaire {} for {}", existing.id, requester);
                existing.id
            }
            None => Uuid::new_v4(),
        };

        let questionnaire = Questionnaire {
            id,
            user_id: requester,
            answers: input,
        };
        tables.questionnaires.insert(id, questionnaire.clone());
        Ok(questionnaire)
    })
}

/// Fetch a user's questionnaire; only the user may read it
pub fn get_questionnaire<S: RecordStore>(
    store: &S,
    user_id: Uuid,
    requester: Uuid,
) -> Result<Questionnaire> {
    if user_id != requester {
        return Err(Error::Forbidden(
            "cannot read another user's questionnaire".into(),
        ));
    }

    store.read(|tables| {
        tables
            .questionnaire_for_user(user_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Questionnaire for user {}", user_id)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::User;

    fn store_with_user() -> (MemoryStore, Uuid) {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        store
            .transaction(|tables| {
                tables.users.insert(
                    id,
                    User {
                        id,
                        username: "anna".into(),
                        password_hash: "x".into(),
                    },
                );
                Ok(())
            })
            .unwrap();
        (store, id)
    }

    fn input(injury: &str, pain: u8) -> QuestionnaireInput {
        QuestionnaireInput {
            name: "Anna".into(),
            gender: "female".into(),
            weight: 60.0,
            height: 170.0,
            main_injury_type: "Neurology".into(),
            specific_injury: injury.into(),
            pain_level: pain,
            training_time: "morning".into(),
        }
    }

    #[test]
    fn test_resubmit_keeps_id_and_overwrites() {
        let (store, user) = store_with_user();

        let first = submit_questionnaire(&store, user, input("Stroke", 3)).unwrap();
        let second = submit_questionnaire(&store, user, input("Spinal cord injury", 5)).unwrap();

        assert_eq!(first.id, second.id);
        let stored = get_questionnaire(&store, user, user).unwrap();
        assert_eq!(stored.answers.specific_injury, "Spinal cord injury");
        assert_eq!(stored.answers.pain_level, 5);

        let count = store.read(|tables| Ok(tables.questionnaires.len())).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_get_other_users_questionnaire_forbidden() {
        let (store, user) = store_with_user();
        submit_questionnaire(&store, user, input("Stroke", 3)).unwrap();

        let result = get_questionnaire(&store, user, Uuid::new_v4());
        assert!(matches!(result, Err(Error::Forbidden(_))));
    }

    #[test]
    fn test_missing_questionnaire_not_found() {
        let (store, user) = store_with_user();
        let result = get_questionnaire(&store, user, user);
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_invalid_answers_rejected() {
        let (store, user) = store_with_user();

        let result = submit_questionnaire(&store, user, input("Stroke", 11));
        assert!(matches!(result, Err(Error::Validation(_))));

        let result = submit_questionnaire(&store, user, input("  ", 2));
        assert!(matches!(result, Err(Error::Validation(_))));
    }
}

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use super::dto::QuestionInput;
use super::repo::SurveyQuestion;

/// Delete/insert/update sets produced by correlating the stored question
/// list with an incoming one on question id. The `usize` is the entry's
/// index in the incoming list and becomes its position.
#[derive(Debug, Default)]
pub struct ReconcilePlan {
    pub to_delete: Vec<Uuid>,
    pub to_insert: Vec<(usize, QuestionInput)>,
    pub to_update: Vec<(usize, SurveyQuestion, QuestionInput)>,
}

/// Incoming entries without a parseable id are client placeholders for new
/// questions; their ids are discarded and the store assigns fresh ones.
pub fn reconcile(existing: Vec<SurveyQuestion>, incoming: Vec<QuestionInput>) -> ReconcilePlan {
    let incoming_ids: HashSet<Uuid> = incoming.iter().filter_map(parsed_id).collect();
    let mut remaining: HashMap<Uuid, SurveyQuestion> =
        existing.into_iter().map(|q| (q.id, q)).collect();

    let mut plan = ReconcilePlan {
        to_delete: remaining
            .keys()
            .copied()
            .filter(|id| !incoming_ids.contains(id))
            .collect(),
        ..ReconcilePlan::default()
    };

    for (index, input) in incoming.into_iter().enumerate() {
        match parsed_id(&input).and_then(|id| remaining.remove(&id)) {
            Some(current) => plan.to_update.push((index, current, input)),
            None => plan.to_insert.push((index, input)),
        }
    }
    plan
}

fn parsed_id(input: &QuestionInput) -> Option<Uuid> {
    input.id.as_deref().and_then(|raw| Uuid::parse_str(raw).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surveys::repo::QuestionType;
    use serde_json::json;
    use time::OffsetDateTime;

    fn stored(id: Uuid) -> SurveyQuestion {
        SurveyQuestion {
            id,
            survey_id: Uuid::new_v4(),
            question_type: QuestionType::Text,
            question: "stored".into(),
            description: None,
            data: json!({}),
            position: 0,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn input(id: Option<String>) -> QuestionInput {
        QuestionInput {
            id,
            question_type: "text".into(),
            question: "incoming".into(),
            description: None,
            data: Some(json!({})),
        }
    }

    #[test]
    fn splits_into_delete_update_insert() {
        let (id1, id2, id3, id4) = (
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
        );
        let existing = vec![stored(id1), stored(id2), stored(id3)];
        let incoming = vec![
            input(Some(id2.to_string())),
            input(Some(id3.to_string())),
            input(Some(id4.to_string())),
        ];

        let plan = reconcile(existing, incoming);

        assert_eq!(plan.to_delete, vec![id1]);
        let updated: Vec<Uuid> = plan.to_update.iter().map(|(_, q, _)| q.id).collect();
        assert_eq!(updated, vec![id2, id3]);
        assert_eq!(plan.to_insert.len(), 1);
        let inserted_id = id4.to_string();
        assert_eq!(plan.to_insert[0].1.id.as_deref(), Some(inserted_id.as_str()));
    }

    #[test]
    fn same_payload_twice_is_a_shape_noop() {
        let ids = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let existing: Vec<SurveyQuestion> = ids.iter().map(|id| stored(*id)).collect();
        let incoming: Vec<QuestionInput> =
            ids.iter().map(|id| input(Some(id.to_string()))).collect();

        let plan = reconcile(existing, incoming);

        assert!(plan.to_delete.is_empty());
        assert!(plan.to_insert.is_empty());
        assert_eq!(plan.to_update.len(), 3);
    }

    #[test]
    fn missing_or_placeholder_ids_become_inserts() {
        let existing = vec![stored(Uuid::new_v4())];
        let incoming = vec![input(None), input(Some("client-temp-1".into()))];

        let plan = reconcile(existing, incoming);

        assert_eq!(plan.to_delete.len(), 1);
        assert_eq!(plan.to_insert.len(), 2);
        assert!(plan.to_update.is_empty());
    }

    #[test]
    fn empty_incoming_deletes_everything() {
        let (id1, id2) = (Uuid::new_v4(), Uuid::new_v4());
        let plan = reconcile(vec![stored(id1), stored(id2)], Vec::new());

        let mut deleted = plan.to_delete.clone();
        deleted.sort();
        let mut expected = vec![id1, id2];
        expected.sort();
        assert_eq!(deleted, expected);
        assert!(plan.to_insert.is_empty());
        assert!(plan.to_update.is_empty());
    }

    #[test]
    fn positions_follow_incoming_order() {
        let kept = Uuid::new_v4();
        let existing = vec![stored(kept)];
        let incoming = vec![input(None), input(Some(kept.to_string())), input(None)];

        let plan = reconcile(existing, incoming);

        assert_eq!(plan.to_update[0].0, 1);
        let insert_positions: Vec<usize> = plan.to_insert.iter().map(|(i, _)| *i).collect();
        assert_eq!(insert_positions, vec![0, 2]);
    }
}

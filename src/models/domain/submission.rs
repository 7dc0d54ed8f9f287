use async_graphql::{InputObject, SimpleObject};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::{question::QuestionId, user::Principal};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, SimpleObject, InputObject)]
#[serde(rename_all = "camelCase")]
#[graphql(input_name = "AnswerInput")]
pub struct Answer {
    pub question_id: QuestionId,
    pub selected_index: u32,
}

/// Graded quiz attempt. Written once by the grading service and never updated.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    pub user: Principal,
    pub answers: Vec<Answer>,
    pub score: u64,
    pub question_count: u64,
    pub submitted_at: DateTime<Utc>,
}

impl Submission {
    pub fn new(user: Principal, answers: Vec<Answer>, score: u64) -> Self {
        let question_count = answers.len() as u64;
        Submission {
            id: Uuid::new_v4().to_string(),
            user,
            answers,
            score,
            question_count,
            submitted_at: Utc::now(),
        }
    }

    pub fn answer_for(&self, question_id: QuestionId) -> Option<&Answer> {
        self.answers.iter().find(|a| a.question_id == question_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_submission_counts_answers() {
        let answers = vec![
            Answer { question_id: 1, selected_index: 0 },
            Answer { question_id: 2, selected_index: 3 },
        ];
        let submission = Submission::new(Principal::new("student"), answers, 4);

        assert_eq!(submission.question_count, 2);
        assert_eq!(submission.score, 4);
        assert!(Uuid::parse_str(&submission.id).is_ok());
    }

    #[test]
    fn test_answer_for() {
        let submission = Submission::new(
            Principal::new("student"),
            vec![Answer { question_id: 9, selected_index: 2 }],
            0,
        );

        assert_eq!(submission.answer_for(9).map(|a| a.selected_index), Some(2));
        assert!(submission.answer_for(10).is_none());
    }
}

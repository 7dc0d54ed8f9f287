use std::collections::{HashMap, HashSet};

use crate::errors::{AppError, AppResult};
use crate::models::domain::{Answer, Question, QuestionId};

pub struct GradingService;

impl GradingService {
    /// Sum of `points` over answers whose selection is the question's correct
    /// option. Every answer must reference a question in `questions`, at most once.
    pub fn grade(questions: &[Question], answers: &[Answer]) -> AppResult<u64> {
        if answers.is_empty() {
            return Err(AppError::ValidationError("No answers submitted".to_string()));
        }

        // Create a map of questions by ID for quick lookup
        let question_map: HashMap<QuestionId, &Question> =
            questions.iter().map(|q| (q.id, q)).collect();

        let mut seen = HashSet::with_capacity(answers.len());
        let mut score: u64 = 0;

        for answer in answers {
            if !seen.insert(answer.question_id) {
                return Err(AppError::ValidationError(format!(
                    "Question {} was answered more than once",
                    answer.question_id
                )));
            }

            let question = question_map.get(&answer.question_id).ok_or_else(|| {
                AppError::NotFound(format!(
                    "Question {} is no longer in the catalog",
                    answer.question_id
                ))
            })?;

            if question.is_correct(answer.selected_index) {
                score += u64::from(question.points);
            }
        }

        Ok(score)
    }

    /// Highest score a full attempt of `questions` can reach.
    pub fn max_score(questions: &[Question]) -> u64 {
        questions.iter().map(|q| u64::from(q.points)).sum()
    }
}

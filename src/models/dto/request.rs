use async_graphql::InputObject;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::errors::{AppError, AppResult};
use crate::models::domain::{Question, QuestionId, UserProfile};

/// Question as submitted by an admin. `id` is ignored on create and
/// required on update.
#[derive(Debug, Clone, Deserialize, Serialize, Validate, InputObject)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    pub id: Option<QuestionId>,

    #[validate(length(min = 1, max = 2000, message = "Question text must not be empty"))]
    pub question_text: String,

    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,

    pub answer_index: u32,

    #[validate(range(min = 1, message = "Points must be a positive integer"))]
    pub points: u32,

    #[validate(length(max = 100))]
    pub topic: Option<String>,
}

fn validate_options(options: &[String]) -> Result<(), ValidationError> {
    if options.len() < 2 {
        return Err(ValidationError::new("at_least_two_options")
            .with_message("Please provide at least 2 options".into()));
    }
    if options.iter().any(|o| o.trim().is_empty()) {
        return Err(ValidationError::new("empty_option")
            .with_message("Options must not be empty".into()));
    }
    for opt in options {
        if opt.len() > 500 {
            return Err(ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

impl QuestionInput {
    /// Field validation plus the cross-field `answerIndex < options.len()` rule.
    pub fn check(&self) -> AppResult<()> {
        self.validate()?;
        if self.question_text.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Question text must not be empty".to_string(),
            ));
        }
        if self.answer_index as usize >= self.options.len() {
            return Err(AppError::ValidationError(format!(
                "answerIndex {} is out of range for {} options",
                self.answer_index,
                self.options.len()
            )));
        }
        Ok(())
    }

    pub fn into_question(self, id: QuestionId) -> Question {
        Question {
            id,
            question_text: self.question_text.trim().to_string(),
            options: self.options.into_iter().map(|o| o.trim().to_string()).collect(),
            answer_index: self.answer_index,
            points: self.points,
            topic: self
                .topic
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            created_at: None,
            modified_at: None,
        }
    }
}

impl From<Question> for QuestionInput {
    fn from(question: Question) -> Self {
        QuestionInput {
            id: Some(question.id),
            question_text: question.question_text,
            options: question.options,
            answer_index: question.answer_index,
            points: question.points,
            topic: question.topic,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SaveProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Name must not be empty"))]
    pub name: String,
}

impl SaveProfileRequest {
    pub fn check(profile: &UserProfile) -> AppResult<UserProfile> {
        let request = SaveProfileRequest {
            name: profile.name.trim().to_string(),
        };
        request.validate()?;
        Ok(UserProfile { name: request.name })
    }
}

use std::sync::Arc;

use chrono::Utc;

use crate::{
    auth::require_authenticated,
    errors::{AppError, AppResult},
    models::{
        domain::{Principal, Question, QuestionId},
        dto::QuestionInput,
    },
    repositories::QuestionRepository,
    services::access_service::AccessService,
};

/// The question catalog. Reads need an authenticated caller, writes need an admin.
pub struct QuestionService {
    questions: Arc<dyn QuestionRepository>,
    access: Arc<AccessService>,
}

impl QuestionService {
    pub fn new(questions: Arc<dyn QuestionRepository>, access: Arc<AccessService>) -> Self {
        Self { questions, access }
    }

    pub async fn add_question(
        &self,
        caller: Option<&Principal>,
        input: QuestionInput,
    ) -> AppResult<QuestionId> {
        let admin = self.access.require_admin(caller).await?;
        input.check()?;

        let mut question = input.into_question(0);
        let now = Utc::now();
        question.created_at = Some(now);
        question.modified_at = Some(now);

        let created = self.questions.create(question).await?;
        log::info!("Admin '{}' added question {}", admin, created.id);
        Ok(created.id)
    }

    /// Replaces every field of an existing question; the id is required.
    pub async fn update_question(
        &self,
        caller: Option<&Principal>,
        input: QuestionInput,
    ) -> AppResult<Question> {
        let admin = self.access.require_admin(caller).await?;
        input.check()?;

        let id = input
            .id
            .ok_or_else(|| AppError::ValidationError("Question id is required".to_string()))?;
        let existing = self
            .questions
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Question with id '{}' not found", id)))?;

        let mut question = input.into_question(id);
        question.created_at = existing.created_at;
        question.modified_at = Some(Utc::now());

        let updated = self.questions.update(question).await?;
        log::info!("Admin '{}' updated question {}", admin, id);
        Ok(updated)
    }

    pub async fn delete_question(&self, caller: Option<&Principal>, id: QuestionId) -> AppResult<()> {
        let admin = self.access.require_admin(caller).await?;
        self.questions.delete(id).await?;
        log::info!("Admin '{}' deleted question {}", admin, id);
        Ok(())
    }

    pub async fn get_all_questions(&self, caller: Option<&Principal>) -> AppResult<Vec<Question>> {
        require_authenticated(caller)?;
        self.questions.find_all().await
    }

    pub async fn get_question_by_id(
        &self,
        caller: Option<&Principal>,
        id: QuestionId,
    ) -> AppResult<Question> {
        require_authenticated(caller)?;
        self.questions
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Question with id '{}' not found", id)))
    }
}

#[cfg(test)]
pub mod fixtures {
    use std::{sync::Arc, time::Duration};

    use async_trait::async_trait;

    use crate::{
        app_state::AppState,
        config::Config,
        errors::AppResult,
        models::{
            domain::{Principal, Question, QuestionId},
            dto::QuestionInput,
        },
        repositories::{
            InMemoryQuestionRepository, InMemorySubmissionRepository, InMemoryUserRepository,
            QuestionRepository,
        },
    };

    pub const BOOTSTRAP_TOKEN: &str = "let-me-in";

    pub fn admin() -> Principal {
        Principal::new("admin-principal")
    }

    pub fn student() -> Principal {
        Principal::new("student-principal")
    }

    pub fn question_input(text: &str, options: &[&str], answer_index: u32, points: u32) -> QuestionInput {
        QuestionInput {
            id: None,
            question_text: text.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            answer_index,
            points,
            topic: None,
        }
    }

    /// In-memory state with `admin()` claimed and two questions:
    /// "2+2?" (answer 1, 5 points) and "Capital of France?" (answer 1, 2 points).
    pub async fn seeded_state() -> (AppState, Vec<QuestionId>) {
        let state = AppState::in_memory(Config::test_config());
        state
            .access_service
            .bootstrap_admin(Some(&admin()), BOOTSTRAP_TOKEN, BOOTSTRAP_TOKEN)
            .await
            .expect("bootstrap on a fresh state");

        let mut ids = Vec::new();
        for input in [
            question_input("2+2?", &["3", "4", "5"], 1, 5),
            question_input("Capital of France?", &["Rome", "Paris"], 1, 2),
        ] {
            let id = state
                .question_service
                .add_question(Some(&admin()), input)
                .await
                .expect("seed question");
            ids.push(id);
        }
        (state, ids)
    }

    /// In-memory questions whose listing takes `delay`.
    pub struct SlowQuestionRepository {
        inner: InMemoryQuestionRepository,
        delay: Duration,
    }

    impl SlowQuestionRepository {
        pub fn new(delay: Duration) -> Self {
            Self {
                inner: InMemoryQuestionRepository::new(),
                delay,
            }
        }
    }

    #[async_trait]
    impl QuestionRepository for SlowQuestionRepository {
        async fn create(&self, question: Question) -> AppResult<Question> {
            self.inner.create(question).await
        }

        async fn update(&self, question: Question) -> AppResult<Question> {
            self.inner.update(question).await
        }

        async fn delete(&self, id: QuestionId) -> AppResult<()> {
            self.inner.delete(id).await
        }

        async fn find_by_id(&self, id: QuestionId) -> AppResult<Option<Question>> {
            self.inner.find_by_id(id).await
        }

        async fn find_all(&self) -> AppResult<Vec<Question>> {
            tokio::time::sleep(self.delay).await;
            self.inner.find_all().await
        }

        async fn ensure_indexes(&self) -> AppResult<()> {
            Ok(())
        }
    }

    /// In-memory state whose question listing stalls for `delay`, with
    /// `admin()` claimed.
    pub async fn slow_listing_state(delay: Duration) -> AppState {
        let state = AppState::from_repositories(
            Config::test_config(),
            Arc::new(SlowQuestionRepository::new(delay)),
            Arc::new(InMemorySubmissionRepository::new()),
            Arc::new(InMemoryUserRepository::new()),
            None,
        );
        state
            .access_service
            .bootstrap_admin(Some(&admin()), BOOTSTRAP_TOKEN, BOOTSTRAP_TOKEN)
            .await
            .expect("bootstrap on a fresh state");
        state
    }
}

#[cfg(test)]
pub mod test_helpers {
    use actix_web::http::StatusCode;

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }

    /// Asserts that a status code represents success (2xx)
    pub fn assert_success_status(status: StatusCode) {
        assert!(
            status.is_success(),
            "Expected success status, got: {}",
            status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[tokio::test]
    async fn test_seeded_state() {
        let (state, ids) = seeded_state().await;

        assert_eq!(ids, vec![1, 2]);
        assert!(state.access_service.is_caller_admin(Some(&admin())).await.unwrap());
        assert!(!state.access_service.is_caller_admin(Some(&student())).await.unwrap());
    }
}

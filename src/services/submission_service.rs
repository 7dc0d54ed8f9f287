use std::sync::Arc;

use crate::{
    auth::require_owner_or_admin,
    errors::AppResult,
    models::domain::{Answer, Principal, Submission},
    repositories::{QuestionRepository, SubmissionRepository},
    services::{access_service::AccessService, grading_service::GradingService},
};

pub struct SubmissionService {
    questions: Arc<dyn QuestionRepository>,
    submissions: Arc<dyn SubmissionRepository>,
    access: Arc<AccessService>,
}

impl SubmissionService {
    pub fn new(
        questions: Arc<dyn QuestionRepository>,
        submissions: Arc<dyn SubmissionRepository>,
        access: Arc<AccessService>,
    ) -> Self {
        Self {
            questions,
            submissions,
            access,
        }
    }

    /// Grades `answers` against the current catalog and records the result
    /// for the caller.
    pub async fn submit_answers(
        &self,
        caller: Option<&Principal>,
        answers: Vec<Answer>,
    ) -> AppResult<Submission> {
        let (principal, _) = self.access.require_member(caller).await?;

        let questions = self.questions.find_all().await?;
        let score = GradingService::grade(&questions, &answers)?;

        let submission = self
            .submissions
            .create(Submission::new(principal.clone(), answers, score))
            .await?;
        log::info!(
            "Recorded submission {} for '{}': score {} over {} answers",
            submission.id,
            principal,
            submission.score,
            submission.question_count
        );
        Ok(submission)
    }

    /// Caller's own submissions, newest first.
    pub async fn get_my_submissions(&self, caller: Option<&Principal>) -> AppResult<Vec<Submission>> {
        let (principal, _) = self.access.require_member(caller).await?;
        self.submissions.find_by_user(&principal).await
    }

    pub async fn get_user_submissions(
        &self,
        caller: Option<&Principal>,
        user: &Principal,
    ) -> AppResult<Vec<Submission>> {
        let (principal, role) = self.access.require_member(caller).await?;
        require_owner_or_admin(&principal, role, user)?;
        self.submissions.find_by_user(user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::models::domain::Question;
    use crate::repositories::{
        InMemoryQuestionRepository, InMemorySubmissionRepository, InMemoryUserRepository,
    };

    struct Fixture {
        service: SubmissionService,
        admin: Principal,
        student: Principal,
        ids: Vec<u64>,
    }

    async fn setup() -> Fixture {
        let users = Arc::new(InMemoryUserRepository::new());
        let access = Arc::new(AccessService::new(users, None));
        let admin = Principal::new("admin");
        access.bootstrap_admin(Some(&admin), "t", "t").await.unwrap();

        let questions = Arc::new(InMemoryQuestionRepository::new());
        let q1 = questions
            .create(Question::new("2+2?", &["3", "4", "5"], 1, 5))
            .await
            .unwrap();
        let q2 = questions
            .create(Question::new("Capital of France?", &["Rome", "Paris"], 1, 2))
            .await
            .unwrap();

        let service = SubmissionService::new(
            questions,
            Arc::new(InMemorySubmissionRepository::new()),
            access,
        );
        Fixture {
            service,
            admin,
            student: Principal::new("student"),
            ids: vec![q1.id, q2.id],
        }
    }

    #[tokio::test]
    async fn test_submit_scores_and_records() {
        let f = setup().await;
        let answers = vec![
            Answer { question_id: f.ids[0], selected_index: 1 },
            Answer { question_id: f.ids[1], selected_index: 0 },
        ];

        let submission = f.service.submit_answers(Some(&f.student), answers).await.unwrap();
        assert_eq!(submission.score, 5);

        let mine = f.service.get_my_submissions(Some(&f.student)).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].score, 5);
        assert_eq!(mine[0].question_count, 2);
        assert_eq!(mine[0].user, f.student);
    }

    #[tokio::test]
    async fn test_anonymous_cannot_submit() {
        let f = setup().await;
        let answers = vec![Answer { question_id: f.ids[0], selected_index: 1 }];

        let result = f.service.submit_answers(None, answers).await;
        assert!(matches!(result, Err(AppError::NotAuthenticated(_))));
    }

    #[tokio::test]
    async fn test_only_owner_or_admin_reads_history() {
        let f = setup().await;
        let answers = vec![Answer { question_id: f.ids[0], selected_index: 1 }];
        f.service.submit_answers(Some(&f.student), answers).await.unwrap();

        let other = Principal::new("other");
        let denied = f.service.get_user_submissions(Some(&other), &f.student).await;
        assert!(matches!(denied, Err(AppError::NotAuthorized(_))));

        let as_admin = f
            .service
            .get_user_submissions(Some(&f.admin), &f.student)
            .await
            .unwrap();
        assert_eq!(as_admin.len(), 1);
    }
}

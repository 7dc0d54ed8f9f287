//! In-memory repositories, used by tests and by `STORAGE_BACKEND=memory`.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{Principal, Question, QuestionId, Submission, UserProfile, UserRecord, UserRole},
    repositories::{
        user_repository::BootstrapRecord, QuestionRepository, SubmissionRepository,
        UserRepository,
    },
};

#[derive(Default)]
struct QuestionTable {
    last_id: QuestionId,
    rows: BTreeMap<QuestionId, Question>,
}

#[derive(Default, Clone)]
pub struct InMemoryQuestionRepository {
    table: Arc<RwLock<QuestionTable>>,
}

impl InMemoryQuestionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuestionRepository for InMemoryQuestionRepository {
    async fn create(&self, mut question: Question) -> AppResult<Question> {
        let mut table = self.table.write().await;
        table.last_id += 1;
        question.id = table.last_id;
        table.rows.insert(question.id, question.clone());
        Ok(question)
    }

    async fn update(&self, question: Question) -> AppResult<Question> {
        let mut table = self.table.write().await;
        if !table.rows.contains_key(&question.id) {
            return Err(AppError::NotFound(format!(
                "Question with id '{}' not found",
                question.id
            )));
        }
        table.rows.insert(question.id, question.clone());
        Ok(question)
    }

    async fn delete(&self, id: QuestionId) -> AppResult<()> {
        let mut table = self.table.write().await;
        if table.rows.remove(&id).is_none() {
            return Err(AppError::NotFound(format!(
                "Question with id '{}' not found",
                id
            )));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: QuestionId) -> AppResult<Option<Question>> {
        let table = self.table.read().await;
        Ok(table.rows.get(&id).cloned())
    }

    async fn find_all(&self) -> AppResult<Vec<Question>> {
        let table = self.table.read().await;
        Ok(table.rows.values().cloned().collect())
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct InMemorySubmissionRepository {
    submissions: Arc<RwLock<Vec<Submission>>>,
}

impl InMemorySubmissionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubmissionRepository for InMemorySubmissionRepository {
    async fn create(&self, submission: Submission) -> AppResult<Submission> {
        let mut submissions = self.submissions.write().await;
        if submissions.iter().any(|s| s.id == submission.id) {
            return Err(AppError::DatabaseError(format!(
                "Submission with id '{}' already exists",
                submission.id
            )));
        }
        submissions.push(submission.clone());
        Ok(submission)
    }

    async fn find_by_user(&self, user: &Principal) -> AppResult<Vec<Submission>> {
        let submissions = self.submissions.read().await;
        // insertion order is submission order, so reverse for newest first
        Ok(submissions
            .iter()
            .rev()
            .filter(|s| &s.user == user)
            .cloned()
            .collect())
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
struct UserTable {
    users: HashMap<Principal, UserRecord>,
    bootstrap: Option<BootstrapRecord>,
}

impl UserTable {
    fn entry(&mut self, principal: &Principal) -> &mut UserRecord {
        self.users
            .entry(principal.clone())
            .or_insert_with(|| UserRecord::new(principal.clone()))
    }
}

#[derive(Default, Clone)]
pub struct InMemoryUserRepository {
    table: Arc<RwLock<UserTable>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_principal(&self, principal: &Principal) -> AppResult<Option<UserRecord>> {
        let table = self.table.read().await;
        Ok(table.users.get(principal).cloned())
    }

    async fn set_role(&self, principal: &Principal, role: UserRole) -> AppResult<UserRecord> {
        let mut table = self.table.write().await;
        let record = table.entry(principal);
        record.role = role;
        record.modified_at = Some(Utc::now());
        Ok(record.clone())
    }

    async fn save_profile(
        &self,
        principal: &Principal,
        profile: UserProfile,
    ) -> AppResult<UserRecord> {
        let mut table = self.table.write().await;
        let record = table.entry(principal);
        record.profile = Some(profile);
        record.modified_at = Some(Utc::now());
        Ok(record.clone())
    }

    async fn admin_exists(&self) -> AppResult<bool> {
        let table = self.table.read().await;
        Ok(table.bootstrap.is_some() || table.users.values().any(|u| u.role == UserRole::Admin))
    }

    async fn claim_initial_admin(
        &self,
        principal: &Principal,
        token_hash: &str,
    ) -> AppResult<UserRecord> {
        let mut table = self.table.write().await;
        if table.bootstrap.is_some() {
            return Err(AppError::AlreadyInitialized(
                "an administrator has already been claimed".to_string(),
            ));
        }
        table.bootstrap = Some(BootstrapRecord::new(principal.clone(), token_hash));

        let record = table.entry(principal);
        record.role = UserRole::Admin;
        record.modified_at = Some(Utc::now());
        Ok(record.clone())
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

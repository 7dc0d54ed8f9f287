use std::sync::Arc;

use secrecy::ExposeSecret;

use crate::{
    auth::JwtService,
    config::{Config, StorageBackend},
    db::Database,
    errors::AppResult,
    repositories::{
        InMemoryQuestionRepository, InMemorySubmissionRepository, InMemoryUserRepository,
        MongoQuestionRepository, MongoSubmissionRepository, MongoUserRepository,
        QuestionRepository, SubmissionRepository, UserRepository,
    },
    services::{AccessService, QuestionService, SubmissionService, UserService},
};

#[derive(Clone)]
pub struct AppState {
    pub access_service: Arc<AccessService>,
    pub question_service: Arc<QuestionService>,
    pub submission_service: Arc<SubmissionService>,
    pub user_service: Arc<UserService>,
    pub jwt_service: Arc<JwtService>,
    pub config: Arc<Config>,
    /// `None` when running on the in-memory backend.
    pub db: Option<Database>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        if config.storage_backend == StorageBackend::Memory {
            log::warn!("Using in-memory storage; data is lost on restart");
            return Ok(Self::in_memory(config));
        }

        let db = Database::connect(&config).await?;

        let question_repository = Arc::new(MongoQuestionRepository::new(&db));
        question_repository.ensure_indexes().await?;
        let submission_repository = Arc::new(MongoSubmissionRepository::new(&db));
        submission_repository.ensure_indexes().await?;
        let user_repository = Arc::new(MongoUserRepository::new(&db));
        user_repository.ensure_indexes().await?;

        Ok(Self::from_repositories(
            config,
            question_repository,
            submission_repository,
            user_repository,
            Some(db),
        ))
    }

    pub fn in_memory(config: Config) -> Self {
        Self::from_repositories(
            config,
            Arc::new(InMemoryQuestionRepository::new()),
            Arc::new(InMemorySubmissionRepository::new()),
            Arc::new(InMemoryUserRepository::new()),
            None,
        )
    }

    pub fn from_repositories(
        config: Config,
        questions: Arc<dyn QuestionRepository>,
        submissions: Arc<dyn SubmissionRepository>,
        users: Arc<dyn UserRepository>,
        db: Option<Database>,
    ) -> Self {
        let bootstrap_token = config
            .admin_bootstrap_token
            .as_ref()
            .map(|t| t.expose_secret().to_string());
        let access_service = Arc::new(AccessService::new(
            users.clone(),
            bootstrap_token.as_deref(),
        ));

        let question_service = Arc::new(QuestionService::new(
            questions.clone(),
            access_service.clone(),
        ));
        let submission_service = Arc::new(SubmissionService::new(
            questions,
            submissions,
            access_service.clone(),
        ));
        let user_service = Arc::new(UserService::new(users, access_service.clone()));
        let jwt_service = Arc::new(JwtService::new(
            &config.jwt_secret,
            config.jwt_expiration_hours,
        ));

        Self {
            access_service,
            question_service,
            submission_service,
            user_service,
            jwt_service,
            config: Arc::new(config),
            db,
        }
    }

    /// Storage reachability; always healthy on the in-memory backend.
    pub async fn health_check(&self) -> AppResult<()> {
        match &self.db {
            Some(db) => db.health_check().await,
            None => Ok(()),
        }
    }
}

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::{IndexOptions, ReturnDocument},
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::{Question, QuestionId},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Stores a new question under a freshly assigned id; the incoming id is ignored.
    async fn create(&self, question: Question) -> AppResult<Question>;
    async fn update(&self, question: Question) -> AppResult<Question>;
    async fn delete(&self, id: QuestionId) -> AppResult<()>;
    async fn find_by_id(&self, id: QuestionId) -> AppResult<Option<Question>>;
    /// All questions ordered by id.
    async fn find_all(&self) -> AppResult<Vec<Question>>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoQuestionRepository {
    collection: Collection<Question>,
    counters: Collection<Document>,
}

impl MongoQuestionRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.get_collection("questions"),
            counters: db.get_collection("counters"),
        }
    }

    async fn next_id(&self) -> AppResult<QuestionId> {
        let counter = self
            .counters
            .find_one_and_update(doc! { "_id": "questions" }, doc! { "$inc": { "seq": 1_i64 } })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| {
                AppError::DatabaseError("question counter missing after upsert".to_string())
            })?;

        let seq = counter
            .get_i64("seq")
            .map_err(|e| AppError::DatabaseError(format!("bad question counter: {}", e)))?;

        Ok(seq as QuestionId)
    }
}

#[async_trait]
impl QuestionRepository for MongoQuestionRepository {
    async fn create(&self, mut question: Question) -> AppResult<Question> {
        question.id = self.next_id().await?;
        self.collection.insert_one(&question).await?;
        Ok(question)
    }

    async fn update(&self, question: Question) -> AppResult<Question> {
        let result = self
            .collection
            .replace_one(doc! { "id": question.id as i64 }, &question)
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!(
                "Question with id '{}' not found",
                question.id
            )));
        }

        Ok(question)
    }

    async fn delete(&self, id: QuestionId) -> AppResult<()> {
        let result = self.collection.delete_one(doc! { "id": id as i64 }).await?;

        if result.deleted_count == 0 {
            return Err(AppError::NotFound(format!(
                "Question with id '{}' not found",
                id
            )));
        }

        Ok(())
    }

    async fn find_by_id(&self, id: QuestionId) -> AppResult<Option<Question>> {
        let question = self.collection.find_one(doc! { "id": id as i64 }).await?;
        Ok(question)
    }

    async fn find_all(&self) -> AppResult<Vec<Question>> {
        let questions = self
            .collection
            .find(doc! {})
            .sort(doc! { "id": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(questions)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for questions collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;

        log::info!("Successfully created indexes for questions collection");
        Ok(())
    }
}

use std::{collections::BTreeSet, sync::Arc};

use crate::{
    client::{
        cache::{QueryCache, QueryKey},
        remote::RemoteDataService,
    },
    errors::{AppError, AppResult},
    models::{
        domain::{Question, QuestionId},
        dto::QuestionInput,
    },
    services::GradingService,
};

const MIN_OPTIONS: usize = 2;

/// Editable form state for a question.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionDraft {
    pub question_text: String,
    pub options: Vec<String>,
    pub answer_index: u32,
    pub points: u32,
    pub topic: String,
}

impl Default for QuestionDraft {
    fn default() -> Self {
        Self {
            question_text: String::new(),
            options: vec![String::new(); MIN_OPTIONS],
            answer_index: 0,
            points: 1,
            topic: String::new(),
        }
    }
}

impl From<&Question> for QuestionDraft {
    fn from(question: &Question) -> Self {
        Self {
            question_text: question.question_text.clone(),
            options: question.options.clone(),
            answer_index: question.answer_index,
            points: question.points,
            topic: question.topic.clone().unwrap_or_default(),
        }
    }
}

impl QuestionDraft {
    pub fn add_option(&mut self) {
        self.options.push(String::new());
    }

    pub fn set_option(&mut self, index: usize, text: &str) -> AppResult<()> {
        let option = self
            .options
            .get_mut(index)
            .ok_or_else(|| AppError::ValidationError(format!("no option at index {}", index)))?;
        *option = text.to_string();
        Ok(())
    }

    pub fn set_answer_index(&mut self, index: u32) -> AppResult<()> {
        if index as usize >= self.options.len() {
            return Err(AppError::ValidationError(format!(
                "answer index {} is out of range for {} options",
                index,
                self.options.len()
            )));
        }
        self.answer_index = index;
        Ok(())
    }

    /// Removes an option and keeps `answer_index` pointing at the same
    /// answer. Removing the answer itself resets it to the first option.
    pub fn remove_option(&mut self, index: usize) -> AppResult<()> {
        if self.options.len() <= MIN_OPTIONS {
            return Err(AppError::ValidationError(format!(
                "a question needs at least {} options",
                MIN_OPTIONS
            )));
        }
        if index >= self.options.len() {
            return Err(AppError::ValidationError(format!("no option at index {}", index)));
        }

        self.options.remove(index);
        let answer = self.answer_index as usize;
        if index == answer {
            self.answer_index = 0;
        } else if index < answer {
            self.answer_index -= 1;
        }
        Ok(())
    }

    /// Validated input for the remote call; nothing is sent if this fails.
    pub fn to_input(&self, id: Option<QuestionId>) -> AppResult<QuestionInput> {
        let topic = self.topic.trim();
        let input = QuestionInput {
            id,
            question_text: self.question_text.clone(),
            options: self.options.clone(),
            answer_index: self.answer_index,
            points: self.points,
            topic: (!topic.is_empty()).then(|| topic.to_string()),
        };
        input.check()?;
        Ok(input)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogStats {
    pub question_count: usize,
    pub topics: Vec<String>,
    pub max_score: u64,
}

impl CatalogStats {
    pub fn from_questions(questions: &[Question]) -> Self {
        let topics: BTreeSet<String> = questions.iter().filter_map(|q| q.topic.clone()).collect();
        Self {
            question_count: questions.len(),
            topics: topics.into_iter().collect(),
            max_score: GradingService::max_score(questions),
        }
    }
}

/// Question catalog access with list caching. Every mutation drops the
/// cached list.
#[derive(Clone)]
pub struct QuestionCatalogClient {
    remote: Arc<dyn RemoteDataService>,
    cache: QueryCache,
}

impl QuestionCatalogClient {
    pub fn new(remote: Arc<dyn RemoteDataService>, cache: QueryCache) -> Self {
        Self { remote, cache }
    }

    pub async fn list(&self) -> AppResult<Vec<Question>> {
        if let Some(questions) = self.cache.get::<Vec<Question>>(&QueryKey::Questions) {
            return Ok(questions);
        }
        self.list_fresh().await
    }

    /// Bypasses the cache and refreshes it.
    pub async fn list_fresh(&self) -> AppResult<Vec<Question>> {
        let questions = self.remote.get_all_questions().await?;
        self.cache.insert(QueryKey::Questions, questions.clone());
        Ok(questions)
    }

    pub async fn get(&self, id: QuestionId) -> AppResult<Question> {
        self.remote.get_by_id(id).await
    }

    pub async fn create(&self, draft: &QuestionDraft) -> AppResult<QuestionId> {
        let input = draft.to_input(None)?;
        let id = self.remote.add_question(input).await?;
        self.cache.invalidate(&QueryKey::Questions);
        Ok(id)
    }

    pub async fn update(&self, id: QuestionId, draft: &QuestionDraft) -> AppResult<Question> {
        let input = draft.to_input(Some(id))?;
        let question = self.remote.update_question(input).await?;
        self.cache.invalidate(&QueryKey::Questions);
        Ok(question)
    }

    pub async fn delete(&self, id: QuestionId) -> AppResult<()> {
        self.remote.delete_question(id).await?;
        self.cache.invalidate(&QueryKey::Questions);
        Ok(())
    }

    pub async fn stats(&self) -> AppResult<CatalogStats> {
        Ok(CatalogStats::from_questions(&self.list().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::remote::MockRemoteDataService;

    fn draft() -> QuestionDraft {
        QuestionDraft {
            question_text: "2+2?".to_string(),
            options: vec!["3".to_string(), "4".to_string(), "5".to_string()],
            answer_index: 2,
            points: 5,
            topic: String::new(),
        }
    }

    #[test]
    fn test_remove_option_before_answer_shifts_index() {
        let mut d = draft();
        d.remove_option(1).unwrap();

        assert_eq!(d.options, vec!["3".to_string(), "5".to_string()]);
        assert_eq!(d.answer_index, 1);
    }

    #[test]
    fn test_remove_answer_resets_to_first() {
        let mut d = draft();
        d.remove_option(2).unwrap();
        assert_eq!(d.answer_index, 0);
    }

    #[test]
    fn test_remove_after_answer_keeps_index() {
        let mut d = draft();
        d.answer_index = 0;
        d.remove_option(2).unwrap();
        assert_eq!(d.answer_index, 0);
    }

    #[test]
    fn test_remove_refused_at_two_options() {
        let mut d = draft();
        d.remove_option(0).unwrap();

        assert!(d.remove_option(0).is_err());
        assert_eq!(d.options.len(), 2);
    }

    #[test]
    fn test_to_input_validates_locally() {
        let mut d = draft();
        d.options[0] = "  ".to_string();
        assert!(matches!(d.to_input(None), Err(AppError::ValidationError(_))));

        let mut d = draft();
        d.points = 0;
        assert!(d.to_input(None).is_err());

        assert!(draft().to_input(None).unwrap().topic.is_none());
    }

    #[tokio::test]
    async fn test_invalid_draft_never_reaches_remote() {
        let mut remote = MockRemoteDataService::new();
        remote.expect_add_question().never();
        let client = QuestionCatalogClient::new(Arc::new(remote), QueryCache::new());

        let mut d = draft();
        d.answer_index = 3;
        assert!(client.create(&d).await.is_err());
    }

    #[tokio::test]
    async fn test_mutation_invalidates_list() {
        let mut remote = MockRemoteDataService::new();
        remote
            .expect_get_all_questions()
            .times(2)
            .returning(|| Ok(vec![Question::new("2+2?", &["3", "4"], 1, 5)]));
        remote.expect_add_question().times(1).returning(|_| Ok(2));
        let client = QuestionCatalogClient::new(Arc::new(remote), QueryCache::new());

        client.list().await.unwrap();
        client.list().await.unwrap();
        client.create(&draft()).await.unwrap();
        client.list().await.unwrap();
    }

    #[test]
    fn test_stats() {
        let questions = vec![
            Question::new("a", &["x", "y"], 0, 5).with_topic("Math"),
            Question::new("b", &["x", "y"], 0, 2).with_topic("Geography"),
            Question::new("c", &["x", "y"], 0, 3).with_topic("Math"),
            Question::new("d", &["x", "y"], 0, 1),
        ];
        let stats = CatalogStats::from_questions(&questions);

        assert_eq!(stats.question_count, 4);
        assert_eq!(stats.topics, vec!["Geography".to_string(), "Math".to_string()]);
        assert_eq!(stats.max_score, 11);
    }
}

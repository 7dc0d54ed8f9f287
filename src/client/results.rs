use std::sync::Arc;

use crate::{
    client::{
        cache::{QueryCache, QueryKey},
        remote::RemoteDataService,
    },
    errors::AppResult,
    models::domain::{Principal, Question, Submission},
    services::GradingService,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rating {
    Excellent,
    Good,
    Fair,
    NeedsImprovement,
}

impl Rating {
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            90.. => Rating::Excellent,
            70..=89 => Rating::Good,
            50..=69 => Rating::Fair,
            _ => Rating::NeedsImprovement,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Rating::Excellent => "Excellent",
            Rating::Good => "Good",
            Rating::Fair => "Fair",
            Rating::NeedsImprovement => "Needs Improvement",
        }
    }
}

/// `score` as a rounded percentage of `total`; zero when there is nothing to score.
pub fn percentage(score: f64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    ((score / total as f64) * 100.0).round() as u32
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResultsSummary {
    pub attempts: usize,
    pub best_score: u64,
    pub average_score: f64,
    /// Highest score the current catalog allows.
    pub total_points: u64,
}

impl ResultsSummary {
    pub fn new(submissions: &[Submission], questions: &[Question]) -> Self {
        let attempts = submissions.len();
        let best_score = submissions.iter().map(|s| s.score).max().unwrap_or(0);
        let average_score = if attempts == 0 {
            0.0
        } else {
            submissions.iter().map(|s| s.score as f64).sum::<f64>() / attempts as f64
        };

        Self {
            attempts,
            best_score,
            average_score,
            total_points: GradingService::max_score(questions),
        }
    }

    pub fn best_percentage(&self) -> u32 {
        percentage(self.best_score as f64, self.total_points)
    }

    pub fn average_percentage(&self) -> u32 {
        percentage(self.average_score, self.total_points)
    }

    pub fn rating_for(&self, submission: &Submission) -> Rating {
        Rating::from_percentage(percentage(submission.score as f64, self.total_points))
    }
}

/// Submission history, server-issued records only.
#[derive(Clone)]
pub struct SubmissionHistoryClient {
    remote: Arc<dyn RemoteDataService>,
    cache: QueryCache,
}

impl SubmissionHistoryClient {
    pub fn new(remote: Arc<dyn RemoteDataService>, cache: QueryCache) -> Self {
        Self { remote, cache }
    }

    pub async fn mine(&self) -> AppResult<Vec<Submission>> {
        if let Some(submissions) = self.cache.get::<Vec<Submission>>(&QueryKey::MySubmissions) {
            return Ok(submissions);
        }
        let submissions = self.remote.get_my_submissions().await?;
        self.cache.insert(QueryKey::MySubmissions, submissions.clone());
        Ok(submissions)
    }

    pub async fn for_user(&self, user: &Principal) -> AppResult<Vec<Submission>> {
        self.remote.get_user_submissions(user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::remote::MockRemoteDataService;
    use crate::models::domain::Answer;

    fn submission(score: u64) -> Submission {
        Submission::new(
            Principal::new("me"),
            vec![Answer { question_id: 1, selected_index: 0 }],
            score,
        )
    }

    #[test]
    fn test_rating_bands() {
        assert_eq!(Rating::from_percentage(100), Rating::Excellent);
        assert_eq!(Rating::from_percentage(90), Rating::Excellent);
        assert_eq!(Rating::from_percentage(89), Rating::Good);
        assert_eq!(Rating::from_percentage(70), Rating::Good);
        assert_eq!(Rating::from_percentage(50), Rating::Fair);
        assert_eq!(Rating::from_percentage(49).label(), "Needs Improvement");
    }

    #[test]
    fn test_summary() {
        let questions = vec![
            Question::new("a", &["x", "y"], 0, 6),
            Question::new("b", &["x", "y"], 0, 4),
        ];
        let summary = ResultsSummary::new(&[submission(9), submission(4)], &questions);

        assert_eq!(summary.attempts, 2);
        assert_eq!(summary.best_score, 9);
        assert_eq!(summary.total_points, 10);
        assert_eq!(summary.best_percentage(), 90);
        assert_eq!(summary.average_percentage(), 65);
        assert_eq!(summary.rating_for(&submission(4)), Rating::NeedsImprovement);
    }

    #[test]
    fn test_empty_summary() {
        let summary = ResultsSummary::new(&[], &[]);
        assert_eq!(summary.best_score, 0);
        assert_eq!(summary.best_percentage(), 0);
    }

    #[tokio::test]
    async fn test_history_is_cached() {
        let mut remote = MockRemoteDataService::new();
        remote
            .expect_get_my_submissions()
            .times(1)
            .returning(|| Ok(vec![submission(3)]));
        let history = SubmissionHistoryClient::new(Arc::new(remote), QueryCache::new());

        assert_eq!(history.mine().await.unwrap().len(), 1);
        assert_eq!(history.mine().await.unwrap().len(), 1);
    }
}

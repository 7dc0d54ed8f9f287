use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use crate::{
    client::{
        cache::{QueryCache, QueryKey},
        catalog::QuestionCatalogClient,
        remote::RemoteDataService,
    },
    errors::{AppError, AppResult},
    models::domain::{Answer, Question, QuestionId, Submission},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Answering,
    Submitting,
    Submitted(Submission),
    /// The catalog changed since the snapshot; only a restart helps.
    Stale,
}

/// One quiz attempt over a catalog snapshot taken at start. Grading
/// happens on the server; the session only collects answers.
pub struct QuizSession {
    remote: Arc<dyn RemoteDataService>,
    cache: QueryCache,
    snapshot: Vec<Question>,
    answers: BTreeMap<QuestionId, u32>,
    phase: SessionPhase,
}

impl QuizSession {
    pub async fn start(
        catalog: &QuestionCatalogClient,
        remote: Arc<dyn RemoteDataService>,
        cache: QueryCache,
    ) -> AppResult<Self> {
        let snapshot = catalog.list().await?;
        Ok(Self::from_snapshot(remote, cache, snapshot))
    }

    pub fn from_snapshot(remote: Arc<dyn RemoteDataService>, cache: QueryCache, snapshot: Vec<Question>) -> Self {
        Self {
            remote,
            cache,
            snapshot,
            answers: BTreeMap::new(),
            phase: SessionPhase::Answering,
        }
    }

    pub fn questions(&self) -> &[Question] {
        &self.snapshot
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn selected(&self, question_id: QuestionId) -> Option<u32> {
        self.answers.get(&question_id).copied()
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn select(&mut self, question_id: QuestionId, selected_index: u32) -> AppResult<()> {
        if self.phase != SessionPhase::Answering {
            return Err(AppError::ValidationError(
                "answers can no longer be changed".to_string(),
            ));
        }

        let question = self
            .snapshot
            .iter()
            .find(|q| q.id == question_id)
            .ok_or_else(|| {
                AppError::ValidationError(format!("question {} is not part of this quiz", question_id))
            })?;
        if !question.has_option(selected_index) {
            return Err(AppError::ValidationError(format!(
                "option {} does not exist for question {}",
                selected_index, question_id
            )));
        }

        self.answers.insert(question_id, selected_index);
        Ok(())
    }

    /// Every question in the snapshot has an answer.
    pub fn is_complete(&self) -> bool {
        !self.snapshot.is_empty() && self.snapshot.iter().all(|q| self.answers.contains_key(&q.id))
    }

    /// Submits once. The catalog is re-read first, bypassing the cache, and
    /// the attempt is rejected as stale if it no longer matches the snapshot.
    /// Dropping the returned future before it settles leaves the session in
    /// `Answering`.
    pub async fn submit(&mut self) -> AppResult<Submission> {
        match &self.phase {
            SessionPhase::Answering => {}
            SessionPhase::Submitting => {
                return Err(AppError::ValidationError(
                    "a submission is already in progress".to_string(),
                ))
            }
            SessionPhase::Submitted(_) => {
                return Err(AppError::ValidationError(
                    "this attempt has already been submitted".to_string(),
                ))
            }
            SessionPhase::Stale => return Err(stale_error()),
        }
        if !self.is_complete() {
            return Err(AppError::ValidationError(
                "Please answer all questions before submitting".to_string(),
            ));
        }

        let remote = self.remote.clone();
        let cache = self.cache.clone();
        let snapshot = &self.snapshot;
        let answers = &self.answers;
        let mut pending = PendingSubmit::begin(&mut self.phase);

        let current = remote.get_all_questions().await?;
        cache.insert(QueryKey::Questions, current.clone());

        if !matches_catalog(snapshot, answers, &current) {
            log::warn!("Quiz catalog changed during the attempt; submission rejected");
            pending.settle(SessionPhase::Stale);
            return Err(stale_error());
        }

        let submitted: Vec<Answer> = snapshot
            .iter()
            .filter_map(|q| {
                answers.get(&q.id).map(|&selected_index| Answer {
                    question_id: q.id,
                    selected_index,
                })
            })
            .collect();

        let submission = remote.submit_answers(submitted).await?;
        cache.invalidate(&QueryKey::MySubmissions);
        pending.settle(SessionPhase::Submitted(submission.clone()));
        Ok(submission)
    }

    /// Clears local answers for another attempt on the same snapshot.
    pub fn reset(&mut self) {
        self.answers.clear();
        self.phase = SessionPhase::Answering;
    }

    /// Fresh snapshot and no answers.
    pub async fn restart(&mut self, catalog: &QuestionCatalogClient) -> AppResult<()> {
        self.snapshot = catalog.list_fresh().await?;
        self.reset();
        Ok(())
    }
}

/// Holds the phase at `Submitting` while a submit is in flight. Unless
/// settled, the phase goes back to `Answering` when this is dropped, which
/// covers both errors and a cancelled future.
struct PendingSubmit<'a> {
    phase: &'a mut SessionPhase,
    settled: bool,
}

impl<'a> PendingSubmit<'a> {
    fn begin(phase: &'a mut SessionPhase) -> Self {
        *phase = SessionPhase::Submitting;
        Self { phase, settled: false }
    }

    fn settle(&mut self, phase: SessionPhase) {
        *self.phase = phase;
        self.settled = true;
    }
}

impl Drop for PendingSubmit<'_> {
    fn drop(&mut self) {
        if !self.settled {
            *self.phase = SessionPhase::Answering;
        }
    }
}

fn matches_catalog(
    snapshot: &[Question],
    answers: &BTreeMap<QuestionId, u32>,
    current: &[Question],
) -> bool {
    let snapshot_ids: BTreeSet<QuestionId> = snapshot.iter().map(|q| q.id).collect();
    let current_ids: BTreeSet<QuestionId> = current.iter().map(|q| q.id).collect();
    if snapshot_ids != current_ids {
        return false;
    }

    current.iter().all(|q| match answers.get(&q.id) {
        Some(&selected) => q.has_option(selected),
        None => true,
    })
}

fn stale_error() -> AppError {
    AppError::ValidationError(
        "The question set changed while you were answering. Please restart the quiz.".to_string(),
    )
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionOutcome {
    pub question_id: QuestionId,
    pub selected_index: Option<u32>,
    pub correct: bool,
}

/// Per-question view of a server-graded submission.
pub fn reconcile(questions: &[Question], submission: &Submission) -> Vec<QuestionOutcome> {
    questions
        .iter()
        .map(|q| {
            let selected_index = submission.answer_for(q.id).map(|a| a.selected_index);
            QuestionOutcome {
                question_id: q.id,
                selected_index,
                correct: selected_index.is_some_and(|s| q.is_correct(s)),
            }
        })
        .collect()
}

//! Client-side view of the remote data service.
//!
//! [`RemoteDataService`] is the seam every client component talks through.
//! [`InProcessRemote`] binds it to an [`AppState`] and a caller identity,
//! [`GraphqlRemote`] speaks to a running server over HTTP.

use std::{future::Future, time::Duration};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};

use crate::{
    app_state::AppState,
    errors::{AppError, AppResult},
    models::{
        domain::{Answer, Principal, Question, QuestionId, Submission, UserProfile, UserRole},
        dto::QuestionInput,
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteDataService: Send + Sync {
    async fn add_question(&self, question: QuestionInput) -> AppResult<QuestionId>;
    async fn update_question(&self, question: QuestionInput) -> AppResult<Question>;
    async fn delete_question(&self, id: QuestionId) -> AppResult<()>;
    async fn get_all_questions(&self) -> AppResult<Vec<Question>>;
    async fn get_by_id(&self, id: QuestionId) -> AppResult<Question>;

    async fn get_caller_user_role(&self) -> AppResult<UserRole>;
    async fn is_caller_admin(&self) -> AppResult<bool>;
    async fn is_admin_initialized(&self) -> AppResult<bool>;
    async fn assign_caller_user_role(&self, user: &Principal, role: UserRole) -> AppResult<()>;
    async fn bootstrap_admin_role(&self, admin_token: &str, user_provided_token: &str) -> AppResult<()>;

    async fn get_caller_user_profile(&self) -> AppResult<Option<UserProfile>>;
    async fn save_caller_user_profile(&self, profile: UserProfile) -> AppResult<()>;
    async fn get_user_profile(&self, user: &Principal) -> AppResult<Option<UserProfile>>;

    async fn submit_answers(&self, answers: Vec<Answer>) -> AppResult<Submission>;
    async fn get_my_submissions(&self) -> AppResult<Vec<Submission>>;
    async fn get_user_submissions(&self, user: &Principal) -> AppResult<Vec<Submission>>;
}

/// Calls the services directly, as `caller`. Every call is bounded by `timeout`.
#[derive(Clone)]
pub struct InProcessRemote {
    state: AppState,
    caller: Option<Principal>,
    timeout: Duration,
}

impl InProcessRemote {
    pub fn new(state: AppState, caller: Option<Principal>) -> Self {
        let timeout = state.config.remote_timeout();
        Self {
            state,
            caller,
            timeout,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn caller(&self) -> Option<&Principal> {
        self.caller.as_ref()
    }

    async fn bounded<T>(&self, call: impl Future<Output = AppResult<T>>) -> AppResult<T> {
        tokio::time::timeout(self.timeout, call).await?
    }
}

#[async_trait]
impl RemoteDataService for InProcessRemote {
    async fn add_question(&self, question: QuestionInput) -> AppResult<QuestionId> {
        self.bounded(self.state.question_service.add_question(self.caller(), question))
            .await
    }

    async fn update_question(&self, question: QuestionInput) -> AppResult<Question> {
        self.bounded(self.state.question_service.update_question(self.caller(), question))
            .await
    }

    async fn delete_question(&self, id: QuestionId) -> AppResult<()> {
        self.bounded(self.state.question_service.delete_question(self.caller(), id))
            .await
    }

    async fn get_all_questions(&self) -> AppResult<Vec<Question>> {
        self.bounded(self.state.question_service.get_all_questions(self.caller()))
            .await
    }

    async fn get_by_id(&self, id: QuestionId) -> AppResult<Question> {
        self.bounded(self.state.question_service.get_question_by_id(self.caller(), id))
            .await
    }

    async fn get_caller_user_role(&self) -> AppResult<UserRole> {
        self.bounded(self.state.access_service.role_of(self.caller()))
            .await
    }

    async fn is_caller_admin(&self) -> AppResult<bool> {
        self.bounded(self.state.access_service.is_caller_admin(self.caller()))
            .await
    }

    async fn is_admin_initialized(&self) -> AppResult<bool> {
        self.bounded(self.state.access_service.is_admin_initialized())
            .await
    }

    async fn assign_caller_user_role(&self, user: &Principal, role: UserRole) -> AppResult<()> {
        self.bounded(self.state.access_service.assign_role(self.caller(), user, role))
            .await
    }

    async fn bootstrap_admin_role(&self, admin_token: &str, user_provided_token: &str) -> AppResult<()> {
        self.bounded(self.state.access_service.bootstrap_admin(
            self.caller(),
            admin_token,
            user_provided_token,
        ))
        .await
    }

    async fn get_caller_user_profile(&self) -> AppResult<Option<UserProfile>> {
        self.bounded(self.state.user_service.get_caller_profile(self.caller()))
            .await
    }

    async fn save_caller_user_profile(&self, profile: UserProfile) -> AppResult<()> {
        self.bounded(self.state.user_service.save_caller_profile(self.caller(), profile))
            .await
            .map(|_| ())
    }

    async fn get_user_profile(&self, user: &Principal) -> AppResult<Option<UserProfile>> {
        self.bounded(self.state.user_service.get_user_profile(self.caller(), user))
            .await
    }

    async fn submit_answers(&self, answers: Vec<Answer>) -> AppResult<Submission> {
        self.bounded(self.state.submission_service.submit_answers(self.caller(), answers))
            .await
    }

    async fn get_my_submissions(&self) -> AppResult<Vec<Submission>> {
        self.bounded(self.state.submission_service.get_my_submissions(self.caller()))
            .await
    }

    async fn get_user_submissions(&self, user: &Principal) -> AppResult<Vec<Submission>> {
        self.bounded(self.state.submission_service.get_user_submissions(self.caller(), user))
            .await
    }
}

const QUESTION_FIELDS: &str = "id questionText options answerIndex points topic";
const SUBMISSION_FIELDS: &str =
    "id user answers { questionId selectedIndex } score questionCount submittedAt";

#[derive(Debug, Deserialize)]
struct GraphqlEnvelope {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
    #[serde(default)]
    extensions: Option<Value>,
}

impl From<GraphqlError> for AppError {
    fn from(err: GraphqlError) -> Self {
        let code = err
            .extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .and_then(Value::as_str)
            .unwrap_or("INTERNAL_ERROR");
        AppError::from_code(code, err.message)
    }
}

/// GraphQL over HTTP, authenticated with a bearer token when one is set.
#[derive(Clone)]
pub struct GraphqlRemote {
    http: reqwest::Client,
    endpoint: String,
    token: Option<SecretString>,
}

impl GraphqlRemote {
    pub fn new(endpoint: impl Into<String>, token: Option<SecretString>, timeout: Duration) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::InternalError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            token,
        })
    }

    async fn execute<T: DeserializeOwned>(&self, query: &str, variables: Value, field: &str) -> AppResult<T> {
        let mut request = self
            .http
            .post(&self.endpoint)
            .header("accept", "application/json")
            .json(&json!({ "query": query, "variables": variables }));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await.map_err(|e| {
            log::error!("GraphQL request to {} failed: {}", self.endpoint, e);
            AppError::from(e)
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AppError::NotAuthenticated(
                "the server rejected the credentials".to_string(),
            ));
        }
        if status.is_server_error() && status != reqwest::StatusCode::INTERNAL_SERVER_ERROR {
            return Err(AppError::RemoteUnavailable(format!("server answered {}", status)));
        }

        let envelope: GraphqlEnvelope = response.json().await?;
        if let Some(err) = envelope.errors.into_iter().next() {
            return Err(err.into());
        }

        let value = envelope
            .data
            .and_then(|mut data| data.get_mut(field).map(Value::take))
            .ok_or_else(|| AppError::InternalError(format!("response is missing '{}'", field)))?;
        serde_json::from_value(value)
            .map_err(|e| AppError::InternalError(format!("Failed to parse '{}': {}", field, e)))
    }
}

#[async_trait]
impl RemoteDataService for GraphqlRemote {
    async fn add_question(&self, question: QuestionInput) -> AppResult<QuestionId> {
        let query = "mutation($question: QuestionInput!) { addQuestion(question: $question) }";
        self.execute(query, json!({ "question": question }), "addQuestion")
            .await
    }

    async fn update_question(&self, question: QuestionInput) -> AppResult<Question> {
        let query = format!(
            "mutation($question: QuestionInput!) {{ updateQuestion(question: $question) {{ {} }} }}",
            QUESTION_FIELDS
        );
        self.execute(&query, json!({ "question": question }), "updateQuestion")
            .await
    }

    async fn delete_question(&self, id: QuestionId) -> AppResult<()> {
        let query = "mutation($id: Int!) { deleteQuestion(id: $id) }";
        self.execute::<bool>(query, json!({ "id": id }), "deleteQuestion")
            .await
            .map(|_| ())
    }

    async fn get_all_questions(&self) -> AppResult<Vec<Question>> {
        let query = format!("{{ getAllQuestions {{ {} }} }}", QUESTION_FIELDS);
        self.execute(&query, json!({}), "getAllQuestions").await
    }

    async fn get_by_id(&self, id: QuestionId) -> AppResult<Question> {
        let query = format!(
            "query($id: Int!) {{ getById(id: $id) {{ {} }} }}",
            QUESTION_FIELDS
        );
        self.execute(&query, json!({ "id": id }), "getById").await
    }

    async fn get_caller_user_role(&self) -> AppResult<UserRole> {
        self.execute("{ getCallerUserRole }", json!({}), "getCallerUserRole")
            .await
    }

    async fn is_caller_admin(&self) -> AppResult<bool> {
        self.execute("{ isCallerAdmin }", json!({}), "isCallerAdmin")
            .await
    }

    async fn is_admin_initialized(&self) -> AppResult<bool> {
        self.execute("{ isAdminInitialized }", json!({}), "isAdminInitialized")
            .await
    }

    async fn assign_caller_user_role(&self, user: &Principal, role: UserRole) -> AppResult<()> {
        let query = "mutation($user: Principal!, $role: UserRole!) { assignCallerUserRole(user: $user, role: $role) }";
        self.execute::<bool>(query, json!({ "user": user, "role": role }), "assignCallerUserRole")
            .await
            .map(|_| ())
    }

    async fn bootstrap_admin_role(&self, admin_token: &str, user_provided_token: &str) -> AppResult<()> {
        let query = "mutation($adminToken: String!, $userProvidedToken: String!) { bootstrap_admin_role(adminToken: $adminToken, userProvidedToken: $userProvidedToken) }";
        self.execute::<bool>(
            query,
            json!({ "adminToken": admin_token, "userProvidedToken": user_provided_token }),
            "bootstrap_admin_role",
        )
        .await
        .map(|_| ())
    }

    async fn get_caller_user_profile(&self) -> AppResult<Option<UserProfile>> {
        self.execute("{ getCallerUserProfile { name } }", json!({}), "getCallerUserProfile")
            .await
    }

    async fn save_caller_user_profile(&self, profile: UserProfile) -> AppResult<()> {
        let query = "mutation($profile: UserProfileInput!) { saveCallerUserProfile(profile: $profile) { name } }";
        self.execute::<UserProfile>(query, json!({ "profile": profile }), "saveCallerUserProfile")
            .await
            .map(|_| ())
    }

    async fn get_user_profile(&self, user: &Principal) -> AppResult<Option<UserProfile>> {
        let query = "query($user: Principal!) { getUserProfile(user: $user) { name } }";
        self.execute(query, json!({ "user": user }), "getUserProfile")
            .await
    }

    async fn submit_answers(&self, answers: Vec<Answer>) -> AppResult<Submission> {
        let query = format!(
            "mutation($answers: [AnswerInput!]!) {{ submitAnswers(answers: $answers) {{ {} }} }}",
            SUBMISSION_FIELDS
        );
        self.execute(&query, json!({ "answers": answers }), "submitAnswers")
            .await
    }

    async fn get_my_submissions(&self) -> AppResult<Vec<Submission>> {
        let query = format!("{{ getMySubmissions {{ {} }} }}", SUBMISSION_FIELDS);
        self.execute(&query, json!({}), "getMySubmissions").await
    }

    async fn get_user_submissions(&self, user: &Principal) -> AppResult<Vec<Submission>> {
        let query = format!(
            "query($user: Principal!) {{ getUserSubmissions(user: $user) {{ {} }} }}",
            SUBMISSION_FIELDS
        );
        self.execute(&query, json!({ "user": user }), "getUserSubmissions")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::test_utils::fixtures::{slow_listing_state, student};

    #[test]
    fn test_graphql_error_code_becomes_typed_error() {
        let err = GraphqlError {
            message: "an administrator has already been claimed".to_string(),
            extensions: Some(json!({ "code": "ALREADY_INITIALIZED" })),
        };
        assert!(matches!(AppError::from(err), AppError::AlreadyInitialized(_)));

        let bare = GraphqlError {
            message: "boom".to_string(),
            extensions: None,
        };
        assert!(matches!(AppError::from(bare), AppError::InternalError(_)));
    }

    #[tokio::test]
    async fn test_in_process_remote_acts_as_caller() {
        let state = AppState::in_memory(Config::test_config());
        let anonymous = InProcessRemote::new(state.clone(), None);
        let student = InProcessRemote::new(state, Some(Principal::new("student")));

        assert_eq!(anonymous.get_caller_user_role().await.unwrap(), UserRole::Guest);
        assert_eq!(student.get_caller_user_role().await.unwrap(), UserRole::User);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_remote_unavailable() {
        let remote = GraphqlRemote::new(
            "http://127.0.0.1:9/graphql",
            None,
            Duration::from_millis(500),
        )
        .unwrap();

        let result = remote.is_admin_initialized().await;
        assert!(matches!(result, Err(AppError::RemoteUnavailable(_))));
    }

    #[tokio::test]
    async fn test_slow_call_times_out_as_remote_unavailable() {
        let state = slow_listing_state(Duration::from_secs(5)).await;
        let remote = InProcessRemote::new(state, Some(student()))
            .with_timeout(Duration::from_millis(20));

        let result = remote.get_all_questions().await;
        match result {
            Err(AppError::RemoteUnavailable(message)) => assert_eq!(message, "request timed out"),
            other => panic!("expected a timeout, got {:?}", other),
        }

        // calls that finish in time are unaffected
        assert_eq!(remote.get_caller_user_role().await.unwrap(), UserRole::User);
    }
}

use async_graphql::{Context, Object};

use crate::{
    graphql::helpers::{request_scope, with_code},
    models::domain::{Principal, Question, QuestionId, Submission, UserProfile, UserRole},
};

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn get_all_questions(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<Question>> {
        let (state, caller) = request_scope(ctx)?;
        with_code(state.question_service.get_all_questions(caller.as_ref()).await)
    }

    async fn get_by_id(&self, ctx: &Context<'_>, id: QuestionId) -> async_graphql::Result<Question> {
        let (state, caller) = request_scope(ctx)?;
        with_code(
            state
                .question_service
                .get_question_by_id(caller.as_ref(), id)
                .await,
        )
    }

    async fn get_caller_user_role(&self, ctx: &Context<'_>) -> async_graphql::Result<UserRole> {
        let (state, caller) = request_scope(ctx)?;
        with_code(state.access_service.role_of(caller.as_ref()).await)
    }

    async fn is_caller_admin(&self, ctx: &Context<'_>) -> async_graphql::Result<bool> {
        let (state, caller) = request_scope(ctx)?;
        with_code(state.access_service.is_caller_admin(caller.as_ref()).await)
    }

    async fn is_admin_initialized(&self, ctx: &Context<'_>) -> async_graphql::Result<bool> {
        let (state, _) = request_scope(ctx)?;
        with_code(state.access_service.is_admin_initialized().await)
    }

    async fn get_caller_user_profile(
        &self,
        ctx: &Context<'_>,
    ) -> async_graphql::Result<Option<UserProfile>> {
        let (state, caller) = request_scope(ctx)?;
        with_code(state.user_service.get_caller_profile(caller.as_ref()).await)
    }

    async fn get_user_profile(
        &self,
        ctx: &Context<'_>,
        user: Principal,
    ) -> async_graphql::Result<Option<UserProfile>> {
        let (state, caller) = request_scope(ctx)?;
        with_code(
            state
                .user_service
                .get_user_profile(caller.as_ref(), &user)
                .await,
        )
    }

    async fn get_my_submissions(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<Submission>> {
        let (state, caller) = request_scope(ctx)?;
        with_code(
            state
                .submission_service
                .get_my_submissions(caller.as_ref())
                .await,
        )
    }

    async fn get_user_submissions(
        &self,
        ctx: &Context<'_>,
        user: Principal,
    ) -> async_graphql::Result<Vec<Submission>> {
        let (state, caller) = request_scope(ctx)?;
        with_code(
            state
                .submission_service
                .get_user_submissions(caller.as_ref(), &user)
                .await,
        )
    }
}

use async_graphql::{Context, Object};

use crate::{
    graphql::helpers::{request_scope, with_code},
    models::{
        domain::{Answer, Principal, Question, QuestionId, Submission, UserProfile, UserRole},
        dto::QuestionInput,
    },
};

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn add_question(
        &self,
        ctx: &Context<'_>,
        question: QuestionInput,
    ) -> async_graphql::Result<QuestionId> {
        let (state, caller) = request_scope(ctx)?;
        with_code(
            state
                .question_service
                .add_question(caller.as_ref(), question)
                .await,
        )
    }

    async fn update_question(
        &self,
        ctx: &Context<'_>,
        question: QuestionInput,
    ) -> async_graphql::Result<Question> {
        let (state, caller) = request_scope(ctx)?;
        with_code(
            state
                .question_service
                .update_question(caller.as_ref(), question)
                .await,
        )
    }

    async fn delete_question(&self, ctx: &Context<'_>, id: QuestionId) -> async_graphql::Result<bool> {
        let (state, caller) = request_scope(ctx)?;
        with_code(
            state
                .question_service
                .delete_question(caller.as_ref(), id)
                .await
                .map(|_| true),
        )
    }

    async fn assign_caller_user_role(
        &self,
        ctx: &Context<'_>,
        user: Principal,
        role: UserRole,
    ) -> async_graphql::Result<bool> {
        let (state, caller) = request_scope(ctx)?;
        with_code(
            state
                .access_service
                .assign_role(caller.as_ref(), &user, role)
                .await
                .map(|_| true),
        )
    }

    #[graphql(name = "bootstrap_admin_role")]
    async fn bootstrap_admin_role(
        &self,
        ctx: &Context<'_>,
        admin_token: String,
        user_provided_token: String,
    ) -> async_graphql::Result<bool> {
        let (state, caller) = request_scope(ctx)?;
        with_code(
            state
                .access_service
                .bootstrap_admin(caller.as_ref(), &admin_token, &user_provided_token)
                .await
                .map(|_| true),
        )
    }

    async fn save_caller_user_profile(
        &self,
        ctx: &Context<'_>,
        profile: UserProfile,
    ) -> async_graphql::Result<UserProfile> {
        let (state, caller) = request_scope(ctx)?;
        with_code(
            state
                .user_service
                .save_caller_profile(caller.as_ref(), profile)
                .await,
        )
    }

    async fn submit_answers(
        &self,
        ctx: &Context<'_>,
        answers: Vec<Answer>,
    ) -> async_graphql::Result<Submission> {
        let (state, caller) = request_scope(ctx)?;
        with_code(
            state
                .submission_service
                .submit_answers(caller.as_ref(), answers)
                .await,
        )
    }
}

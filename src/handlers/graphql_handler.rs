use actix_web::{get, post, web, HttpResponse};
use async_graphql::http::GraphiQLSource;
use async_graphql_actix_web::{GraphQLRequest, GraphQLResponse};

use crate::{auth::Identity, graphql::Schema};

#[post("/graphql")]
async fn graphql_endpoint(
    schema: web::Data<Schema>,
    identity: Identity,
    request: GraphQLRequest,
) -> GraphQLResponse {
    let mut request = request.into_inner();
    if let Some(principal) = identity.0 {
        request = request.data(principal);
    }
    schema.execute(request).await.into()
}

#[get("/graphql")]
async fn graphiql_page() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(GraphiQLSource::build().endpoint("/graphql").finish())
}

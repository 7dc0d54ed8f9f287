pub mod graphql_handler;
pub mod health_handler;

pub use graphql_handler::{graphiql_page, graphql_endpoint};
pub use health_handler::{health_check, health_check_live, health_check_ready};

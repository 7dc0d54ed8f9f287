use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};

use aptitude_hub::{
    app_state::AppState,
    config::{Config, StorageBackend},
    graphql::create_schema,
    handlers,
    middleware::RequestIdMiddleware,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env();
    if config.storage_backend == StorageBackend::Mongo {
        config.validate_for_production();
    }

    let host = config.web_server_host.clone();
    let port = config.web_server_port;

    let app_state = AppState::new(config)
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    let schema = create_schema(app_state.clone());

    log::info!("Starting HTTP server on {}:{}", host, port);
    log::info!("GraphiQL playground: http://{}:{}/graphql", host, port);

    let app_state = web::Data::new(app_state);
    let schema = web::Data::new(schema);

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(schema.clone())
            .wrap(Cors::permissive())
            .wrap(RequestIdMiddleware)
            .wrap(Logger::new(r#"%a "%r" %s %b %T req_id=%{x-request-id}o"#))
            .service(handlers::graphql_endpoint)
            .service(handlers::graphiql_page)
            .service(handlers::health_check)
            .service(handlers::health_check_live)
            .service(handlers::health_check_ready)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}

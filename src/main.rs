use actix_cors::Cors;
use actix_web::{
    middleware::{self, Condition},
    web::Data,
    App, HttpServer,
};
use clap::Parser;
use database::database::repository::ParticipantRepository;
use participants::{config::ServerConfig, routes, state::AppState};
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Optional, values already in the environment win
    dotenvy::dotenv().ok();

    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args = ServerConfig::parse();

    let store = args.storage().connect().await;
    let repository = ParticipantRepository::new(store, &args.table);

    log::info!(
        "Using {:?} storage, table [{}]",
        args.storage_engine,
        repository.table()
    );

    if args.should_create_table() {
        repository.init().await.map_err(io::Error::other)?;
    }

    let admin = args.admin_credentials();

    if args.admin_username.is_empty() || args.admin_password.is_empty() {
        log::warn!("Admin credentials are empty, every participants request will be rejected");
    } else {
        log::info!("Participants routes restricted to admin [{}]", admin.username());
    }

    let state = Data::new(AppState::new(repository, admin));

    log::info!("starting HTTP server on port {}.", args.port);

    let log_http = args.log_http;
    let permissive_cors = args.permissive_cors;

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(routes::configure)
            .wrap(Condition::new(permissive_cors, Cors::permissive()))
            .wrap(Condition::new(log_http, middleware::Logger::default()))
    })
    .workers(args.http_workers)
    .bind((args.address, args.port))?
    .run()
    .await
}

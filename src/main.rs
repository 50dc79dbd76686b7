use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use cordpal_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    handlers,
    middlewares::{RequestIdMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    let config = Config::from_toml().expect("Failed to load configuration file");

    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // Service wiring, leaves first
    let user_service = UserService::new(pool.clone());
    let album_service = AlbumService::new(pool.clone(), user_service.clone());
    let outage_service = OutageService::new(pool.clone(), config.aotd.clone(), user_service.clone());
    let rating_service = RatingService::new(pool.clone(), config.aotd.clone());
    let timeline_service = TimelineService::new(pool.clone(), rating_service.clone());
    let streak_service = StreakService::new(pool.clone());
    let chance_service = ChanceService::new(pool.clone(), config.aotd.clone());
    let review_service = ReviewService::new(
        pool.clone(),
        config.aotd.clone(),
        streak_service.clone(),
        chance_service.clone(),
    );
    let selection_service = SelectionService::new(
        pool.clone(),
        config.aotd.clone(),
        chance_service.clone(),
        timeline_service.clone(),
        rating_service.clone(),
    );

    // Daily selection, streak reset and chance refresh jobs
    tasks::spawn_all(
        selection_service.clone(),
        chance_service.clone(),
        streak_service.clone(),
    );

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .wrap(RequestIdMiddleware)
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(album_service.clone()))
            .app_data(web::Data::new(outage_service.clone()))
            .app_data(web::Data::new(rating_service.clone()))
            .app_data(web::Data::new(timeline_service.clone()))
            .app_data(web::Data::new(streak_service.clone()))
            .app_data(web::Data::new(chance_service.clone()))
            .app_data(web::Data::new(review_service.clone()))
            .app_data(web::Data::new(selection_service.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::aotd_config)
                    .configure(handlers::review_config)
                    .configure(handlers::album_config)
                    .configure(handlers::outage_config)
                    .configure(handlers::user_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}

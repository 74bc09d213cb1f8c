use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use clap::Parser;
use socra::api::middleware::ApiKeyAuth;
use socra::cli::{commands::{Cli, Commands}, run_cli};
use socra::config::AppConfig;
use socra::db;
use socra::orchestrator::SessionOrchestrator;
use socra::reasoning::{HttpReasoningGateway, ReasoningGateway};
use std::sync::Arc;
use tracing::{error, info};

async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({"status": "healthy"}))
}

async fn index() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "service": "socra",
        "description": "Document-grounded Socratic tutoring sessions",
    }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if !matches!(cli.command, Commands::Serve) {
        run_cli(cli.command, cli.config).await;
        return Ok(());
    }

    info!("Starting Socra Tutoring Server...");

    let config = match AppConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let db_pool = match db::get_connection(&config.database) {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let gateway: Arc<dyn ReasoningGateway> = Arc::new(HttpReasoningGateway::new(&config.reasoning));
    let orchestrator = web::Data::new(SessionOrchestrator::new(db_pool, gateway));

    let host = config.server.host.clone();
    let port = config.server.port;

    info!("Server listening on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(config.clone()))
            .app_data(orchestrator.clone())
            .route("/", web::get().to(index))
            .route("/health", web::get().to(health))
            .wrap(ApiKeyAuth)
            .configure(socra::api::routes::configure)
    })
    .bind((host, port))?
    .run()
    .await
}

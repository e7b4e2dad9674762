mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use verimail_api::auth::{AppState, AppStateInner};
use verimail_api::{FlowConfig, VerificationFlow, routes};
use verimail_db::Database;
use verimail_mail::{ResendMailer, ResendOptions};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "verimail=debug,verimail_api=debug,tower_http=debug".into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: {e:#}");
            eprintln!("       Set it in your .env file and restart.");
            std::process::exit(1);
        }
    };

    // Init database
    let db = Arc::new(Database::open(&config.db_path)?);

    let mailer = Arc::new(ResendMailer::new(ResendOptions {
        api_key: config.resend_api_key.clone(),
        base_url: config.resend_base_url.clone(),
        timeout: config.mail_timeout,
    })?);

    let flow = VerificationFlow::with_database(
        db,
        mailer,
        FlowConfig {
            email_from: config.email_from.clone(),
            enquiry_recipients: config.email_to.clone(),
            app_url: config.app_url.clone(),
            token_ttl: config.token_ttl,
        },
    );
    let app_state: AppState = Arc::new(AppStateInner { flow });

    let app = routes::router(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Verimail server listening on {}", addr);
    match config.token_ttl {
        Some(ttl) => info!("Verification tokens expire after {} hours", ttl.num_hours()),
        None => info!("Verification tokens do not expire"),
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}

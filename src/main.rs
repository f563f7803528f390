use anyhow::{Context, Result};
use clap::Parser;
use exportpitch::feedback::{FeedbackGenerator, HttpScorer};
use exportpitch::notify::{HttpMailer, LogMailer, Mailer, NotificationDispatcher};
use exportpitch::{create_router, AppState, Config, SessionLifecycle, Store};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "exportpitch")]
#[command(about = "ExportPitch practice and feedback service")]
struct Args {
    /// Config file, extension optional
    #[arg(short, long, default_value = "config/exportpitch")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("ExportPitch v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    let store = Store::open(&cfg.database.path).await?;

    let mailer: Arc<dyn Mailer> = if cfg.email.enabled {
        Arc::new(HttpMailer::new(&cfg.email).context("Failed to create email client")?)
    } else {
        warn!("Email delivery disabled, notifications will only be logged");
        Arc::new(LogMailer)
    };
    let dispatcher = Arc::new(NotificationDispatcher::new(
        store.clone(),
        mailer,
        cfg.email.app_url.clone(),
    ));

    let scorer = Arc::new(HttpScorer::new(&cfg.scoring).context("Failed to create scoring client")?);
    let generator = FeedbackGenerator::new(
        store.clone(),
        scorer,
        dispatcher,
        Duration::from_secs(cfg.scoring.timeout_secs),
    );

    let lifecycle = SessionLifecycle::new(store.clone(), cfg.credits.session_cost);
    info!("Session cost: {} credit(s)", lifecycle.session_cost());

    let state = AppState::new(store, lifecycle, generator, cfg.voice.clone());
    let app = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}

#![warn(clippy::all)]

use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::fmt::format::FmtSpan;

use content_service::config::{Args, Command, Config};
use content_service::services::Services;
use content_service::store::PgStore;
use content_service::types::question::QuestionId;

#[tokio::main]
async fn main() -> Result<(), handle_errors::Error> {
    let args = Args::parse();
    let config = Config::load(&args.config)?;

    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| config.log_filter(args.log_level.as_deref()));

    tracing_subscriber::fmt()
        .with_env_filter(log_filter)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    let result = run(args.command, &config).await;
    if let Err(e) = &result {
        e.trace();
    }
    result
}

async fn run(command: Command, config: &Config) -> Result<(), handle_errors::Error> {
    let store = PgStore::new(&config.database_url(), config.max_connections).await?;
    store.migrate().await?;
    info!("migrations applied");

    let services = Services::new(Arc::new(store), config.max_write_attempts);

    match command {
        Command::Migrate => Ok(()),
        Command::Resync {
            question: Some(id),
        } => {
            let count = services.counters.resync(QuestionId(id)).await?;
            println!(
                "{}",
                serde_json::json!({ "question_id": id, "answer_count": count })
            );
            Ok(())
        }
        Command::Resync { question: None } => {
            let report = services.counters.resync_all().await?;
            println!("{}", serde_json::json!(report));
            Ok(())
        }
    }
}

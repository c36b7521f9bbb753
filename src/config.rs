use clap::Parser;
use serde::Deserialize;

use handle_errors::Error;

/// Maintenance tool for the content database
#[derive(Parser, Debug, PartialEq)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file name, extension optional
    #[clap(short, long, default_value = "setup")]
    pub config: String,
    /// Overrides the configured log level
    #[clap(short, long)]
    pub log_level: Option<String>,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Apply pending database migrations
    Migrate,
    /// Recount the active answers of one question, or of every question
    Resync {
        #[clap(long)]
        question: Option<i32>,
    },
}

#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_database_host")]
    pub database_host: String,
    #[serde(default = "default_database_port")]
    pub database_port: u16,
    #[serde(default = "default_database_name")]
    pub database_name: String,
    #[serde(default = "default_database_user")]
    pub database_user: String,
    #[serde(default)]
    pub database_password: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_max_write_attempts")]
    pub max_write_attempts: u32,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_database_host() -> String {
    "localhost".to_string()
}

fn default_database_port() -> u16 {
    5432
}

fn default_database_name() -> String {
    "content".to_string()
}

fn default_database_user() -> String {
    "postgres".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_max_write_attempts() -> u32 {
    crate::services::DEFAULT_WRITE_ATTEMPTS
}

impl Config {
    /// Reads `.env`, then the optional config file, then `CONTENT_*`
    /// environment variables. Later sources win.
    pub fn load(path: &str) -> Result<Config, Error> {
        dotenv::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("CONTENT"))
            .build()?;

        Ok(config.try_deserialize::<Config>()?)
    }

    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.database_user,
            self.database_password,
            self.database_host,
            self.database_port,
            self.database_name
        )
    }

    pub fn log_filter(&self, level_override: Option<&str>) -> String {
        let level = level_override.unwrap_or(&self.log_level);
        format!("content_service={},sqlx=warn", level)
    }
}

//! Operator entry point.
//!
//! # Responsibility
//! - Probe core linkage, migrate a database file, and seed sample data.
//! - Resolve configuration from the environment with a `--db` override.

mod commands;
mod seed;

use anyhow::Context;
use commands::{CommandLine, Commands};
use stackit_core::db::migrations::{current_user_version, latest_version};
use stackit_core::{init_logging, open_db, CoreConfig};

fn main() -> anyhow::Result<()> {
    let cli = CommandLine::parse_args();

    let mut config = CoreConfig::from_env().context("failed to read configuration")?;
    if let Some(db) = cli.db {
        config = config.with_db_path(db);
    }
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(config.log_level, log_dir).context("failed to initialize logging")?;
    }

    match cli.command {
        Commands::Ping => {
            println!("stackit_core ping={}", stackit_core::ping());
            println!("stackit_core version={}", stackit_core::core_version());
            Ok(())
        }
        Commands::Migrate => {
            let conn = open_db(&config.db_path)
                .with_context(|| format!("failed to open `{}`", config.db_path.display()))?;
            let version = current_user_version(&conn)?;
            println!(
                "database `{}` at schema version {version}/{}",
                config.db_path.display(),
                latest_version()
            );
            Ok(())
        }
        Commands::Seed => {
            let conn = open_db(&config.db_path)
                .with_context(|| format!("failed to open `{}`", config.db_path.display()))?;
            let summary = seed::seed_sample_forum(&conn)?;
            println!("{summary}");
            Ok(())
        }
    }
}

mod analysis;
mod cleaner;
mod combiner;
mod error;
mod loader;
mod metrics;
mod settings;
mod table;

use anyhow::{Context, Result};
use metrics::{new_run_id, StageTracker};
use settings::Settings;
use tracing::info;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let settings = Settings::from_env();
    info!(settings = ?settings, "Starting data preparation");

    println!("Users & Posts Preparation");
    println!("=========================\n");

    let result = if settings == Settings::default() {
        analysis::run()
    } else {
        info!("Running with {}_* overrides", settings::ENV_PREFIX);
        analysis::run_with(&settings, &mut StageTracker::new(new_run_id()))
    };
    let combined = result.with_context(|| {
        format!(
            "preparing {} and {}",
            settings.users_path.display(),
            settings.posts_path.display()
        )
    })?;

    if combined.is_empty() {
        println!("\nNo user matched any post.");
        return Ok(());
    }
    println!("\nCombined table (first {} rows):\n", settings.preview_rows);
    println!("{}", combined.render_preview(settings.preview_rows));
    Ok(())
}

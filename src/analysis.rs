//! Load → clean → combine, producing the table the analysis works on.

use tracing::info;

use crate::cleaner::{fill_missing, normalize_status, normalize_text};
use crate::combiner::combine;
use crate::error::Result;
use crate::loader::load;
use crate::metrics::{new_run_id, StageTracker};
use crate::settings::Settings;
use crate::table::Table;

pub const BIO_COLUMN: &str = "biografia";
pub const INTERESTS_COLUMN: &str = "intereses";
pub const STATUS_COLUMN: &str = "estado";

/// Reads `data/usuarios.csv` and `data/publicaciones.json` and returns the
/// cleaned, combined table.
pub fn run() -> Result<Table> {
    let mut tracker = StageTracker::new(new_run_id());
    run_with(&Settings::default(), &mut tracker)
}

pub fn run_with(settings: &Settings, tracker: &mut StageTracker) -> Result<Table> {
    info!(
        users = %settings.users_path.display(),
        posts = %settings.posts_path.display(),
        "loading and preprocessing data"
    );
    let (mut users, mut posts) = load(&settings.users_path, &settings.posts_path)?;
    info!(users = users.len(), posts = posts.len(), "sources loaded");

    let before = users.null_count(BIO_COLUMN);
    fill_missing(&mut users, BIO_COLUMN, &settings.missing_bio)?;
    tracker.record("fill_missing:biografia", &users, BIO_COLUMN, before);

    let before = users.null_count(INTERESTS_COLUMN);
    normalize_text(&mut users, INTERESTS_COLUMN)?;
    tracker.record("normalize_text:intereses", &users, INTERESTS_COLUMN, before);

    let before = posts.null_count(STATUS_COLUMN);
    normalize_status(&mut posts, STATUS_COLUMN)?;
    tracker.record("normalize_status:estado", &posts, STATUS_COLUMN, before);

    let combined = combine(&users, &posts, &settings.join_key)?;
    tracker.record("combine", &combined, &settings.join_key, 0);

    info!(
        rows = combined.len(),
        columns = combined.columns().len(),
        "data loaded and combined"
    );
    Ok(combined)
}

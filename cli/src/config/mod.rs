//! CLI configuration

pub mod loader;

pub use loader::CliConfigLoader;

use tracing::{debug, warn};

/// Load `.env` from the working directory, if there is one.
/// Variables already set in the environment are left alone.
pub fn load_dotenv() {
    match dotenv::dotenv() {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "failed to read .env"),
    }
}

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use roulette_game::{Catalog, Character, RouletteSession, SessionConfig};

/// Shared inputs every scenario iteration builds its session from.
#[derive(Debug, Clone)]
pub struct TesterAssets {
    roster: Arc<[Character]>,
    catalog: Arc<Catalog>,
    config: SessionConfig,
}

impl TesterAssets {
    #[must_use]
    pub fn new(roster: Arc<[Character]>, config: SessionConfig) -> Self {
        Self {
            roster,
            catalog: Arc::new(Catalog::builtin().clone()),
            config,
        }
    }

    /// Read a `SessionConfig` JSON document, or the defaults when no path is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or fails validation.
    pub fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
        let Some(path) = path else {
            return Ok(SessionConfig::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        SessionConfig::from_json(&raw).with_context(|| format!("invalid config {}", path.display()))
    }

    #[must_use]
    pub fn roster(&self) -> &[Character] {
        &self.roster
    }

    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn session(&self, seed: u64) -> RouletteSession {
        RouletteSession::with_config(
            Arc::clone(&self.roster),
            Arc::clone(&self.catalog),
            self.config,
            seed,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roulette_game::{FIXTURE_ROSTER_DATA, parse_ddragon_roster};

    #[test]
    fn missing_config_path_yields_defaults() {
        assert_eq!(
            TesterAssets::load_config(None).unwrap(),
            SessionConfig::default()
        );
    }

    #[test]
    fn unreadable_config_names_the_file() {
        let err = TesterAssets::load_config(Some(Path::new("/nonexistent/roulette.json")))
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/roulette.json"));
    }

    #[test]
    fn sessions_share_the_roster() {
        let roster: Arc<[Character]> = parse_ddragon_roster(FIXTURE_ROSTER_DATA).unwrap().into();
        let assets = TesterAssets::new(roster, SessionConfig::default());
        let a = assets.session(1);
        let b = assets.session(2);
        assert_eq!(a.roster(), b.roster());
        assert_eq!(a.seed(), 1);
    }
}

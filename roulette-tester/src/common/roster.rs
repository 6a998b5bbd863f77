use anyhow::{Context, Result};
use clap::ValueEnum;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use roulette_game::roster::roster_url;
use roulette_game::{
    Character, RosterCache, RosterError, RosterProvider, RosterStatus, StaticRoster,
    parse_ddragon_roster,
};

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RosterSource {
    /// Bundled champion fixture (offline, deterministic)
    Fixture,
    /// Current Data Dragon champion list
    Live,
}

/// Fetches `champion.json` from the Data Dragon CDN.
pub struct DataDragonRoster {
    client: Client,
    url: String,
}

impl DataDragonRoster {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn pinned() -> Result<Self> {
        Self::new(roster_url())
    }
}

#[async_trait::async_trait(?Send)]
impl RosterProvider for DataDragonRoster {
    async fn fetch_roster(&self) -> Result<Vec<Character>, RosterError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| RosterError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RosterError::Http {
                status: response.status().as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| RosterError::Transport(e.to_string()))?;
        parse_ddragon_roster(&body)
    }
}

async fn load_through<P: RosterProvider>(provider: P) -> Result<Arc<[Character]>> {
    let cache = RosterCache::new(provider);
    match cache.load().await {
        Ok(roster) => {
            if let RosterStatus::Ready { count } = cache.status().await {
                log::info!("roster ready with {count} champions");
            }
            Ok(roster)
        }
        Err(err) => Err(err).context("failed to load champion roster"),
    }
}

/// Resolve the roster the scenarios run against.
///
/// # Errors
///
/// Returns an error if the roster cannot be fetched or parsed.
pub async fn load_roster(source: RosterSource) -> Result<Arc<[Character]>> {
    match source {
        RosterSource::Fixture => load_through(StaticRoster::fixture()).await,
        RosterSource::Live => load_through(DataDragonRoster::pinned()?).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_source_loads_offline() {
        let roster = tokio_test::block_on(load_roster(RosterSource::Fixture)).unwrap();
        assert!(roster.len() >= 10);
        assert!(
            roster
                .windows(2)
                .all(|w| w[0].name.to_lowercase() <= w[1].name.to_lowercase())
        );
    }

    #[test]
    fn malformed_fixture_reports_context() {
        let err = tokio_test::block_on(load_through(StaticRoster::new("{\"data\":{}}")))
            .unwrap_err();
        assert!(format!("{err:#}").contains("failed to load champion roster"));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let provider = DataDragonRoster::new("http://127.0.0.1:9/champion.json").unwrap();
        let err = provider.fetch_roster().await.unwrap_err();
        assert!(matches!(err, RosterError::Transport(_)), "{err}");
    }
}

//! Character roster: Data Dragon parsing and the session-wide load-once cache.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::catalog::Candidate;
use crate::constants::{DDRAGON_CDN, DDRAGON_VERSION};

#[cfg(feature = "async")]
use std::sync::Arc;
#[cfg(feature = "async")]
use tokio::sync::OnceCell;

/// Bundled Data Dragon excerpt used by tests and offline runs.
pub const FIXTURE_ROSTER_DATA: &str = include_str!("../assets/data/roster_fixture.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Fighter,
    Mage,
    Assassin,
    Marksman,
    Support,
    Tank,
}

impl Role {
    /// Display order; the first entry is the single-role default.
    pub const ALL: [Self; 6] = [
        Self::Fighter,
        Self::Mage,
        Self::Assassin,
        Self::Marksman,
        Self::Support,
        Self::Tank,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fighter => "Fighter",
            Self::Mage => "Mage",
            Self::Assassin => "Assassin",
            Self::Marksman => "Marksman",
            Self::Support => "Support",
            Self::Tank => "Tank",
        }
    }

    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(tag.trim()))
    }

    /// Primary role from a Data Dragon tag list; unknown or missing tags fall back to Fighter.
    #[must_use]
    pub fn from_tags(tags: &[String]) -> Self {
        tags.first()
            .and_then(|tag| Self::parse(tag))
            .unwrap_or(Self::Fighter)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: String,
    pub name: String,
    pub title: String,
    pub role: Role,
    pub image_url: String,
}

impl Candidate for Character {
    fn id(&self) -> &str {
        &self.id
    }
}

#[must_use]
pub fn loading_image_url(character_id: &str) -> String {
    format!("{DDRAGON_CDN}/img/champion/loading/{character_id}_0.jpg")
}

#[must_use]
pub fn square_image_url(character_id: &str) -> String {
    format!("{DDRAGON_CDN}/{DDRAGON_VERSION}/img/champion/{character_id}.png")
}

/// Endpoint of the English champion summary for the pinned version.
#[must_use]
pub fn roster_url() -> String {
    format!("{DDRAGON_CDN}/{DDRAGON_VERSION}/data/en_US/champion.json")
}

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("Failed to fetch champion data: {status}")]
    Http { status: u16 },
    #[error("Failed to reach the roster service: {0}")]
    Transport(String),
    #[error("Roster payload could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Roster payload contained no champions")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct DdragonChampion {
    id: String,
    name: String,
    title: String,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DdragonResponse {
    data: HashMap<String, DdragonChampion>,
}

/// Parse a Data Dragon `champion.json` document into a name-sorted roster.
///
/// # Errors
///
/// Returns an error if the document is malformed or lists no champions.
pub fn parse_ddragon_roster(json: &str) -> Result<Vec<Character>, RosterError> {
    let response: DdragonResponse = serde_json::from_str(json)?;
    if response.data.is_empty() {
        return Err(RosterError::Empty);
    }
    let mut roster: Vec<Character> = response
        .data
        .into_values()
        .map(|champ| Character {
            image_url: loading_image_url(&champ.id),
            role: Role::from_tags(&champ.tags),
            id: champ.id,
            name: champ.name,
            title: champ.title,
        })
        .collect();
    roster.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });
    Ok(roster)
}

/// Load state surfaced to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum RosterStatus {
    Loading,
    Ready { count: usize },
    Failed { message: String },
}

/// Source of the ordered character list. Called at most once per
/// successful session load.
#[cfg(feature = "async")]
#[async_trait::async_trait(?Send)]
pub trait RosterProvider {
    async fn fetch_roster(&self) -> Result<Vec<Character>, RosterError>;
}

/// Provider backed by an in-memory Data Dragon document.
#[cfg(feature = "async")]
#[derive(Debug, Clone)]
pub struct StaticRoster {
    json: String,
}

#[cfg(feature = "async")]
impl StaticRoster {
    #[must_use]
    pub fn new(json: impl Into<String>) -> Self {
        Self { json: json.into() }
    }

    /// The bundled fixture roster.
    #[must_use]
    pub fn fixture() -> Self {
        Self::new(FIXTURE_ROSTER_DATA)
    }
}

#[cfg(feature = "async")]
#[async_trait::async_trait(?Send)]
impl RosterProvider for StaticRoster {
    async fn fetch_roster(&self) -> Result<Vec<Character>, RosterError> {
        parse_ddragon_roster(&self.json)
    }
}

/// Session-wide roster memo. The first caller triggers the fetch; callers
/// arriving while it is in flight await the same result. Failures are not
/// memoized, so a manual retry issues a fresh fetch.
#[cfg(feature = "async")]
pub struct RosterCache<P> {
    provider: P,
    cell: OnceCell<Arc<[Character]>>,
}

#[cfg(feature = "async")]
impl<P: RosterProvider> RosterCache<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            cell: OnceCell::new(),
        }
    }

    /// Return the cached roster, fetching it on first use.
    ///
    /// # Errors
    ///
    /// Propagates the provider's error; nothing is cached in that case.
    pub async fn load(&self) -> Result<Arc<[Character]>, RosterError> {
        self.cell
            .get_or_try_init(|| async {
                log::debug!("fetching character roster");
                let roster = self.provider.fetch_roster().await?;
                if roster.is_empty() {
                    return Err(RosterError::Empty);
                }
                log::debug!("roster loaded with {} characters", roster.len());
                Ok(Arc::from(roster))
            })
            .await
            .cloned()
    }

    /// Load and fold the outcome into a presentation status.
    pub async fn status(&self) -> RosterStatus {
        match self.load().await {
            Ok(roster) => RosterStatus::Ready {
                count: roster.len(),
            },
            Err(err) => {
                log::warn!("roster load failed: {err}");
                RosterStatus::Failed {
                    message: err.to_string(),
                }
            }
        }
    }

    #[must_use]
    pub fn cached(&self) -> Option<Arc<[Character]>> {
        self.cell.get().cloned()
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    pub const fn provider(&self) -> &P {
        &self.provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_parses_sorted_with_primary_roles() {
        let roster = parse_ddragon_roster(FIXTURE_ROSTER_DATA).unwrap();
        assert_eq!(roster.len(), 18);
        assert_eq!(roster[0].name, "Aatrox");
        assert!(
            roster
                .windows(2)
                .all(|w| w[0].name.to_lowercase() <= w[1].name.to_lowercase())
        );
        let ahri = roster.iter().find(|c| c.id == "Ahri").unwrap();
        assert_eq!(ahri.role, Role::Mage);
        assert!(ahri.image_url.ends_with("/img/champion/loading/Ahri_0.jpg"));
        let wukong = roster.iter().find(|c| c.id == "MonkeyKing").unwrap();
        assert_eq!(wukong.name, "Wukong");
    }

    #[test]
    fn unknown_and_missing_tags_default_to_fighter() {
        assert_eq!(Role::from_tags(&[]), Role::Fighter);
        assert_eq!(Role::from_tags(&["Specialist".to_string()]), Role::Fighter);
        assert_eq!(
            Role::from_tags(&["support".to_string(), "Mage".to_string()]),
            Role::Support
        );
    }

    #[test]
    fn empty_and_malformed_payloads_are_errors() {
        assert!(matches!(
            parse_ddragon_roster(r#"{"data":{}}"#),
            Err(RosterError::Empty)
        ));
        assert!(matches!(
            parse_ddragon_roster("not json"),
            Err(RosterError::Parse(_))
        ));
    }

    #[test]
    fn image_helpers_pin_the_cdn_version() {
        assert_eq!(
            square_image_url("Zed"),
            format!("{DDRAGON_CDN}/16.3.1/img/champion/Zed.png")
        );
        assert!(roster_url().ends_with("/16.3.1/data/en_US/champion.json"));
    }

    #[cfg(feature = "async")]
    mod cache {
        use super::super::*;
        use std::cell::Cell;

        struct Flaky {
            calls: Cell<u32>,
            fail_first: bool,
        }

        #[async_trait::async_trait(?Send)]
        impl RosterProvider for Flaky {
            async fn fetch_roster(&self) -> Result<Vec<Character>, RosterError> {
                let call = self.calls.get() + 1;
                self.calls.set(call);
                if self.fail_first && call == 1 {
                    return Err(RosterError::Http { status: 503 });
                }
                parse_ddragon_roster(FIXTURE_ROSTER_DATA)
            }
        }

        #[tokio::test]
        async fn load_is_memoized_after_success() {
            let cache = RosterCache::new(Flaky {
                calls: Cell::new(0),
                fail_first: false,
            });
            let first = cache.load().await.unwrap();
            let second = cache.load().await.unwrap();
            assert!(Arc::ptr_eq(&first, &second));
            assert_eq!(cache.provider().calls.get(), 1);
            assert!(cache.is_loaded());
        }

        #[tokio::test]
        async fn concurrent_callers_share_one_fetch() {
            let cache = RosterCache::new(Flaky {
                calls: Cell::new(0),
                fail_first: false,
            });
            let (a, b) = tokio::join!(cache.load(), cache.load());
            assert_eq!(a.unwrap().len(), b.unwrap().len());
            assert_eq!(cache.provider().calls.get(), 1);
        }

        #[tokio::test]
        async fn failures_are_not_cached_and_retry_fetches_again() {
            let cache = RosterCache::new(Flaky {
                calls: Cell::new(0),
                fail_first: true,
            });
            let status = cache.status().await;
            assert_eq!(
                status,
                RosterStatus::Failed {
                    message: "Failed to fetch champion data: 503".to_string()
                }
            );
            assert!(cache.cached().is_none());

            let status = cache.status().await;
            assert_eq!(status, RosterStatus::Ready { count: 18 });
            assert_eq!(cache.provider().calls.get(), 2);
        }

        #[tokio::test]
        async fn static_roster_serves_fixture() {
            let cache = RosterCache::new(StaticRoster::fixture());
            assert_eq!(cache.load().await.unwrap().len(), 18);
        }
    }
}

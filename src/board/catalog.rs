//! Read-only registry of board profiles.
//!
//! The catalog is built once (from the embedded board table or a TOML file)
//! and never mutated afterwards, so lookups need no synchronization and the
//! handed-out `Arc<BoardProfile>`s can be shared freely between requests.

use super::{BoardProfile, BusRole, PinId};
use crate::config::CatalogConfig;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Shortest query that may match a longer board key by containment.
const MIN_FUZZY_QUERY_LEN: usize = 3;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("board '{board}' declares no available pins")]
    EmptyBoard { board: String },
    #[error("board '{board}': pin {pin} in {set} is not an available pin")]
    NotSubset {
        board: String,
        set: &'static str,
        pin: PinId,
    },
    #[error("board '{board}': default {bus} pin {pin} is not an available pin")]
    BadBusPin {
        board: String,
        bus: BusRole,
        pin: PinId,
    },
    #[error("board '{board}': invalid pin range '{spec}'")]
    InvalidRange { board: String, spec: String },
    #[error("board key or alias '{key}' is registered more than once")]
    DuplicateKey { key: String },
    #[error("no board profile registered for '{key}'")]
    UnknownBoard { key: String },
}

#[derive(Debug, Clone)]
pub struct BoardCatalog {
    profiles: BTreeMap<String, Arc<BoardProfile>>,
    aliases: BTreeMap<String, String>,
    generic: Arc<BoardProfile>,
}

impl BoardCatalog {
    /// Catalog of the boards shipped with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_config(&CatalogConfig::builtin()?)
    }

    /// Load a catalog from a TOML file. Any profile violating the pin-set
    /// invariants fails the whole load.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        Self::from_config(&CatalogConfig::load(path)?)
    }

    pub fn from_config(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let mut profiles = BTreeMap::new();
        let mut aliases = BTreeMap::new();

        for (raw_key, board) in &config.boards {
            let key = normalize_key(raw_key);
            let profile = board.to_profile(&key)?;
            if profiles.insert(key.clone(), Arc::new(profile)).is_some() {
                return Err(CatalogError::DuplicateKey { key });
            }
            for alias in &board.aliases {
                let alias = normalize_key(alias);
                if aliases.insert(alias.clone(), key.clone()).is_some() {
                    return Err(CatalogError::DuplicateKey { key: alias });
                }
            }
        }
        if let Some(clash) = aliases.keys().find(|alias| profiles.contains_key(*alias)) {
            return Err(CatalogError::DuplicateKey { key: clash.clone() });
        }

        tracing::info!(
            "Loaded board catalog: {} profiles, {} aliases",
            profiles.len(),
            aliases.len()
        );

        Ok(Self {
            profiles,
            aliases,
            generic: Arc::new(BoardProfile::generic(config.generic.pin_count)),
        })
    }

    /// Find the profile for `board_key`.
    ///
    /// Matching is tried in order: exact key, declared alias, then
    /// containment (`"esp32dev"` finds `esp32`, `"uno"` finds
    /// `arduino_uno`), preferring the longest matching key.
    ///
    /// Containment matches the board family, not the variant: a query such
    /// as `"stm32f4_discovery"` lands on the `stm32` (F103) profile. Register
    /// a separate board when a variant's pinout differs.
    pub fn lookup(&self, board_key: &str) -> Result<Arc<BoardProfile>, CatalogError> {
        let key = normalize_key(board_key);

        if let Some(profile) = self.profiles.get(&key) {
            return Ok(Arc::clone(profile));
        }
        if let Some(profile) = self.aliases.get(&key).and_then(|k| self.profiles.get(k)) {
            return Ok(Arc::clone(profile));
        }
        if let Some(profile) = self.fuzzy_match(&key) {
            tracing::debug!("Board '{}' matched profile '{}' by name", board_key, profile.key());
            return Ok(profile);
        }

        Err(CatalogError::UnknownBoard {
            key: board_key.to_string(),
        })
    }

    /// Like [`lookup`](Self::lookup), but degrades to the generic profile
    /// instead of failing.
    pub fn lookup_or_generic(&self, board_key: &str) -> Arc<BoardProfile> {
        match self.lookup(board_key) {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!("{}; falling back to generic profile", e);
                Arc::clone(&self.generic)
            }
        }
    }

    pub fn generic(&self) -> Arc<BoardProfile> {
        Arc::clone(&self.generic)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    fn fuzzy_match(&self, query: &str) -> Option<Arc<BoardProfile>> {
        if query.is_empty() {
            return None;
        }
        let candidates = self
            .profiles
            .keys()
            .map(|k| (k, k))
            .chain(self.aliases.iter());

        let mut best: Option<(&String, &String)> = None;
        for (name, key) in candidates {
            let contains = query.contains(name.as_str())
                || (query.len() >= MIN_FUZZY_QUERY_LEN && name.contains(query));
            if !contains {
                continue;
            }
            match best {
                Some((best_name, _)) if best_name.len() >= name.len() => {}
                _ => best = Some((name, key)),
            }
        }
        best.and_then(|(_, key)| self.profiles.get(key)).map(Arc::clone)
    }
}

/// Canonical form of a board key or alias: trimmed, lowercase, with
/// spaces and dashes folded to underscores.
pub fn normalize_key(key: &str) -> String {
    key.trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

use crate::error::CatalogError;
use core_types::Entity;
use std::collections::{HashMap, HashSet};

/// Sector name, Datastream world sector index, I/B/E/S aggregate (if covered).
const SECTORS: [(&str, &str, Option<&str>); 11] = [
    ("Technology", "TECNOWD", Some("@TECNOWD")),
    ("Telecommunications", "TELCMWD", Some("@TELCMWD")),
    ("Healthcare", "HLTHCWD", Some("@HLTHCWD")),
    ("Financials", "FINANWD", Some("@FINANWD")),
    ("Real Estate", "RLESTWD", None),
    ("Consumer Discretionary", "CNSMDWD", Some("@CNSMDWD")),
    ("Consumer Staples", "CNSMSWD", Some("@CNSMSWD")),
    ("Industrials", "INDUSWD", Some("@INDUSWD")),
    ("Basic Materials", "BMATRWD", Some("@BMATRWD")),
    ("Energy", "ENEGYWD", Some("@ENEGYWD")),
    ("Utilities", "UTILSWD", Some("@UTILSWD")),
];

/// The ordered, immutable set of tracked sectors.
#[derive(Debug, Clone)]
pub struct EntityRegistry {
    entities: Vec<Entity>,
}

impl EntityRegistry {
    /// Builds a registry, rejecting duplicate names, empty tickers and
    /// tickers shared by two entities.
    pub fn new(entities: Vec<Entity>) -> Result<Self, CatalogError> {
        let mut names: HashSet<&str> = HashSet::new();
        let mut tickers: HashMap<&str, &str> = HashMap::new();

        for entity in &entities {
            if !names.insert(entity.name.as_str()) {
                return Err(CatalogError::DuplicateEntity(entity.name.clone()));
            }
            if entity.primary_ticker.trim().is_empty() {
                return Err(CatalogError::Malformed {
                    key: entity.name.clone(),
                    reason: "primary ticker is empty".to_string(),
                });
            }

            let variants = [
                Some(entity.primary_ticker.as_str()),
                entity.estimate_ticker.as_deref(),
            ];
            for ticker in variants.into_iter().flatten() {
                if let Some(first) = tickers.insert(ticker, entity.name.as_str()) {
                    return Err(CatalogError::DuplicateTicker {
                        ticker: ticker.to_string(),
                        first: first.to_string(),
                        second: entity.name.clone(),
                    });
                }
            }
        }

        Ok(Self { entities })
    }

    /// The eleven world sectors tracked by the dashboard.
    pub fn sectors() -> Result<Self, CatalogError> {
        let entities = SECTORS
            .iter()
            .map(|(name, primary, estimate)| Entity::new(name, primary, *estimate))
            .collect();
        Self::new(entities)
    }

    pub fn list_entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Restricts the registry to `names`, keeping registry order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Self, CatalogError> {
        for name in names {
            let name = name.as_ref();
            if !self.entities.iter().any(|e| e.name.eq_ignore_ascii_case(name)) {
                return Err(CatalogError::UnknownEntity(name.to_string()));
            }
        }

        let entities = self
            .entities
            .iter()
            .filter(|e| names.iter().any(|n| e.name.eq_ignore_ascii_case(n.as_ref())))
            .cloned()
            .collect();
        tracing::debug!(requested = names.len(), "Entity registry restricted.");
        Ok(Self { entities })
    }
}

//! In-memory question catalog.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use quizduel_protocol::{Codec, JsonCodec, ProtocolError, QuestionRecord};
use quizduel_room::QuestionSource;

use crate::DuelError;

/// Questions grouped by (category, level), loaded once and read by every
/// room.
///
/// Catalog files are a JSON array of records in the layout
/// `{ "qText", "options", "correct", "level", "category", "time" }`.
#[derive(Debug, Clone, Default)]
pub struct QuestionCatalog {
    pools: BTreeMap<(String, u8), Vec<QuestionRecord>>,
}

impl QuestionCatalog {
    /// Builds a catalog, refusing any record a duel couldn't serve.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidQuestion`] naming the first malformed
    /// record.
    pub fn new(
        records: impl IntoIterator<Item = QuestionRecord>,
    ) -> Result<Self, ProtocolError> {
        let mut pools: BTreeMap<(String, u8), Vec<QuestionRecord>> =
            BTreeMap::new();
        for record in records {
            if !record.is_well_formed() {
                return Err(ProtocolError::InvalidQuestion(format!(
                    "{:?} ({} level {}, {} options, correct {})",
                    record.text,
                    record.category,
                    record.level,
                    record.options.len(),
                    record.correct
                )));
            }
            pools
                .entry((record.category.clone(), record.level))
                .or_default()
                .push(record);
        }
        Ok(Self { pools })
    }

    /// Parses a JSON catalog.
    pub fn from_json(data: &[u8]) -> Result<Self, ProtocolError> {
        let records: Vec<QuestionRecord> = JsonCodec.decode(data)?;
        Self::new(records)
    }

    /// Reads and parses a JSON catalog file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DuelError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| DuelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json(&data)?;
        tracing::info!(
            path = %path.display(),
            questions = catalog.len(),
            pools = catalog.pools.len(),
            "question catalog loaded"
        );
        Ok(catalog)
    }

    /// Total number of questions.
    pub fn len(&self) -> usize {
        self.pools.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

impl QuestionSource for QuestionCatalog {
    fn list_topics(&self) -> BTreeSet<String> {
        self.pools.keys().map(|(topic, _)| topic.clone()).collect()
    }

    fn list_levels(&self, topic: &str) -> BTreeSet<u8> {
        self.pools
            .keys()
            .filter(|(t, _)| t == topic)
            .map(|(_, level)| *level)
            .collect()
    }

    fn find(&self, topic: &str, level: u8) -> Vec<QuestionRecord> {
        self.pools
            .get(&(topic.to_string(), level))
            .cloned()
            .unwrap_or_default()
    }
}

//! Static religious content served by the site.
//!
//! Quran surah metadata, adhkar collections and Hisn al-Muslim chapters are
//! read once at startup from JSON files in the configured data directory
//! (kept in sync from the external data repository) and held in memory;
//! every request after that is a plain lookup. A missing file downgrades to
//! an empty collection with a warning so a partial data sync does not take
//! the whole site down.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod prayer;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Surah {
    pub number: u32,
    /// Arabic name, e.g. "الفاتحة"
    pub name: String,
    pub english_name: String,
    pub ayah_count: u32,
    /// "Meccan" or "Medinan"
    pub revelation_place: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdhkarItem {
    pub text: String,
    /// How many times the dhikr is repeated
    pub repeat: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdhkarSection {
    pub id: String,
    pub title: String,
    pub items: Vec<AdhkarItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HisnChapter {
    pub id: u32,
    pub title: String,
    pub items: Vec<String>,
}

/// In-memory store for all static content.
pub struct ContentStore {
    surahs: Vec<Surah>,
    adhkar: Vec<AdhkarSection>,
    hisn: Vec<HisnChapter>,
}

impl ContentStore {
    /// Loads all content files from the data directory.
    pub fn load(data_dir: &str) -> Result<Self> {
        let dir = Path::new(data_dir);

        Ok(Self {
            surahs: load_file(dir, "quran.json")?,
            adhkar: load_file(dir, "adhkar.json")?,
            hisn: load_file(dir, "hisnmuslim.json")?,
        })
    }

    pub fn list_surahs(&self) -> &[Surah] {
        &self.surahs
    }

    pub fn get_surah(&self, number: u32) -> Option<&Surah> {
        self.surahs.iter().find(|s| s.number == number)
    }

    pub fn list_adhkar(&self) -> &[AdhkarSection] {
        &self.adhkar
    }

    pub fn get_adhkar(&self, id: &str) -> Option<&AdhkarSection> {
        self.adhkar.iter().find(|s| s.id == id)
    }

    pub fn list_hisn(&self) -> &[HisnChapter] {
        &self.hisn
    }

    pub fn get_hisn(&self, id: u32) -> Option<&HisnChapter> {
        self.hisn.iter().find(|c| c.id == id)
    }
}

/// Reads one JSON content file; a missing file is an empty collection.
fn load_file<T: serde::de::DeserializeOwned>(dir: &Path, file_name: &str) -> Result<Vec<T>> {
    let path = dir.join(file_name);

    if !path.exists() {
        tracing::warn!("Content file {} not found; serving empty list", path.display());
        return Ok(Vec::new());
    }

    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let parsed = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_the_bundled_data_directory() {
        let store = ContentStore::load("./data").unwrap();

        let fatihah = store.get_surah(1).expect("surah 1 should exist");
        assert_eq!(fatihah.name, "الفاتحة");
        assert_eq!(fatihah.ayah_count, 7);

        let ikhlas = store.get_surah(112).expect("surah 112 should exist");
        assert_eq!(ikhlas.english_name, "Al-Ikhlas");
        assert_eq!(ikhlas.ayah_count, 4);

        assert_eq!(store.list_surahs().len(), 114);
        assert!(!store.list_adhkar().is_empty());
        assert!(!store.list_hisn().is_empty());
    }

    #[test]
    fn unknown_lookups_return_none() {
        let store = ContentStore::load("./data").unwrap();

        assert!(store.get_surah(0).is_none());
        assert!(store.get_surah(115).is_none());
        assert!(store.get_adhkar("no-such-section").is_none());
        assert!(store.get_hisn(9999).is_none());
    }

    #[test]
    fn missing_directory_serves_empty_lists() {
        let store = ContentStore::load("./no-such-dir").unwrap();

        assert!(store.list_surahs().is_empty());
        assert!(store.list_adhkar().is_empty());
        assert!(store.list_hisn().is_empty());
    }
}

use std::collections::HashSet;

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use indexmap::map::Entry;
use tracing::debug;

use crate::domain::{Bib, file_name_of, url_key};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    pub key: String,
    pub low_url: Option<String>,
    pub local_path: Option<Utf8PathBuf>,
    pub high_url: String,
    pub bib: Option<Bib>,
}

impl ImageEntry {
    pub fn from_low(low_url: String, high_url: String) -> Option<Self> {
        let key = url_key(&low_url).to_string();
        if key.is_empty() {
            return None;
        }
        Some(Self {
            key,
            low_url: Some(low_url),
            local_path: None,
            high_url,
            bib: None,
        })
    }

    pub fn from_high(high_url: String, bib: Bib) -> Option<Self> {
        let key = url_key(&high_url).to_string();
        if key.is_empty() {
            return None;
        }
        Some(Self {
            key,
            low_url: None,
            local_path: None,
            high_url,
            bib: Some(bib),
        })
    }

    pub fn is_resolved(&self) -> bool {
        self.local_path.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub key: String,
    pub url: String,
}

#[derive(Debug, Clone, Default)]
pub struct ImageIndex {
    entries: IndexMap<String, ImageEntry>,
}

impl ImageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&ImageEntry> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageEntry> {
        self.entries.values()
    }

    pub fn insert(&mut self, entry: ImageEntry) -> bool {
        match self.entries.entry(entry.key.clone()) {
            Entry::Occupied(existing) => {
                if existing.get().bib != entry.bib || existing.get().high_url != entry.high_url {
                    debug!(
                        key = %entry.key,
                        "file name already indexed from another listing; keeping first entry"
                    );
                }
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(entry);
                true
            }
        }
    }

    pub fn resolve(&mut self, key: &str, path: &Utf8Path) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) if entry.local_path.is_none() => {
                entry.local_path = Some(path.to_path_buf());
                true
            }
            _ => false,
        }
    }

    pub fn unresolved_low(&self) -> Vec<Candidate> {
        self.entries
            .values()
            .filter(|entry| !entry.is_resolved())
            .filter_map(|entry| {
                entry.low_url.as_ref().map(|url| Candidate {
                    key: entry.key.clone(),
                    url: url.clone(),
                })
            })
            .collect()
    }

    pub fn unresolved_low_among(&self, keys: &HashSet<String>) -> Vec<Candidate> {
        self.unresolved_low()
            .into_iter()
            .filter(|candidate| keys.contains(&candidate.key))
            .collect()
    }

    pub fn merge_resolved(&mut self, batch: ImageIndex) -> usize {
        let mut merged = 0;
        for entry in batch.entries.into_values() {
            let Some(path) = entry.local_path.clone() else {
                continue;
            };
            if self.contains_key(&entry.key) {
                if self.resolve(&entry.key, &path) {
                    merged += 1;
                }
            } else if self.insert(entry) {
                merged += 1;
            }
        }
        merged
    }

    pub fn resolved_count(&self) -> usize {
        self.entries.values().filter(|entry| entry.is_resolved()).count()
    }

    // O(results x candidates); file names are assumed unique within a batch.
    pub fn reconcile(&mut self, candidates: &[Candidate], results: &[Utf8PathBuf]) -> usize {
        let mut resolved = 0;
        for path in results {
            let name = file_name_of(path.as_str());
            if name.is_empty() {
                continue;
            }
            let stem = path.file_stem();
            let matched = candidates
                .iter()
                .find(|candidate| {
                    let segment = file_name_of(&candidate.url);
                    segment == name || (!segment.contains('.') && Some(segment) == stem)
                })
                .or_else(|| candidates.iter().find(|candidate| candidate.url.contains(name)));
            match matched {
                Some(candidate) => {
                    if self.resolve(&candidate.key, path) {
                        resolved += 1;
                    }
                }
                None => debug!(path = %path, "downloaded file matches no requested url"),
            }
        }
        resolved
    }
}

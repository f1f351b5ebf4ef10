use std::fs;

use camino::{Utf8Path, Utf8PathBuf};

use crate::catalog::Event;
use crate::domain::{Bib, Pass};
use crate::error::PhotoError;

#[derive(Debug, Clone)]
pub struct Store {
    event_root: Utf8PathBuf,
    event_key: String,
}

impl Store {
    pub fn new(target_root: &Utf8Path, event: &Event) -> Self {
        Self {
            event_root: target_root.join(&event.key),
            event_key: event.key.clone(),
        }
    }

    pub fn event_root(&self) -> &Utf8Path {
        &self.event_root
    }

    pub fn bib_dir(&self, bib: &Bib) -> Utf8PathBuf {
        self.event_root.join(bib.as_str())
    }

    pub fn cache_path(&self, pass: Pass) -> Utf8PathBuf {
        self.event_root
            .join(format!("{}{}", self.event_key, pass.cache_suffix()))
    }

    pub fn ensure_event_root(&self) -> Result<(), PhotoError> {
        fs::create_dir_all(self.event_root.as_std_path())
            .map_err(|err| PhotoError::Filesystem(err.to_string()))
    }

    pub fn ensure_bib_dir(&self, bib: &Bib) -> Result<Utf8PathBuf, PhotoError> {
        let dir = self.bib_dir(bib);
        fs::create_dir_all(dir.as_std_path())
            .map_err(|err| PhotoError::Filesystem(err.to_string()))?;
        Ok(dir)
    }
}

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::info;

use crate::cache::{
    dump_high_cache, dump_low_cache, load_high_cache, load_low_cache, read_low_rows,
};
use crate::catalog::{Event, EventCatalog};
use crate::domain::{Pass, url_key};
use crate::download::{Downloader, HIGH_BATCH_SIZE};
use crate::error::PhotoError;
use crate::index::{Candidate, ImageEntry, ImageIndex};
use crate::listing::{ListingClient, extract_entries};
use crate::range::RunRange;
use crate::roster::{group_by_bib, read_roster};
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct LowPassRequest {
    pub roster: PathBuf,
    pub target: PathBuf,
    pub cache: Option<PathBuf>,
    pub range: RunRange,
}

#[derive(Debug, Clone)]
pub struct HighPassRequest {
    pub low_cache: PathBuf,
    pub target: PathBuf,
    pub cache: Option<PathBuf>,
    pub range: RunRange,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub event: String,
    pub pass: Pass,
    pub range: RunRange,
    pub bibs: Vec<BibResult>,
    pub entries: usize,
    pub resolved: usize,
    pub cache_path: String,
    pub started_at: String,
    pub finished_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BibResult {
    pub position: usize,
    pub bib: String,
    pub found: usize,
    pub requested: usize,
    pub downloaded: usize,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App<L: ListingClient, D: Downloader> {
    catalog: EventCatalog,
    listing: L,
    downloader: D,
}

impl<L: ListingClient, D: Downloader> App<L, D> {
    pub fn new(catalog: EventCatalog, listing: L, downloader: D) -> Self {
        Self {
            catalog,
            listing,
            downloader,
        }
    }

    pub fn run_low(
        &self,
        request: &LowPassRequest,
        sink: &dyn ProgressSink,
    ) -> Result<RunResult, PhotoError> {
        let started_at = iso_timestamp();
        if let Some(cache) = &request.cache {
            require_exists("cache file", cache)?;
        }
        require_exists("target directory", &request.target)?;
        require_exists("source file", &request.roster)?;
        let event = self.resolve_event(&request.roster)?;

        let mut index = ImageIndex::new();
        if let Some(cache) = &request.cache {
            let merged = load_low_cache(cache, &mut index)?;
            sink.event(ProgressEvent {
                message: format!(
                    "phase=Cache; {merged} entries loaded, {} resolved",
                    index.resolved_count()
                ),
                elapsed: None,
            });
        }
        let roster = read_roster(&request.roster)?;

        let store = Store::new(&utf8(&request.target)?, event);
        store.ensure_event_root()?;

        let mut bibs = Vec::new();
        for (position, bib) in request.range.slice(&roster) {
            let start = Instant::now();
            sink.event(ProgressEvent {
                message: format!("Collecting image set for bib {bib} from {} ...", event.name),
                elapsed: None,
            });
            let bib_dir = store.ensure_bib_dir(bib)?;

            let html = self.listing.fetch_listing(&event.listing_url_for(bib))?;
            let entries = extract_entries(&html, event)?;
            let found = entries.len();
            let listed: HashSet<String> = entries.iter().map(|entry| entry.key.clone()).collect();
            let inserted = entries
                .into_iter()
                .map(|entry| index.insert(entry))
                .filter(|inserted| *inserted)
                .count();
            info!(bib = %bib, found, inserted, "listing parsed");

            let candidates = index.unresolved_low_among(&listed);
            let downloaded = self.download_batch(&mut index, &candidates, &bib_dir)?;

            sink.event(ProgressEvent {
                message: format!(
                    "...there are officially {found} records for bib {bib}; downloaded {downloaded} of {}",
                    candidates.len()
                ),
                elapsed: Some(start.elapsed()),
            });
            bibs.push(BibResult {
                position,
                bib: bib.to_string(),
                found,
                requested: candidates.len(),
                downloaded,
            });
        }

        let cache_path = store.cache_path(Pass::Low);
        dump_low_cache(&cache_path, &index)?;
        sink.event(ProgressEvent {
            message: format!("... data saved at {}", store.event_root()),
            elapsed: None,
        });

        Ok(RunResult {
            event: event.key.clone(),
            pass: Pass::Low,
            range: request.range,
            bibs,
            entries: index.len(),
            resolved: index.resolved_count(),
            cache_path: cache_path.to_string(),
            started_at,
            finished_at: iso_timestamp(),
        })
    }

    pub fn run_high(
        &self,
        request: &HighPassRequest,
        sink: &dyn ProgressSink,
    ) -> Result<RunResult, PhotoError> {
        let started_at = iso_timestamp();
        if let Some(cache) = &request.cache {
            require_exists("cache file", cache)?;
        }
        require_exists("target directory", &request.target)?;
        require_exists("source file", &request.low_cache)?;
        let event = self.resolve_event(&request.low_cache)?;

        let mut index = ImageIndex::new();
        if let Some(cache) = &request.cache {
            let merged = load_high_cache(cache, &mut index)?;
            sink.event(ProgressEvent {
                message: format!("phase=Cache; {merged} high-res entries loaded"),
                elapsed: None,
            });
        }
        let groups = group_by_bib(&read_low_rows(&request.low_cache)?);

        let store = Store::new(&utf8(&request.target)?, event);
        store.ensure_event_root()?;

        let mut bibs = Vec::new();
        for (position, group) in request.range.slice(&groups) {
            let start = Instant::now();
            sink.event(ProgressEvent {
                message: format!(
                    "Collecting image set for bib {} from {} images ...",
                    group.bib,
                    group.high_urls.len()
                ),
                elapsed: None,
            });
            let bib_dir = store.ensure_bib_dir(&group.bib)?;

            let mut seen = HashSet::new();
            let pending: Vec<&String> = group
                .high_urls
                .iter()
                .filter(|url| {
                    let key = url_key(url);
                    !key.is_empty()
                        && seen.insert(key.to_string())
                        && !index.get(key).is_some_and(ImageEntry::is_resolved)
                })
                .collect();
            sink.event(ProgressEvent {
                message: format!(
                    "Only {} will be downloaded. Already downloaded {}",
                    pending.len(),
                    group.high_urls.len() - pending.len()
                ),
                elapsed: None,
            });

            let mut downloaded = 0;
            for chunk in pending.chunks(HIGH_BATCH_SIZE) {
                let mut batch = ImageIndex::new();
                for url in chunk {
                    if let Some(entry) = ImageEntry::from_high((*url).clone(), group.bib.clone()) {
                        batch.insert(entry);
                    }
                }
                let candidates: Vec<Candidate> = batch
                    .iter()
                    .map(|entry| Candidate {
                        key: entry.key.clone(),
                        url: entry.high_url.clone(),
                    })
                    .collect();
                self.download_batch(&mut batch, &candidates, &bib_dir)?;
                downloaded += index.merge_resolved(batch);
            }
            info!(bib = %group.bib, requested = pending.len(), downloaded, "high-res batch done");

            sink.event(ProgressEvent {
                message: format!("bib {}: downloaded {downloaded} of {}", group.bib, pending.len()),
                elapsed: Some(start.elapsed()),
            });
            bibs.push(BibResult {
                position,
                bib: group.bib.to_string(),
                found: group.high_urls.len(),
                requested: pending.len(),
                downloaded,
            });
        }

        let cache_path = store.cache_path(Pass::High);
        dump_high_cache(&cache_path, &index)?;
        sink.event(ProgressEvent {
            message: format!("... data saved at {}", store.event_root()),
            elapsed: None,
        });

        Ok(RunResult {
            event: event.key.clone(),
            pass: Pass::High,
            range: request.range,
            bibs,
            entries: index.len(),
            resolved: index.resolved_count(),
            cache_path: cache_path.to_string(),
            started_at,
            finished_at: iso_timestamp(),
        })
    }

    fn resolve_event(&self, path: &Path) -> Result<&Event, PhotoError> {
        self.catalog.resolve(&path.to_string_lossy())
    }

    fn download_batch(
        &self,
        index: &mut ImageIndex,
        candidates: &[Candidate],
        destination: &Utf8Path,
    ) -> Result<usize, PhotoError> {
        if candidates.is_empty() {
            return Ok(0);
        }
        let urls: Vec<String> = candidates.iter().map(|c| c.url.clone()).collect();
        let results = self.downloader.download(&urls, destination)?;
        Ok(index.reconcile(candidates, &results))
    }
}

fn require_exists(what: &'static str, path: &Path) -> Result<(), PhotoError> {
    if path.exists() {
        Ok(())
    } else {
        Err(PhotoError::MissingPath {
            what,
            path: path.to_path_buf(),
        })
    }
}

fn utf8(path: &Path) -> Result<Utf8PathBuf, PhotoError> {
    Utf8PathBuf::from_path_buf(path.to_path_buf())
        .map_err(|_| PhotoError::Filesystem(format!("non-utf8 path: {}", path.display())))
}

fn iso_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

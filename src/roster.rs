use std::fs::File;
use std::path::Path;

use indexmap::IndexMap;
use tracing::debug;

use crate::cache::LowCacheRow;
use crate::domain::Bib;
use crate::error::PhotoError;

pub const BIB_COLUMN: &str = "bib";

pub fn read_roster(path: &Path) -> Result<Vec<Bib>, PhotoError> {
    let file = File::open(path).map_err(|err| {
        PhotoError::Filesystem(format!("open roster {}: {err}", path.display()))
    })?;
    let mut reader = csv::Reader::from_reader(file);
    let headers = reader.headers().map_err(|err| roster_error(path, err))?;
    let column = headers
        .iter()
        .position(|header| header.trim() == BIB_COLUMN)
        .ok_or_else(|| PhotoError::MissingColumn {
            path: path.to_path_buf(),
            column: BIB_COLUMN.to_string(),
        })?;

    let mut bibs = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| roster_error(path, err))?;
        let value = record.get(column).unwrap_or_default();
        bibs.push(value.parse()?);
    }
    Ok(bibs)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibGroup {
    pub bib: Bib,
    pub high_urls: Vec<String>,
}

/// Groups downloaded low-res entries by the directory they were saved in
/// (`<target>/<event>/<bib>/<file>`), sorted by bib as text.
pub fn group_by_bib(rows: &[LowCacheRow]) -> Vec<BibGroup> {
    let mut groups: IndexMap<Bib, Vec<String>> = IndexMap::new();
    for row in rows {
        let Some(bib) = row.file_path.as_deref().and_then(bib_from_local_path) else {
            debug!(key = %row.key, "no local file; not part of any bib group");
            continue;
        };
        groups.entry(bib).or_default().push(row.file_high.clone());
    }
    groups.sort_by(|left, _, right, _| left.as_str().cmp(right.as_str()));
    groups
        .into_iter()
        .map(|(bib, high_urls)| BibGroup { bib, high_urls })
        .collect()
}

fn bib_from_local_path(path: &str) -> Option<Bib> {
    let mut segments = path.rsplit(['/', '\\']).filter(|segment| !segment.is_empty());
    segments.next()?;
    segments.next()?.parse().ok()
}

fn roster_error(path: &Path, err: csv::Error) -> PhotoError {
    PhotoError::RosterFormat {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

use std::fs::File;
use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::Bib;
use crate::error::PhotoError;
use crate::index::{ImageEntry, ImageIndex};

pub const LOW_REQUIRED_COLUMNS: [&str; 3] = ["key", "file_low", "file_high"];
pub const HIGH_REQUIRED_COLUMNS: [&str; 3] = ["key", "bib", "file_high"];

const LOW_HEADER: [&str; 4] = ["key", "file_path", "file_high", "file_low"];
const HIGH_HEADER: [&str; 4] = ["key", "file_path", "bib", "file_high"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowCacheRow {
    pub key: String,
    #[serde(default)]
    pub file_path: Option<String>,
    pub file_high: String,
    pub file_low: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighCacheRow {
    pub key: String,
    #[serde(default)]
    pub file_path: Option<String>,
    pub bib: String,
    pub file_high: String,
}

pub fn read_low_rows(path: &Path) -> Result<Vec<LowCacheRow>, PhotoError> {
    read_rows(path, &LOW_REQUIRED_COLUMNS)
}

pub fn read_high_rows(path: &Path) -> Result<Vec<HighCacheRow>, PhotoError> {
    read_rows(path, &HIGH_REQUIRED_COLUMNS)
}

pub fn load_low_cache(path: &Path, index: &mut ImageIndex) -> Result<usize, PhotoError> {
    let rows = read_low_rows(path)?;
    let mut merged = 0;
    for row in rows {
        if row.key.is_empty() || row.file_low.is_empty() || row.file_high.is_empty() {
            return Err(format_error(path, format!("incomplete row for key `{}`", row.key)));
        }
        let entry = ImageEntry {
            key: row.key,
            low_url: Some(row.file_low),
            local_path: non_empty(row.file_path).map(Utf8PathBuf::from),
            high_url: row.file_high,
            bib: None,
        };
        if index.insert(entry) {
            merged += 1;
        }
    }
    Ok(merged)
}

pub fn load_high_cache(path: &Path, index: &mut ImageIndex) -> Result<usize, PhotoError> {
    let rows = read_high_rows(path)?;
    let mut merged = 0;
    for row in rows {
        if row.key.is_empty() || row.file_high.is_empty() {
            return Err(format_error(path, format!("incomplete row for key `{}`", row.key)));
        }
        let bib: Bib = row.bib.parse()?;
        let entry = ImageEntry {
            key: row.key,
            low_url: None,
            local_path: non_empty(row.file_path).map(Utf8PathBuf::from),
            high_url: row.file_high,
            bib: Some(bib),
        };
        if index.insert(entry) {
            merged += 1;
        }
    }
    Ok(merged)
}

pub fn dump_low_cache(path: &Utf8Path, index: &ImageIndex) -> Result<(), PhotoError> {
    let rows = index.iter().map(|entry| LowCacheRow {
        key: entry.key.clone(),
        file_path: entry.local_path.as_ref().map(|p| p.to_string()),
        file_high: entry.high_url.clone(),
        file_low: entry.low_url.clone().unwrap_or_default(),
    });
    write_rows_atomic(path, &LOW_HEADER, rows)
}

pub fn dump_high_cache(path: &Utf8Path, index: &ImageIndex) -> Result<(), PhotoError> {
    let rows = index.iter().map(|entry| HighCacheRow {
        key: entry.key.clone(),
        file_path: entry.local_path.as_ref().map(|p| p.to_string()),
        bib: entry
            .bib
            .as_ref()
            .map(|bib| bib.as_str().to_string())
            .unwrap_or_default(),
        file_high: entry.high_url.clone(),
    });
    write_rows_atomic(path, &HIGH_HEADER, rows)
}

fn read_rows<T>(path: &Path, required: &[&str]) -> Result<Vec<T>, PhotoError>
where
    T: DeserializeOwned,
{
    let file = File::open(path).map_err(|err| {
        PhotoError::Filesystem(format!("open cache {}: {err}", path.display()))
    })?;
    let mut reader = csv::Reader::from_reader(file);
    let headers = reader
        .headers()
        .map_err(|err| format_error(path, err.to_string()))?
        .clone();
    for column in required {
        if !headers.iter().any(|header| header == *column) {
            return Err(PhotoError::MissingColumn {
                path: path.to_path_buf(),
                column: column.to_string(),
            });
        }
    }

    reader
        .deserialize::<T>()
        .map(|row| row.map_err(|err| format_error(path, err.to_string())))
        .collect()
}

fn write_rows_atomic<T, I>(path: &Utf8Path, header: &[&str], rows: I) -> Result<(), PhotoError>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or(Utf8Path::new("."));
    std::fs::create_dir_all(parent.as_std_path())
        .map_err(|err| PhotoError::Filesystem(err.to_string()))?;
    let temp = tempfile::Builder::new()
        .prefix(".bibphotos-cache")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| PhotoError::Filesystem(err.to_string()))?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(temp.as_file());
    writer
        .write_record(header)
        .map_err(|err| PhotoError::Filesystem(err.to_string()))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|err| PhotoError::Filesystem(err.to_string()))?;
    }
    writer
        .flush()
        .map_err(|err| PhotoError::Filesystem(err.to_string()))?;
    drop(writer);

    temp.persist(path.as_std_path())
        .map_err(|err| PhotoError::Filesystem(err.to_string()))?;
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn format_error(path: &Path, message: String) -> PhotoError {
    PhotoError::CacheFormat {
        path: path.to_path_buf(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn empty_file_path_loads_as_unresolved() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("bpc_conde_cache.csv");
        std::fs::write(
            &path,
            "key,file_path,file_high,file_low\n\
             a.jpg,,https://hd.test/1,https://lo.test/a.jpg\n\
             b.jpg,bpc_conde/7/b.jpg,https://hd.test/2,https://lo.test/b.jpg\n",
        )
        .unwrap();

        let mut index = ImageIndex::new();
        assert_eq!(load_low_cache(&path, &mut index).unwrap(), 2);
        assert!(index.get("a.jpg").unwrap().local_path.is_none());
        assert_eq!(
            index.get("b.jpg").unwrap().local_path.as_deref(),
            Some(Utf8Path::new("bpc_conde/7/b.jpg"))
        );
    }

    #[test]
    fn missing_column_is_fatal() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("cache.csv");
        std::fs::write(&path, "key,file_path\na.jpg,\n").unwrap();

        let mut index = ImageIndex::new();
        let err = load_low_cache(&path, &mut index).unwrap_err();
        assert_matches!(err, PhotoError::MissingColumn { column, .. } if column == "file_low");
        assert!(index.is_empty());
    }

    #[test]
    fn high_cache_requires_bib() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("high.csv");
        std::fs::write(&path, "key,file_path,bib,file_high\nx.jpg,,,https://hd.test/x.jpg\n")
            .unwrap();

        let mut index = ImageIndex::new();
        assert_matches!(
            load_high_cache(&path, &mut index),
            Err(PhotoError::InvalidBib(_))
        );
    }
}

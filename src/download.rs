use std::fs;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use tracing::{debug, warn};

use crate::domain::file_name_of;
use crate::error::PhotoError;

pub const DEFAULT_WORKERS: usize = 8;

pub const HIGH_BATCH_SIZE: usize = 10;

const IMAGE_EXTENSIONS: [(&str, &str); 4] = [
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
];

pub trait Downloader: Send + Sync {
    fn download(
        &self,
        urls: &[String],
        destination: &Utf8Path,
    ) -> Result<Vec<Utf8PathBuf>, PhotoError>;
}

pub struct HttpDownloader {
    client: Client,
    pool: ThreadPool,
}

impl HttpDownloader {
    pub fn new(workers: usize) -> Result<Self, PhotoError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("bibphotos/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| PhotoError::DownloadHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|err| PhotoError::DownloadHttp(err.to_string()))?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|idx| format!("bibphotos-download-{idx}"))
            .build()
            .map_err(|err| PhotoError::DownloadHttp(err.to_string()))?;
        Ok(Self { client, pool })
    }

    fn fetch_one(&self, url: &str, destination: &Utf8Path) -> Result<Utf8PathBuf, PhotoError> {
        let name = file_name_of(url);
        if name.is_empty() {
            return Err(PhotoError::DownloadHttp(format!("no file name in {url}")));
        }
        if let Some(existing) = existing_download(destination, name) {
            debug!(path = %existing, "already on disk");
            return Ok(existing);
        }

        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|err| PhotoError::DownloadHttp(err.to_string()))?;
        if !response.status().is_success() {
            return Err(PhotoError::DownloadHttp(format!(
                "{url} returned status {}",
                response.status().as_u16()
            )));
        }

        let target = match response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(extension_for)
        {
            Some(extension) if !name.contains('.') => {
                destination.join(format!("{name}.{extension}"))
            }
            _ => destination.join(name),
        };

        let mut temp = tempfile::Builder::new()
            .prefix(".bibphotos-part")
            .tempfile_in(destination.as_std_path())
            .map_err(|err| PhotoError::Filesystem(err.to_string()))?;
        response
            .copy_to(temp.as_file_mut())
            .map_err(|err| PhotoError::DownloadHttp(err.to_string()))?;
        temp.persist(target.as_std_path())
            .map_err(|err| PhotoError::Filesystem(err.to_string()))?;
        Ok(target)
    }
}

impl Downloader for HttpDownloader {
    fn download(
        &self,
        urls: &[String],
        destination: &Utf8Path,
    ) -> Result<Vec<Utf8PathBuf>, PhotoError> {
        if urls.is_empty() {
            return Ok(Vec::new());
        }
        fs::create_dir_all(destination.as_std_path())
            .map_err(|err| PhotoError::Filesystem(err.to_string()))?;

        let saved = self.pool.install(|| {
            urls.par_iter()
                .filter_map(|url| match self.fetch_one(url, destination) {
                    Ok(path) => Some(path),
                    Err(err) => {
                        warn!(url = %url, error = %err, "download skipped");
                        None
                    }
                })
                .collect::<Vec<_>>()
        });
        Ok(saved)
    }
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next()?.trim();
    IMAGE_EXTENSIONS
        .iter()
        .find(|(mime, _)| mime.eq_ignore_ascii_case(essence))
        .map(|(_, extension)| *extension)
}

fn existing_download(destination: &Utf8Path, name: &str) -> Option<Utf8PathBuf> {
    let exact = destination.join(name);
    if exact.as_std_path().exists() {
        return Some(exact);
    }
    if name.contains('.') {
        return None;
    }
    IMAGE_EXTENSIONS
        .iter()
        .map(|(_, extension)| destination.join(format!("{name}.{extension}")))
        .find(|path| path.as_std_path().exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_from_content_type() {
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for("Image/PNG; charset=binary"), Some("png"));
        assert_eq!(extension_for("text/html"), None);
    }

    #[test]
    fn saved_high_res_file_is_found_by_photo_id() {
        let temp = tempfile::tempdir().unwrap();
        let dir = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        fs::write(dir.join("12345.jpg").as_std_path(), b"jpeg").unwrap();

        let downloader = HttpDownloader::new(1).unwrap();
        let saved = downloader
            .download(&["http://127.0.0.1:9/hd/12345".to_string()], &dir)
            .unwrap();

        assert_eq!(saved, vec![dir.join("12345.jpg")]);
        assert_eq!(existing_download(&dir, "1234"), None);
    }

    #[test]
    fn existing_files_are_not_fetched_again() {
        let temp = tempfile::tempdir().unwrap();
        let dir = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        fs::write(dir.join("a.jpg").as_std_path(), b"jpeg").unwrap();

        let downloader = HttpDownloader::new(2).unwrap();
        let saved = downloader
            .download(&["http://127.0.0.1:9/thumbs/a.jpg".to_string()], &dir)
            .unwrap();

        assert_eq!(saved, vec![dir.join("a.jpg")]);
    }

    #[test]
    fn unnamed_urls_are_skipped() {
        let temp = tempfile::tempdir().unwrap();
        let dir = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();

        let downloader = HttpDownloader::new(1).unwrap();
        let saved = downloader
            .download(&["http://127.0.0.1:9/thumbs/".to_string()], &dir)
            .unwrap();

        assert!(saved.is_empty());
    }
}

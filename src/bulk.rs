//! Bulk download orchestration
//!
//! The bulk-download listing names one or more full snapshots (`bulk`) and
//! any number of incremental files (`delta`), each with a time-limited URL.

use crate::archive::MemberPattern;
use crate::download::Downloader;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::progress::ProgressSink;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Pattern of downloaded full-snapshot archives
pub const DEFAULT_ARCHIVE_GLOB: &str = "bulk-light-vehicle_*.zip";

/// One downloadable file in the listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkFile {
    /// Time-limited download URL
    pub download_url: String,
    /// Remote file name, possibly with a path
    pub filename: String,
    /// Size in bytes, when advertised
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

impl BulkFile {
    /// Local file name: the last component of `filename`
    pub fn local_name(&self) -> Result<&str> {
        Path::new(&self.filename)
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                Error::invalid_value(
                    "filename",
                    format!("'{}' has no file name component", self.filename),
                )
            })
    }
}

/// Bulk-download listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkManifest {
    /// Full snapshots
    #[serde(default)]
    pub bulk: Vec<BulkFile>,
    /// Incremental updates
    #[serde(default)]
    pub delta: Vec<BulkFile>,
}

impl BulkManifest {
    /// Parse a listing from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a listing from a local file or an `http(s)://` URL
    pub async fn load(source: &str, client: &HttpClient) -> Result<Self> {
        if source.starts_with("http://") || source.starts_with("https://") {
            debug!("Fetching bulk listing from {}", source);
            return client.get_json(source).await;
        }

        let content = tokio::fs::read_to_string(source)
            .await
            .map_err(|e| Error::filesystem(source, format!("Failed to read listing: {e}")))?;
        Self::from_json_str(&content)
    }

    /// Bulk files followed by delta files
    pub fn files(&self) -> impl Iterator<Item = &BulkFile> {
        self.bulk.iter().chain(self.delta.iter())
    }
}

/// Download every file of the listing into `dest_dir`
///
/// Files already present at their advertised size are skipped and partial
/// ones resumed. Stops at the first failure.
pub async fn download_bulk_data(
    downloader: &Downloader,
    manifest: &BulkManifest,
    dest_dir: impl AsRef<Path>,
    progress: &dyn ProgressSink,
) -> Result<Vec<PathBuf>> {
    let dest_dir = dest_dir.as_ref();
    let mut paths = Vec::with_capacity(manifest.bulk.len() + manifest.delta.len());

    for file in manifest.files() {
        let destination = dest_dir.join(file.local_name()?);
        let path = downloader
            .fetch(&file.download_url, &destination, file.file_size, progress)
            .await?;
        paths.push(path);
    }

    info!("{} bulk file(s) ready in {}", paths.len(), dest_dir.display());
    Ok(paths)
}

/// The lexicographically greatest file in `data_dir` matching `pattern`
///
/// Archive names carry a sortable date stamp, so this is the most recent one.
pub fn latest_archive(data_dir: impl AsRef<Path>, pattern: &str) -> Result<PathBuf> {
    let data_dir = data_dir.as_ref();
    let pattern = MemberPattern::new(pattern)?;

    let entries = std::fs::read_dir(data_dir)
        .map_err(|e| Error::filesystem(data_dir, format!("Failed to list directory: {e}")))?;

    let mut latest: Option<String> = None;
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if pattern.matches(&name) && latest.as_ref().map_or(true, |best| name > *best) {
            latest = Some(name);
        }
    }

    latest.map(|name| data_dir.join(name)).ok_or_else(|| {
        Error::filesystem(
            data_dir,
            format!("No archive matching '{pattern}' found"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn listing(base: &str) -> serde_json::Value {
        json!({
            "bulk": [{
                "filename": "bulk/bulk-light-vehicle_20240101.zip",
                "downloadUrl": format!("{base}/files/bulk.zip"),
                "fileSize": 6,
                "fileCreatedAt": "2024-01-01"
            }],
            "delta": [{
                "filename": "delta-light-vehicle_20240102.zip",
                "downloadUrl": format!("{base}/files/delta.zip"),
                "fileSize": 3
            }]
        })
    }

    fn downloader() -> Downloader {
        Downloader::new(HttpClient::new().unwrap())
    }

    #[test]
    fn test_manifest_parse() {
        let manifest = BulkManifest::from_json_str(
            r#"{"bulk": [{"downloadUrl": "https://x/a.zip", "filename": "a.zip"}]}"#,
        )
        .unwrap();

        assert_eq!(manifest.bulk.len(), 1);
        assert!(manifest.delta.is_empty());
        assert_eq!(manifest.bulk[0].file_size, None);
        assert_eq!(manifest.bulk[0].download_url, "https://x/a.zip");
    }

    #[test]
    fn test_manifest_files_order() {
        let manifest: BulkManifest = serde_json::from_value(listing("http://h")).unwrap();
        let names: Vec<&str> = manifest.files().map(|f| f.filename.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "bulk/bulk-light-vehicle_20240101.zip",
                "delta-light-vehicle_20240102.zip"
            ]
        );
    }

    #[test]
    fn test_manifest_serializes_camel_case() {
        let file = BulkFile {
            download_url: "https://x/a.zip".to_string(),
            filename: "a.zip".to_string(),
            file_size: Some(1),
        };
        let value = serde_json::to_value(&file).unwrap();
        assert_eq!(
            value,
            json!({"downloadUrl": "https://x/a.zip", "filename": "a.zip", "fileSize": 1})
        );
    }

    #[test]
    fn test_local_name() {
        let file = BulkFile {
            download_url: String::new(),
            filename: "nested/dir/archive.zip".to_string(),
            file_size: None,
        };
        assert_eq!(file.local_name().unwrap(), "archive.zip");

        let bad = BulkFile {
            filename: "..".to_string(),
            ..file
        };
        assert!(bad.local_name().is_err());
    }

    #[tokio::test]
    async fn test_manifest_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("listing.json");
        std::fs::write(&path, listing("http://h").to_string()).unwrap();

        let manifest = BulkManifest::load(path.to_str().unwrap(), &HttpClient::new().unwrap())
            .await
            .unwrap();
        assert_eq!(manifest.delta[0].file_size, Some(3));
    }

    #[tokio::test]
    async fn test_manifest_load_from_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/trade/vehicles/bulk-download"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing(&server.uri())))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/v1/trade/vehicles/bulk-download", server.uri());
        let manifest = BulkManifest::load(&url, &HttpClient::new().unwrap())
            .await
            .unwrap();
        assert_eq!(manifest.bulk[0].file_size, Some(6));
    }

    #[tokio::test]
    async fn test_download_bulk_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/bulk.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"bulk!!".to_vec()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/files/delta.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"dlt".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let manifest: BulkManifest = serde_json::from_value(listing(&server.uri())).unwrap();

        let paths = download_bulk_data(&downloader(), &manifest, dir.path(), &NoProgress)
            .await
            .unwrap();

        assert_eq!(
            paths,
            vec![
                dir.path().join("bulk-light-vehicle_20240101.zip"),
                dir.path().join("delta-light-vehicle_20240102.zip"),
            ]
        );
        assert_eq!(std::fs::read(&paths[0]).unwrap(), b"bulk!!");
        assert_eq!(std::fs::read(&paths[1]).unwrap(), b"dlt");
    }

    #[tokio::test]
    async fn test_download_bulk_data_skips_complete_files() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"xxxxxx".to_vec()))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("bulk-light-vehicle_20240101.zip"), b"bulk!!").unwrap();
        std::fs::write(dir.path().join("delta-light-vehicle_20240102.zip"), b"dlt").unwrap();
        let manifest: BulkManifest = serde_json::from_value(listing(&server.uri())).unwrap();

        let paths = download_bulk_data(&downloader(), &manifest, dir.path(), &NoProgress)
            .await
            .unwrap();
        assert_eq!(paths.len(), 2);
    }

    #[tokio::test]
    async fn test_download_bulk_data_stops_at_first_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/bulk.zip"))
            .respond_with(ResponseTemplate::new(403).set_body_string("expired"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/files/delta.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"dlt".to_vec()))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let manifest: BulkManifest = serde_json::from_value(listing(&server.uri())).unwrap();

        let err = download_bulk_data(&downloader(), &manifest, dir.path(), &NoProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::HttpStatus { status: 403, .. }));
        assert!(!dir.path().join("delta-light-vehicle_20240102.zip").exists());
    }

    #[test]
    fn test_latest_archive() {
        let dir = tempdir().unwrap();
        for name in [
            "bulk-light-vehicle_20240101.zip",
            "bulk-light-vehicle_20240301.zip",
            "bulk-light-vehicle_20240401.txt",
            "delta-light-vehicle_20240501.zip",
        ] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("bulk-light-vehicle_20249999.zip")).unwrap();

        let latest = latest_archive(dir.path(), DEFAULT_ARCHIVE_GLOB).unwrap();
        assert_eq!(latest, dir.path().join("bulk-light-vehicle_20240301.zip"));
    }

    #[test]
    fn test_latest_archive_none_found() {
        let dir = tempdir().unwrap();
        let err = latest_archive(dir.path(), DEFAULT_ARCHIVE_GLOB).unwrap_err();
        assert!(matches!(err, Error::Filesystem { .. }));
    }
}

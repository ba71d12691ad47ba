//! Document source for the CLI: local files and HTTP(S).

use std::{io, path::Path};

use async_trait::async_trait;
use log::debug;
use url::Url;

use umlpp::{
    DocumentSource,
    error::FetchError,
    fetch::{Document, StdlibEntry},
};

/// Reads `file://` URLs and plain paths from disk and fetches `http(s)`
/// URLs over the network. The stdlib listing is a JSON array of
/// `{"path", "url"}` objects stored at `index`.
pub struct LocalSource {
    client: reqwest::Client,
    index: Option<String>,
}

impl LocalSource {
    pub fn new(index: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            index,
        }
    }

    async fn read(&self, location: &str) -> Result<String, FetchError> {
        if location.starts_with("http://") || location.starts_with("https://") {
            return self.download(location).await;
        }

        let path = match Url::parse(location) {
            Ok(url) if url.scheme() == "file" => {
                url.to_file_path().map_err(|()| FetchError::Transport {
                    url: location.to_string(),
                    message: "not a local file URL".to_string(),
                })?
            }
            _ => Path::new(location).to_path_buf(),
        };
        debug!(path = path.display().to_string(); "Reading file");

        tokio::fs::read_to_string(&path)
            .await
            .map_err(|err| match err.kind() {
                io::ErrorKind::NotFound => FetchError::NotFound {
                    url: location.to_string(),
                },
                _ => FetchError::Transport {
                    url: location.to_string(),
                    message: err.to_string(),
                },
            })
    }

    async fn download(&self, url: &str) -> Result<String, FetchError> {
        debug!(url; "Downloading");
        let transport = |err: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(transport)?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound {
                url: url.to_string(),
            });
        }
        response
            .error_for_status()
            .map_err(transport)?
            .text()
            .await
            .map_err(transport)
    }
}

#[async_trait]
impl DocumentSource for LocalSource {
    async fn fetch_document(&self, url: &str) -> Result<Document, FetchError> {
        self.read(url).await.map(Document::utf8)
    }

    async fn fetch_stdlib_index(&self) -> Result<Vec<StdlibEntry>, FetchError> {
        let Some(index) = &self.index else {
            debug!("No standard library index configured");
            return Ok(Vec::new());
        };
        let listing = self.read(index).await?;
        serde_json::from_str(&listing).map_err(|err| FetchError::Decode {
            url: index.clone(),
            message: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[tokio::test]
    async fn test_reads_file_urls_and_paths() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lib.puml");
        fs::write(&path, "!global $x = 1\n").unwrap();

        let source = LocalSource::new(None);
        let url = Url::from_file_path(&path).unwrap().to_string();
        let by_url = source.fetch_document(&url).await.unwrap();
        assert_eq!(by_url.content, "!global $x = 1\n");

        let by_path = source
            .fetch_document(path.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(by_path, by_url);
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let url = Url::from_file_path(dir.path().join("gone.puml")).unwrap().to_string();
        let err = LocalSource::new(None).fetch_document(&url).await.unwrap_err();
        assert_eq!(err, FetchError::NotFound { url });
    }

    #[tokio::test]
    async fn test_stdlib_index_listing() {
        let dir = tempdir().unwrap();
        let index = dir.path().join("index.json");
        fs::write(
            &index,
            r#"[{"path": "C4/C4.puml", "url": "https://std.test/C4/C4.puml"}]"#,
        )
        .unwrap();

        let source = LocalSource::new(Some(index.to_string_lossy().to_string()));
        let entries = source.fetch_stdlib_index().await.unwrap();
        assert_eq!(entries, vec![StdlibEntry::new("C4/C4.puml", "https://std.test/C4/C4.puml")]);

        assert!(LocalSource::new(None).fetch_stdlib_index().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_index_is_a_decode_error() {
        let dir = tempdir().unwrap();
        let index = dir.path().join("index.json");
        fs::write(&index, "{not json").unwrap();

        let source = LocalSource::new(Some(index.to_string_lossy().to_string()));
        let err = source.fetch_stdlib_index().await.unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
    }
}

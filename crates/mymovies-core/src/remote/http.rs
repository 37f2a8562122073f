//! HTTP implementation of the remote document store

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, Url};
use tracing::debug;
use uuid::Uuid;

use super::RemoteStore;
use crate::config::Config;
use crate::error::NetworkError;
use crate::models::{Movie, MovieRepresentation};

/// Remote document store reached over REST
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    client: reqwest::Client,
    base: Url,
}

impl HttpRemoteStore {
    /// Create a client for the store rooted at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, NetworkError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base: parse_url(base_url)?,
        })
    }

    /// Create a client from configuration
    ///
    /// Returns `None` when remote mirroring is not active.
    pub fn from_config(config: &Config) -> Result<Option<Self>, NetworkError> {
        match config.remote_url {
            Some(ref url) if config.sync_enabled => {
                Self::new(url, config.request_timeout()).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// URL of a single movie document
    pub fn document_url(&self, id: Uuid) -> Url {
        self.with_path(&format!("/{}.json", id))
    }

    /// URL of the whole collection
    pub fn collection_url(&self) -> Url {
        let path = self.base.path().trim_end_matches('/');
        if path.is_empty() {
            // Root of the store: "{host}/.json"
            self.with_path("/.json")
        } else {
            self.with_path(".json")
        }
    }

    fn with_path(&self, suffix: &str) -> Url {
        let mut url = self.base.clone();
        let path = format!("{}{}", url.path().trim_end_matches('/'), suffix);
        url.set_path(&path);
        url
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn put(&self, movie: &Movie) -> Result<(), NetworkError> {
        let url = self.document_url(movie.id);
        debug!(%url, "PUT movie document");

        let response = self
            .client
            .put(url)
            .json(&movie.representation())
            .send()
            .await?;
        ensure_success("PUT", response)?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), NetworkError> {
        let url = self.document_url(id);
        debug!(%url, "DELETE movie document");

        let response = self.client.delete(url).send().await?;
        ensure_success("DELETE", response)?;
        Ok(())
    }

    async fn fetch_all(&self) -> Result<HashMap<String, MovieRepresentation>, NetworkError> {
        let url = self.collection_url();
        debug!(%url, "GET movie collection");

        let response = self.client.get(url.clone()).send().await?;
        let bytes = ensure_success("GET", response)?.bytes().await?;

        // An empty store answers `null`
        let documents: Option<HashMap<String, MovieRepresentation>> =
            serde_json::from_slice(&bytes).map_err(|source| NetworkError::Decode {
                url: url.to_string(),
                source,
            })?;

        Ok(documents.unwrap_or_default())
    }
}

pub(crate) fn parse_url(url: &str) -> Result<Url, NetworkError> {
    Url::parse(url).map_err(|e| NetworkError::InvalidUrl {
        url: url.to_string(),
        details: e.to_string(),
    })
}

pub(crate) fn ensure_success(method: &'static str, response: Response) -> Result<Response, NetworkError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(NetworkError::status(method, response.url().as_str(), status.as_u16()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn store(server: &MockServer, path: &str) -> HttpRemoteStore {
        HttpRemoteStore::new(&server.url(path), TIMEOUT).unwrap()
    }

    #[test]
    fn test_document_and_collection_urls() {
        let store = HttpRemoteStore::new("https://movies.example.com/users/me/", TIMEOUT).unwrap();
        let id = Uuid::new_v4();

        assert_eq!(
            store.document_url(id).as_str(),
            format!("https://movies.example.com/users/me/{}.json", id)
        );
        assert_eq!(
            store.collection_url().as_str(),
            "https://movies.example.com/users/me.json"
        );
    }

    #[test]
    fn test_urls_at_store_root() {
        let store = HttpRemoteStore::new("https://movies.example.com/", TIMEOUT).unwrap();
        let id = Uuid::new_v4();

        assert_eq!(
            store.document_url(id).as_str(),
            format!("https://movies.example.com/{}.json", id)
        );
        assert_eq!(
            store.collection_url().as_str(),
            "https://movies.example.com/.json"
        );
    }

    #[test]
    fn test_urls_keep_query() {
        let store = HttpRemoteStore::new("https://movies.example.com/?auth=token", TIMEOUT).unwrap();
        assert_eq!(
            store.collection_url().as_str(),
            "https://movies.example.com/.json?auth=token"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = HttpRemoteStore::new("not a url", TIMEOUT).unwrap_err();
        assert!(matches!(err, NetworkError::InvalidUrl { .. }));
    }

    #[test]
    fn test_from_config_requires_active_remote() {
        let mut config = Config::default();
        assert!(HttpRemoteStore::from_config(&config).unwrap().is_none());

        config.remote_url = Some("https://movies.example.com/".to_string());
        assert!(HttpRemoteStore::from_config(&config).unwrap().is_none());

        config.sync_enabled = true;
        assert!(HttpRemoteStore::from_config(&config).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_put_sends_full_representation() {
        let server = MockServer::start_async().await;
        let mut movie = Movie::new("Heat");
        movie.has_watched = true;
        movie.image_path = Some("/heat.jpg".to_string());

        let mock = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path(format!("/movies/{}.json", movie.id))
                    .json_body(json!({
                        "identifier": movie.id.to_string(),
                        "title": "Heat",
                        "imagePath": "/heat.jpg",
                        "hasWatched": true
                    }));
                then.status(200).json_body(json!({}));
            })
            .await;

        store(&server, "/movies").put(&movie).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_put_reports_status_errors() {
        let server = MockServer::start_async().await;
        let movie = Movie::new("Heat");

        server
            .mock_async(|when, then| {
                when.method(PUT);
                then.status(401);
            })
            .await;

        let err = store(&server, "/movies").put(&movie).await.unwrap_err();
        assert_eq!(err.status_code(), Some(401));
    }

    #[tokio::test]
    async fn test_delete_targets_document() {
        let server = MockServer::start_async().await;
        let id = Uuid::new_v4();

        let mock = server
            .mock_async(|when, then| {
                when.method(DELETE).path(format!("/movies/{}.json", id));
                then.status(200).body("null");
            })
            .await;

        store(&server, "/movies").delete(id).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_all_decodes_documents() {
        let server = MockServer::start_async().await;
        let id = Uuid::new_v4();

        server
            .mock_async(|when, then| {
                when.method(GET).path("/movies.json");
                then.status(200).json_body(json!({
                    "k1": {"identifier": id.to_string(), "title": "Heat", "hasWatched": false}
                }));
            })
            .await;

        let documents = store(&server, "/movies").fetch_all().await.unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents["k1"].identifier, Some(id));
        assert_eq!(documents["k1"].has_watched, Some(false));
    }

    #[tokio::test]
    async fn test_fetch_all_empty_store() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(GET).path("/movies.json");
                then.status(200).body("null");
            })
            .await;

        let documents = store(&server, "/movies").fetch_all().await.unwrap();
        assert!(documents.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_all_decode_error() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(GET).path("/movies.json");
                then.status(200).body("{\"k1\": 42}");
            })
            .await;

        let err = store(&server, "/movies").fetch_all().await.unwrap_err();
        assert!(matches!(err, NetworkError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_http_error() {
        let store = HttpRemoteStore::new("http://127.0.0.1:9/movies", TIMEOUT).unwrap();
        let err = store.fetch_all().await.unwrap_err();
        assert!(matches!(err, NetworkError::Http(_)));
    }
}

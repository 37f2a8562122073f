//! Movie search
//!
//! Queries the external search API and keeps the latest results. Results are
//! ephemeral: nothing is persisted until the user adds one of them.

use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::NetworkError;
use crate::models::MovieRepresentation;
use crate::remote::{ensure_success, parse_url};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<MovieRepresentation>,
}

/// Client for the movie search API
#[derive(Debug)]
pub struct SearchClient {
    client: reqwest::Client,
    url: Url,
    api_key: Option<String>,
    results: Vec<MovieRepresentation>,
}

impl SearchClient {
    pub fn new(
        search_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, NetworkError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: parse_url(search_url)?,
            api_key,
            results: Vec::new(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, NetworkError> {
        Self::new(
            &config.search_url,
            config.search_api_key.clone(),
            config.request_timeout(),
        )
    }

    /// Full request URL for a search term
    pub fn request_url(&self, term: &str) -> Url {
        let mut url = self.url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("query", term);
            if let Some(ref key) = self.api_key {
                query.append_pair("api_key", key);
            }
        }
        url
    }

    /// Search for movies matching `term`
    ///
    /// On success the cached results are replaced wholesale; on failure the
    /// previous results are kept.
    pub async fn search(&mut self, term: &str) -> Result<&[MovieRepresentation], NetworkError> {
        match self.fetch(term).await {
            Ok(results) => {
                debug!(term, count = results.len(), "search complete");
                self.results = results;
                Ok(&self.results)
            }
            Err(e) => {
                warn!(term, error = %e, "search failed");
                Err(e)
            }
        }
    }

    async fn fetch(&self, term: &str) -> Result<Vec<MovieRepresentation>, NetworkError> {
        let url = self.request_url(term);
        let response = self.client.get(url).send().await?;
        let bytes = ensure_success("GET", response)?.bytes().await?;

        let response: SearchResponse =
            serde_json::from_slice(&bytes).map_err(|source| NetworkError::Decode {
                url: self.url.to_string(),
                source,
            })?;

        // Search hits are never persisted entities
        Ok(response
            .results
            .into_iter()
            .map(|mut rep| {
                rep.identifier = None;
                rep
            })
            .collect())
    }

    /// Results of the last successful search
    pub fn results(&self) -> &[MovieRepresentation] {
        &self.results
    }
}

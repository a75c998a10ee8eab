//! HTTPS implementation of the provider and asset transport.

use super::{ClientConfig, FileProvider, RenderParams};
use crate::download::Transport;
use crate::error::{Error, Result};
use crate::model::FileDocument;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;

/// Header carrying the personal access token.
const TOKEN_HEADER: &str = "X-Figma-Token";

/// Provider client backed by `reqwest`.
///
/// API calls carry the access token; asset downloads are plain GETs.
#[derive(Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    config: ClientConfig,
}

/// Body of the render endpoint.
#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    err: Option<String>,
    #[serde(default)]
    images: HashMap<String, Option<String>>,
}

impl HttpClient {
    /// Create a client from explicit configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("figsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Other(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    /// Create a client configured from the environment.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// The active configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn api_get<T: DeserializeOwned>(
        &self,
        file_id: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}/v1/{}", self.config.api_base, path);
        log::debug!("GET {}", url);

        let mut request = self
            .http
            .get(&url)
            .header(TOKEN_HEADER, &self.config.token)
            .query(query);
        if let Some(timeout) = self.config.request_timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::provider(file_id, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::provider(file_id, format!("{}: {}", status, body)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::provider(file_id, e))?;
        serde_json::from_slice(&body).map_err(|e| Error::provider(file_id, e))
    }
}

#[async_trait]
impl FileProvider for HttpClient {
    async fn file(&self, file_id: &str) -> Result<FileDocument> {
        self.api_get(file_id, &format!("files/{}", file_id), &[])
            .await
    }

    async fn file_images(
        &self,
        file_id: &str,
        ids: &[String],
        params: &RenderParams,
    ) -> Result<HashMap<String, Option<String>>> {
        let mut query = params.query();
        query.push(("ids", ids.join(",")));

        let response: ImagesResponse = self
            .api_get(file_id, &format!("images/{}", file_id), &query)
            .await?;
        match response.err {
            Some(err) => Err(Error::provider(file_id, err)),
            None => Ok(response.images),
        }
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.http.get(url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(Error::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        let body = response.bytes().await.map_err(|e| Error::Network {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(body.to_vec())
    }
}

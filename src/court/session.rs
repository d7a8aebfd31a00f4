//! HTTP session shared by every request of a run

use crate::config::Config;
use crate::court::types::SearchPayload;
use crate::court::ScraperError;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{Client, Url};
use std::sync::Arc;
use tracing::debug;

/// The two requests the pipeline makes against the court site.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Establish the session (cookies) and confirm the site is reachable.
    async fn warm_up(&self) -> Result<(), ScraperError> {
        Ok(())
    }

    /// POST a search payload and return the raw response body.
    async fn search(&self, url: &str, payload: &SearchPayload) -> Result<String, ScraperError>;

    /// GET a document and return its bytes.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ScraperError>;
}

/// reqwest-backed session with a cookie jar and the configured default headers
pub struct HttpSession {
    client: Client,
    base_url: String,
}

impl HttpSession {
    pub fn new(config: &Config) -> Result<Self, ScraperError> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| ScraperError::Config(format!("Invalid base URL {}: {}", config.base_url, e)))?;

        let jar = Arc::new(Jar::default());
        for (name, value) in &config.http.cookies {
            jar.add_cookie_str(&format!("{}={}", name, value), &base);
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
        for (key, raw) in &config.http.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| ScraperError::Config(format!("Invalid header name {}: {}", key, e)))?;
            let value = HeaderValue::from_str(raw)
                .map_err(|e| ScraperError::Config(format!("Invalid header value for {}: {}", key, e)))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .user_agent(&config.http.user_agent)
            .timeout(config.http_timeout())
            .default_headers(headers)
            .cookie_provider(jar)
            .build()?;

        debug!("HTTP session initialized with {} headers and {} cookies",
            config.http.headers.len(), config.http.cookies.len());

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }
}

fn check_status(url: &str, response: &reqwest::Response) -> Result<(), ScraperError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(ScraperError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl Transport for HttpSession {
    async fn warm_up(&self) -> Result<(), ScraperError> {
        debug!("Opening session against {}", self.base_url);
        let response = self.client.get(&self.base_url).send().await?;
        check_status(&self.base_url, &response)
    }

    async fn search(&self, url: &str, payload: &SearchPayload) -> Result<String, ScraperError> {
        let response = self.client.post(url).json(payload).send().await?;
        check_status(url, &response)?;
        Ok(response.text().await?)
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ScraperError> {
        let response = self.client.get(url).send().await?;
        check_status(url, &response)?;

        let mut content = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            content.extend_from_slice(&chunk?);
        }
        Ok(content)
    }
}

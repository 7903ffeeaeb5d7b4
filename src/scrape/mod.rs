use async_trait::async_trait;
use reqwest::StatusCode;
use std::{error::Error, time::Duration};

const USER_AGENT_DEFAULT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:124.0) Gecko/20100101 Firefox/124.0";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("server responded with {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),
}

impl FetchError {
    /// Message shown to the person who asked for the card.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::InvalidUrl(_) => "That does not look like a valid URL.".to_string(),
            FetchError::Status(403) => {
                "The site refused the request (403). It may block automated access.".to_string()
            }
            FetchError::Status(404) => "Page not found (404). Check the URL.".to_string(),
            FetchError::Status(code) if *code >= 500 => {
                format!("The site is having problems ({code}). Try again later.")
            }
            FetchError::Status(code) => format!("The site responded with an error ({code})."),
            FetchError::Timeout => "The site took too long to respond.".to_string(),
            FetchError::Network(_) => {
                "Could not reach the site. Check your connection and the URL.".to_string()
            }
        }
    }
}

/// Byte source for pages, images and icons.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

fn get_error(error: &reqwest::Error) -> String {
    match error.source() {
        Some(e) => match e.source() {
            Some(e) => e.to_string(),
            None => e.to_string(),
        },
        None => error.to_string(),
    }
}

pub struct HttpFetcher {
    client: reqwest::Client,
    proxy_client: Option<reqwest::Client>,
    retries: u8,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, retries: u8) -> Result<Self, FetchError> {
        let builder = || {
            reqwest::Client::builder()
                .user_agent(USER_AGENT_DEFAULT)
                .timeout(timeout)
                .pool_idle_timeout(timeout)
        };

        let client = builder()
            .build()
            .map_err(|e| FetchError::Network(get_error(&e)))?;

        // falls back to OPT_PROXY once a direct attempt has failed
        let opt_proxy = std::env::var("OPT_PROXY").unwrap_or_default();
        let proxy_client = if opt_proxy.is_empty() {
            None
        } else {
            let proxy = reqwest::Proxy::all(&opt_proxy)
                .map_err(|e| FetchError::Network(get_error(&e)))?;
            Some(
                builder()
                    .proxy(proxy)
                    .build()
                    .map_err(|e| FetchError::Network(get_error(&e)))?,
            )
        };

        Ok(Self {
            client,
            proxy_client,
            retries: retries.max(1),
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let url_parsed =
            reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;

        let host = url_parsed.host_str().unwrap_or_default();
        let path = url_parsed.path();
        let iden = format!("{host}{path}");

        let mut force_proxy = false;
        let mut last_error = FetchError::Network("no attempt made".to_string());

        for r in 0..self.retries {
            if r > 0 {
                log::debug!("{iden}: retrying");
            }

            let client = match (&self.proxy_client, force_proxy) {
                (Some(proxy_client), true) => {
                    log::debug!("{iden}: using proxy");
                    proxy_client
                }
                _ => &self.client,
            };

            log::debug!("{iden}: requesting");

            let resp = match client.get(url_parsed.clone()).send().await {
                Ok(r) => r,
                Err(err) => {
                    force_proxy = true;
                    log::warn!("{iden}: {err}: {:#?}", get_error(&err));
                    last_error = if err.is_timeout() {
                        FetchError::Timeout
                    } else {
                        FetchError::Network(get_error(&err))
                    };
                    continue;
                }
            };

            let status = resp.status();

            if status.is_success() {
                match resp.bytes().await {
                    Ok(bytes) => return Ok(bytes.into()),
                    Err(err) => {
                        log::debug!("{iden}: body read failed, timeout: {}", err.is_timeout());
                        force_proxy = true;
                        last_error = FetchError::Network(get_error(&err));
                        continue;
                    }
                }
            }

            log::debug!("{iden}: {:?}", status.to_string());
            last_error = FetchError::Status(status.as_u16());

            if status == StatusCode::TOO_MANY_REQUESTS {
                tokio::time::sleep(Duration::from_secs((r as u64 + 1) * 4)).await;
                continue;
            }

            if status.is_client_error() {
                // no need to try again, it's over...
                if force_proxy || self.proxy_client.is_none() {
                    return Err(last_error);
                }

                force_proxy = true;
            }
        }

        Err(last_error)
    }
}

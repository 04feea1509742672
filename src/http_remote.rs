use crate::{
    config::FetchConfig,
    error::SnapFetchError,
    remote::{Remote, RemoteResponse},
};
use reqwest::{blocking::Client, header::USER_AGENT};
use std::error::Error;

const AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: Client,
}

impl HttpRemote {
    pub fn connect(config: &FetchConfig) -> Result<Self, Box<dyn Error>> {
        if config.accept_invalid_certs {
            log::warn!("TLS certificate verification is disabled");
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        log::debug!(
            "HTTP client ready, timeout {:?}",
            config.request_timeout
        );

        Ok(HttpRemote { client })
    }
}

impl Remote for HttpRemote {
    fn get(&self, url: &str) -> Result<RemoteResponse, Box<dyn Error>> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, AGENT)
            .send()
            .map_err(|err| SnapFetchError::Http(format!("GET {} failed: {}", url, err)))?;

        Ok(RemoteResponse {
            status: response.status().as_u16(),
            content_length: response.content_length(),
            body: Box::new(response),
        })
    }
}

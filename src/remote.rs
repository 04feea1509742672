use std::{error::Error, io::Read};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub url: String,
}

impl RemoteEntry {
    pub fn new<N, U>(name: N, url: U) -> Self
    where
        N: Into<String>,
        U: Into<String>,
    {
        RemoteEntry {
            name: name.into(),
            url: url.into(),
        }
    }
}

pub struct RemoteResponse {
    pub status: u16,
    pub content_length: Option<u64>,
    pub body: Box<dyn Read>,
}

impl RemoteResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn text(mut self) -> String {
        let mut text = String::new();
        if let Err(err) = self.body.read_to_string(&mut text) {
            log::debug!("Could not read response body: {}", err);
        }
        text
    }
}

/// Implementations perform exactly one request per call; retrying is layered on top by
/// [`crate::RetryPolicy`]. An `Err` is a transport-level fault (DNS, TLS, reset, timeout), while
/// any status code the server sent back, including errors, is an `Ok` response.
pub trait Remote {
    fn get(&self, url: &str) -> Result<RemoteResponse, Box<dyn Error>>;
}

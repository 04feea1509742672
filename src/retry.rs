use crate::remote::{Remote, RemoteResponse};
use std::{error::Error, thread, time::Duration};

pub const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per URL including the first one.
    pub total_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub retry_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            total_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            retry_statuses: RETRY_STATUSES.to_vec(),
        }
    }
}

impl RetryPolicy {
    /// A policy that retries immediately, for tests and scripted remotes.
    pub fn without_backoff(total_attempts: u32) -> Self {
        RetryPolicy {
            total_attempts,
            initial_backoff: Duration::from_secs(0),
            max_backoff: Duration::from_secs(0),
            ..RetryPolicy::default()
        }
    }

    /// Delay before retry number `retry` (zero based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    pub fn is_retryable(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }

    /// GET `url`, retrying on transport faults and retryable statuses.
    ///
    /// When the attempts run out on a retryable status the last response is returned so the
    /// caller sees the real status; when they run out on transport faults the last fault is
    /// returned.
    pub fn get<R>(&self, remote: &R, url: &str) -> Result<RemoteResponse, Box<dyn Error>>
    where
        R: Remote + ?Sized,
    {
        let attempts = self.total_attempts.max(1);

        let mut attempt = 0;
        loop {
            attempt += 1;
            let last = attempt >= attempts;

            match remote.get(url) {
                Ok(response) if last || !self.is_retryable(response.status) => {
                    return Ok(response);
                }
                Ok(response) => {
                    log::warn!(
                        "HTTP {} on attempt {}/{}: {}",
                        response.status,
                        attempt,
                        attempts,
                        url
                    );
                }
                Err(err) if last => return Err(err),
                Err(err) => {
                    log::warn!(
                        "Network error on attempt {}/{}: {} : {}",
                        attempt,
                        attempts,
                        url,
                        err
                    );
                }
            }

            let delay = self.backoff(attempt - 1);
            if !delay.is_zero() {
                log::debug!("Retrying after {:?}", delay);
                thread::sleep(delay);
            }
        }
    }
}

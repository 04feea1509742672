/**************************************************************************************************
 *                                           Public API
 *************************************************************************************************/
pub use crate::{
    catalog::list_entries,
    config::FetchConfig,
    download::{
        attempt_download, AttemptOutcome, DownloadAttempt, DownloadOutcome, FallbackDownloader,
        Tier,
    },
    error::SnapFetchError,
    fetcher::{FetchSummary, Fetcher, Matches},
    http_remote::HttpRemote,
    matcher::TimestampMatcher,
    range::TimeRange,
    remote::{Remote, RemoteEntry, RemoteResponse},
    retry::{RetryPolicy, RETRY_STATUSES},
    shorthand::{compose, resolve_bound, resolve_date, resolve_time, Bound},
};
/**************************************************************************************************
 *                                      Private Implementation
 *************************************************************************************************/
mod catalog;
mod config;
mod download;
mod error;
mod fetcher;
mod http_remote;
mod matcher;
mod range;
mod remote;
mod retry;
mod shorthand;

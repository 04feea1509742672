use crate::{
    catalog,
    config::FetchConfig,
    download::{DownloadOutcome, FallbackDownloader},
    error::SnapFetchError,
    matcher::TimestampMatcher,
    range::TimeRange,
    remote::{Remote, RemoteEntry},
};
use std::{error::Error, fs::create_dir_all, path::Path};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub listed: usize,
    pub matched: usize,
    pub downloaded: usize,
    pub failed: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Matches {
    pub listed: usize,
    pub files: Vec<RemoteEntry>,
}

pub struct Fetcher<R: Remote> {
    config: FetchConfig,
    remote: R,
    matcher: TimestampMatcher,
}

impl<R> Fetcher<R>
where
    R: Remote,
{
    pub fn connect(config: FetchConfig, remote: R) -> Self {
        log::info!("Saving downloads to: {:?}", &config.download_dir);
        Self {
            config,
            remote,
            matcher: TimestampMatcher::new(),
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// List the remote directory and keep the entries inside `range`.
    ///
    /// Listing failures show up as an empty listing, never as an error.
    pub fn find_matches(&self, range: &TimeRange) -> Matches {
        let entries = catalog::list_entries(&self.remote, &self.config.listing_url());
        let listed = entries.len();

        let files = self.matcher.filter(entries, range);
        log::info!("{} of {} files fall in {}", files.len(), listed, range);

        Matches { listed, files }
    }

    /// Download each file in order. A file that cannot be fetched from any source is counted
    /// and skipped; only failing to prepare the download directory is an error.
    pub fn download_all(&self, files: &[RemoteEntry]) -> Result<FetchSummary, Box<dyn Error>> {
        Self::ensure_dir(&self.config.download_dir)?;

        let downloader = FallbackDownloader::new(&self.remote, &self.config);
        let mut summary = FetchSummary {
            matched: files.len(),
            ..FetchSummary::default()
        };

        for (i, entry) in files.iter().enumerate() {
            log::info!("Downloading ({}/{}): {}", i + 1, files.len(), entry.name);

            match downloader.download(entry) {
                DownloadOutcome::Downloaded { .. } => summary.downloaded += 1,
                DownloadOutcome::AllSourcesFailed => summary.failed += 1,
            }
        }

        Ok(summary)
    }

    pub fn retrieve(&self, range: &TimeRange) -> Result<FetchSummary, Box<dyn Error>> {
        let matches = self.find_matches(range);

        if matches.files.is_empty() {
            return Ok(FetchSummary {
                listed: matches.listed,
                ..FetchSummary::default()
            });
        }

        let summary = self.download_all(&matches.files)?;
        Ok(FetchSummary {
            listed: matches.listed,
            ..summary
        })
    }

    fn ensure_dir(dir: &Path) -> Result<(), SnapFetchError> {
        if !dir.exists() {
            log::debug!("Creating path: {:?}", dir);
        }

        create_dir_all(dir).map_err(|err| {
            SnapFetchError::Storage(format!("cannot create download directory {:?}: {}", dir, err))
        })
    }
}

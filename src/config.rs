use crate::retry::RetryPolicy;
use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

const DEFAULT_API_HOST: &str = "https://api.github.com";
const DEFAULT_RAW_HOST: &str = "https://github.com";
const DEFAULT_MIRROR_HOST: &str = "https://raw.gitmirror.com";
const DEFAULT_OWNER: &str = "MTGW1";
const DEFAULT_REPO: &str = "WplaceTracker_image";
const DEFAULT_BRANCH: &str = "main";
const DEFAULT_PATH: &str = "images";
const DOWNLOAD_DIR_NAME: &str = "download";

#[derive(Clone, Debug)]
pub struct FetchConfig {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// Directory inside the repository that holds the images.
    pub path: String,
    /// Overrides the listing URL derived from the API host and repository.
    pub listing_url: Option<String>,
    pub api_host: String,
    pub raw_host: String,
    pub mirror_host: String,
    pub download_dir: PathBuf,
    pub request_timeout: Duration,
    pub accept_invalid_certs: bool,
    pub retry: RetryPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            owner: DEFAULT_OWNER.to_owned(),
            repo: DEFAULT_REPO.to_owned(),
            branch: DEFAULT_BRANCH.to_owned(),
            path: DEFAULT_PATH.to_owned(),
            listing_url: None,
            api_host: DEFAULT_API_HOST.to_owned(),
            raw_host: DEFAULT_RAW_HOST.to_owned(),
            mirror_host: DEFAULT_MIRROR_HOST.to_owned(),
            download_dir: Self::default_download_dir(),
            request_timeout: Duration::from_secs(30),
            accept_invalid_certs: false,
            retry: RetryPolicy::default(),
        }
    }
}

impl FetchConfig {
    /// `download/` next to the running executable, or in the working directory if the
    /// executable's location is unknown.
    pub fn default_download_dir() -> PathBuf {
        env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DOWNLOAD_DIR_NAME)
    }

    pub fn with_download_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.download_dir = dir.into();
        self
    }

    pub fn with_repository(mut self, owner: &str, repo: &str) -> Self {
        self.owner = owner.to_owned();
        self.repo = repo.to_owned();
        self
    }

    pub fn with_listing_url(mut self, url: &str) -> Self {
        self.listing_url = Some(url.to_owned());
        self
    }

    pub fn with_hosts(mut self, raw_host: &str, mirror_host: &str) -> Self {
        self.raw_host = raw_host.to_owned();
        self.mirror_host = mirror_host.to_owned();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn listing_url(&self) -> String {
        match &self.listing_url {
            Some(url) => url.clone(),
            None => format!(
                "{}/repos/{}/{}/contents/{}",
                trim_host(&self.api_host),
                self.owner,
                self.repo,
                self.path
            ),
        }
    }

    pub fn raw_url(&self, file_name: &str) -> String {
        format!(
            "{}/{}/{}/raw/{}/{}/{}",
            trim_host(&self.raw_host),
            self.owner,
            self.repo,
            self.branch,
            self.path,
            file_name
        )
    }

    pub fn mirror_url(&self, file_name: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}/{}",
            trim_host(&self.mirror_host),
            self.owner,
            self.repo,
            self.branch,
            self.path,
            file_name
        )
    }
}

fn trim_host(host: &str) -> &str {
    host.trim_end_matches('/')
}

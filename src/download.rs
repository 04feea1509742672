use crate::{
    config::FetchConfig,
    remote::{Remote, RemoteEntry, RemoteResponse},
    retry::RetryPolicy,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::{
    io::{ErrorKind, Read, Write},
    path::Path,
};
use strum::IntoStaticStr;
use tempfile::NamedTempFile;

const CHUNK_SIZE: usize = 8192;

#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoStaticStr)]
pub enum Tier {
    #[strum(serialize = "primary")]
    Primary,
    #[strum(serialize = "raw content")]
    RawContent,
    #[strum(serialize = "mirror")]
    Mirror,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success { bytes: u64 },
    /// The server answered with something other than 200, after any automatic retries.
    HttpError(u16),
    TransportError(String),
    StorageError(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadAttempt {
    pub url: String,
    pub outcome: AttemptOutcome,
}

impl DownloadAttempt {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, AttemptOutcome::Success { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DownloadOutcome {
    Downloaded { tier: Tier, bytes: u64 },
    AllSourcesFailed,
}

/// Fetch `url` into `dest`.
///
/// The body is written to a temporary file beside `dest` and renamed over it only once the
/// whole body has arrived, so `dest` is either the previous file or the complete new one.
pub fn attempt_download<R>(
    remote: &R,
    url: &str,
    dest: &Path,
    policy: &RetryPolicy,
) -> DownloadAttempt
where
    R: Remote + ?Sized,
{
    let outcome = match policy.get(remote, url) {
        Ok(response) if response.is_ok() => match save_body(response, dest) {
            Ok(bytes) => AttemptOutcome::Success { bytes },
            Err(outcome) => outcome,
        },
        Ok(response) => AttemptOutcome::HttpError(response.status),
        Err(err) => AttemptOutcome::TransportError(err.to_string()),
    };

    match &outcome {
        AttemptOutcome::Success { bytes } => {
            log::debug!("Saved {:?} ({} bytes) from {}", dest, bytes, url)
        }
        AttemptOutcome::HttpError(status) => log::warn!("HTTP status {}: {}", status, url),
        AttemptOutcome::TransportError(msg) => log::error!("Error downloading {} : {}", url, msg),
        AttemptOutcome::StorageError(msg) => log::error!("Error saving {:?} : {}", dest, msg),
    }

    DownloadAttempt {
        url: url.to_owned(),
        outcome,
    }
}

fn save_body(mut response: RemoteResponse, dest: &Path) -> Result<u64, AttemptOutcome> {
    let storage = |err: std::io::Error| AttemptOutcome::StorageError(err.to_string());

    let dir = dest
        .parent()
        .ok_or_else(|| AttemptOutcome::StorageError(format!("no parent directory: {:?}", dest)))?;
    let file_name = dest
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let prefix = format!(".{}.", file_name);
    let mut builder = tempfile::Builder::new();
    builder.prefix(&prefix).suffix(".part");
    // Same mode as a plain create; the temp file default of 0600 would survive the rename.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    let mut tmp = builder.tempfile_in(dir).map_err(storage)?;

    let written = match response.content_length.filter(|len| *len > 0) {
        Some(total) => copy_with_progress(&mut response.body, &mut tmp, total)?,
        None => {
            let mut data = vec![];
            response
                .body
                .read_to_end(&mut data)
                .map_err(|err| AttemptOutcome::TransportError(err.to_string()))?;
            tmp.write_all(&data).map_err(storage)?;
            data.len() as u64
        }
    };

    tmp.flush().map_err(storage)?;
    tmp.persist(dest).map_err(|err| storage(err.error))?;

    Ok(written)
}

fn copy_with_progress(
    body: &mut dyn Read,
    out: &mut NamedTempFile,
    total: u64,
) -> Result<u64, AttemptOutcome> {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::with_template("[{bar:50}] {percent}%")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("= ");
    pb.set_style(style);

    let mut buf = [0u8; CHUNK_SIZE];
    let mut downloaded: u64 = 0;
    loop {
        let n = match body.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                pb.abandon();
                return Err(AttemptOutcome::TransportError(err.to_string()));
            }
        };

        if let Err(err) = out.write_all(&buf[..n]) {
            pb.abandon();
            return Err(AttemptOutcome::StorageError(err.to_string()));
        }

        downloaded += n as u64;
        pb.set_position(downloaded);
    }

    if downloaded < total {
        pb.abandon();
        return Err(AttemptOutcome::TransportError(format!(
            "body ended after {} of {} bytes",
            downloaded, total
        )));
    }

    pb.finish();
    Ok(downloaded)
}

pub struct FallbackDownloader<'a, R: ?Sized> {
    remote: &'a R,
    config: &'a FetchConfig,
}

impl<'a, R> FallbackDownloader<'a, R>
where
    R: Remote + ?Sized,
{
    pub fn new(remote: &'a R, config: &'a FetchConfig) -> Self {
        FallbackDownloader { remote, config }
    }

    pub fn sources(&self, entry: &RemoteEntry) -> Vec<(Tier, String)> {
        vec![
            (Tier::Primary, entry.url.clone()),
            (Tier::RawContent, self.config.raw_url(&entry.name)),
            (Tier::Mirror, self.config.mirror_url(&entry.name)),
        ]
    }

    pub fn download(&self, entry: &RemoteEntry) -> DownloadOutcome {
        if !is_plain_file_name(&entry.name) {
            log::error!("Refusing to save remote file with unsafe name: {:?}", entry.name);
            return DownloadOutcome::AllSourcesFailed;
        }

        let dest = self.config.download_dir.join(&entry.name);

        for (tier, url) in self.sources(entry) {
            if tier != Tier::Primary {
                let tier_name: &'static str = tier.into();
                log::info!("Trying {} source for {}", tier_name, entry.name);
            }

            let attempt = attempt_download(self.remote, &url, &dest, &self.config.retry);
            if let AttemptOutcome::Success { bytes } = attempt.outcome {
                return DownloadOutcome::Downloaded { tier, bytes };
            }
        }

        log::error!("Unable to download file {}", entry.name);
        DownloadOutcome::AllSourcesFailed
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(|c: char| c == '/' || c == '\\' || c == '\0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SnapFetchError;
    use std::{cell::RefCell, collections::HashMap, error::Error, fs, io::Cursor};

    /// Body reader that fails after handing out its bytes.
    struct Truncated(Cursor<Vec<u8>>);

    impl Read for Truncated {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.0.read(buf)? {
                0 => Err(std::io::Error::new(ErrorKind::ConnectionReset, "reset")),
                n => Ok(n),
            }
        }
    }

    #[derive(Default)]
    struct Routes {
        routes: HashMap<String, (u16, Vec<u8>, bool)>,
        truncate: Option<String>,
        calls: RefCell<Vec<String>>,
    }

    impl Routes {
        fn with(mut self, url: &str, status: u16, body: &[u8], report_length: bool) -> Self {
            self.routes
                .insert(url.to_owned(), (status, body.to_vec(), report_length));
            self
        }
    }

    impl Remote for Routes {
        fn get(&self, url: &str) -> Result<RemoteResponse, Box<dyn Error>> {
            self.calls.borrow_mut().push(url.to_owned());

            if self.truncate.as_deref() == Some(url) {
                return Ok(RemoteResponse {
                    status: 200,
                    content_length: Some(1_000),
                    body: Box::new(Truncated(Cursor::new(vec![7u8; 10]))),
                });
            }

            match self.routes.get(url) {
                Some((status, body, report_length)) => Ok(RemoteResponse {
                    status: *status,
                    content_length: if *report_length {
                        Some(body.len() as u64)
                    } else {
                        None
                    },
                    body: Box::new(Cursor::new(body.clone())),
                }),
                None => Err(Box::new(SnapFetchError::Http(format!("no route: {}", url)))),
            }
        }
    }

    fn config(dir: &Path) -> FetchConfig {
        FetchConfig::default()
            .with_download_dir(dir)
            .with_hosts("http://raw.test", "http://mirror.test")
            .with_retry(RetryPolicy::without_backoff(3))
    }

    fn leftover_parts(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
            .count()
    }

    #[test]
    fn test_attempt_streams_with_length() {
        let dir = tempfile::tempdir().unwrap();
        let body = vec![1u8; CHUNK_SIZE * 3 + 17];
        let remote = Routes::default().with("http://a", 200, &body, true);
        let dest = dir.path().join("f.png");

        let attempt = attempt_download(&remote, "http://a", &dest, &RetryPolicy::without_backoff(1));

        assert_eq!(
            attempt.outcome,
            AttemptOutcome::Success {
                bytes: body.len() as u64
            }
        );
        assert_eq!(fs::read(&dest).unwrap(), body);
        assert_eq!(leftover_parts(dir.path()), 0);
    }

    #[test]
    fn test_attempt_without_length_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("f.png");
        fs::write(&dest, b"old contents that are longer").unwrap();
        let remote = Routes::default().with("http://a", 200, b"new", false);

        let attempt = attempt_download(&remote, "http://a", &dest, &RetryPolicy::without_backoff(1));

        assert!(attempt.is_success());
        assert_eq!(fs::read(&dest).unwrap(), b"new");
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_has_regular_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("plain.png");
        fs::write(&plain, b"x").unwrap();
        let dest = dir.path().join("f.png");
        let remote = Routes::default().with("http://a", 200, b"image", true);

        let attempt = attempt_download(&remote, "http://a", &dest, &RetryPolicy::without_backoff(1));

        assert!(attempt.is_success());
        let mode = |p: &Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&dest), mode(&plain));
    }

    #[test]
    fn test_attempt_http_error_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("f.png");
        let remote = Routes::default().with("http://a", 404, b"missing", true);

        let attempt = attempt_download(&remote, "http://a", &dest, &RetryPolicy::without_backoff(3));

        assert_eq!(attempt.outcome, AttemptOutcome::HttpError(404));
        assert_eq!(attempt.url, "http://a");
        assert!(!dest.exists());
        assert_eq!(remote.calls.borrow().len(), 1);
    }

    #[test]
    fn test_interrupted_body_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("f.png");
        fs::write(&dest, b"previous").unwrap();
        let remote = Routes {
            truncate: Some("http://a".to_owned()),
            ..Routes::default()
        };

        let attempt = attempt_download(&remote, "http://a", &dest, &RetryPolicy::without_backoff(1));

        assert!(matches!(attempt.outcome, AttemptOutcome::TransportError(_)));
        assert_eq!(fs::read(&dest).unwrap(), b"previous");
        assert_eq!(leftover_parts(dir.path()), 0);
    }

    #[test]
    fn test_short_body_is_a_transport_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("f.png");
        let short = RemoteResponse {
            status: 200,
            content_length: Some(100),
            body: Box::new(Cursor::new(vec![0u8; 40])),
        };

        let outcome = save_body(short, &dest).unwrap_err();

        assert!(matches!(outcome, AttemptOutcome::TransportError(_)));
        assert!(!dest.exists());
        assert_eq!(leftover_parts(dir.path()), 0);
    }

    #[test]
    fn test_sources_order() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let remote = Routes::default();
        let downloader = FallbackDownloader::new(&remote, &config);

        let sources = downloader.sources(&RemoteEntry::new("x.png", "http://primary/x.png"));
        assert_eq!(
            sources,
            vec![
                (Tier::Primary, "http://primary/x.png".to_owned()),
                (
                    Tier::RawContent,
                    "http://raw.test/MTGW1/WplaceTracker_image/raw/main/images/x.png".to_owned()
                ),
                (
                    Tier::Mirror,
                    "http://mirror.test/MTGW1/WplaceTracker_image/main/images/x.png".to_owned()
                ),
            ]
        );
    }

    #[test]
    fn test_falls_back_to_mirror() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let remote = Routes::default()
            .with("http://primary/x.png", 404, b"", true)
            .with(&config.mirror_url("x.png"), 200, b"mirror bytes", true);

        let outcome = FallbackDownloader::new(&remote, &config)
            .download(&RemoteEntry::new("x.png", "http://primary/x.png"));

        assert_eq!(
            outcome,
            DownloadOutcome::Downloaded {
                tier: Tier::Mirror,
                bytes: 12
            }
        );
        assert_eq!(fs::read(dir.path().join("x.png")).unwrap(), b"mirror bytes");
        // primary once (404 is final), raw host three times (transport faults), mirror once
        assert_eq!(remote.calls.borrow().len(), 5);
    }

    #[test]
    fn test_unsafe_names_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let remote = Routes::default();
        let downloader = FallbackDownloader::new(&remote, &config);

        for name in &["../escape.png", "a/b.png", "..", ""] {
            assert_eq!(
                downloader.download(&RemoteEntry::new(*name, "http://x")),
                DownloadOutcome::AllSourcesFailed
            );
        }
        assert!(remote.calls.borrow().is_empty());
    }
}

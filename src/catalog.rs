use crate::remote::{Remote, RemoteEntry};
use serde::Deserialize;
use std::error::Error;

/// One element of the directory-listing JSON array. Other fields are ignored.
#[derive(Debug, Deserialize)]
struct ListingItem {
    name: String,
    /// `null` for sub-directories.
    download_url: Option<String>,
}

/// Fetch the remote directory listing.
///
/// Failures never propagate: a non-200 status, a transport fault or an unreadable body all
/// produce an empty listing plus a log message, so the caller simply sees no files.
pub fn list_entries<R>(remote: &R, listing_url: &str) -> Vec<RemoteEntry>
where
    R: Remote + ?Sized,
{
    log::info!("Requesting file listing: {}", listing_url);

    match try_list_entries(remote, listing_url) {
        Ok(entries) => {
            log::info!("Listing returned {} files", entries.len());
            entries
        }
        Err(err) => {
            log::error!("Error retrieving remote listing: {} : {}", listing_url, err);
            vec![]
        }
    }
}

fn try_list_entries<R>(remote: &R, listing_url: &str) -> Result<Vec<RemoteEntry>, Box<dyn Error>>
where
    R: Remote + ?Sized,
{
    let response = remote.get(listing_url)?;

    if !response.is_ok() {
        let status = response.status;
        log::warn!(
            "Listing request failed with HTTP {}: {}",
            status,
            response.text()
        );
        return Ok(vec![]);
    }

    let items: Vec<ListingItem> = serde_json::from_reader(response.body)?;

    let entries = items
        .into_iter()
        .filter_map(|item| match item.download_url {
            Some(url) => Some(RemoteEntry::new(item.name, url)),
            None => {
                log::debug!("Skipping listing entry without a download URL: {}", item.name);
                None
            }
        })
        .collect();

    Ok(entries)
}

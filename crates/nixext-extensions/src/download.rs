//! Package download into scoped temporary files

use futures::StreamExt;
use nixext_core::types::Browser;
use std::io::Write;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::DownloadError;

/// Stream `url` into a new `nixext-*.crx|xpi` temporary file
///
/// The file is removed when the returned handle is dropped.
pub async fn download_to_temp(
    client: &reqwest::Client,
    url: &str,
    browser: Browser,
) -> Result<NamedTempFile, DownloadError> {
    let mut file = tempfile::Builder::new()
        .prefix("nixext-")
        .suffix(&format!(".{}", browser.file_extension()))
        .tempfile()?;

    debug!("Downloading {} to {}", url, file.path().display());

    let response = client.get(url).send().await?.error_for_status()?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)?;
        written += chunk.len() as u64;
    }

    file.flush()?;
    debug!("Downloaded {} bytes from {}", written, url);

    Ok(file)
}

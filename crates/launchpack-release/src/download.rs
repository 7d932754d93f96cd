use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

const CHUNK_SIZE: usize = 8192;

/// Streams `url` into `dest`, reporting `(bytes_so_far, total_or_zero)` after
/// every chunk. One attempt only; a non-success status or dropped connection
/// aborts with whatever partial file was written, so callers stage `dest` in
/// scratch space rather than the live target. Returns the byte count.
pub fn download_to_file(
    url: &str,
    dest: &Path,
    mut progress: impl FnMut(u64, u64),
) -> Result<u64> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    // Connect deadline only: large transfers must not hit an overall timeout.
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("launchpack/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .context("failed building http client")?;

    let mut response = client
        .get(url)
        .send()
        .with_context(|| format!("failed requesting {url}"))?
        .error_for_status()
        .with_context(|| format!("download rejected: {url}"))?;

    let total = response.content_length().unwrap_or(0);
    let mut file = fs::File::create(dest)
        .with_context(|| format!("failed to create {}", dest.display()))?;

    let mut written: u64 = 0;
    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
        let read = response
            .read(&mut buffer)
            .with_context(|| format!("download interrupted: {url}"))?;
        if read == 0 {
            break;
        }
        file.write_all(&buffer[..read])
            .with_context(|| format!("failed writing {}", dest.display()))?;
        written += read as u64;
        progress(written, total);
    }

    file.flush()
        .with_context(|| format!("failed writing {}", dest.display()))?;
    Ok(written)
}

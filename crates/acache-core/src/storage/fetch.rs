//! Single-stream curl transfers (http, https, file).
//!
//! Blocking; call from `spawn_blocking` when used from async code.

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::StorageWriter;
use crate::config::TransferConfig;

fn configure(easy: &mut curl::easy::Easy, uri: &str, transfer: &TransferConfig) -> Result<()> {
    easy.url(uri).context("invalid URL")?;
    easy.follow_location(true)?;
    easy.max_redirections(transfer.max_redirections)?;
    easy.connect_timeout(transfer.connect_timeout())?;
    easy.low_speed_limit(transfer.low_speed_limit_bytes)?;
    easy.low_speed_time(transfer.low_speed_time())?;
    easy.timeout(transfer.timeout())?;
    Ok(())
}

/// Non-HTTP schemes (file://) report code 0.
fn check_status(easy: &mut curl::easy::Easy, uri: &str) -> Result<()> {
    let code = easy.response_code().context("no response code")?;
    if code != 0 && !(200..300).contains(&code) {
        anyhow::bail!("GET {} returned HTTP {}", uri, code);
    }
    Ok(())
}

/// Downloads `uri` with a single GET, writing sequentially to `storage`.
/// Returns the number of bytes written.
pub fn download_to(uri: &str, storage: &StorageWriter, transfer: &TransferConfig) -> Result<u64> {
    let offset = Arc::new(AtomicU64::new(0));
    let offset_cb = Arc::clone(&offset);
    let storage = storage.clone();

    let mut easy = curl::easy::Easy::new();
    configure(&mut easy, uri, transfer)?;

    {
        let mut transfer = easy.transfer();
        transfer.write_function(move |data| {
            let off = offset_cb.fetch_add(data.len() as u64, Ordering::Relaxed);
            match storage.write_at(off, data) {
                Ok(()) => Ok(data.len()),
                Err(e) => {
                    tracing::warn!("asset write failed: {:#}", e);
                    Ok(0) // abort transfer
                }
            }
        })?;
        transfer.perform().context("GET request failed")?;
    }

    check_status(&mut easy, uri)?;
    Ok(offset.load(Ordering::Relaxed))
}

/// Fetches `uri` into memory. Used for image probes, which only need headers
/// but cannot rely on servers honoring ranges.
pub fn fetch_bytes(uri: &str, transfer: &TransferConfig) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    let mut easy = curl::easy::Easy::new();
    configure(&mut easy, uri, transfer)?;
    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform().context("GET request failed")?;
    }
    check_status(&mut easy, uri)?;
    Ok(body)
}

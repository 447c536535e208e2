//! Integration tests: real filesystem backend and curl against a local HTTP server.

mod common;

use acache_core::asset::{AssetKind, AssetRef};
use acache_core::cache::{AssetCache, CacheOptions, Location};
use acache_core::checksum::HashAlgorithm;
use acache_core::config::{StorageMode, TransferConfig};
use acache_core::probe::CurlImageProbe;
use acache_core::resolver::{ManifestEntry, ManifestResolver};
use acache_core::storage::{self, FsBackend};
use acache_core::AssetError;
use base64::Engine;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

/// 1x1 transparent PNG.
const PNG_1X1: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

fn entry(id: &str, kind: &str, uri: String, hash: Option<String>) -> ManifestEntry {
    ManifestEntry {
        id: id.to_string(),
        name: None,
        kind: AssetKind::new(kind),
        uri: Some(uri),
        hash,
        width: None,
        height: None,
        variants: Vec::new(),
    }
}

fn cache(entries: Vec<ManifestEntry>, mode: StorageMode, cache_dir: &Path) -> AssetCache {
    AssetCache::new(
        Arc::new(ManifestResolver::new(entries, 1.0).unwrap()),
        Arc::new(FsBackend::new(
            None,
            HashAlgorithm::Md5,
            TransferConfig::default(),
        )),
        Arc::new(CurlImageProbe::new(TransferConfig::default())),
        CacheOptions {
            mode,
            cache_dir: cache_dir.to_path_buf(),
        },
    )
}

fn body() -> Vec<u8> {
    (0u8..100).cycle().take(32 * 1024).collect()
}

#[tokio::test]
async fn download_verifies_and_survives_restart() {
    let body = body();
    let hash = HashAlgorithm::Md5.hash_bytes(&body);
    let server = common::asset_server::start(vec![("logo.png", body.clone())], Duration::ZERO);
    let dir = tempdir().unwrap();
    let entries = vec![entry("logo", "png", server.url("logo.png"), Some(hash.clone()))];

    let first = cache(entries.clone(), StorageMode::Durable, dir.path());
    let handle = first.resolve(&AssetRef::Module("logo".into())).unwrap();
    first.ensure_local(&handle).await.expect("ensure_local");

    let expected = storage::local_asset_path(dir.path(), &hash, &AssetKind::new("png"));
    assert_eq!(handle.location(), Some(Location::Path(expected.clone())));
    assert_eq!(std::fs::read(&expected).unwrap(), body);
    assert!(!storage::temp_path(&expected).exists());
    assert_eq!(server.hits("logo.png"), 1);

    // A fresh cache over the same directory finds the verified copy.
    let second = cache(entries, StorageMode::Durable, dir.path());
    let handle = second.resolve(&AssetRef::Module("logo".into())).unwrap();
    second.ensure_local(&handle).await.unwrap();
    assert!(handle.is_resolved());
    assert_eq!(server.hits("logo.png"), 1);
}

#[tokio::test]
async fn integrity_failure_discards_file() {
    let server = common::asset_server::start(vec![("logo.png", body())], Duration::ZERO);
    let dir = tempdir().unwrap();
    let c = cache(
        vec![entry("logo", "png", server.url("logo.png"), Some("0".repeat(32)))],
        StorageMode::Durable,
        dir.path(),
    );
    let handle = c.resolve(&AssetRef::Module("logo".into())).unwrap();

    let err = c.ensure_local(&handle).await.unwrap_err();
    assert!(err.is_integrity(), "got {err}");
    assert!(!handle.is_resolved());
    assert!(!handle.is_downloading());
    let path = storage::local_asset_path(dir.path(), &"0".repeat(32), &AssetKind::new("png"));
    assert!(!path.exists());
    assert!(!storage::temp_path(&path).exists());
}

#[tokio::test]
async fn http_error_is_a_transfer_error() {
    let server = common::asset_server::start(Vec::new(), Duration::ZERO);
    let dir = tempdir().unwrap();
    let c = cache(Vec::new(), StorageMode::Durable, dir.path());
    let handle = c.resolve_uri(&server.url("missing.ttf"));

    let err = c.ensure_local(&handle).await.unwrap_err();
    match err {
        AssetError::Transfer { uri, reason } => {
            assert_eq!(uri, server.url("missing.ttf"));
            assert!(reason.contains("HTTP 404"), "reason: {reason}");
        }
        other => panic!("expected Transfer, got {other:?}"),
    }
    assert!(!handle.is_resolved());
    assert_eq!(c.render_uri(&handle), server.url("missing.ttf"));
}

#[tokio::test]
async fn concurrent_requests_share_one_get() {
    let body = body();
    let hash = HashAlgorithm::Md5.hash_bytes(&body);
    let server =
        common::asset_server::start(vec![("font.ttf", body)], Duration::from_millis(200));
    let dir = tempdir().unwrap();
    let c = cache(
        vec![entry("font", "ttf", server.url("font.ttf"), Some(hash))],
        StorageMode::Durable,
        dir.path(),
    );
    let handle = c.resolve(&AssetRef::Module("font".into())).unwrap();

    let results =
        futures_util::future::join_all((0..6).map(|_| c.ensure_local(&handle))).await;

    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(server.total_hits(), 1);
}

#[tokio::test]
async fn load_many_mixes_data_and_http_uris() {
    let server = common::asset_server::start(vec![("a.txt", b"alpha".to_vec())], Duration::ZERO);
    let dir = tempdir().unwrap();
    let c = cache(Vec::new(), StorageMode::Durable, dir.path());
    let refs = vec![
        AssetRef::Uri(server.url("a.txt")),
        AssetRef::Uri("data:text/plain;base64,YmV0YQ==".into()),
    ];

    let handles = c.load_many(&refs).await.unwrap();

    let read = |i: usize| match handles[i].location() {
        Some(Location::Path(p)) => std::fs::read(p).unwrap(),
        other => panic!("unexpected location {other:?}"),
    };
    assert_eq!(read(0), b"alpha");
    assert_eq!(read(1), b"beta");
    assert_eq!(handles[1].kind().as_str(), "plain");
}

#[tokio::test]
async fn remote_mode_probes_served_image() {
    let png = base64::engine::general_purpose::STANDARD
        .decode(PNG_1X1)
        .unwrap();
    let server = common::asset_server::start(vec![("pixel.png", png)], Duration::ZERO);
    let dir = tempdir().unwrap();
    let c = cache(Vec::new(), StorageMode::Remote, dir.path());
    let handle = c.resolve_uri(&server.url("pixel.png"));

    c.ensure_local(&handle).await.unwrap();

    assert_eq!(handle.location(), Some(Location::Remote(server.url("pixel.png"))));
    assert_eq!((handle.width(), handle.height()), (Some(1), Some(1)));
    assert_eq!(handle.name(), "pixel.png");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn remote_mode_serves_heic_without_probing() {
    let dir = tempdir().unwrap();
    let c = cache(Vec::new(), StorageMode::Remote, dir.path());
    // ftyp box of a HEIC file; not readable by the bundled codecs.
    let uri = "data:image/heic;base64,AAAAGGZ0eXBoZWljAAAAAG1pZjFoZWlj";
    let handle = c.resolve_uri(uri);
    assert!(handle.kind().is_image());

    c.ensure_local(&handle).await.unwrap();

    assert!(handle.is_resolved());
    assert_eq!(handle.location(), Some(Location::Remote(uri.to_string())));
    assert_eq!((handle.width(), handle.height()), (None, None));
}

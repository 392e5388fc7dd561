//! Fetching and decoding part images.
//!
//! Loads are fallible and bounded: a missing or undecodable file is an
//! [`EmblemError::AssetLoad`], and [`TimedAssetSource`] turns a load that
//! never settles into an [`EmblemError::AssetTimeout`].

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use image::RgbaImage;

use crate::error::{EmblemError, EmblemResult};

/// Somewhere asset bytes come from.
pub trait AssetSource {
    /// Returns the raw (encoded) bytes stored at `path`.
    fn fetch(&self, path: &str) -> EmblemResult<Vec<u8>>;

    /// Fetches and decodes an image to RGBA.
    fn load_image(&self, path: &str) -> EmblemResult<RgbaImage> {
        let bytes = self.fetch(path)?;
        decode_image(path, &bytes)
    }
}

impl<S: AssetSource + ?Sized> AssetSource for Arc<S> {
    fn fetch(&self, path: &str) -> EmblemResult<Vec<u8>> {
        (**self).fetch(path)
    }
}

impl<S: AssetSource + ?Sized> AssetSource for &S {
    fn fetch(&self, path: &str) -> EmblemResult<Vec<u8>> {
        (**self).fetch(path)
    }
}

/// Decodes PNG/JPEG/etc. bytes into an RGBA image.
pub fn decode_image(path: &str, bytes: &[u8]) -> EmblemResult<RgbaImage> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| EmblemError::asset_load(path, e))?;
    Ok(decoded.to_rgba8())
}

// ============================================================================
// FsAssetSource
// ============================================================================

/// Reads assets from a directory.
///
/// Asset paths like `/assets/images/full/star.png` are resolved relative to
/// `root`; paths that would escape the root are refused.
#[derive(Debug, Clone)]
pub struct FsAssetSource {
    root: PathBuf,
}

impl FsAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> EmblemResult<PathBuf> {
        let mut resolved = self.root.clone();
        for component in Path::new(path).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::RootDir | Component::CurDir => {}
                Component::ParentDir | Component::Prefix(_) => {
                    return Err(EmblemError::asset_load(path, "path escapes the asset root"));
                }
            }
        }
        Ok(resolved)
    }
}

impl AssetSource for FsAssetSource {
    fn fetch(&self, path: &str) -> EmblemResult<Vec<u8>> {
        let resolved = self.resolve(path)?;
        std::fs::read(&resolved).map_err(|e| EmblemError::asset_load(path, e))
    }
}

// ============================================================================
// MemoryAssetSource
// ============================================================================

/// Assets held in memory, keyed by path. Useful for previews that have
/// already downloaded their parts, and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetSource {
    assets: HashMap<String, Arc<Vec<u8>>>,
}

impl MemoryAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: Vec<u8>) {
        self.assets.insert(path.into(), Arc::new(bytes));
    }

    pub fn with(mut self, path: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(path, bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl AssetSource for MemoryAssetSource {
    fn fetch(&self, path: &str) -> EmblemResult<Vec<u8>> {
        self.assets
            .get(path)
            .map(|bytes| bytes.as_ref().clone())
            .ok_or_else(|| EmblemError::asset_load(path, "no such asset"))
    }
}

// ============================================================================
// TimedAssetSource
// ============================================================================

/// Wraps a source so every fetch either settles or fails within `timeout`.
///
/// The fetch runs on a worker thread; if the deadline passes first the
/// result is abandoned and the caller gets [`EmblemError::AssetTimeout`].
///
/// Threads cannot be cancelled, so an abandoned worker keeps running until
/// the inner fetch returns. At most `max_workers` fetches may be in flight
/// at once, counting abandoned ones; beyond that a fetch times out at once
/// without spawning, so a source that hangs forever pins a bounded number
/// of threads.
#[derive(Debug)]
pub struct TimedAssetSource<S> {
    inner: Arc<S>,
    timeout: Duration,
    max_workers: usize,
    in_flight: Arc<AtomicUsize>,
}

impl<S> Clone for TimedAssetSource<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            timeout: self.timeout,
            max_workers: self.max_workers,
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<S> TimedAssetSource<S> {
    pub const DEFAULT_MAX_WORKERS: usize = 16;

    pub fn new(inner: S, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            timeout,
            max_workers: Self::DEFAULT_MAX_WORKERS,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Worker threads still running, including ones whose caller gave up.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    fn timed_out(&self, path: &str) -> EmblemError {
        EmblemError::AssetTimeout {
            path: path.to_string(),
            timeout: self.timeout,
        }
    }
}

/// Releases a worker slot when the worker finishes, even by panicking.
struct WorkerSlot(Arc<AtomicUsize>);

impl Drop for WorkerSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl<S: AssetSource + Send + Sync + 'static> AssetSource for TimedAssetSource<S> {
    fn fetch(&self, path: &str) -> EmblemResult<Vec<u8>> {
        if self.in_flight.fetch_add(1, Ordering::AcqRel) >= self.max_workers {
            self.in_flight.fetch_sub(1, Ordering::AcqRel);
            tracing::warn!(path, max_workers = self.max_workers, "asset workers exhausted");
            return Err(self.timed_out(path));
        }
        let slot = WorkerSlot(Arc::clone(&self.in_flight));

        let (tx, rx) = mpsc::sync_channel(1);
        let inner = Arc::clone(&self.inner);
        let owned_path = path.to_string();

        thread::Builder::new()
            .name("asset-fetch".into())
            .spawn(move || {
                let _slot = slot;
                // The receiver may be gone after a timeout.
                let _ = tx.send(inner.fetch(&owned_path));
            })?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::warn!(path, timeout = ?self.timeout, "asset fetch timed out");
                Err(self.timed_out(path))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(EmblemError::asset_load(
                path,
                "asset worker exited without a result",
            )),
        }
    }
}

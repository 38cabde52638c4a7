//! On-disk cache of solc executables, one file per version.
//!
//! The cache directory is owned exclusively by [`CompilerCache`]. Binaries are
//! write-once: a version is downloaded at most once per process and the file
//! is never rewritten afterwards.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::error::CompilerError;

const SOLC_BIN_LINUX: &str = "https://github.com/ethereum/solc-bin/raw/gh-pages/linux-amd64/solc-linux-amd64-";
const SOLC_BIN_MACOS: &str = "https://github.com/ethereum/solc-bin/raw/gh-pages/macosx-amd64/solc-macosx-amd64-";

/// Canonical solc distribution prefix for the current OS. The version string is
/// appended as-is, e.g. `v0.8.17+commit.8df45f5f`.
pub fn default_download_base() -> &'static str {
    if cfg!(target_os = "macos") {
        SOLC_BIN_MACOS
    } else {
        SOLC_BIN_LINUX
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionState {
    Absent,
    Present(PathBuf),
}

pub struct CompilerCache {
    cache_dir: PathBuf,
    download_base: String,
    http: reqwest::Client,
    /// Versions known to be on disk.
    installed: DashMap<String, PathBuf>,
    /// One lock per version so that a first download of one version never
    /// blocks requests for another.
    download_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl CompilerCache {
    /// Creates the cache directory if needed. Failing here is a startup error.
    pub fn new(
        cache_dir: impl Into<PathBuf>,
        download_base: impl Into<String>,
        http: reqwest::Client,
    ) -> Result<Self, CompilerError> {
        let cache_dir = cache_dir.into();
        std::fs::create_dir_all(&cache_dir).map_err(|e| CompilerError::cache(&cache_dir, e))?;

        Ok(Self {
            cache_dir,
            download_base: download_base.into(),
            http,
            installed: DashMap::new(),
            download_locks: DashMap::new(),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn binary_path(&self, version: &str) -> PathBuf {
        self.cache_dir.join(version)
    }

    /// Presence as recorded in memory; a binary placed on disk by another
    /// process is only picked up by [`CompilerCache::ensure_version`].
    pub fn state(&self, version: &str) -> VersionState {
        match self.installed.get(version) {
            Some(path) => VersionState::Present(path.value().clone()),
            None => VersionState::Absent,
        }
    }

    /// Makes sure the solc binary for `version` exists locally and returns its path.
    ///
    /// Concurrent first calls for the same version download it exactly once;
    /// the other callers wait on the per-version lock and then observe it as present.
    pub async fn ensure_version(&self, version: &str) -> Result<PathBuf, CompilerError> {
        validate_version(version)?;

        if let VersionState::Present(path) = self.state(version) {
            return Ok(path);
        }

        let lock = self.version_lock(version);
        let result = self.install_locked(version, &lock).await;
        drop(lock);
        self.release_version_lock(version);

        result
    }

    async fn install_locked(&self, version: &str, lock: &Mutex<()>) -> Result<PathBuf, CompilerError> {
        let _guard = lock.lock().await;

        // Re-check after acquiring the lock, another task may have finished the download.
        if let VersionState::Present(path) = self.state(version) {
            return Ok(path);
        }

        let path = self.binary_path(version);
        if tokio::fs::try_exists(&path).await.map_err(|e| CompilerError::cache(&path, e))? {
            debug!(version = %version, path = %path.display(), "Found solc binary on disk");
            self.installed.insert(version.to_string(), path.clone());
            return Ok(path);
        }

        info!(version = %version, "Start downloading solc binary");
        self.download(version, &path).await?;
        self.installed.insert(version.to_string(), path.clone());
        info!(version = %version, path = %path.display(), "Solc binary installed");

        Ok(path)
    }

    fn version_lock(&self, version: &str) -> Arc<Mutex<()>> {
        self.download_locks.entry(version.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).value().clone()
    }

    /// Drops the lock entry once no task holds or waits on it. `remove_if` runs
    /// under the shard lock that `version_lock` clones under, so a count of one
    /// means only the map still references it.
    fn release_version_lock(&self, version: &str) {
        self.download_locks.remove_if(version, |_, lock| Arc::strong_count(lock) == 1);
    }

    async fn download(&self, version: &str, destination: &Path) -> Result<(), CompilerError> {
        let url = format!("{}{}", self.download_base, version);
        debug!(url = %url, "Downloading solc");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| CompilerError::Download { version: version.to_string(), message: e.to_string() })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CompilerError::DownloadStatus { version: version.to_string(), status: status.as_u16() });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| CompilerError::Download { version: version.to_string(), message: e.to_string() })?;

        // Written under a temporary name and renamed so a crash never leaves a
        // truncated binary under the final name.
        let partial = self.cache_dir.join(format!(".{}.partial", version));
        tokio::fs::write(&partial, &body).await.map_err(|e| CompilerError::cache(&partial, e))?;
        make_executable(&partial).await?;
        tokio::fs::rename(&partial, destination).await.map_err(|e| CompilerError::cache(destination, e))?;

        Ok(())
    }
}

pub(crate) fn validate_version(version: &str) -> Result<(), CompilerError> {
    let is_safe_file_name = !version.is_empty()
        && version != "."
        && !version.contains("..")
        && !version.contains(['/', '\\'])
        && !version.starts_with('.');
    if is_safe_file_name {
        Ok(())
    } else {
        Err(CompilerError::InvalidVersion(version.to_string()))
    }
}

#[cfg(unix)]
pub(crate) async fn make_executable(path: &Path) -> Result<(), CompilerError> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .map_err(|e| CompilerError::cache(path, e))
}

#[cfg(not(unix))]
pub(crate) async fn make_executable(_path: &Path) -> Result<(), CompilerError> {
    Ok(())
}

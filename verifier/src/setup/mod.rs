//! `verifier setup`: installs a resolc release into the compiler cache.
//!
//! Releases are resolved through the GitHub releases API. The binary is stored
//! under its release tag and copied to the default resolc name, which is what
//! metadata without an explicit tag compiles with.

use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::cli::SetupCmd;
use crate::core::compiler::cache::validate_version;
use crate::core::compiler::DEFAULT_RESOLC_BINARY;
use crate::error::VerifierResult;
use crate::types::params::SetupParams;

const RESOLC_ASSET_LINUX: &str = "resolc-x86_64-unknown-linux-musl";
const RESOLC_ASSET_MACOS: &str = "resolc-universal-apple-darwin";
const ARCHIVE_SUFFIX: &str = ".tar.gz";

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Failed to fetch release {release}: {source}")]
    ReleaseRequest {
        release: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Release lookup for {release} returned status {status}")]
    ReleaseStatus { release: String, status: u16 },

    #[error("Release {tag} has no asset named {asset}")]
    AssetNotFound { tag: String, asset: String },

    #[error("Invalid release tag {0}")]
    InvalidTag(String),

    #[error("No resolc build is published for {0}")]
    UnsupportedPlatform(&'static str),

    #[error("Failed to download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Download of {url} returned status {status}")]
    DownloadStatus { url: String, status: u16 },

    #[error("Failed to read archive {asset}: {source}")]
    Archive {
        asset: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive {0} does not contain a resolc binary")]
    BinaryNotInArchive(String),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("Extraction task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl SetupError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io { path: path.to_path_buf(), source }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

impl Release {
    /// The asset published for `base_name`, either the bare binary or its tarball.
    pub fn asset_for(&self, base_name: &str) -> Option<&ReleaseAsset> {
        let archive = format!("{}{}", base_name, ARCHIVE_SUFFIX);
        self.assets.iter().find(|asset| asset.name == base_name || asset.name == archive)
    }
}

/// Where an installed release ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledResolc {
    pub tag: String,
    /// `<cache_dir>/<tag>`
    pub path: PathBuf,
    /// `<cache_dir>/resolc`
    pub default_path: PathBuf,
}

/// Name of the release asset built for the running OS.
pub fn platform_asset_name() -> Result<&'static str, SetupError> {
    if cfg!(target_os = "macos") {
        Ok(RESOLC_ASSET_MACOS)
    } else if cfg!(target_os = "linux") {
        Ok(RESOLC_ASSET_LINUX)
    } else {
        Err(SetupError::UnsupportedPlatform(std::env::consts::OS))
    }
}

pub struct ResolcInstaller {
    http: reqwest::Client,
    releases_url: String,
    cache_dir: PathBuf,
}

impl ResolcInstaller {
    pub fn new(params: &SetupParams) -> Result<Self, SetupError> {
        // GitHub rejects API requests without a user agent.
        let http = reqwest::Client::builder()
            .user_agent(concat!("contract-verifier/", env!("CARGO_PKG_VERSION")))
            .timeout(params.http_timeout)
            .build()
            .map_err(SetupError::HttpClient)?;

        Ok(Self { http, releases_url: params.releases_url.clone(), cache_dir: params.cache_dir.clone() })
    }

    /// Looks up `tag`, or the latest release when `None`.
    pub async fn release(&self, tag: Option<&str>) -> Result<Release, SetupError> {
        let (release, url) = match tag {
            Some(tag) => (tag.to_string(), format!("{}/tags/{}", self.releases_url, tag)),
            None => ("latest".to_string(), format!("{}/latest", self.releases_url)),
        };
        debug!(url = %url, "Fetching resolc release");

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|source| SetupError::ReleaseRequest { release: release.clone(), source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SetupError::ReleaseStatus { release, status: status.as_u16() });
        }

        response.json::<Release>().await.map_err(|source| SetupError::ReleaseRequest { release, source })
    }

    #[instrument(skip(self), fields(cache_dir = %self.cache_dir.display()))]
    pub async fn install(&self, tag: Option<&str>) -> Result<InstalledResolc, SetupError> {
        let release = self.release(tag).await?;
        validate_version(&release.tag_name).map_err(|_| SetupError::InvalidTag(release.tag_name.clone()))?;

        let base_name = platform_asset_name()?;
        let asset = release
            .asset_for(base_name)
            .ok_or_else(|| SetupError::AssetNotFound { tag: release.tag_name.clone(), asset: base_name.to_string() })?;
        info!(tag = %release.tag_name, asset = %asset.name, "Downloading resolc");

        let payload = self.download(&asset.browser_download_url).await?;
        let binary = if asset.name.ends_with(ARCHIVE_SUFFIX) {
            let name = asset.name.clone();
            tokio::task::spawn_blocking(move || extract_binary(&payload, &name)).await??
        } else {
            payload
        };

        tokio::fs::create_dir_all(&self.cache_dir).await.map_err(|e| SetupError::io(&self.cache_dir, e))?;
        let path = self.cache_dir.join(&release.tag_name);
        let default_path = self.cache_dir.join(DEFAULT_RESOLC_BINARY);
        write_executable(&self.cache_dir, &path, &binary).await?;
        write_executable(&self.cache_dir, &default_path, &binary).await?;

        info!(tag = %release.tag_name, path = %path.display(), "resolc installed");
        Ok(InstalledResolc { tag: release.tag_name, path, default_path })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, SetupError> {
        let response =
            self.http.get(url).send().await.map_err(|source| SetupError::Download { url: url.to_string(), source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SetupError::DownloadStatus { url: url.to_string(), status: status.as_u16() });
        }

        let body = response.bytes().await.map_err(|source| SetupError::Download { url: url.to_string(), source })?;
        Ok(body.to_vec())
    }
}

/// Pulls the resolc executable out of a gzipped tarball.
pub fn extract_binary(archive: &[u8], asset: &str) -> Result<Vec<u8>, SetupError> {
    let archive_error = |source| SetupError::Archive { asset: asset.to_string(), source };

    let mut tarball = tar::Archive::new(GzDecoder::new(archive));
    for entry in tarball.entries().map_err(archive_error)? {
        let mut entry = entry.map_err(archive_error)?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let is_resolc = entry
            .path()
            .map_err(archive_error)?
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(DEFAULT_RESOLC_BINARY));
        if is_resolc {
            let mut binary = Vec::new();
            entry.read_to_end(&mut binary).map_err(archive_error)?;
            return Ok(binary);
        }
    }

    Err(SetupError::BinaryNotInArchive(asset.to_string()))
}

async fn write_executable(dir: &Path, destination: &Path, binary: &[u8]) -> Result<(), SetupError> {
    let file_name = destination.file_name().and_then(|name| name.to_str()).unwrap_or(DEFAULT_RESOLC_BINARY);
    let partial = dir.join(format!(".{}.partial", file_name));

    tokio::fs::write(&partial, binary).await.map_err(|e| SetupError::io(&partial, e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(&partial, std::fs::Permissions::from_mode(0o755))
            .await
            .map_err(|e| SetupError::io(&partial, e))?;
    }
    tokio::fs::rename(&partial, destination).await.map_err(|e| SetupError::io(destination, e))
}

pub async fn setup(setup_cmd: &SetupCmd) -> VerifierResult<()> {
    let params = SetupParams::from(setup_cmd.clone());
    let installer = ResolcInstaller::new(&params)?;

    let installed = installer.install(params.tag.as_deref()).await?;
    info!(
        tag = %installed.tag,
        path = %installed.path.display(),
        default_path = %installed.default_path.display(),
        "Setup completed"
    );
    Ok(())
}

//! `!update`: replace the running binary with the published one when their
//! SHA-256 checksums differ.
//!
//! The repository publishes two files next to each other:
//! `<repo_url>/checksum.sha256` (hex digest, optionally followed by a file
//! name as `sha256sum` prints it) and `<repo_url>/termai` (the binary).

use reqwest::Client;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Duration;
use termai_core::SelfUpdaterFeature;
use termai_error::{Error, ErrorKind, Result};
use tracing::{info, warn};

const CHECKSUM_FILE: &str = "checksum.sha256";
const BINARY_FILE: &str = "termai";

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// First token of a `sha256sum`-style line, lowercased
pub fn parse_checksum(text: &str) -> Option<String> {
    let digest = text.split_whitespace().next()?.to_lowercase();
    let valid = digest.len() == 64 && digest.chars().all(|c| c.is_ascii_hexdigit());
    valid.then_some(digest)
}

pub fn join_url(base: &str, file: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), file)
}

fn fetch_failed(url: &str, err: reqwest::Error) -> Error {
    Error::new(ErrorKind::IoFailed, format!("Failed to fetch update info: {}", err))
        .with_operation("update::fetch")
        .with_context("url", url)
        .temporary()
        .set_source(err)
}

/// Write `bytes` beside `target`, make it executable, then rename over it
pub fn install(target: &Path, bytes: &[u8]) -> Result<()> {
    let staged = target.with_extension("update");
    std::fs::write(&staged, bytes)
        .map_err(|e| Error::from(e).with_operation("update::install"))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&staged, std::fs::Permissions::from_mode(0o755))?;
    }

    std::fs::rename(&staged, target).map_err(|e| {
        let _ = std::fs::remove_file(&staged);
        Error::from(e)
            .with_operation("update::install")
            .with_context("target", target.display().to_string())
    })?;
    Ok(())
}

pub async fn run(feature: &SelfUpdaterFeature, timeout_secs: u64) -> Result<String> {
    if !feature.enabled {
        return Err(Error::feature_disabled("self_updater"));
    }
    if feature.has_placeholder_url() {
        return Err(Error::config_invalid(
            "Please configure features.self_updater.repo_url in ai_config.json",
        ));
    }

    let exe = std::env::current_exe()?;
    update_binary(&exe, &feature.repo_url, timeout_secs).await
}

/// Compare `exe` with the published checksum and swap it when they differ
pub async fn update_binary(exe: &Path, repo_url: &str, timeout_secs: u64) -> Result<String> {
    let current = sha256_hex(&std::fs::read(exe)?);

    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| termai_core::error::client_build_failed(e.to_string()).set_source(e))?;

    let checksum_url = join_url(repo_url, CHECKSUM_FILE);
    let published = client
        .get(&checksum_url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| fetch_failed(&checksum_url, e))?
        .text()
        .await
        .map_err(|e| fetch_failed(&checksum_url, e))?;
    let expected = parse_checksum(&published).ok_or_else(|| {
        Error::parse_failed("published checksum is not a SHA-256 hex digest")
            .with_context("url", checksum_url.clone())
    })?;

    if expected == current {
        return Ok("Already running latest version".to_string());
    }

    let binary_url = join_url(repo_url, BINARY_FILE);
    info!(url = %binary_url, "downloading update");
    let bytes = client
        .get(&binary_url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| fetch_failed(&binary_url, e))?
        .bytes()
        .await
        .map_err(|e| fetch_failed(&binary_url, e))?;

    let actual = sha256_hex(&bytes);
    if actual != expected {
        warn!(%expected, %actual, "downloaded binary does not match checksum");
        return Err(Error::new(
            ErrorKind::ChecksumMismatch,
            "Update failed: downloaded file does not match the published checksum",
        )
        .with_operation("update::verify")
        .with_context("expected", expected)
        .with_context("actual", actual));
    }

    install(exe, &bytes)?;
    info!(path = %exe.display(), "binary replaced");
    Ok("Update complete. Please restart.".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_parse_checksum() {
        let digest = "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD";
        assert_eq!(
            parse_checksum(&format!("{}  termai\n", digest)).as_deref(),
            Some("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
        assert_eq!(parse_checksum("not-a-digest"), None);
        assert_eq!(parse_checksum(""), None);
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("https://h/x/", "termai"), "https://h/x/termai");
        assert_eq!(join_url("https://h/x", "checksum.sha256"), "https://h/x/checksum.sha256");
    }

    #[test]
    fn test_install_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("termai");
        std::fs::write(&target, b"old").unwrap();

        install(&target, b"new").unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"new");
        assert!(!dir.path().join("termai.update").exists());
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&target).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[tokio::test]
    async fn test_refuses_when_disabled_or_placeholder() {
        let err = run(&SelfUpdaterFeature::default(), 5).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FeatureDisabled);

        let feature = SelfUpdaterFeature {
            enabled: true,
            ..Default::default()
        };
        let err = run(&feature, 5).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[tokio::test]
    async fn test_unreachable_repo_is_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("termai");
        std::fs::write(&exe, b"binary").unwrap();

        let err = update_binary(&exe, "http://127.0.0.1:9/releases", 2)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoFailed);
        assert!(err.message().starts_with("Failed to fetch update info"));
        assert_eq!(std::fs::read(&exe).unwrap(), b"binary");
    }
}

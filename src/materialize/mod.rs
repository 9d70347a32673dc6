//! Certificate directory materialization.
//!
//! # Responsibilities
//! - Replace every `*.crt` / `*.key` pair in the SSL directory with exactly
//!   the certificates bound in a snapshot
//! - Write or remove `dhparam.pem` to match the snapshot
//!
//! # Design Decisions
//! - Delete-then-write: stale pairs never survive an apply
//! - Keys are written 0600, certificates and DH params 0644
//! - A failure part way leaves the directory partially rebuilt; the next
//!   successful apply rewrites all of it
//! - Other entries (e.g. a `default/` fallback pair) are left alone

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::{Certificate, RouterConfig};

/// File stem of the platform certificate pair.
pub const PLATFORM_CERT_NAME: &str = "platform";

/// File name of the DH parameters.
pub const DHPARAM_FILE: &str = "dhparam.pem";

const CERT_MODE: u32 = 0o644;
const KEY_MODE: u32 = 0o600;

/// Errors raised while materializing TLS material.
#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("failed to list {}: {source}", .path.display())]
    List {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to remove {}: {source}", .path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Replace the directory's certificate pairs with those in `config`.
pub fn write_certs(config: &RouterConfig, ssl_dir: &Path) -> Result<(), MaterializeError> {
    fs::create_dir_all(ssl_dir).map_err(|source| MaterializeError::Write {
        path: ssl_dir.to_path_buf(),
        source,
    })?;

    for path in existing_pairs(ssl_dir)? {
        fs::remove_file(&path).map_err(|source| MaterializeError::Remove { path, source })?;
    }

    if let Some(platform) = &config.platform_certificate {
        write_pair(ssl_dir, PLATFORM_CERT_NAME, platform)?;
    }

    for app in &config.app_configs {
        for (domain, certificate) in &app.certificates {
            write_pair(ssl_dir, domain, certificate)?;
        }
    }

    tracing::debug!(path = %ssl_dir.display(), "Certificates written");
    Ok(())
}

/// Write `dhparam.pem` when the snapshot carries DH parameters, remove it otherwise.
pub fn write_dhparam(config: &RouterConfig, ssl_dir: &Path) -> Result<(), MaterializeError> {
    let path = ssl_dir.join(DHPARAM_FILE);

    if config.ssl.dh_param.is_empty() {
        return match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(MaterializeError::Remove { path, source }),
        };
    }

    write_file(&path, config.ssl.dh_param.as_bytes(), CERT_MODE)
}

fn existing_pairs(ssl_dir: &Path) -> Result<Vec<PathBuf>, MaterializeError> {
    let list_err = |source| MaterializeError::List {
        path: ssl_dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(ssl_dir).map_err(list_err)? {
        let entry = entry.map_err(list_err)?;
        let path = entry.path();
        let is_pair_file = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("crt") | Some("key")
        );
        if is_pair_file && entry.file_type().map_err(list_err)?.is_file() {
            paths.push(path);
        }
    }
    Ok(paths)
}

fn write_pair(
    ssl_dir: &Path,
    name: &str,
    certificate: &Certificate,
) -> Result<(), MaterializeError> {
    write_file(&ssl_dir.join(format!("{}.crt", name)), certificate.cert.as_bytes(), CERT_MODE)?;
    write_file(&ssl_dir.join(format!("{}.key", name)), certificate.key.as_bytes(), KEY_MODE)
}

fn write_file(path: &Path, contents: &[u8], mode: u32) -> Result<(), MaterializeError> {
    let write_err = |source| MaterializeError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut file = open_with_mode(path, mode).map_err(write_err)?;
    file.write_all(contents).map_err(write_err)?;

    // The creation mode only applies to new files.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(mode)).map_err(write_err)?;
    }

    Ok(())
}

/// Open `path` for writing, creating it with `mode` so key material is
/// never readable by others, not even briefly.
#[cfg(unix)]
fn open_with_mode(path: &Path, mode: u32) -> io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;

    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode)
        .open(path)
}

#[cfg(not(unix))]
fn open_with_mode(path: &Path, _mode: u32) -> io::Result<fs::File> {
    fs::File::create(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AppConfig;
    use std::collections::BTreeMap;

    fn snapshot() -> RouterConfig {
        let mut config = RouterConfig::default();
        config.platform_certificate = Some(Certificate::new("platform-cert", "platform-key"));

        let mut app = AppConfig::new(&config);
        app.name = "foo".to_string();
        app.domains = vec!["foo".to_string(), "foo.example.com".to_string()];
        app.certificates
            .insert("foo".to_string(), Certificate::new("platform-cert", "platform-key"));
        app.certificates
            .insert("foo.example.com".to_string(), Certificate::new("foo-cert", "foo-key"));
        config.app_configs.push(app);
        config
    }

    fn contents(dir: &Path) -> BTreeMap<String, Vec<u8>> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.is_file())
            .map(|p| (p.file_name().unwrap().to_string_lossy().into_owned(), fs::read(&p).unwrap()))
            .collect()
    }

    #[test]
    fn test_writes_one_pair_per_certificate() {
        let dir = tempfile::tempdir().unwrap();
        write_certs(&snapshot(), dir.path()).unwrap();

        let files = contents(dir.path());
        let names: Vec<_> = files.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            vec![
                "foo.crt",
                "foo.example.com.crt",
                "foo.example.com.key",
                "foo.key",
                "platform.crt",
                "platform.key",
            ]
        );
        assert_eq!(files["foo.example.com.crt"], b"foo-cert");
        assert_eq!(files["foo.example.com.key"], b"foo-key");
        assert_eq!(files["platform.key"], b"platform-key");
    }

    #[test]
    fn test_removes_stale_pairs_and_keeps_other_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("old.example.com.crt"), "stale").unwrap();
        fs::write(dir.path().join("old.example.com.key"), "stale").unwrap();
        fs::create_dir(dir.path().join("default")).unwrap();
        fs::write(dir.path().join("default").join("default.crt"), "fallback").unwrap();
        fs::write(dir.path().join("README"), "keep").unwrap();

        write_certs(&RouterConfig::default(), dir.path()).unwrap();

        let files = contents(dir.path());
        assert_eq!(files.keys().map(String::as_str).collect::<Vec<_>>(), vec!["README"]);
        assert!(dir.path().join("default").join("default.crt").exists());
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let config = snapshot();

        write_certs(&config, dir.path()).unwrap();
        write_dhparam(&config, dir.path()).unwrap();
        let first = contents(dir.path());

        write_certs(&config, dir.path()).unwrap();
        write_dhparam(&config, dir.path()).unwrap();
        let second = contents(dir.path());

        assert_eq!(first, second);
    }

    #[cfg(unix)]
    #[test]
    fn test_key_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        write_certs(&snapshot(), dir.path()).unwrap();

        let mode =
            |name: &str| fs::metadata(dir.path().join(name)).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode("platform.key"), 0o600);
        assert_eq!(mode("platform.crt"), 0o644);
    }

    #[cfg(unix)]
    #[test]
    fn test_rewritten_key_loses_wider_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("www.foo.io.key");
        fs::write(&path, "old key material that is longer").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        write_file(&path, b"new key", KEY_MODE).unwrap();

        let meta = fs::metadata(&path).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);
        assert_eq!(fs::read_to_string(&path).unwrap(), "new key");
    }

    #[test]
    fn test_dhparam_written_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = RouterConfig::default();
        config.ssl.dh_param = "bizbaz".to_string();

        write_dhparam(&config, dir.path()).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join(DHPARAM_FILE)).unwrap(), "bizbaz");

        config.ssl.dh_param.clear();
        write_dhparam(&config, dir.path()).unwrap();
        assert!(!dir.path().join(DHPARAM_FILE).exists());

        // Removing an absent file is fine.
        write_dhparam(&config, dir.path()).unwrap();
    }
}

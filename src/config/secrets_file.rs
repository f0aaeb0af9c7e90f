//! Gitignored `KEY: value` secrets file.
//!
//! One entry per line, keys upper-case with digits and underscores. Lines
//! that do not match are skipped. A leading byte-order mark is tolerated.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ConfigError;

/// File name looked up in the working directory when no override is set.
pub const DEFAULT_SECRETS_FILE: &str = "MEUS_SEGREDOS.txt";

static ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z0-9_]+):\s*(.+)$").expect("secrets entry pattern is valid")
});

/// Parse secrets file contents into ordered `(key, value)` pairs.
pub fn parse_secrets(raw: &str) -> Vec<(String, String)> {
    let raw = raw.strip_prefix('\u{FEFF}').unwrap_or(raw);
    raw.lines()
        .filter_map(|line| {
            let caps = ENTRY.captures(line.trim_end_matches('\r'))?;
            Some((caps[1].to_string(), caps[2].trim().to_string()))
        })
        .collect()
}

/// Read and parse a secrets file. A missing file yields no entries.
pub fn load_secrets_file(path: &Path) -> Result<Vec<(String, String)>, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(raw) => {
            let entries = parse_secrets(&raw);
            tracing::debug!(
                path = %path.display(),
                entries = entries.len(),
                "Loaded secrets file"
            );
            Ok(entries)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(ConfigError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Resolve the secrets file path: explicit override, else the default in `cwd`.
pub fn secrets_file_path(override_path: Option<&str>, cwd: &Path) -> PathBuf {
    match override_path {
        Some(p) => PathBuf::from(p),
        None => cwd.join(DEFAULT_SECRETS_FILE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_skips_noise_and_trims() {
        let raw = "\u{FEFF}APPSMITH_URL: https://apps.example.com \r\n# comment\nlower: nope\nAPPSMITH_EMAIL:ops@example.com\n\nAPPSMITH_PASSWORD:   s3cr3t: with colon\n";
        assert_eq!(
            parse_secrets(raw),
            vec![
                (
                    "APPSMITH_URL".to_string(),
                    "https://apps.example.com".to_string()
                ),
                ("APPSMITH_EMAIL".to_string(), "ops@example.com".to_string()),
                (
                    "APPSMITH_PASSWORD".to_string(),
                    "s3cr3t: with colon".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let entries = load_secrets_file(&dir.path().join("absent.txt")).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_SECRETS_FILE);
        std::fs::write(&path, "APPSMITH_TIMEOUT_MS: 1500\n").unwrap();

        let entries = load_secrets_file(&path).unwrap();
        assert_eq!(
            entries,
            vec![("APPSMITH_TIMEOUT_MS".to_string(), "1500".to_string())]
        );
        assert_eq!(secrets_file_path(None, dir.path()), path);
        assert_eq!(
            secrets_file_path(Some("/etc/x.txt"), dir.path()),
            PathBuf::from("/etc/x.txt")
        );
    }
}

//! Object keys and the line-delimited key list they are read from.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Serialize;

use crate::error::{ConfigError, KeySourceError};

/// A non-empty object key. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Key(String);

impl Key {
    /// Build a key, rejecting the empty string. `position` is only used for the error.
    pub fn new(raw: impl Into<String>, position: usize) -> Result<Self, ConfigError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(ConfigError::EmptyKey { position });
        }
        Ok(Self(raw))
    }

    /// Validate a whole list up front. Fails on the first empty entry so that
    /// nothing is fetched for a list that is known to be bad.
    pub fn parse_all<I, T>(raw: I) -> Result<Vec<Key>, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        raw.into_iter()
            .enumerate()
            .map(|(i, k)| Key::new(k, i + 1))
            .collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.0
    }
}

/// Read one key per line. `\n` and `\r\n` endings are both accepted; any
/// empty line is an error carrying its line number.
pub fn read_keys<R: BufRead>(reader: R) -> Result<Vec<Key>, KeySourceError> {
    let lines = reader
        .lines()
        .collect::<Result<Vec<_>, _>>()
        .map_err(KeySourceError::Read)?;
    Ok(Key::parse_all(lines)?)
}

/// Load and validate the key list at `path`.
pub fn load_keys(path: &Path) -> Result<Vec<Key>, KeySourceError> {
    let file = File::open(path).map_err(|source| KeySourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let keys = read_keys(BufReader::new(file)).map_err(|e| match e {
        KeySourceError::Read(source) => KeySourceError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })?;
    tracing::debug!(path = %path.display(), count = keys.len(), "loaded key list");
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn empty_key_rejected_with_position() {
        let err = Key::parse_all(["a", "", "c"]).unwrap_err();
        assert_eq!(err, ConfigError::EmptyKey { position: 2 });
    }

    #[test]
    fn keys_keep_inner_whitespace() {
        let keys = Key::parse_all(["dir/with space.txt", " lead"]).unwrap();
        assert_eq!(keys[0].as_str(), "dir/with space.txt");
        assert_eq!(keys[1].as_str(), " lead");
    }

    #[test]
    fn read_keys_handles_crlf() {
        let keys = read_keys(Cursor::new("a\r\nb\r\nc\n")).unwrap();
        let names: Vec<&str> = keys.iter().map(Key::as_str).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn read_keys_blank_line_is_rejected() {
        let err = read_keys(Cursor::new("a\n\nb\n")).unwrap_err();
        assert!(matches!(
            err,
            KeySourceError::Invalid(ConfigError::EmptyKey { position: 2 })
        ));
    }

    #[test]
    fn load_keys_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "logs/2024/01.gz").unwrap();
        writeln!(f, "logs/2024/02.gz").unwrap();
        let keys = load_keys(f.path()).unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[1].as_str(), "logs/2024/02.gz");
    }

    #[test]
    fn load_keys_reports_line_of_blank_entry() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "a\nb\n\n").unwrap();
        match load_keys(f.path()) {
            Err(KeySourceError::Invalid(ConfigError::EmptyKey { position })) => {
                assert_eq!(position, 3)
            }
            other => panic!("expected empty key error, got {other:?}"),
        }
    }

    #[test]
    fn load_keys_missing_file() {
        let err = load_keys(Path::new("/nonexistent/objmeta/keys.txt")).unwrap_err();
        assert!(matches!(err, KeySourceError::Io { .. }));
    }
}

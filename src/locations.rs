//! Resource location resolution
//!
//! This module handles resolution of schema locations (file paths, URLs,
//! in-memory sources) including `schemaLocation` hints relative to the
//! document that carries them.

use crate::error::Result;
use std::path::{Path, PathBuf};
use url::Url;

/// Resource location - can be a URL, file path, or in-memory source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// File system path
    Path(PathBuf),
    /// URL (http, https, ftp, etc.)
    Url(Url),
    /// In-memory schema text
    String(String),
}

impl Location {
    /// Create a location from a string (auto-detect type)
    pub fn from_str(s: &str) -> Result<Self> {
        if let Ok(url) = Url::parse(s) {
            if url.scheme() == "file" {
                if let Ok(path) = url.to_file_path() {
                    return Ok(Location::Path(path));
                }
            } else if url.scheme().len() > 1 {
                // Single-letter schemes are Windows drive letters
                return Ok(Location::Url(url));
            }
        }

        Ok(Location::Path(PathBuf::from(s)))
    }

    /// Location for a file path
    pub fn path(path: impl AsRef<Path>) -> Self {
        Location::Path(path.as_ref().to_path_buf())
    }

    /// Resolve a `schemaLocation` hint against this location.
    ///
    /// Returns `None` for in-memory sources, which have no base to
    /// resolve relative hints against.
    pub fn join(&self, hint: &str) -> Option<Location> {
        if let Ok(url) = Url::parse(hint) {
            if url.scheme().len() > 1 {
                return Location::from_str(hint).ok();
            }
        }

        match self {
            Location::Path(path) => {
                let hinted = Path::new(hint);
                if hinted.is_absolute() {
                    return Some(Location::Path(hinted.to_path_buf()));
                }
                let base = path.parent().unwrap_or_else(|| Path::new(""));
                Some(Location::Path(normalize(&base.join(hinted))))
            }
            Location::Url(url) => url.join(hint).ok().map(Location::Url),
            Location::String(_) => None,
        }
    }

    /// Get the location as a string
    pub fn as_str(&self) -> String {
        match self {
            Location::Path(p) => p.to_string_lossy().to_string(),
            Location::Url(u) => u.to_string(),
            Location::String(_) => "<string>".to_string(),
        }
    }

    /// Check if this is a remote location (URL)
    pub fn is_remote(&self) -> bool {
        matches!(self, Location::Url(_))
    }

    /// Check if this is a local file
    pub fn is_file(&self) -> bool {
        matches!(self, Location::Path(_))
    }
}

/// Collapse `.` and `..` components so the same file reached through
/// different relative hints is loaded once.
fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_from_url() {
        let loc = Location::from_str("http://example.com/schema.xsd").unwrap();
        assert!(matches!(loc, Location::Url(_)));
        assert!(loc.is_remote());
    }

    #[test]
    fn test_location_from_file_url() {
        let loc = Location::from_str("file:///tmp/schema.xsd").unwrap();
        assert_eq!(loc, Location::Path(PathBuf::from("/tmp/schema.xsd")));
    }

    #[test]
    fn test_location_from_path() {
        let loc = Location::from_str("/tmp/schema.xsd").unwrap();
        assert!(matches!(loc, Location::Path(_)));
        assert!(loc.is_file());
    }

    #[test]
    fn test_join_relative_hint() {
        let loc = Location::path("/data/xsd/Entity/DI.xsd");
        assert_eq!(
            loc.join("../common/Common.xsd"),
            Some(Location::path("/data/xsd/common/Common.xsd"))
        );
        assert_eq!(
            loc.join("./UDIDI.xsd"),
            Some(Location::path("/data/xsd/Entity/UDIDI.xsd"))
        );
    }

    #[test]
    fn test_join_from_string_source() {
        let loc = Location::String("<xs:schema/>".to_string());
        assert_eq!(loc.join("other.xsd"), None);
        assert_eq!(loc.as_str(), "<string>");
    }
}

use std::convert::Infallible;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::RenderError;

/// Where an asset's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    File(PathBuf),
    /// `http://` or `https://` URL.
    Http(String),
}

impl AssetSource {
    /// Retrieves the raw bytes. Blocking; no retry, no cache.
    pub fn fetch(&self) -> Result<Vec<u8>, RenderError> {
        match self {
            AssetSource::File(path) => {
                std::fs::read(path).map_err(|e| RenderError::asset(self.to_string(), e))
            }
            AssetSource::Http(url) => {
                let response = reqwest::blocking::get(url)
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| RenderError::asset(self.to_string(), e))?;
                let bytes = response
                    .bytes()
                    .map_err(|e| RenderError::asset(self.to_string(), e))?;
                Ok(bytes.to_vec())
            }
        }
    }
}

impl FromStr for AssetSource {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Ok(AssetSource::Http(s.to_owned()))
        } else {
            Ok(AssetSource::File(PathBuf::from(s)))
        }
    }
}

impl fmt::Display for AssetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetSource::File(path) => write!(f, "{}", path.display()),
            AssetSource::Http(url) => f.write_str(url),
        }
    }
}

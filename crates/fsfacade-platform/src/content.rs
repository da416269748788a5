use std::fmt;
use std::ops::Deref;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("json decode failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("yaml decode failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("content is not valid utf-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Bytes read from a file, with decode helpers
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Content(Bytes);

impl Content {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self(data.into())
    }

    /// Decode the content as JSON into `T`
    pub fn decode_json<T: DeserializeOwned>(&self) -> Result<T, ContentError> {
        Ok(serde_json::from_slice(&self.0)?)
    }

    /// Decode the content as YAML into `T`
    pub fn decode_yaml<T: DeserializeOwned>(&self) -> Result<T, ContentError> {
        Ok(serde_yaml::from_slice(&self.0)?)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_str(&self) -> Result<&str, ContentError> {
        Ok(std::str::from_utf8(&self.0)?)
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl Deref for Content {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Content {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Content {
    fn from(data: Vec<u8>) -> Self {
        Self(Bytes::from(data))
    }
}

impl From<&'static [u8]> for Content {
    fn from(data: &'static [u8]) -> Self {
        Self(Bytes::from_static(data))
    }
}

impl From<&str> for Content {
    fn from(data: &str) -> Self {
        Self(Bytes::copy_from_slice(data.as_bytes()))
    }
}

impl From<String> for Content {
    fn from(data: String) -> Self {
        Self(Bytes::from(data))
    }
}

impl From<Bytes> for Content {
    fn from(data: Bytes) -> Self {
        Self(data)
    }
}

/// Lossy UTF-8 view
impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Content").field(&self.0).finish()
    }
}

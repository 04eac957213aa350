//! Small static pages served by agents (robots.txt, sitemaps).

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageType {
    Basic,
    BasicHost,
    #[serde(other)]
    Unknown,
}

impl PageType {
    pub fn is_host_scoped(self) -> bool {
        matches!(self, PageType::BasicHost)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentType {
    TextPlain,
    Xml,
    /// Unrecognised wire value; served as `text/plain`.
    #[serde(other)]
    Unknown,
}

impl ContentType {
    /// HTTP `Content-Type` for this page.
    pub fn mime(self) -> &'static str {
        match self {
            ContentType::Xml => "application/xml",
            ContentType::TextPlain | ContentType::Unknown => "text/plain",
        }
    }
}

/// A static page. `content` travels base64-encoded in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(rename = "type")]
    pub kind: PageType,
    pub path: String,
    #[serde(with = "content_base64")]
    pub content: Vec<u8>,
    pub content_type: ContentType,
    /// Derived from `content`; recomputed by the manager on every write.
    #[serde(default)]
    pub content_size: u64,
}

impl Page {
    pub fn new(
        kind: PageType,
        path: impl Into<String>,
        content: impl Into<Vec<u8>>,
        content_type: ContentType,
    ) -> Self {
        let content = content.into();
        Self {
            kind,
            path: path.into(),
            content_size: content.len() as u64,
            content,
            content_type,
        }
    }

    /// Recompute `content_size` from `content`.
    pub fn refresh_content_size(&mut self) {
        self.content_size = self.content.len() as u64;
    }
}

impl Entity for Page {
    const KIND: &'static str = "page";

    fn unique_key(&self) -> &str {
        &self.path
    }

    fn content_size(&self) -> u64 {
        self.content.len() as u64
    }
}

mod content_base64 {
    use super::*;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded.as_bytes()).map_err(serde::de::Error::custom)
    }
}

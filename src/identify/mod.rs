//! Book identification collaborators.
//!
//! An [`Identifier`] reads `{isbn, title, author}` from a photo and looks up
//! richer metadata for a free-text query. Both calls are best effort:
//! `Ok(None)` means nothing usable was found, `Err` means the call itself
//! failed and callers treat it as a connectivity problem.

mod command;
mod openai;

use std::sync::Arc;

use anyhow::Context as _;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::catalog::BookPatch;
use crate::cli::{IdentifyArgs, IdentifyEngine};

pub use command::CommandIdentifier;
pub use openai::OpenAiIdentifier;

/// Fields read directly off a cover, spine or barcode.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanResult {
    #[serde(default)]
    pub isbn: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
}

impl ScanResult {
    pub fn is_blank(&self) -> bool {
        self.isbn.trim().is_empty() && self.title.trim().is_empty() && self.author.trim().is_empty()
    }

    /// ISBN when one was read, otherwise "title author".
    pub fn enrichment_query(&self) -> String {
        if self.isbn.trim().is_empty() {
            format!("{} {}", self.title, self.author)
        } else {
            self.isbn.clone()
        }
    }
}

/// Queries of two characters or fewer are not worth a lookup.
pub fn is_meaningful_query(query: &str) -> bool {
    query.trim().chars().count() > 2
}

#[async_trait]
pub trait Identifier: Send + Sync {
    async fn identify_from_image(&self, image: &[u8]) -> anyhow::Result<Option<ScanResult>>;
    async fn fetch_metadata(&self, query: &str) -> anyhow::Result<Option<BookPatch>>;
}

/// Finds nothing. Used when no engine is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopIdentifier;

#[async_trait]
impl Identifier for NoopIdentifier {
    async fn identify_from_image(&self, _image: &[u8]) -> anyhow::Result<Option<ScanResult>> {
        Ok(None)
    }

    async fn fetch_metadata(&self, _query: &str) -> anyhow::Result<Option<BookPatch>> {
        Ok(None)
    }
}

pub fn from_args(args: &IdentifyArgs) -> anyhow::Result<Arc<dyn Identifier>> {
    let identifier: Arc<dyn Identifier> = match args.engine {
        IdentifyEngine::Noop => Arc::new(NoopIdentifier),
        IdentifyEngine::Command => {
            let Some(program) = args.command.as_deref() else {
                anyhow::bail!("missing --command (required when --engine=command)");
            };
            Arc::new(CommandIdentifier::new(program, args.command_args.clone()))
        }
        IdentifyEngine::Openai => {
            let api_key = std::env::var("OPENAI_API_KEY")
                .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY is not set"))?;
            Arc::new(
                OpenAiIdentifier::new(args, api_key).context("build OpenAI identifier")?,
            )
        }
    };
    tracing::debug!(engine = ?args.engine, "identifier ready");
    Ok(identifier)
}

/// MIME type from the image's magic bytes; JPEG when unrecognised.
pub fn sniff_image_mime(image: &[u8]) -> &'static str {
    if image.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else if image.starts_with(b"GIF8") {
        "image/gif"
    } else if image.len() >= 12 && &image[0..4] == b"RIFF" && &image[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "image/jpeg"
    }
}

/// Keeps only non-blank strings.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enrichment_query_prefers_isbn() {
        let scan = ScanResult {
            isbn: "9789750719387".to_owned(),
            title: "Sefiller".to_owned(),
            author: "Victor Hugo".to_owned(),
        };
        assert_eq!(scan.enrichment_query(), "9789750719387");

        let scan = ScanResult {
            isbn: String::new(),
            ..scan
        };
        assert_eq!(scan.enrichment_query(), "Sefiller Victor Hugo");
    }

    #[test]
    fn short_queries_are_not_meaningful() {
        assert!(!is_meaningful_query(" "));
        assert!(!is_meaningful_query("Al "));
        assert!(!is_meaningful_query("  İz "));
        assert!(is_meaningful_query("Ilk"));
    }

    #[test]
    fn sniff_detects_common_formats() {
        assert_eq!(sniff_image_mime(&[0x89, b'P', b'N', b'G', 0x0d]), "image/png");
        assert_eq!(sniff_image_mime(b"GIF89a"), "image/gif");
        assert_eq!(sniff_image_mime(b"RIFF\0\0\0\0WEBPVP8 "), "image/webp");
        assert_eq!(sniff_image_mime(&[0xff, 0xd8, 0xff]), "image/jpeg");
        assert_eq!(sniff_image_mime(&[]), "image/jpeg");
    }

    #[test]
    fn blank_scan_result() {
        assert!(ScanResult::default().is_blank());
        assert!(
            !ScanResult {
                author: "Hugo".to_owned(),
                ..ScanResult::default()
            }
            .is_blank()
        );
    }
}

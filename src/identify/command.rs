use std::process::Stdio;

use anyhow::Context as _;
use async_trait::async_trait;
use base64::Engine as _;
use serde::Deserialize;
use tokio::io::AsyncWriteExt as _;
use tokio::process::Command;

use crate::catalog::BookPatch;
use crate::identify::{Identifier, ScanResult, non_blank, sniff_image_mime};

/// Runs an external program per call.
///
/// The request goes to stdin as one JSON object
/// (`{"kind":"identify","mime_type":..,"image_base64":..}` or
/// `{"kind":"metadata","query":..}`) and `SHELFSCAN_REQUEST_KIND` carries the
/// kind. Stdout must be a JSON object, or empty / `null` for "not found".
#[derive(Debug, Clone)]
pub struct CommandIdentifier {
    program: String,
    args: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetadataOutput {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    publisher: Option<String>,
    #[serde(default)]
    year: Option<String>,
    #[serde(default)]
    genre: Option<String>,
    #[serde(default)]
    isbn: Option<String>,
    #[serde(default, alias = "cover_description")]
    cover_description: Option<String>,
}

impl CommandIdentifier {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    async fn call(&self, kind: &str, request: serde_json::Value) -> anyhow::Result<Option<String>> {
        tracing::info!(engine = "command", command = %self.program, kind, "identifier call");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .env("SHELFSCAN_REQUEST_KIND", kind)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawn identifier command: {}", self.program))?;

        let payload = serde_json::to_vec(&request).context("serialize identifier request")?;
        {
            let mut stdin = child.stdin.take().context("open identifier stdin")?;
            stdin
                .write_all(&payload)
                .await
                .context("write identifier stdin")?;
        }

        let output = child
            .wait_with_output()
            .await
            .context("wait identifier process")?;
        if !output.status.success() {
            anyhow::bail!(
                "identifier command failed: {} ({})",
                self.program,
                output.status
            );
        }

        let stdout =
            String::from_utf8(output.stdout).context("identifier stdout is not valid UTF-8")?;
        let stdout = stdout.trim();
        if stdout.is_empty() || stdout == "null" {
            return Ok(None);
        }
        Ok(Some(stdout.to_owned()))
    }
}

#[async_trait]
impl Identifier for CommandIdentifier {
    async fn identify_from_image(&self, image: &[u8]) -> anyhow::Result<Option<ScanResult>> {
        let request = serde_json::json!({
            "kind": "identify",
            "mime_type": sniff_image_mime(image),
            "image_base64": base64::engine::general_purpose::STANDARD.encode(image),
        });
        let Some(raw) = self.call("identify", request).await? else {
            return Ok(None);
        };
        let scan: ScanResult =
            serde_json::from_str(&raw).context("parse identifier output as scan result")?;
        Ok((!scan.is_blank()).then_some(scan))
    }

    async fn fetch_metadata(&self, query: &str) -> anyhow::Result<Option<BookPatch>> {
        let request = serde_json::json!({
            "kind": "metadata",
            "query": query,
        });
        let Some(raw) = self.call("metadata", request).await? else {
            return Ok(None);
        };
        let output: MetadataOutput =
            serde_json::from_str(&raw).context("parse identifier output as metadata")?;
        let patch = BookPatch {
            title: non_blank(output.title),
            author: non_blank(output.author),
            publisher: non_blank(output.publisher),
            year: non_blank(output.year),
            genre: non_blank(output.genre),
            isbn: non_blank(output.isbn),
            cover_description: non_blank(output.cover_description),
            shelf_id: None,
        };
        Ok((!patch.is_empty()).then_some(patch))
    }
}

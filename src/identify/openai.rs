use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use base64::Engine as _;
use serde::Deserialize;

use crate::catalog::BookPatch;
use crate::cli::IdentifyArgs;
use crate::identify::{Identifier, ScanResult, non_blank, sniff_image_mime};
use crate::openai::{self, StructuredRequest};

const IDENTIFY_INSTRUCTIONS: &str = "You read book photos. If there is a barcode, extract the \
ISBN. If there is a book cover or spine, read the title and author. Use an empty string for \
anything that is not visible.";

const METADATA_INSTRUCTIONS: &str = "You are a bibliographic assistant. Find detailed metadata \
for the book matching the query. If the query is an ISBN, look it up; if it is a title, find \
the best match. Use empty strings for unknown fields.";

#[derive(Debug, Clone)]
pub struct OpenAiIdentifier {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    metadata_model: String,
    language: String,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct MetadataOutput {
    title: String,
    author: String,
    publisher: String,
    year: String,
    genre: String,
    isbn: String,
    cover_description: String,
}

impl OpenAiIdentifier {
    pub fn new(args: &IdentifyArgs, api_key: String) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            endpoint: openai::responses_endpoint(&args.openai_base_url),
            api_key,
            model: args.openai_model.clone(),
            metadata_model: args
                .openai_metadata_model
                .clone()
                .unwrap_or_else(|| args.openai_model.clone()),
            language: args.language.clone(),
            temperature: args.openai_temperature,
        })
    }
}

#[async_trait]
impl Identifier for OpenAiIdentifier {
    async fn identify_from_image(&self, image: &[u8]) -> anyhow::Result<Option<ScanResult>> {
        tracing::info!(engine = "openai", model = %self.model, bytes = image.len(), "identify image");

        let data_url = format!(
            "data:{};base64,{}",
            sniff_image_mime(image),
            base64::engine::general_purpose::STANDARD.encode(image)
        );
        let input = serde_json::json!([
            {
                "role": "user",
                "content": [
                    {
                        "type": "input_text",
                        "text": "Identify the book in this image. Return a JSON object."
                    },
                    { "type": "input_image", "image_url": data_url }
                ]
            }
        ]);

        let value = openai::responses_json(
            &self.client,
            &self.endpoint,
            &self.api_key,
            StructuredRequest {
                model: &self.model,
                instructions: IDENTIFY_INSTRUCTIONS,
                input,
                schema_name: "book_scan",
                schema: string_object_schema(&["isbn", "title", "author"]),
                temperature: self.temperature,
            },
        )
        .await
        .context("identify image via OpenAI")?;

        if value.is_null() {
            return Ok(None);
        }
        let scan: ScanResult = serde_json::from_value(value).context("decode scan result")?;
        Ok((!scan.is_blank()).then_some(scan))
    }

    async fn fetch_metadata(&self, query: &str) -> anyhow::Result<Option<BookPatch>> {
        tracing::info!(engine = "openai", model = %self.metadata_model, query, "fetch metadata");

        let input = format!(
            "Answer in {language}. Describe the cover in five words for a placeholder.\n\
BEGIN_QUERY\n{query}\nEND_QUERY",
            language = self.language,
        );

        let value = openai::responses_json(
            &self.client,
            &self.endpoint,
            &self.api_key,
            StructuredRequest {
                model: &self.metadata_model,
                instructions: METADATA_INSTRUCTIONS,
                input: serde_json::Value::String(input),
                schema_name: "book_metadata",
                schema: string_object_schema(&[
                    "title",
                    "author",
                    "publisher",
                    "year",
                    "genre",
                    "isbn",
                    "cover_description",
                ]),
                temperature: self.temperature,
            },
        )
        .await
        .context("fetch metadata via OpenAI")?;

        if value.is_null() {
            return Ok(None);
        }
        let output: MetadataOutput =
            serde_json::from_value(value).context("decode metadata result")?;
        let patch = BookPatch {
            title: non_blank(Some(output.title)),
            author: non_blank(Some(output.author)),
            publisher: non_blank(Some(output.publisher)),
            year: non_blank(Some(output.year)),
            genre: non_blank(Some(output.genre)),
            isbn: non_blank(Some(output.isbn)),
            cover_description: non_blank(Some(output.cover_description)),
            shelf_id: None,
        };
        Ok((!patch.is_empty()).then_some(patch))
    }
}

/// Strict-mode schema: every listed property is a required string.
fn string_object_schema(fields: &[&str]) -> serde_json::Value {
    let properties: serde_json::Map<String, serde_json::Value> = fields
        .iter()
        .map(|field| ((*field).to_owned(), serde_json::json!({ "type": "string" })))
        .collect();
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": fields,
        "additionalProperties": false,
    })
}

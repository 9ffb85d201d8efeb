use anyhow::Context as _;

pub fn responses_endpoint(base_url: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    format!("{base_url}/responses")
}

/// One Responses API request whose output must follow `schema` (strict JSON schema).
#[derive(Debug, Clone)]
pub struct StructuredRequest<'a> {
    pub model: &'a str,
    pub instructions: &'a str,
    pub input: serde_json::Value,
    pub schema_name: &'a str,
    pub schema: serde_json::Value,
    pub temperature: f32,
}

pub async fn responses_json(
    client: &reqwest::Client,
    endpoint: &str,
    api_key: &str,
    request: StructuredRequest<'_>,
) -> anyhow::Result<serde_json::Value> {
    let mut body = serde_json::json!({
        "model": request.model,
        "instructions": request.instructions,
        "input": request.input,
        "text": {
            "format": {
                "type": "json_schema",
                "name": request.schema_name,
                "strict": true,
                "schema": request.schema,
            }
        },
        "store": false,
    });

    // GPT-5 models reject sampling params like `temperature`.
    if !request.model.starts_with("gpt-5")
        && let Some(obj) = body.as_object_mut()
    {
        obj.insert(
            "temperature".to_owned(),
            serde_json::json!(request.temperature),
        );
    }

    let response = client
        .post(endpoint)
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await
        .with_context(|| format!("POST {endpoint}"))?;

    let status = response.status();
    let raw = response.text().await.context("read OpenAI response body")?;
    if !status.is_success() {
        let message = parse_error_message(&raw).unwrap_or_else(|| raw.clone());
        anyhow::bail!("OpenAI API error ({status}): {message}");
    }

    let value: serde_json::Value = serde_json::from_str(&raw).context("parse OpenAI response")?;
    let text = extract_output_text(&value).context("extract output text")?;
    serde_json::from_str(text.trim()).context("parse structured output as json")
}

fn parse_error_message(raw_json: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw_json).ok()?;
    value["error"]["message"].as_str().map(str::to_owned)
}

/// Concatenates every `output_text` part of every message item.
fn extract_output_text(value: &serde_json::Value) -> anyhow::Result<String> {
    let output = value["output"]
        .as_array()
        .context("response has no `output` array")?;

    let text: String = output
        .iter()
        .filter(|item| item["type"] == "message")
        .filter_map(|item| item["content"].as_array())
        .flatten()
        .filter(|part| part["type"] == "output_text")
        .filter_map(|part| part["text"].as_str())
        .collect();

    if text.trim().is_empty() {
        anyhow::bail!("structured output is empty");
    }
    Ok(text)
}

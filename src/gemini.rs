//! Model client for the classification and extraction calls.
//!
//! [`ModelClient`] is the seam between the scanning pipeline and the hosted
//! model. [`GeminiClient`] implements it against the Gemini
//! `generateContent` REST endpoint with a schema-constrained JSON response.
//!
//! # Failure policy
//!
//! Each request is sent exactly once. Non-2xx responses, network errors and
//! unparseable bodies are returned to the caller unchanged; the batch loop
//! records the first error per item and moves on.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::ModelConfig;
use crate::image::ImageInput;
use crate::models::{DocType, DocumentData};
use crate::schema::{extraction_schema, identification_schema};

const IDENTIFY_PROMPT: &str = "Classifique o tipo deste documento. Responda apenas com o JSON.";

/// A multimodal model that answers with JSON matching a response schema.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Sends one image and one text prompt, returning the parsed JSON answer.
    async fn generate_json(&self, image: &ImageInput, prompt: &str, schema: &Value)
        -> Result<Value>;
}

/// Classification call: returns the coarse document type.
pub async fn identify_document_type(
    client: &dyn ModelClient,
    image: &ImageInput,
) -> Result<DocType> {
    let answer = client
        .generate_json(image, IDENTIFY_PROMPT, &identification_schema())
        .await
        .context("failed to identify the document type")?;

    let label = answer
        .get("tipoDocumento")
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow!("classification answer has no tipoDocumento: {}", answer))
        .context("failed to identify the document type")?;

    let doc_type = DocType::from_label(label);
    tracing::debug!(file = %image.file_name, label, %doc_type, "document classified");
    Ok(doc_type)
}

/// Extraction call keyed by the classification result.
///
/// [`DocType::Desconhecido`] has no schema and fails without contacting the
/// model.
pub async fn extract_document_data(
    client: &dyn ModelClient,
    image: &ImageInput,
    doc_type: DocType,
) -> Result<DocumentData> {
    let schema = match extraction_schema(doc_type) {
        Some(schema) => schema,
        None => bail!("no extraction schema defined for type {}", doc_type),
    };

    let prompt = format!(
        "O documento é um(a) {}. Extraia as informações solicitadas no schema JSON.",
        doc_type
    );

    let answer = client
        .generate_json(image, &prompt, &schema)
        .await
        .with_context(|| format!("failed to extract data for {}", doc_type))?;

    DocumentData::from_extraction(doc_type, answer)
        .with_context(|| format!("failed to extract data for {}", doc_type))
}

// ============ Gemini ============

/// Client for `POST {base_url}/v1beta/models/{model}:generateContent`.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// Builds a client, reading the API key from the environment variable
    /// named by `config.api_key_env`.
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| anyhow!("{} environment variable not set", config.api_key_env))?;
        Self::new(config, api_key)
    }

    pub fn new(config: &ModelConfig, api_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.name.clone(),
            api_key: api_key.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate_json(
        &self,
        image: &ImageInput,
        prompt: &str,
        schema: &Value,
    ) -> Result<Value> {
        let body = build_request(image, prompt, schema);

        tracing::debug!(
            model = %self.model,
            file = %image.file_name,
            bytes = image.data.len(),
            "calling generateContent"
        );

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Gemini API error {}: {}", status, body_text);
        }

        let json: Value = response.json().await?;
        let text = response_text(&json)?;
        serde_json::from_str(text.trim())
            .with_context(|| format!("model answer is not valid JSON: {}", text))
    }
}

/// Request body: the image as inline data followed by the prompt, with the
/// response constrained to JSON matching `schema`.
fn build_request(image: &ImageInput, prompt: &str, schema: &Value) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [
                {
                    "inline_data": {
                        "mime_type": image.mime_type,
                        "data": image.to_base64(),
                    }
                },
                { "text": prompt },
            ]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": schema,
        }
    })
}

/// Concatenates the text parts of the first candidate.
fn response_text(json: &Value) -> Result<String> {
    let parts = json
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array());

    let text: String = parts
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        if let Some(reason) = json
            .get("promptFeedback")
            .and_then(|f| f.get("blockReason"))
            .and_then(|r| r.as_str())
        {
            bail!("Gemini blocked the request: {}", reason);
        }
        bail!("Invalid Gemini response: no candidate text");
    }

    Ok(text)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Fake model answering by prompt prefix and recording every call.
    pub(crate) struct ScriptedModel {
        pub classification: HashMap<String, Result<Value, String>>,
        pub extraction: HashMap<String, Result<Value, String>>,
        pub calls: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedModel {
        pub(crate) fn new() -> Self {
            Self {
                classification: HashMap::new(),
                extraction: HashMap::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn classify(mut self, file: &str, answer: Result<Value, String>) -> Self {
            self.classification.insert(file.to_string(), answer);
            self
        }

        pub(crate) fn extract(mut self, file: &str, answer: Result<Value, String>) -> Self {
            self.extraction.insert(file.to_string(), answer);
            self
        }

        pub(crate) fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelClient for ScriptedModel {
        async fn generate_json(
            &self,
            image: &ImageInput,
            prompt: &str,
            _schema: &Value,
        ) -> Result<Value> {
            let kind = if prompt == IDENTIFY_PROMPT {
                "classify"
            } else {
                "extract"
            };
            self.calls
                .lock()
                .unwrap()
                .push((image.file_name.clone(), kind.to_string()));
            let table = if kind == "classify" {
                &self.classification
            } else {
                &self.extraction
            };
            match table.get(&image.file_name) {
                Some(Ok(v)) => Ok(v.clone()),
                Some(Err(e)) => Err(anyhow!(e.clone())),
                None => Err(anyhow!("no scripted answer for {}", image.file_name)),
            }
        }
    }

    fn image(name: &str) -> ImageInput {
        ImageInput::new(name, "image/jpeg", vec![0xFF, 0xD8, 0xFF])
    }

    #[test]
    fn request_carries_inline_image_and_schema() {
        let schema = identification_schema();
        let body = build_request(&image("a.jpg"), IDENTIFY_PROMPT, &schema);
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(parts[0]["inline_data"]["data"], "/9j/");
        assert_eq!(parts[1]["text"], IDENTIFY_PROMPT);
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(body["generationConfig"]["responseSchema"], schema);
    }

    #[test]
    fn response_text_joins_parts() {
        let json = json!({
            "candidates": [{"content": {"parts": [{"text": "{\"tipo"}, {"text": "Documento\": \"RG\"}"}]}}]
        });
        assert_eq!(
            response_text(&json).unwrap(),
            "{\"tipoDocumento\": \"RG\"}"
        );
    }

    #[test]
    fn response_text_reports_block_reason() {
        let json = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        let err = response_text(&json).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));

        let err = response_text(&json!({"candidates": []})).unwrap_err();
        assert!(err.to_string().contains("no candidate text"));
    }

    #[tokio::test]
    async fn identify_maps_label() {
        let model = ScriptedModel::new().classify("a.jpg", Ok(json!({"tipoDocumento": "cnh"})));
        let t = identify_document_type(&model, &image("a.jpg")).await.unwrap();
        assert_eq!(t, DocType::Cnh);
    }

    #[tokio::test]
    async fn identify_wraps_errors() {
        let model = ScriptedModel::new().classify("a.jpg", Err("boom".to_string()));
        let err = identify_document_type(&model, &image("a.jpg"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "failed to identify the document type");
        assert!(format!("{:#}", err).contains("boom"));
    }

    #[tokio::test]
    async fn extract_unknown_type_skips_model() {
        let model = ScriptedModel::new();
        let err = extract_document_data(&model, &image("a.jpg"), DocType::Desconhecido)
            .await
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("no extraction schema defined for type DESCONHECIDO"));
        assert!(model.calls().is_empty());
    }

    #[tokio::test]
    async fn extract_builds_typed_record() {
        let model = ScriptedModel::new().extract(
            "conta.png",
            Ok(json!({"destinatario": "João", "cep": "01001-000"})),
        );
        let data = extract_document_data(&model, &image("conta.png"), DocType::ComprovanteEndereco)
            .await
            .unwrap();
        assert_eq!(data.doc_type(), DocType::ComprovanteEndereco);
        assert_eq!(data.get("cep"), Some("01001-000"));
    }

    #[test]
    fn missing_api_key_names_variable() {
        let config = ModelConfig {
            api_key_env: "ORIUS_TEST_KEY_THAT_IS_NOT_SET".to_string(),
            ..ModelConfig::default()
        };
        let err = GeminiClient::from_config(&config).err().unwrap();
        assert!(err.to_string().contains("ORIUS_TEST_KEY_THAT_IS_NOT_SET"));
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        let config = ModelConfig {
            base_url: "http://127.0.0.1:9999/".to_string(),
            ..ModelConfig::default()
        };
        let client = GeminiClient::new(&config, "k").unwrap();
        assert_eq!(
            client.endpoint(),
            "http://127.0.0.1:9999/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use haggle_core::config::{VisionConfig, VisionProvider};
use haggle_core::domain::category::Category;

use crate::types::{clamp_categories, ImagePayload, ItemSuggestion, SourceLink};

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("image analysis is disabled")]
    Disabled,
    #[error("vision transport failure: {0}")]
    Transport(String),
    #[error("vision response was malformed: {0}")]
    MalformedResponse(String),
    #[error("vision configuration problem: {0}")]
    Configuration(String),
}

/// The opaque image-analysis collaborator. A failed suggestion is never
/// fatal to anything: callers fall back to manual entry.
#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    async fn suggest(&self, image: &ImagePayload) -> Result<ItemSuggestion, VisionError>;
}

/// Analyzer used when no provider is configured. Every call reports
/// [`VisionError::Disabled`] so forms drop straight to manual entry.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledAnalyzer;

#[async_trait]
impl ImageAnalyzer for DisabledAnalyzer {
    async fn suggest(&self, _image: &ImagePayload) -> Result<ItemSuggestion, VisionError> {
        Err(VisionError::Disabled)
    }
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    model: &'a str,
    mime_type: &'a str,
    data: &'a str,
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    text: String,
    #[serde(default)]
    sources: Vec<SourceLink>,
}

#[derive(Debug, Deserialize)]
struct RawSuggestion {
    title: String,
    description: String,
    #[serde(default)]
    categories: Vec<String>,
}

pub struct HttpVisionClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    model: String,
    max_retries: u32,
}

impl HttpVisionClient {
    pub fn from_config(config: &VisionConfig) -> Result<Self, VisionError> {
        let base_url = match (config.provider, config.base_url.as_deref()) {
            (VisionProvider::Disabled, _) => {
                return Err(VisionError::Configuration(
                    "vision provider is disabled; use DisabledAnalyzer".to_string(),
                ));
            }
            (_, Some(url)) => url.trim_end_matches('/').to_string(),
            (VisionProvider::Gemini, None) => {
                "https://generativelanguage.googleapis.com".to_string()
            }
            (VisionProvider::OpenAi, None) => "https://api.openai.com".to_string(),
        };

        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| VisionError::Configuration("vision.api_key is not set".to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| VisionError::Transport(error.to_string()))?;

        Ok(Self {
            http,
            base_url,
            api_key,
            model: config.model.clone(),
            max_retries: config.max_retries,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/analyze", self.base_url)
    }

    async fn call_once(&self, image: &ImagePayload) -> Result<AnalyzeResponse, VisionError> {
        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose_secret())
            .json(&AnalyzeRequest {
                model: &self.model,
                mime_type: &image.mime_type,
                data: &image.base64_data,
                prompt: suggestion_prompt(),
            })
            .send()
            .await
            .map_err(|error| VisionError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VisionError::Transport(format!(
                "analysis endpoint returned {status}"
            )));
        }

        response
            .json::<AnalyzeResponse>()
            .await
            .map_err(|error| VisionError::MalformedResponse(error.to_string()))
    }
}

#[async_trait]
impl ImageAnalyzer for HttpVisionClient {
    async fn suggest(&self, image: &ImagePayload) -> Result<ItemSuggestion, VisionError> {
        let mut last_error = VisionError::Transport("no attempt was made".to_string());
        for _attempt in 0..=self.max_retries {
            match self.call_once(image).await {
                Ok(response) => return parse_suggestion(&response.text, response.sources),
                Err(error @ VisionError::Transport(_)) => last_error = error,
                Err(error) => return Err(error),
            }
        }
        Err(last_error)
    }
}

/// The instruction sent alongside the image. The model must answer with a
/// bare JSON object; the category list is pinned to the marketplace
/// taxonomy so suggestions always land on real categories.
fn suggestion_prompt() -> String {
    let taxonomy = Category::ALL
        .iter()
        .map(|category| format!("\"{category}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Identify the object in this image. The user wants a replacement part or a \
         similar item. Respond ONLY with a JSON object containing \"title\", \
         \"description\", and \"categories\". Keep the title concise and make the \
         description a technical description a vendor can quote from. \"categories\" \
         is an array of up to three choices from this list: {taxonomy}. Do not wrap \
         the JSON in markdown fences or add any other text."
    )
}

/// Models wrap JSON in markdown fences often enough that tolerating it is
/// table stakes.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let without_prefix = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_prefix.strip_suffix("```").unwrap_or(without_prefix).trim()
}

fn parse_suggestion(
    text: &str,
    sources: Vec<SourceLink>,
) -> Result<ItemSuggestion, VisionError> {
    let raw: RawSuggestion = serde_json::from_str(strip_code_fences(text))
        .map_err(|error| VisionError::MalformedResponse(error.to_string()))?;

    if raw.title.trim().is_empty() {
        return Err(VisionError::MalformedResponse("suggestion title is empty".to_string()));
    }

    // unknown labels are dropped rather than failing the whole suggestion
    let categories = clamp_categories(
        raw.categories.iter().filter_map(|label| label.parse::<Category>().ok()).collect(),
    );

    Ok(ItemSuggestion { title: raw.title, description: raw.description, categories, sources })
}

#[cfg(test)]
mod tests {
    use haggle_core::config::{VisionConfig, VisionProvider};
    use haggle_core::domain::category::Category;

    use super::{
        parse_suggestion, strip_code_fences, DisabledAnalyzer, HttpVisionClient, ImageAnalyzer,
        VisionError,
    };
    use crate::types::{ImagePayload, SourceLink};

    const PLAIN: &str = r#"{"title":"Brake caliper","description":"Front-left caliper for a 2018 Civic.","categories":["Auto Parts","Hardware"]}"#;

    #[test]
    fn fenced_and_bare_payloads_both_parse() {
        let fenced = format!("```json\n{PLAIN}\n```");
        let bare_fence = format!("```\n{PLAIN}\n```");

        for payload in [PLAIN.to_string(), fenced, bare_fence] {
            let suggestion = parse_suggestion(&payload, Vec::new()).expect("parses");
            assert_eq!(suggestion.title, "Brake caliper");
            assert_eq!(
                suggestion.categories,
                vec![Category::AutoParts, Category::Hardware]
            );
        }
    }

    #[test]
    fn fence_stripping_leaves_inner_json_intact() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn unknown_category_labels_are_dropped_not_fatal() {
        let payload = r#"{"title":"Widget","description":"d","categories":["Mechanics","Hardware"]}"#;
        let suggestion = parse_suggestion(payload, Vec::new()).expect("parses");
        assert_eq!(suggestion.categories, vec![Category::Hardware]);
    }

    #[test]
    fn all_unknown_categories_fall_back_to_general() {
        let payload = r#"{"title":"Widget","description":"d","categories":["Mechanics"]}"#;
        let suggestion = parse_suggestion(payload, Vec::new()).expect("parses");
        assert_eq!(suggestion.categories, vec![Category::General]);
    }

    #[test]
    fn sources_ride_along_unchanged() {
        let sources = vec![SourceLink {
            uri: "https://example.com/part".to_string(),
            title: "Part listing".to_string(),
        }];
        let suggestion = parse_suggestion(PLAIN, sources.clone()).expect("parses");
        assert_eq!(suggestion.sources, sources);
    }

    #[test]
    fn junk_payloads_report_malformed_response() {
        let error = parse_suggestion("the part looks like a caliper", Vec::new())
            .expect_err("not json");
        assert!(matches!(error, VisionError::MalformedResponse(_)));

        let empty_title = r#"{"title":"  ","description":"d","categories":[]}"#;
        let error = parse_suggestion(empty_title, Vec::new()).expect_err("empty title");
        assert!(matches!(error, VisionError::MalformedResponse(_)));
    }

    #[test]
    fn client_construction_requires_an_enabled_provider_and_key() {
        let disabled = VisionConfig {
            provider: VisionProvider::Disabled,
            api_key: None,
            base_url: None,
            model: "gemini-2.5-flash".to_string(),
            timeout_secs: 30,
            max_retries: 2,
        };
        assert!(matches!(
            HttpVisionClient::from_config(&disabled),
            Err(VisionError::Configuration(_))
        ));

        let keyless = VisionConfig { provider: VisionProvider::Gemini, ..disabled };
        assert!(matches!(
            HttpVisionClient::from_config(&keyless),
            Err(VisionError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn disabled_analyzer_degrades_to_manual_entry() {
        let analyzer = DisabledAnalyzer;
        let error = analyzer
            .suggest(&ImagePayload::new("image/jpeg", "aGVsbG8="))
            .await
            .expect_err("disabled");
        assert!(matches!(error, VisionError::Disabled));
    }
}

use crate::domain::models::catalog::ProductCandidate;
use crate::domain::ports::ProductScorer;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tracing::{error, info, instrument, warn};
use std::time::Duration;
use tokio::time::sleep;

const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 500;

pub struct GeminiScorer {
    client: Client,
    api_key: String,
}

impl GeminiScorer {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key,
        }
    }

    async fn send_request_with_retry(&self, url: &str, payload: &Value) -> Result<f64, AppError> {
        let mut retries = 0;
        let mut backoff = INITIAL_BACKOFF_MS;

        loop {
            let res = self.client.post(url)
                .header("x-goog-api-key", &self.api_key)
                .header("Content-Type", "application/json")
                .json(payload)
                .send()
                .await;

            match res {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let body: Value = response.json().await.map_err(|e| {
                            error!("Failed to parse scorer response JSON: {:?}", e);
                            AppError::Internal
                        })?;
                        return self.extract_score(body);
                    } else if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                        if retries >= MAX_RETRIES {
                            error!("Scorer API failed after {} retries. Status: {}", retries, status);
                            let text = response.text().await.unwrap_or_default();
                            return Err(AppError::InternalWithMsg(format!("Scorer Error: {} - {}", status, text)));
                        }
                        warn!("Scorer API transient error {}. Retrying in {}ms...", status, backoff);
                    } else {
                        let text = response.text().await.unwrap_or_default();
                        error!("Scorer API Terminal Error {}: {}", status, text);
                        return Err(AppError::Validation(format!("Scoring request rejected: {} - {}", status, text)));
                    }
                },
                Err(e) => {
                    if retries >= MAX_RETRIES {
                        error!("Scorer Network Error after {} retries: {:?}", retries, e);
                        return Err(AppError::InternalWithMsg(format!("Scorer Network Error: {}", e)));
                    }
                    warn!("Scorer Network Error. Retrying in {}ms... {:?}", backoff, e);
                }
            }

            sleep(Duration::from_millis(backoff)).await;
            retries += 1;
            backoff *= 2;
        }
    }

    fn extract_score(&self, body: Value) -> Result<f64, AppError> {
        let text = body.get("candidates")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .and_then(|first| first.get("content"))
            .and_then(|content| content.get("parts"))
            .and_then(|p| p.as_array())
            .and_then(|parts| parts.first())
            .and_then(|part| part.get("text"))
            .and_then(|t| t.as_str());

        if let Some(text) = text {
            let cleaned = text.trim()
                .trim_start_matches("```json")
                .trim_start_matches("```")
                .trim_end_matches("```")
                .trim();

            if let Ok(parsed) = serde_json::from_str::<Value>(cleaned) {
                if let Some(confidence) = parsed.get("confidence").and_then(|c| c.as_f64()) {
                    return Ok(confidence.clamp(0.0, 1.0));
                }
            }
        }

        error!("Invalid or unexpected response structure from scorer: {:?}", body);
        Err(AppError::InternalWithMsg("Scorer response missing confidence".to_string()))
    }
}

#[async_trait]
impl ProductScorer for GeminiScorer {
    #[instrument(skip(self, candidate), fields(product = %candidate.name))]
    async fn score(&self, candidate: &ProductCandidate) -> Result<f64, AppError> {
        let url = "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent";

        let prompt = format!(
            "New product submission:\n- Name: {}\n- Brand: {}\n- Category: {}\n- Description: {}\n\n\
             Rate your confidence that this is a real, well-formed retail product that can be added \
             to a shared catalog as-is (coherent name, plausible brand and category, not a duplicate \
             spelled differently, not junk input).",
            candidate.name,
            candidate.brand,
            candidate.category,
            candidate.description.as_deref().unwrap_or("None"),
        );

        let payload = json!({
            "contents": [{
                "parts": [{"text": prompt}]
            }],
            "systemInstruction": {
                "parts": [{"text": "You are a retail product catalog reviewer. Respond with JSON only: {\"confidence\": <number between 0.0 and 1.0>}"}]
            },
            "generationConfig": {
                "temperature": 0.3,
                "maxOutputTokens": 100,
                "responseMimeType": "application/json"
            }
        });

        info!("Requesting confidence score for product submission...");
        let score = self.send_request_with_retry(url, &payload).await?;
        info!("Scored submission at {:.2}", score);
        Ok(score)
    }
}

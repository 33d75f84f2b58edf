use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::app_config::EngineConfig;
use crate::engines::Classifier;
use crate::errors::TaggingError;

/// HTTP client for a zero-shot classification server
#[derive(Debug)]
pub struct ZeroShotClassifier {
    /// Base URL of the classification server
    base_url: String,
    /// Model name to request
    model: String,
    /// HTTP client for making requests
    client: Client,
}

/// Classification request for the server
#[derive(Debug, Serialize, Deserialize)]
struct ClassifyRequest {
    /// Model name
    model: String,
    /// Text to classify
    text: String,
    /// Candidate labels
    labels: Vec<String>,
    /// Score each label independently
    multi_label: bool,
}

/// Classification response from the server
#[derive(Debug, Serialize, Deserialize)]
struct ClassifyResponse {
    /// Labels ranked by score
    labels: Vec<String>,
    /// Scores parallel to `labels`
    scores: Vec<f64>,
}

impl ZeroShotClassifier {
    /// Create a new engine client from config
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl Classifier for ZeroShotClassifier {
    async fn classify(
        &self,
        text: &str,
        labels: &[String],
    ) -> Result<Vec<(String, f64)>, TaggingError> {
        if text.trim().is_empty() {
            return Err(TaggingError::EmptyInput);
        }

        let url = format!("{}/classify", self.base_url);
        debug!("Classifying {} chars against {} labels", text.len(), labels.len());

        let request = ClassifyRequest {
            model: self.model.clone(),
            text: text.to_string(),
            labels: labels.to_vec(),
            multi_label: true,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| TaggingError::EngineFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            return Err(TaggingError::EngineFailed(format!(
                "Classification server error ({}): {}",
                status, body
            )));
        }

        let parsed: ClassifyResponse = response
            .json()
            .await
            .map_err(|e| TaggingError::EngineFailed(format!("Invalid response: {}", e)))?;

        if parsed.labels.len() != parsed.scores.len() {
            return Err(TaggingError::EngineFailed(format!(
                "Mismatched labels ({}) and scores ({})",
                parsed.labels.len(),
                parsed.scores.len()
            )));
        }

        let mut ranked: Vec<(String, f64)> =
            parsed.labels.into_iter().zip(parsed.scores).collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        Ok(ranked)
    }
}

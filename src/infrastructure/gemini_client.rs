use crate::infrastructure::error::AnalysisError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

const GENERATE_CONTENT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent";
const API_KEY_HEADER: &str = "x-goog-api-key";

const SYSTEM_INSTRUCTION: &str = "You are an academic task-management assistant. \
Transform the student's end-of-day brain dump into a prioritized to-do list. \
Extract every actionable item, add review tasks for topics covered today and \
preparation tasks for topics announced for tomorrow, break large tasks into \
concrete sub-tasks, and give each task a short due-date description such as \
\"Tonight, Aug 27\", \"Tomorrow, Aug 28\" or \"Friday, Aug 29\". Respond with \
a JSON array only.";

/// One task record as returned by the language service, before local
/// identifiers and state flags are attached.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RawTask {
    pub task_name: String,
    pub subject: String,
    pub due_date: String,
    pub priority: u8,
}

#[async_trait]
pub trait GenerativeClient: Send + Sync {
    async fn generate_tasks(&self, user_input: &str) -> Result<Vec<RawTask>, AnalysisError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestGeminiClient {
    client: Client,
    api_key: String,
}

impl ReqwestGeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
        }
    }

    fn generate_content_endpoint() -> Result<Url, AnalysisError> {
        Url::parse(GENERATE_CONTENT_ENDPOINT)
            .map_err(|error| AnalysisError::Service(format!("invalid generative api url: {error}")))
    }

    fn request_body(user_input: &str) -> serde_json::Value {
        serde_json::json!({
            "systemInstruction": {
                "parts": [{ "text": SYSTEM_INSTRUCTION }]
            },
            "contents": [{
                "parts": [{ "text": user_input }]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "taskName": { "type": "STRING" },
                            "subject": { "type": "STRING" },
                            "dueDate": { "type": "STRING" },
                            "priority": { "type": "INTEGER" },
                        },
                        "required": ["taskName", "subject", "dueDate", "priority"],
                    },
                },
            },
        })
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

fn classify_http_failure(status: reqwest::StatusCode, body: &str) -> AnalysisError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return AnalysisError::Quota;
    }
    let message = if body.trim().is_empty() {
        format!("generative api error: http {}", status.as_u16())
    } else {
        format!("generative api error: http {}; body={body}", status.as_u16())
    };
    AnalysisError::Service(message)
}

fn decode_generate_content_body(body: &str) -> Result<Vec<RawTask>, AnalysisError> {
    let parsed: GenerateContentResponse = serde_json::from_str(body).map_err(|error| {
        AnalysisError::SchemaMismatch(format!("invalid generate content payload: {error}"))
    })?;

    let text = parsed
        .candidates
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .find_map(|part| part.text)
        .ok_or_else(|| {
            AnalysisError::SchemaMismatch("response did not include candidate text".to_string())
        })?;

    serde_json::from_str(text.trim())
        .map_err(|error| AnalysisError::SchemaMismatch(format!("invalid task array: {error}")))
}

#[async_trait]
impl GenerativeClient for ReqwestGeminiClient {
    async fn generate_tasks(&self, user_input: &str) -> Result<Vec<RawTask>, AnalysisError> {
        let endpoint = Self::generate_content_endpoint()?;
        let response = self
            .client
            .post(endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&Self::request_body(user_input))
            .send()
            .await
            .map_err(|error| {
                AnalysisError::Network(format!("request to language service failed: {error}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            AnalysisError::Network(format!("failed reading language service response: {error}"))
        })?;

        if !status.is_success() {
            return Err(classify_http_failure(status, &body));
        }

        decode_generate_content_body(&body)
    }
}

//! [`HttpClassifier`]: sentiment classification over an OpenAI-compatible
//! chat-completions API.

use rapport_core::{
  classifier::SentimentClassifier,
  keywords::detect_cues,
  sentiment::{Classification, ContextMessage, Intensity, MessageCues, Sentiment, Speaker},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{Error, Result};

const SYSTEM_PROMPT: &str = "\
You judge the emotional tone a user expresses towards a companion character.
Reply with one JSON object and nothing else:
{\"sentiment\": \"positive\" | \"neutral\" | \"negative\",
 \"intensity\": integer 1-10,
 \"mood\": short free-text label or null,
 \"playful\": bool, \"vulnerable\": bool, \"apologetic\": bool, \"kind\": bool}
Judge only the final user message; earlier lines are context.";

// ─── Configuration ───────────────────────────────────────────────────────────

/// Connection settings for a hosted classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpClassifierConfig {
  /// API base URL, e.g. `https://api.openai.com/v1`. `/chat/completions` is
  /// appended.
  pub endpoint:      String,
  /// Sent as a bearer token when present.
  #[serde(default)]
  pub api_key:       Option<String>,
  #[serde(default = "default_model")]
  pub model:         String,
  /// How many trailing context lines are forwarded with each request.
  #[serde(default = "default_context_lines")]
  pub context_lines: usize,
}

fn default_model() -> String { "gpt-4o-mini".to_owned() }

fn default_context_lines() -> usize { 6 }

// ─── Classifier ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct HttpClassifier {
  client: reqwest::Client,
  url:    String,
  config: HttpClassifierConfig,
}

impl HttpClassifier {
  pub fn new(config: HttpClassifierConfig) -> Self {
    let url = format!("{}/chat/completions", config.endpoint.trim_end_matches('/'));
    Self { client: reqwest::Client::new(), url, config }
  }

  /// The JSON body posted for one classification.
  pub fn request_body(&self, message: &str, recent: &[ContextMessage]) -> Value {
    let skip = recent.len().saturating_sub(self.config.context_lines);
    let transcript: Vec<String> = recent[skip..]
      .iter()
      .map(|line| {
        let who = match line.speaker {
          Speaker::User => "user",
          Speaker::Character => "character",
        };
        format!("{who}: {}", line.text)
      })
      .collect();

    let prompt = if transcript.is_empty() {
      format!("Message to classify:\n{message}")
    } else {
      format!(
        "Recent conversation:\n{}\n\nMessage to classify:\n{message}",
        transcript.join("\n")
      )
    };

    json!({
      "model": self.config.model,
      "temperature": 0,
      "response_format": { "type": "json_object" },
      "messages": [
        { "role": "system", "content": SYSTEM_PROMPT },
        { "role": "user", "content": prompt },
      ],
    })
  }
}

impl SentimentClassifier for HttpClassifier {
  type Error = Error;

  async fn classify<'a>(
    &'a self,
    message: &'a str,
    recent: &'a [ContextMessage],
  ) -> Result<Classification> {
    let body = self.request_body(message, recent);
    let mut request = self.client.post(&self.url).json(&body);
    if let Some(key) = &self.config.api_key {
      request = request.bearer_auth(key);
    }

    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
      return Err(Error::Status { status: status.as_u16(), body: text });
    }

    // Lexical cues the model missed still count.
    let mut classification = parse_completion(&text)?;
    classification.cues = classification.cues.union(detect_cues(&message.to_lowercase()));
    tracing::debug!(
      sentiment = ?classification.sentiment,
      intensity = classification.intensity.get(),
      "message classified"
    );
    Ok(classification)
  }
}

// ─── Response parsing ────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ChatCompletion {
  choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
  message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
  content: Option<String>,
}

/// The object the model is asked to produce.
#[derive(Deserialize)]
struct Verdict {
  sentiment:  String,
  intensity:  f64,
  #[serde(default)]
  mood:       Option<String>,
  #[serde(default)]
  playful:    bool,
  #[serde(default)]
  vulnerable: bool,
  #[serde(default)]
  apologetic: bool,
  #[serde(default)]
  kind:       bool,
}

/// Extract the verdict from a raw `/chat/completions` response body.
pub fn parse_completion(body: &str) -> Result<Classification> {
  let completion: ChatCompletion = serde_json::from_str(body)?;
  let content = completion
    .choices
    .into_iter()
    .next()
    .and_then(|c| c.message.content)
    .ok_or_else(|| Error::Parse("response has no message content".into()))?;
  parse_verdict(&content)
}

/// Parse the model's JSON verdict. Tolerates a Markdown code fence around the
/// object and any casing of the sentiment label.
pub fn parse_verdict(content: &str) -> Result<Classification> {
  let trimmed = content.trim();
  let unfenced = trimmed
    .strip_prefix("```json")
    .or_else(|| trimmed.strip_prefix("```"))
    .and_then(|s| s.strip_suffix("```"))
    .unwrap_or(trimmed);

  let verdict: Verdict = serde_json::from_str(unfenced.trim())?;

  let sentiment: Sentiment = verdict
    .sentiment
    .trim()
    .to_ascii_lowercase()
    .parse()
    .map_err(|_| Error::Parse(format!("unknown sentiment {:?}", verdict.sentiment)))?;

  if !verdict.intensity.is_finite() {
    return Err(Error::Parse(format!("intensity {} is not a number", verdict.intensity)));
  }
  let intensity = Intensity::new(verdict.intensity.round().clamp(1.0, 10.0) as u8);

  Ok(Classification {
    sentiment,
    intensity,
    mood: verdict.mood.map(|m| m.trim().to_owned()).filter(|m| !m.is_empty()),
    cues: MessageCues {
      playful:    verdict.playful,
      vulnerable: verdict.vulnerable,
      apologetic: verdict.apologetic,
      kind:       verdict.kind,
    },
  })
}

#[cfg(test)]
mod tests {
  use axum::{http::StatusCode, routing::post, Json, Router};

  use super::*;

  fn config(endpoint: &str) -> HttpClassifierConfig {
    HttpClassifierConfig {
      endpoint:      endpoint.to_owned(),
      api_key:       Some("test-key".into()),
      model:         default_model(),
      context_lines: 2,
    }
  }

  fn completion(content: &str) -> Value {
    json!({ "choices": [ { "message": { "role": "assistant", "content": content } } ] })
  }

  async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    format!("http://{addr}/v1/")
  }

  // ── Parsing ───────────────────────────────────────────────────────────────

  #[test]
  fn verdict_with_all_fields() {
    let c = parse_verdict(
      r#"{"sentiment":"negative","intensity":8,"mood":" frustrated ",
          "playful":false,"vulnerable":true,"apologetic":false,"kind":false}"#,
    )
    .unwrap();
    assert_eq!(c.sentiment, Sentiment::Negative);
    assert_eq!(c.intensity.get(), 8);
    assert_eq!(c.mood.as_deref(), Some("frustrated"));
    assert!(c.cues.vulnerable && !c.cues.playful);
  }

  #[test]
  fn verdict_tolerates_fence_case_and_missing_cues() {
    let c = parse_verdict("```json\n{\"sentiment\":\"Positive\",\"intensity\":6.6}\n```").unwrap();
    assert_eq!(c.sentiment, Sentiment::Positive);
    assert_eq!(c.intensity.get(), 7);
    assert_eq!(c.mood, None);
    assert_eq!(c.cues, MessageCues::default());
  }

  #[test]
  fn out_of_range_intensity_is_clamped() {
    let high = parse_verdict(r#"{"sentiment":"positive","intensity":42}"#).unwrap();
    let low = parse_verdict(r#"{"sentiment":"negative","intensity":-3}"#).unwrap();
    assert_eq!(high.intensity, Intensity::MAX);
    assert_eq!(low.intensity, Intensity::MIN);
  }

  #[test]
  fn unknown_sentiment_is_rejected() {
    let err = parse_verdict(r#"{"sentiment":"ecstatic","intensity":5}"#).unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
  }

  #[test]
  fn empty_choices_are_rejected() {
    let err = parse_completion(r#"{"choices":[]}"#).unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
  }

  #[test]
  fn request_body_keeps_only_recent_context() {
    let classifier = HttpClassifier::new(config("http://localhost/v1"));
    assert_eq!(classifier.url, "http://localhost/v1/chat/completions");

    let recent = [
      ContextMessage { speaker: Speaker::User, text: "first".into() },
      ContextMessage { speaker: Speaker::Character, text: "second".into() },
      ContextMessage { speaker: Speaker::User, text: "third".into() },
    ];
    let body = classifier.request_body("hello again", &recent);
    let prompt = body["messages"][1]["content"].as_str().unwrap();
    assert!(!prompt.contains("first"));
    assert!(prompt.contains("character: second"));
    assert!(prompt.contains("user: third"));
    assert!(prompt.ends_with("hello again"));
    assert_eq!(body["response_format"]["type"], "json_object");
  }

  // ── Over the wire ─────────────────────────────────────────────────────────

  #[tokio::test]
  async fn classifies_against_a_live_endpoint() {
    let router = Router::new().route(
      "/v1/chat/completions",
      post(|Json(body): Json<Value>| async move {
        assert_eq!(body["model"], "gpt-4o-mini");
        Json(completion(
          r#"{"sentiment":"positive","intensity":5,"apologetic":true,"kind":true}"#,
        ))
      }),
    );
    let classifier = HttpClassifier::new(config(&serve(router).await));

    let c = classifier.classify("sorry about earlier, haha", &[]).await.unwrap();
    assert_eq!(c.sentiment, Sentiment::Positive);
    assert!(c.cues.apologetic && c.cues.kind);
    // Not in the verdict, picked up from the text.
    assert!(c.cues.playful);
  }

  #[tokio::test]
  async fn http_errors_are_typed() {
    let router = Router::new().route(
      "/v1/chat/completions",
      post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
    );
    let classifier = HttpClassifier::new(config(&serve(router).await));

    let err = classifier.classify("hi", &[]).await.unwrap_err();
    assert!(matches!(err, Error::Status { status: 429, ref body } if body == "slow down"));
  }
}

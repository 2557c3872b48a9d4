//! Classification client: prompt construction, bounded retry, and the
//! mapping of every failure path onto a defined verdict.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use oratio_core::{Debate, LlmVerdict};

use crate::parse;
use crate::transport::{RawReply, Transport};

/// Keywords included in the prompt, at most.
const MAX_PROMPT_KEYWORDS: usize = 10;
/// Characters of speech excerpt included in the prompt, at most.
pub const DEFAULT_EXCERPT_CAP: usize = 8_000;
/// Retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 5;
/// Base backoff, doubled per retry: 6, 12, 24, 48, 96 seconds.
const BACKOFF_BASE_SECS: u64 = 6;

const PROMPT_TEMPLATE: &str = "You are analyzing UK parliamentary House of Commons debates to determine if they relate to Brexit.

**Debate Information:**
- Topic: {topic}
- Date: {date}
- Keywords found: {keywords}

**Speech excerpts (first 5 speeches):**
{excerpt}

**Task:**
Analyze whether this debate has a significant relation to Brexit (the UK's withdrawal from the European Union).

Consider:
- Direct mentions of Brexit, EU exit, Article 50, withdrawal
- Discussions about EU membership, sovereignty, immigration from EU context
- Trade agreements in context of leaving EU
- Northern Ireland border issues related to Brexit
- etc.

**Response format (JSON):**
{
  \"has_brexit_relation\": true/false,
  \"confidence\": 0.0-1.0 (0 = no relation to Brexit, 1 = very likely relation to Brexit),
  \"reasoning\": \"One sentence explanation\"
}

Respond ONLY with the JSON object, no additional text.";

/// Client over a [`Transport`].
///
/// `classify` never returns an error for operational failures: transient
/// transport errors are retried with exponential backoff, and every
/// terminal path resolves to a negative [`LlmVerdict`] whose `reasoning`
/// carries the diagnostic.
pub struct LlmClient<T> {
    transport: T,
    max_retries: u32,
    excerpt_cap: usize,
}

impl<T: Transport> LlmClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            max_retries: DEFAULT_MAX_RETRIES,
            excerpt_cap: DEFAULT_EXCERPT_CAP,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_excerpt_cap(mut self, excerpt_cap: usize) -> Self {
        self.excerpt_cap = excerpt_cap;
        self
    }

    /// Classify one debate from its matched keywords and speech excerpt.
    pub async fn classify(&self, debate: &Debate, matched: &[String], excerpt: &str) -> LlmVerdict {
        let prompt = build_prompt(debate, matched, excerpt, self.excerpt_cap);
        let mut attempt = 0u32;

        loop {
            match self.transport.generate(&prompt).await {
                Ok(reply) => return verdict_from_reply(reply),
                Err(err) if err.is_transient() => {
                    if attempt >= self.max_retries {
                        warn!(
                            attempts = attempt + 1,
                            "rate limit persisted through all retries"
                        );
                        return LlmVerdict::failure("Rate Limit Error after retries");
                    }
                    let wait = Duration::from_secs(BACKOFF_BASE_SECS << attempt);
                    info!(
                        wait_secs = wait.as_secs(),
                        retry = attempt + 1,
                        max_retries = self.max_retries,
                        "rate limited, backing off"
                    );
                    sleep(wait).await;
                    attempt += 1;
                }
                Err(err) => {
                    warn!(error = %err, "LLM call failed");
                    return LlmVerdict::failure(format!("API Error: {err}"));
                }
            }
        }
    }
}

fn verdict_from_reply(reply: RawReply) -> LlmVerdict {
    let usage = reply.usage.unwrap_or_default();
    match parse::parse_verdict(&reply.text) {
        Some(parsed) => LlmVerdict {
            related: parsed.related,
            confidence: parsed.confidence,
            reasoning: parsed.reasoning,
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
        },
        None => {
            warn!(
                head = %reply.text.chars().take(100).collect::<String>(),
                "no JSON object in LLM reply"
            );
            // The call itself succeeded, so the tokens it burned still count.
            LlmVerdict {
                related: false,
                confidence: 0.0,
                reasoning: "Failed to parse response".to_string(),
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            }
        }
    }
}

fn build_prompt(debate: &Debate, matched: &[String], excerpt: &str, excerpt_cap: usize) -> String {
    let keywords = if matched.is_empty() {
        "None".to_string()
    } else {
        matched
            .iter()
            .take(MAX_PROMPT_KEYWORDS)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };

    PROMPT_TEMPLATE
        .replace("{topic}", &debate.title)
        .replace("{date}", &debate.date.to_string())
        .replace("{keywords}", &keywords)
        .replace("{excerpt}", truncate_chars(excerpt, excerpt_cap))
}

fn truncate_chars(s: &str, cap: usize) -> &str {
    match s.char_indices().nth(cap) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{TokenUsage, TransportError};

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use tokio::time::Instant;

    /// Pops one scripted reply per call and records when each call landed.
    struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<RawReply, TransportError>>>,
        calls: Mutex<Vec<Instant>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<Result<RawReply, TransportError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_times(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for &ScriptedTransport {
        async fn generate(&self, _prompt: &str) -> Result<RawReply, TransportError> {
            self.calls.lock().unwrap().push(Instant::now());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("transport called more often than scripted")
        }
    }

    fn debate() -> Debate {
        Debate {
            debate_id: "2016-06-01a".into(),
            date: NaiveDate::from_ymd_opt(2016, 6, 1).unwrap(),
            title: "European Union Referendum".into(),
        }
    }

    fn good_reply() -> RawReply {
        RawReply {
            text: r#"{"has_brexit_relation": true, "confidence": 0.8, "reasoning": "Debate concerns the referendum."}"#
                .into(),
            usage: Some(TokenUsage {
                prompt_tokens: 1500,
                completion_tokens: 40,
            }),
        }
    }

    fn rate_limited() -> Result<RawReply, TransportError> {
        Err(TransportError::RateLimited("429 quota exceeded".into()))
    }

    #[tokio::test]
    async fn successful_reply_maps_to_verdict() {
        let transport = ScriptedTransport::new(vec![Ok(good_reply())]);
        let client = LlmClient::new(&transport);

        let verdict = client
            .classify(&debate(), &["brexit".into()], "speech text")
            .await;

        assert!(verdict.related);
        assert!((verdict.confidence - 0.8).abs() < 1e-9);
        assert_eq!(verdict.reasoning, "Debate concerns the referendum.");
        assert_eq!(verdict.input_tokens, 1500);
        assert_eq!(verdict.output_tokens, 40);
    }

    #[tokio::test]
    async fn unparseable_reply_keeps_token_usage() {
        let transport = ScriptedTransport::new(vec![Ok(RawReply {
            text: "I am unable to provide a JSON answer.".into(),
            usage: Some(TokenUsage {
                prompt_tokens: 900,
                completion_tokens: 12,
            }),
        })]);
        let client = LlmClient::new(&transport);

        let verdict = client.classify(&debate(), &["brexit".into()], "text").await;

        assert!(!verdict.related);
        assert_eq!(verdict.confidence, 0.0);
        assert_eq!(verdict.reasoning, "Failed to parse response");
        assert_eq!(verdict.input_tokens, 900);
        assert_eq!(verdict.output_tokens, 12);
    }

    #[tokio::test]
    async fn missing_usage_counts_as_zero() {
        let transport = ScriptedTransport::new(vec![Ok(RawReply {
            text: r#"{"has_brexit_relation": false, "confidence": 0.2, "reasoning": "x"}"#.into(),
            usage: None,
        })]);
        let client = LlmClient::new(&transport);

        let verdict = client.classify(&debate(), &["brexit".into()], "text").await;

        assert_eq!(verdict.input_tokens, 0);
        assert_eq!(verdict.output_tokens, 0);
        assert!((verdict.confidence - 0.2).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_back_off_exponentially() {
        let transport = ScriptedTransport::new(vec![
            rate_limited(),
            rate_limited(),
            rate_limited(),
            Ok(good_reply()),
        ]);
        let client = LlmClient::new(&transport);

        let verdict = client.classify(&debate(), &["brexit".into()], "text").await;
        assert!(verdict.related);

        let calls = transport.call_times();
        assert_eq!(calls.len(), 4);
        let gaps: Vec<u64> = calls
            .windows(2)
            .map(|w| (w[1] - w[0]).as_secs())
            .collect();
        assert_eq!(gaps, vec![6, 12, 24]);
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_rate_limit_is_terminal_with_zero_tokens() {
        let transport = ScriptedTransport::new(vec![
            rate_limited(),
            rate_limited(),
            rate_limited(),
            rate_limited(),
            rate_limited(),
            rate_limited(),
        ]);
        let client = LlmClient::new(&transport);

        let verdict = client.classify(&debate(), &["brexit".into()], "text").await;

        assert!(!verdict.related);
        assert_eq!(verdict.confidence, 0.0);
        assert_eq!(verdict.reasoning, "Rate Limit Error after retries");
        assert_eq!(verdict.input_tokens, 0);
        assert_eq!(verdict.output_tokens, 0);

        // Initial attempt plus five retries, waits 6+12+24+48+96 seconds.
        let calls = transport.call_times();
        assert_eq!(calls.len(), 6);
        assert_eq!((*calls.last().unwrap() - calls[0]).as_secs(), 186);
    }

    #[tokio::test]
    async fn non_transient_error_is_terminal_immediately() {
        let transport = ScriptedTransport::new(vec![Err(TransportError::Server {
            status: 500,
            body: "internal error".into(),
        })]);
        let client = LlmClient::new(&transport);

        let verdict = client.classify(&debate(), &["brexit".into()], "text").await;

        assert!(!verdict.related);
        assert!(verdict.reasoning.starts_with("API Error: "));
        assert!(verdict.reasoning.contains("500"));
        assert_eq!(verdict.input_tokens, 0);
        assert_eq!(transport.call_times().len(), 1);
    }

    #[test]
    fn prompt_includes_debate_fields_and_caps_keywords() {
        let matched: Vec<String> = (0..12).map(|i| format!("kw{i}")).collect();
        let prompt = build_prompt(&debate(), &matched, "the speeches", DEFAULT_EXCERPT_CAP);

        assert!(prompt.contains("- Topic: European Union Referendum"));
        assert!(prompt.contains("- Date: 2016-06-01"));
        assert!(prompt.contains("kw9"));
        assert!(!prompt.contains("kw10"));
        assert!(prompt.contains("the speeches"));
        assert!(prompt.contains("Respond ONLY with the JSON object"));
    }

    #[test]
    fn prompt_without_keywords_says_none() {
        let prompt = build_prompt(&debate(), &[], "text", DEFAULT_EXCERPT_CAP);
        assert!(prompt.contains("- Keywords found: None"));
    }

    #[test]
    fn excerpt_is_truncated_on_char_boundary() {
        let excerpt = "é".repeat(10_000);
        let prompt = build_prompt(&debate(), &["brexit".into()], &excerpt, 8_000);
        assert!(prompt.chars().filter(|&c| c == 'é').count() == 8_000);
    }
}

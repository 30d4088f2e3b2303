//! # Intent Classification
//!
//! Maps normalized user text to one of the closed [`Intent`] variants with a
//! confidence score. Classification is a capability with two faces: an
//! optional "smart" LLM-backed detector and a deterministic keyword matcher
//! that the agent falls back to on any failure, timeout or absence of the
//! smart path. Classification never fails for well-formed input; `unknown`
//! is always a valid terminal state.

use crate::errors::AgentError;
use crate::prompts::{INTENT_CLASSIFICATION_SYSTEM_PROMPT, INTENT_CLASSIFICATION_USER_PROMPT};
use crate::providers::ai::AiProvider;
use crate::types::{Classification, Intent};
use async_trait::async_trait;
use dyn_clone::DynClone;
use serde::Deserialize;
use std::fmt::Debug;
use std::time::Duration;
use tracing::{debug, warn};

/// A trait for intent detectors.
///
/// Implemented by both the deterministic keyword matcher and the optional
/// LLM-backed detector, so call sites never branch on the concrete type.
#[async_trait]
pub trait IntentDetector: Send + Sync + Debug + DynClone {
    async fn detect(
        &self,
        normalized: &str,
        canonical: &str,
    ) -> Result<Classification, AgentError>;
}

dyn_clone::clone_trait_object!(IntentDetector);

/// Confidence assigned to a partial (cue-word) match.
const PARTIAL_MATCH_CONFIDENCE: f64 = 0.7;

struct IntentRule {
    intent: Intent,
    /// Literal trigger phrases. A containment hit scores confidence 1.0.
    triggers: &'static [&'static str],
    /// Looser single-token cues. A hit scores [`PARTIAL_MATCH_CONFIDENCE`].
    cues: &'static [&'static str],
}

/// Rule table. Declaration order doubles as the tie-breaker: when two
/// intents match literals of the same length, the first-declared wins.
const RULES: &[IntentRule] = &[
    IntentRule {
        intent: Intent::Faq,
        triggers: &[
            "راهنمایی",
            "چگونه",
            "چیست",
            "چقدر",
            "قیمت",
            "هزینه",
            "چطور",
            "آیا",
            "چند",
            "کجا",
            "چرا",
            "چی",
        ],
        cues: &["کی", "؟"],
    },
    IntentRule {
        intent: Intent::Category,
        triggers: &[
            "دسته‌بندی",
            "دسته بندی",
            "چه موضوعاتی",
            "لیست سوالات",
            "دسته‌ها",
            "موضوعات",
        ],
        cues: &["دسته", "موضوع"],
    },
    IntentRule {
        intent: Intent::Greeting,
        triggers: &[
            "سلام علیکم",
            "صبح بخیر",
            "عصر بخیر",
            "وقت بخیر",
            "خدانگهدار",
            "خداحافظ",
            "سلام",
            "درود",
            "بدرود",
        ],
        cues: &[],
    },
];

/// The deterministic keyword/pattern matcher. Always available; never errors.
#[derive(Clone, Debug, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classifies normalized text against the rule table.
    ///
    /// The most specific match (longest literal) wins; ties resolve to the
    /// first-declared rule. Strictly-greater comparisons make the result
    /// reproducible for any input.
    pub fn classify(&self, normalized: &str) -> Classification {
        // (exact, literal length) of the best match so far.
        let mut best: Option<(bool, usize, Intent)> = None;

        for rule in RULES {
            for trigger in rule.triggers {
                if normalized.contains(trigger) {
                    let len = trigger.chars().count();
                    let beats = match best {
                        None => true,
                        Some((exact, best_len, _)) => (true, len) > (exact, best_len),
                    };
                    if beats {
                        best = Some((true, len, rule.intent));
                    }
                }
            }
            for cue in rule.cues {
                if normalized.contains(cue) {
                    let len = cue.chars().count();
                    let beats = match best {
                        None => true,
                        Some((exact, best_len, _)) => (false, len) > (exact, best_len),
                    };
                    if beats {
                        best = Some((false, len, rule.intent));
                    }
                }
            }
        }

        match best {
            Some((true, _, intent)) => Classification::new(intent, 1.0),
            Some((false, _, intent)) => Classification::new(intent, PARTIAL_MATCH_CONFIDENCE),
            None => Classification::unknown(),
        }
    }
}

#[async_trait]
impl IntentDetector for KeywordClassifier {
    async fn detect(
        &self,
        normalized: &str,
        _canonical: &str,
    ) -> Result<Classification, AgentError> {
        Ok(self.classify(normalized))
    }
}

// --- LLM-backed detector ---

#[derive(Deserialize, Debug)]
struct DetectedIntent {
    intent: String,
    #[serde(default)]
    confidence: f64,
}

/// An intent detector backed by a text-generation provider.
#[derive(Clone, Debug)]
pub struct LlmIntentDetector {
    provider: Box<dyn AiProvider>,
}

impl LlmIntentDetector {
    pub fn new(provider: Box<dyn AiProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl IntentDetector for LlmIntentDetector {
    async fn detect(
        &self,
        normalized: &str,
        _canonical: &str,
    ) -> Result<Classification, AgentError> {
        let user_prompt = INTENT_CLASSIFICATION_USER_PROMPT.replace("{prompt}", normalized);
        let llm_response = self
            .provider
            .generate(INTENT_CLASSIFICATION_SYSTEM_PROMPT, &user_prompt)
            .await?;

        debug!("LLM intent response: {}", llm_response);

        // Extract the JSON object even when the model wraps it in a
        // markdown code block.
        let re = regex::Regex::new(r"```json\s*([\s\S]*?)\s*```|(\{[\s\S]*\})")?;
        let json_match = re.find(&llm_response).map(|m| m.as_str());
        let cleaned_response = match json_match {
            Some(json_str) => json_str
                .trim()
                .trim_start_matches("```json")
                .trim_end_matches("```")
                .trim(),
            None => {
                return Err(AgentError::Classification(format!(
                    "LLM response did not contain a JSON object: '{llm_response}'"
                )));
            }
        };

        let detected: DetectedIntent = serde_json::from_str(cleaned_response).map_err(|e| {
            AgentError::Classification(format!(
                "failed to parse intent JSON: {e}. Raw response: '{cleaned_response}'"
            ))
        })?;

        let intent = Intent::from_label(&detected.intent).ok_or_else(|| {
            AgentError::Classification(format!("unrecognized intent label '{}'", detected.intent))
        })?;

        Ok(Classification::new(intent, detected.confidence))
    }
}

// --- Selection wrapper ---

/// The classifier the orchestrator talks to: tries the smart detector when
/// one is configured, falls back to the keyword matcher on any failure.
#[derive(Clone, Debug)]
pub struct Classifier {
    smart: Option<Box<dyn IntentDetector>>,
    keyword: KeywordClassifier,
    timeout: Duration,
}

impl Classifier {
    pub fn new(smart: Option<Box<dyn IntentDetector>>, timeout: Duration) -> Self {
        Self {
            smart,
            keyword: KeywordClassifier::new(),
            timeout,
        }
    }

    /// Classifies a normalized query. Infallible: every failure path lands
    /// on the deterministic keyword matcher.
    pub async fn classify(&self, normalized: &str, canonical: &str) -> Classification {
        if let Some(smart) = &self.smart {
            match tokio::time::timeout(self.timeout, smart.detect(normalized, canonical)).await {
                Ok(Ok(classification)) => return classification,
                Ok(Err(e)) => {
                    warn!("Smart intent detector failed: {e}. Falling back to keyword matcher.");
                }
                Err(_) => {
                    warn!(
                        timeout_ms = self.timeout.as_millis() as u64,
                        "Smart intent detector timed out. Falling back to keyword matcher."
                    );
                }
            }
        }
        self.keyword.classify(normalized)
    }
}

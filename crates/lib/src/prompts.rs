//! # Prompt Templates
//!
//! Centralized prompt constants for the optional LLM capabilities. User
//! prompts use `{placeholder}` substitution.

/// System prompt for the LLM-backed intent detector.
pub const INTENT_CLASSIFICATION_SYSTEM_PROMPT: &str = r#"You are an intent classifier for a Persian-language customer support assistant. Classify the user's message into exactly one of these intents:
- "faq": the user asks a question the knowledge base may answer (pricing, how-to, product details).
- "category": the user asks what topics or categories of questions exist.
- "greeting": the user greets or says goodbye.
- "unknown": anything else.
Your only output must be a JSON object of the form {"intent": "<label>", "confidence": <number between 0 and 1>}. No explanations, no markdown."#;

/// User prompt template for the LLM-backed intent detector.
/// Placeholder: `{prompt}`.
pub const INTENT_CLASSIFICATION_USER_PROMPT: &str = "# User message\n{prompt}";

/// System prompt for the answer rephrasing pass.
///
/// The composer is a style transform, not a content generator; the prompt
/// forbids introducing information that is not in the source answer.
pub const REPHRASE_SYSTEM_PROMPT: &str = r#"You are a Persian copy editor for a customer support chatbot. Rewrite the provided answer in the requested style. Rules:
1. Keep every fact, number and name exactly as given. Never add information that is not in the original answer.
2. Keep the rewrite in Persian and roughly the same length as the original.
3. Output only the rewritten answer text, with no preamble and no markdown."#;

/// User prompt template for the rephrasing pass.
/// Placeholders: `{style}`, `{question}`, `{answer}`.
pub const REPHRASE_USER_PROMPT: &str = r#"# Style
{style}

# User question
{question}

# Answer to rewrite
{answer}"#;

//! # Narration Prompts
//!
//! The second model call turns executed rows into one short sentence.

/// The system prompt for the narration stage.
pub const NARRATION_SYSTEM_PROMPT: &str = r#"You are a careful assistant that writes ONE short sentence
summarizing the provided shopping analytics ROWS in the requested LOCALE.

Return ONLY a JSON object with EXACTLY this key:
- text (string)  -- one sentence in the requested locale

Rules:
- Do NOT invent numbers, dates, shops, cities, or categories.
- Use ONLY values present in ROWS (already aggregated).
- Keep the sentence short (max ~20 words).
- If there is no data (ROWS is empty), say so politely in the locale.
- No markdown, no code fences, no extra keys."#;

/// The user prompt template for the narration stage.
///
/// Placeholders: `{locale}`, `{question}`, `{intent_hint}`, `{rows}`
pub const NARRATION_USER_PROMPT: &str = "LOCALE: {locale}\n\nQUESTION:\n{question}\n\nINTENT_HINT:\n{intent_hint}\n\nROWS:\n{rows}";

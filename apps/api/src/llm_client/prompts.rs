// Shared prompt constants. Each service that needs LLM calls defines its own
// prompts.rs alongside it; this file holds cross-cutting fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction against filling gaps with invented facts.
pub const NO_INVENTION_INSTRUCTION: &str = "\
    Use only information present in the source text. \
    If a field is not supported by the text, leave it as an empty string or empty list. \
    Do NOT invent names, dates, employers or contact details.";

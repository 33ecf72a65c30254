// Prompt constants for resume extraction.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NO_INVENTION_INSTRUCTION};

/// Resume text beyond this many characters is dropped before prompting.
pub const MAX_RESUME_CHARS: usize = 20_000;

/// Extraction prompt template. Replace `{resume_text}` before sending.
const EXTRACT_PROMPT_TEMPLATE: &str = r#"Extract structured portfolio data from the resume below.

Return a JSON object with this EXACT schema (no extra fields):
{
  "personalInfo": {
    "fullName": "", "nickname": "", "location": "", "phone": "", "email": "",
    "github": "", "linkedin": "", "twitter": "", "website": ""
  },
  "summary": {
    "introduction": "",
    "tagline": "",
    "highlights": []
  },
  "skills": [{ "name": "", "percentage": "", "category": "" }],
  "education": [{ "degree": "", "institution": "", "yearStart": "", "yearEnd": "", "score": "", "details": "" }],
  "workExperience": [{ "position": "", "organization": "", "duration": "", "description": "", "bulletPoints": [] }],
  "projects": [{ "title": "", "description": "", "skills": [], "repo": "", "demo": "" }],
  "contactInfo": { "email": "", "phone": "", "address": "" }
}

{no_invention}

RESUME CONTENT:
{resume_text}
"#;

pub fn extraction_system() -> String {
    format!(
        "You are an AI assistant specialized in extracting structured data from resumes. {JSON_ONLY_SYSTEM}"
    )
}

/// Builds the extraction prompt. Newline runs collapse to a single space and
/// the text is cut at `MAX_RESUME_CHARS` characters.
pub fn build_extraction_prompt(resume_text: &str) -> String {
    let flattened = resume_text
        .split(['\n', '\r'])
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let truncated: String = flattened.chars().take(MAX_RESUME_CHARS).collect();

    EXTRACT_PROMPT_TEMPLATE
        .replace("{no_invention}", NO_INVENTION_INSTRUCTION)
        .replace("{resume_text}", &truncated)
}

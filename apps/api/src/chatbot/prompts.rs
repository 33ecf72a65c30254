// Prompt constants for the portfolio assistant.

use crate::chatbot::ChatContext;

const CHAT_SYSTEM: &str = "\
You are an intelligent AI assistant helping users create and customize their portfolio websites. \
You should provide helpful, friendly, and professional guidance.

Your expertise includes:
- Website design and layout suggestions
- Color scheme recommendations
- Content organization and structure
- User experience best practices
- Portfolio presentation tips

Guidelines:
- Keep responses concise and actionable (under 200 words)
- Be encouraging and supportive
- Provide specific, practical suggestions
- Ask clarifying questions when needed
- Focus on helping users make their portfolio stand out";

/// System prompt, followed by a `Current Context` block listing whichever
/// context fields are present.
pub fn build_chat_system(context: Option<&ChatContext>) -> String {
    let mut system = CHAT_SYSTEM.to_string();
    let Some(context) = context else {
        return system;
    };

    system.push_str("\n\nCurrent Context:");
    let fields = [
        ("Selected Template", &context.template_name),
        ("Current Section", &context.form_section),
        ("User Query Type", &context.user_query),
    ];
    for (label, value) in fields {
        if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            system.push_str(&format!("\n- {label}: {value}"));
        }
    }
    system
}

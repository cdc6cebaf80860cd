// Shared prompt fragments.
// Each engine that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting fragments only.

/// Persona shared by every interview-coaching system prompt.
pub const COACH_PERSONA: &str = "You are an expert interview coach who prepares \
    candidates for behavioral interviews.";

/// Appended to every system prompt that is paired with a forced tool call.
pub const STRUCTURED_OUTPUT_INSTRUCTION: &str = "Always answer by calling the provided \
    tool exactly once. Fill every required field. Do NOT answer in prose.";

/// Longest slice of job-description text forwarded to the model.
pub const MAX_JOB_DESCRIPTION_CHARS: usize = 24_000;

/// Builds a system prompt from the shared persona, a task statement and the
/// structured-output instruction.
pub fn system_prompt(task: &str) -> String {
    format!("{COACH_PERSONA} {task} {STRUCTURED_OUTPUT_INSTRUCTION}")
}

/// Truncates `text` to at most `max_chars` characters without splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Fills `{name}` placeholders in one pass over `template`. Substituted values are
/// never rescanned, so placeholder-like text inside them is copied verbatim.
/// Unknown placeholders are left as written.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after
            .find('}')
            .and_then(|close| values.iter().find(|(name, _)| *name == &after[..close]))
            .map(|(name, value)| (name.len(), *value));
        match value {
            Some((name_len, value)) => {
                out.push_str(value);
                rest = &after[name_len + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

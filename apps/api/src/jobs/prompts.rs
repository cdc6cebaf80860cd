// Question Generator LLM prompt templates.

use crate::jobs::schema::QUESTION_COUNT;
use crate::llm_client::prompts::{
    fill_template, system_prompt, truncate_chars, MAX_JOB_DESCRIPTION_CHARS,
};

pub fn question_generation_system() -> String {
    system_prompt(
        "You write behavioral interview questions tailored to a specific role. \
        Each question probes a different competency and invites a STAR-style answer \
        (Situation, Task, Action, Result).",
    )
}

const QUESTION_PROMPT_TEMPLATE: &str = r#"Generate exactly {count} behavioral interview questions for the role below.

COMPANY: {company_name}
JOB TITLE: {job_title}

Requirements:
- Each question targets a distinct competency the role demands (e.g. leadership, conflict resolution, ownership, problem solving, collaboration).
- Ground every question in responsibilities or skills named in the job description.
- Phrase each question so the candidate must describe a concrete past experience.
- No numbering, no preamble, one question per array item.

JOB DESCRIPTION:
{job_description}"#;

/// Builds the generation prompt in a single substitution pass. The job-description
/// text is capped so an oversized posting cannot crowd out the instructions.
pub fn build_question_prompt(company_name: &str, job_title: &str, job_description: &str) -> String {
    let count = QUESTION_COUNT.to_string();
    fill_template(
        QUESTION_PROMPT_TEMPLATE,
        &[
            ("count", count.as_str()),
            ("company_name", company_name.trim()),
            ("job_title", job_title.trim()),
            (
                "job_description",
                truncate_chars(job_description.trim(), MAX_JOB_DESCRIPTION_CHARS),
            ),
        ],
    )
}

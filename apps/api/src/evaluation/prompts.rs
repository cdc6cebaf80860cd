// Evaluation Engine LLM prompt templates.

use crate::evaluation::criteria::Criterion;
use crate::llm_client::prompts::{
    fill_template, system_prompt, truncate_chars, MAX_JOB_DESCRIPTION_CHARS,
};

pub fn evaluation_system() -> String {
    system_prompt(
        "You evaluate a candidate's spoken answer to a behavioral interview question. \
        Score honestly on the full 1-10 scale; do not inflate scores.",
    )
}

const EVALUATION_PROMPT_TEMPLATE: &str = r#"Evaluate the candidate's response to a behavioral interview question.

{job_context}INTERVIEW QUESTION:
{question_text}

EVALUATION CRITERIA (integer score from 1 to 10 for each):
{criteria}

For each criterion provide:
- A score from 1 to 10
- Concise, actionable feedback (2-3 sentences)

Also provide an overall comment summarizing the response quality and key areas for improvement.

CANDIDATE'S RESPONSE (speech transcript):
{transcript}"#;

/// Builds the evaluation prompt. All values are filled in a single pass, so
/// placeholder-like text inside the posting, question or transcript is never expanded.
pub fn build_evaluation_prompt(
    question_text: &str,
    transcript: &str,
    job_description_text: Option<&str>,
) -> String {
    let criteria = Criterion::ALL
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {}: {}", i + 1, c.key(), c.rubric()))
        .collect::<Vec<_>>()
        .join("\n");

    let job_context = job_description_text
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| {
            format!(
                "JOB DESCRIPTION:\n{}\n\n",
                truncate_chars(text, MAX_JOB_DESCRIPTION_CHARS)
            )
        })
        .unwrap_or_default();

    fill_template(
        EVALUATION_PROMPT_TEMPLATE,
        &[
            ("criteria", criteria.as_str()),
            ("job_context", job_context.as_str()),
            ("question_text", question_text),
            ("transcript", transcript),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_question_transcript_and_rubric() {
        let prompt = build_evaluation_prompt(
            "Tell me about a conflict.",
            "I led a team through a crisis...",
            None,
        );
        assert!(prompt.contains("Tell me about a conflict."));
        assert!(prompt.contains("I led a team through a crisis..."));
        for criterion in Criterion::ALL {
            assert!(prompt.contains(criterion.key()));
        }
        assert!(!prompt.contains("JOB DESCRIPTION"));
    }

    #[test]
    fn test_prompt_includes_job_context_when_present() {
        let prompt = build_evaluation_prompt("Q", "A", Some("Senior Rust Engineer"));
        assert!(prompt.contains("JOB DESCRIPTION:\nSenior Rust Engineer"));
    }

    #[test]
    fn test_transcript_placeholders_are_not_expanded() {
        let prompt = build_evaluation_prompt("Q", "I said {question_text} out loud", None);
        assert!(prompt.ends_with("I said {question_text} out loud"));
    }

    #[test]
    fn test_posting_placeholders_are_not_expanded() {
        let prompt = build_evaluation_prompt(
            "Q",
            "SPOKEN_ANSWER",
            Some("We value {transcript} and {question_text}"),
        );
        assert_eq!(prompt.matches("SPOKEN_ANSWER").count(), 1);
        assert!(prompt.contains("JOB DESCRIPTION:\nWe value {transcript} and {question_text}"));
    }

    #[test]
    fn test_question_placeholders_are_not_expanded() {
        let prompt = build_evaluation_prompt("Describe {transcript}", "SPOKEN_ANSWER", None);
        assert_eq!(prompt.matches("SPOKEN_ANSWER").count(), 1);
        assert!(prompt.contains("INTERVIEW QUESTION:\nDescribe {transcript}"));
    }
}

//! Question list parsing for practice templates
//!
//! Admins paste question lists in one of three encodings:
//! - a JSON string array: `["What is your product?", "Who buys it?"]`
//! - quoted, comma-separated items: `"What is your product?", "Who buys it?"`
//! - one question per line
//!
//! Encodings are tried in that order. Stored templates always hold the JSON
//! array form.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestionParseError {
    #[error("question list is empty")]
    Empty,
}

/// Parse an admin-entered question list.
pub fn parse_question_list(text: &str) -> Result<Vec<String>, QuestionParseError> {
    let text = text.trim();

    let questions = parse_json_array(text)
        .or_else(|| parse_quoted_list(text))
        .unwrap_or_else(|| parse_lines(text));

    if questions.is_empty() {
        return Err(QuestionParseError::Empty);
    }

    Ok(questions)
}

/// Render questions as the `questions` variable handed to the voice agent.
pub fn format_question_variable(questions: &[String]) -> String {
    questions
        .iter()
        .map(|q| format!("- {}", q))
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_json_array(text: &str) -> Option<Vec<String>> {
    if !text.starts_with('[') {
        return None;
    }

    let items: Vec<String> = serde_json::from_str(text).ok()?;
    Some(clean(items))
}

fn parse_quoted_list(text: &str) -> Option<Vec<String>> {
    let quote = text.chars().next().filter(|c| *c == '"' || *c == '\'')?;

    let mut items = Vec::new();
    let mut rest = text;

    loop {
        rest = rest.trim_start().strip_prefix(quote)?;
        let end = rest.find(quote)?;
        items.push(rest[..end].to_string());

        rest = rest[end + quote.len_utf8()..].trim_start();
        if rest.is_empty() {
            break;
        }

        rest = rest.strip_prefix(',')?;
        if rest.trim().is_empty() {
            break; // trailing comma
        }
    }

    Some(clean(items))
}

fn parse_lines(text: &str) -> Vec<String> {
    clean(text.lines().map(str::to_string).collect())
}

fn clean(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .collect()
}

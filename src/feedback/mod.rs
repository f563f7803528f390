//! Transcript scoring and feedback persistence

mod generator;
mod prompt;
mod rubric;
mod scorer;

pub use generator::FeedbackGenerator;
pub use prompt::{build_prompt, format_transcript, SYSTEM_INSTRUCTION};
pub use rubric::{
    response_schema, Category, CategoryScore, FeedbackReport, FeedbackView, RubricError,
};
pub use scorer::{FeedbackScorer, HttpScorer, ScoringError};

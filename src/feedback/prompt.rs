use crate::call::Turn;

pub const SYSTEM_INSTRUCTION: &str = "You are a professional export sales coach analyzing a mock \
pitch to an international buyer. Your evaluation is thorough and detailed. Do not be lenient \
with the candidate: point out every mistake and every area for improvement.";

const INSTRUCTIONS: &str = "Score the candidate from 0 to 100 in the following areas only. \
Do not add categories other than the ones provided:
- **Product Knowledge**: Command of specifications, quality standards, certifications and pricing.
- **Market Relevance**: Fit of the offer to the target market, its regulations and buyer expectations.
- **Handling Objections**: Composure and substance when the buyer pushes back.
- **Negotiation Skills**: Ability to trade concessions and protect margin.
- **Logistics and Payment Understanding**: Incoterms, lead times, shipping and payment terms.
Give a short comment for every category, list the strengths and the areas for improvement, \
and close with a final assessment.";

/// One line per turn: `- {role}: {content}`.
pub fn format_transcript(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|turn| format!("- {}: {}\n", turn.role, turn.content))
        .collect()
}

/// The scoring prompt for a formatted transcript.
pub fn build_prompt(formatted_transcript: &str) -> String {
    format!("Transcript:\n{formatted_transcript}\n{INSTRUCTIONS}")
}

use exportpitch::questions::{format_question_variable, parse_question_list, QuestionParseError};

#[test]
fn test_json_array() {
    let questions = parse_question_list(r#"["What is your MOQ?", "  Do you ship FOB?  ", ""]"#).unwrap();
    assert_eq!(questions, vec!["What is your MOQ?", "Do you ship FOB?"]);
}

#[test]
fn test_quoted_comma_list() {
    let double = parse_question_list(r#""What is your MOQ?", "Do you ship FOB?""#).unwrap();
    assert_eq!(double, vec!["What is your MOQ?", "Do you ship FOB?"]);

    let single = parse_question_list("'Price per kg?', 'Payment terms?'").unwrap();
    assert_eq!(single, vec!["Price per kg?", "Payment terms?"]);
}

#[test]
fn test_one_question_per_line() {
    let questions = parse_question_list("What is your MOQ?\n\n  Do you ship FOB?\r\n").unwrap();
    assert_eq!(questions, vec!["What is your MOQ?", "Do you ship FOB?"]);
}

#[test]
fn test_json_takes_precedence() {
    // Valid JSON containing commas and quotes is not split further
    let questions = parse_question_list(r#"["Is it \"organic\", certified?"]"#).unwrap();
    assert_eq!(questions, vec![r#"Is it "organic", certified?"#]);
}

#[test]
fn test_malformed_json_falls_back_to_lines() {
    let questions = parse_question_list("[not json\nsecond line").unwrap();
    assert_eq!(questions, vec!["[not json", "second line"]);
}

#[test]
fn test_empty_input() {
    assert_eq!(parse_question_list("  \n \n"), Err(QuestionParseError::Empty));
    assert_eq!(parse_question_list("[]"), Err(QuestionParseError::Empty));
}

#[test]
fn test_question_variable() {
    let questions = vec!["What is your MOQ?".to_string(), "Do you ship FOB?".to_string()];
    assert_eq!(
        format_question_variable(&questions),
        "- What is your MOQ?\n- Do you ship FOB?"
    );
}

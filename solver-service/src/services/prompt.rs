const INSTRUCTIONS: &str = "\
You are an expert tutor. The following text contains questions from a test or questionnaire (TQ). \
Analyze the text, identify the questions, and provide clear, concise, and accurate solutions for each question. \
Format the response as a JSON object where each key is a question number or identifier (e.g., \"Q1\", \"Q2\") \
and the value is an object with \"question\" (the question text) and \"solution\" (the answer or explanation). \
If the questions are not clearly numbered, infer the structure and assign identifiers. \
If the text is unclear, provide your best interpretation.

For best results, expect the text to be structured like:
Q1: What is 2 + 2?
Q2: Define gravity.
Or similar clear formats.";

const RESPONSE_FORMAT: &str = r#"Return the response in the following format:
{
  "Q1": { "question": "Question text", "solution": "Solution text" },
  "Q2": { "question": "Question text", "solution": "Solution text" },
  ...
}"#;

/// Interpolate extracted document text into the solving prompt.
pub fn build_prompt(text: &str) -> String {
    format!(
        "{INSTRUCTIONS}\n\nText from file:\n{text}\n\n{RESPONSE_FORMAT}\n",
        text = text.trim()
    )
}

//! Prompt text for recipe extraction.

pub const SYSTEM_PROMPT: &str = "You extract recipes from web pages. \
Reply with a single JSON object and nothing else: no prose, no markdown fences.";

const SCHEMA: &str = r#"{"name": string, "ingredients": [string, ...], "instructions": [string, ...], "image_url": string or null}"#;

/// Prompt for the first extraction attempt.
pub fn render_extraction_prompt(page_text: &str) -> String {
    format!(
        "From the page text below, extract the main recipe.\n\
         \n\
         Return JSON with exactly these keys:\n\
         {SCHEMA}\n\
         \n\
         Rules:\n\
         - \"ingredients\": one entry per ingredient line, in page order, with quantities.\n\
         - \"instructions\": one entry per step, in page order.\n\
         - \"image_url\": absolute URL of the main recipe photo if the text shows one, else null.\n\
         - Keep the page's language. Do not invent content that is not on the page.\n\
         \n\
         --- PAGE TEXT START ---\n\
         {page_text}\n\
         --- PAGE TEXT END ---"
    )
}

/// Prompt for a follow-up attempt after the previous answer failed validation.
pub fn render_retry_prompt(page_text: &str, problem: &str) -> String {
    format!(
        "{}\n\nYour previous answer was rejected: {problem}\n\
         Reply again with only the JSON object.",
        render_extraction_prompt(page_text)
    )
}

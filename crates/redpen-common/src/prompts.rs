//! Instructions sent to the correction model.

/// System instruction: return only the corrected text.
pub const SYSTEM_PROMPT: &str = "You are a text correction tool. Your only task is to return the input text with corrected grammar and spelling. Do not provide any explanations or additional formatting. Output only the corrected text.";

const PROMPT_PREFIX: &str =
    "Fix any grammar and spelling errors in the following text. Return only the corrected text:\n\n";

/// User prompt wrapping the text to correct.
pub fn correction_prompt(text: &str) -> String {
    let mut prompt = String::with_capacity(PROMPT_PREFIX.len() + text.len());
    prompt.push_str(PROMPT_PREFIX);
    prompt.push_str(text);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_text_verbatim() {
        let prompt = correction_prompt("  i has a apple\n");
        assert!(prompt.starts_with("Fix any grammar and spelling errors"));
        assert!(prompt.ends_with(":\n\n  i has a apple\n"));
    }
}

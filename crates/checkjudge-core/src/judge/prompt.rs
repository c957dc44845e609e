pub(crate) const SYSTEM_PROMPT: &str = "You are a professional text evaluation expert. \
After carefully analyzing the text, only answer 'Yes' or 'No'.";

/// User message asking whether `text` satisfies `criterion`.
pub(crate) fn build_prompt(criterion: &str, text: &str) -> String {
    let mut prompt = String::with_capacity(criterion.len() + text.len() + 512);
    prompt.push_str("Please evaluate whether the following text meets the checklist criteria:\n\n");
    prompt.push_str("[Checklist Criteria]\n");
    prompt.push_str(criterion);
    prompt.push_str("\n\n[Text to Evaluate]\n");
    prompt.push_str(text);
    prompt.push_str(
        "\n\n[Requirements] Carefully read the text and determine if it fully meets the above criteria.\n\
         [Output Requirements]\n\
         1. Carefully analyze the text and judge whether it fully meets the above criteria.\n\
         2. Only answer: Yes or No (no explanation needed)\n\
         3. Do not output any other content.\n\
         4. Directly output: Yes or No",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_criterion_before_text() {
        let p = build_prompt("Mentions {braces} safely", "The article body.");
        let c = p.find("Mentions {braces} safely").unwrap();
        let t = p.find("The article body.").unwrap();
        assert!(c < t);
        assert!(p.ends_with("Directly output: Yes or No"));
    }
}

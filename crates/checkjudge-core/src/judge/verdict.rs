//! Mapping free-form judge answers to a yes/no verdict.

const AFFIRMATIVE: &[&str] = &["yes", "true"];
const NEGATIVE: &[&str] = &["no", "false"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Polarity {
    Affirmative,
    Negative,
}

fn polarity(token: &str) -> Option<Polarity> {
    if AFFIRMATIVE.contains(&token) {
        Some(Polarity::Affirmative)
    } else if NEGATIVE.contains(&token) {
        Some(Polarity::Negative)
    } else {
        None
    }
}

/// `Some(true)`/`Some(false)` for a clear answer, `None` when the text is empty
/// or mixes both polarities without leading with one.
///
/// Matching is on whole words, so "know" or "nothing" never count as "no".
pub fn parse_verdict(text: &str) -> Option<bool> {
    let lowered = text.to_lowercase();
    let mut tokens = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty());

    let first = tokens.next()?;
    if let Some(p) = polarity(first) {
        return Some(p == Polarity::Affirmative);
    }

    let mut seen_yes = false;
    let mut seen_no = false;
    for token in tokens {
        match polarity(token) {
            Some(Polarity::Affirmative) => seen_yes = true,
            Some(Polarity::Negative) => seen_no = true,
            None => {}
        }
    }
    match (seen_yes, seen_no) {
        (true, false) => Some(true),
        (false, true) => Some(false),
        _ => None,
    }
}

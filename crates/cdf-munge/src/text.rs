//! Text regularization applied to raw identifier values.

/// Compress whitespace: newlines become spaces, each internal run of
/// whitespace collapses to its first character, and the ends are trimmed.
pub fn compress_whitespace(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut run_char: Option<char> = None;
    for ch in value.chars() {
        let ch = if ch == '\n' || ch == '\r' { ' ' } else { ch };
        if ch.is_whitespace() {
            if run_char.is_none() {
                run_char = Some(ch);
            }
        } else {
            if let Some(ws) = run_char.take()
                && !out.is_empty()
            {
                out.push(ws);
            }
            out.push(ch);
        }
    }
    out
}

/// Candidate names arriving fully upper-cased are converted to title case so
/// dictionary and data regularize the same way. Mixed-case input is left
/// alone.
pub fn regularize_candidate_name(value: &str) -> String {
    let has_alpha = value.chars().any(char::is_alphabetic);
    if !has_alpha || value != value.to_uppercase() {
        return value.to_string();
    }
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

//! Whitespace tokenizer that keeps double-quoted phrases together

use crate::error::QueryError;

/// Split `input` on whitespace. A double-quoted run becomes part of a single
/// token and keeps its quotes, so `"song sparrow" in birds` yields
/// `["\"song sparrow\"", "in", "birds"]`.
///
/// Apostrophes are ordinary characters (`cooper's hawk`).
pub fn tokenize(input: &str) -> Result<Vec<String>, QueryError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;

    for ch in input.chars() {
        if in_quote {
            current.push(ch);
            if ch == '"' {
                in_quote = false;
            }
            continue;
        }
        match ch {
            '"' => {
                current.push(ch);
                in_quote = true;
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }

    if in_quote {
        return Err(QueryError::UnclosedQuote);
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

/// The words of a quoted token, or `None` if the token isn't quoted.
pub fn phrase_words(token: &str) -> Option<Vec<String>> {
    let inner = token.strip_prefix('"')?.strip_suffix('"')?;
    Some(inner.split_whitespace().map(str::to_string).collect())
}

/// Strip quote characters from a token.
pub fn unquote(token: &str) -> String {
    token.replace('"', "")
}

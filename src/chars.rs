//! Code point classes used by the scanner.

pub fn is_word_start(c: char) -> bool {
    c.is_alphabetic() || matches!(c, '_' | '#' | '%')
}

pub fn is_word_continue(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '#' | '%' | '.')
}

pub fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

pub fn is_comparison_symbol(c: char) -> bool {
    matches!(c, '<' | '>' | '=')
}

pub fn is_arithmetic_symbol(c: char) -> bool {
    matches!(c, '&' | '+' | '-' | '*' | '/')
}

/// Byte length of the word-shaped run at the start of `text`, or 0 if there is none.
pub fn word_len(text: &str) -> usize {
    let mut chars = text.char_indices();
    match chars.next() {
        Some((_, c)) if is_word_start(c) => {}
        _ => return 0,
    }
    chars
        .find(|(_, c)| !is_word_continue(*c))
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// True when every char of `word` forms exactly one word-shaped run.
pub fn is_whole_word(word: &str) -> bool {
    !word.is_empty() && word_len(word) == word.len()
}

//! Decides whether a word-shaped run starts a keyword, a logical operator, or is a
//! plain identifier.

use crate::chars::word_len;
use crate::keywords::Vocabulary;
use crate::token::{Kind, OperatorKind, Span, Tier, Trivia, TriviaKind};

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Resolved {
    pub end: usize,
    pub kind: Kind,
    pub canonical: Option<String>,
    /// Comments skipped between the matched words.
    pub inner: Vec<Trivia>,
}

/// Resolves the word starting at byte `start` of `source`.
///
/// Following words are collected while the sequence so far is a prefix of some
/// multi-word keyword; the longest collected sequence that is itself a keyword wins.
/// Whitespace and complete `//` or `/* */` comments may separate the words.
pub fn resolve(source: &str, start: usize, vocabulary: &Vocabulary) -> Resolved {
    let first_end = start + word_len(&source[start..]);
    let mut words = vec![&source[start..first_end]];
    let mut ends = vec![first_end];
    // gaps[i] holds the comments between words[i] and words[i + 1]
    let mut gaps: Vec<Vec<Trivia>> = Vec::new();

    while words.len() < vocabulary.max_words() && vocabulary.is_prefix(&words) {
        let (next, comments) = skip_gap(source, ends[ends.len() - 1]);
        let len = word_len(&source[next..]);
        if len == 0 {
            break;
        }
        words.push(&source[next..next + len]);
        ends.push(next + len);
        gaps.push(comments);
    }

    for n in (1..=words.len()).rev() {
        let Some(entry) = vocabulary.lookup(&words[..n]) else {
            continue;
        };
        if n == 1 && entry.callable && source[first_end..].starts_with('(') {
            break;
        }
        let kind = match entry.tier {
            Tier::Logical => Kind::Operator(OperatorKind::Logical),
            tier => Kind::Keyword(tier, entry.role),
        };
        return Resolved {
            end: ends[n - 1],
            kind,
            canonical: vocabulary.canonical(&words[..n]).map(str::to_string),
            inner: gaps.drain(..n - 1).flatten().collect(),
        };
    }

    Resolved {
        end: first_end,
        kind: Kind::Identifier,
        canonical: None,
        inner: Vec::new(),
    }
}

/// Skips whitespace and complete line or block comments starting at `from`.
/// Returns where the next word may start and the comments passed over.
fn skip_gap(source: &str, from: usize) -> (usize, Vec<Trivia>) {
    let mut cursor = from;
    let mut comments = Vec::new();
    loop {
        let rest = &source[cursor..];
        let trimmed = rest.trim_start();
        let (len, kind) = if trimmed.len() != rest.len() {
            (rest.len() - trimmed.len(), None)
        } else if rest.starts_with("//") {
            (rest.find('\n').unwrap_or(rest.len()), Some(TriviaKind::LineComment))
        } else if rest.starts_with("/*") {
            match rest[2..].find("*/") {
                Some(i) => (i + 4, Some(TriviaKind::BlockComment)),
                None => return (cursor, comments),
            }
        } else {
            return (cursor, comments);
        };
        if let Some(kind) = kind {
            comments.push(Trivia {
                kind,
                text: rest[..len].to_string(),
                span: Span::new(cursor, cursor + len),
            });
        }
        cursor += len;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Role;

    fn resolve_all(source: &str) -> Resolved {
        resolve(source, 0, Vocabulary::standard())
    }

    #[test]
    fn multi_word_beats_single_word() {
        let resolved = resolve_all("LEFT JOIN (Orders) LOAD");
        assert_eq!(resolved.end, 9);
        assert_eq!(resolved.kind, Kind::Keyword(Tier::Script, Role::Leader));
        assert_eq!(resolved.canonical.as_deref(), Some("LEFT JOIN"));
    }

    #[test]
    fn single_word_when_nothing_follows() {
        let resolved = resolve_all("Left (Orders)");
        assert_eq!(resolved.end, 4);
        assert_eq!(resolved.canonical.as_deref(), Some("LEFT"));
    }

    #[test]
    fn three_word_keywords_match_across_newlines_and_comments() {
        let source = "lib\n  CONNECT /* data */ to 'Sales';";
        let resolved = resolve_all(source);
        assert_eq!(&source[..resolved.end], "lib\n  CONNECT /* data */ to");
        assert_eq!(resolved.canonical.as_deref(), Some("LIB CONNECT TO"));
        assert_eq!(resolved.inner.len(), 1);
        assert_eq!(resolved.inner[0].kind, TriviaKind::BlockComment);
        assert_eq!(resolved.inner[0].text, "/* data */");
        assert_eq!(resolved.inner[0].span, Span::new(14, 24));
    }

    #[test]
    fn line_comments_between_words_are_kept() {
        let resolved = resolve_all("end // close\n  if");
        assert_eq!(resolved.canonical.as_deref(), Some("END IF"));
        let texts: Vec<&str> = resolved.inner.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["// close"]);
    }

    #[test]
    fn falls_back_to_the_longest_complete_prefix() {
        // `LIB CONNECT` is only a prefix, `LIB` alone is a keyword.
        let resolved = resolve_all("LIB CONNECT x");
        assert_eq!(resolved.end, 3);
        assert_eq!(resolved.canonical.as_deref(), Some("LIB"));
        assert!(resolve_all("LIB /* c */ CONNECT x").inner.is_empty());
    }

    #[test]
    fn unterminated_block_comment_stops_the_lookahead() {
        let resolved = resolve_all("END /* IF");
        assert_eq!(resolved.end, 3);
        assert_eq!(resolved.canonical.as_deref(), Some("END"));
    }

    #[test]
    fn words_only_match_whole_runs() {
        let resolved = resolve_all("AddDateName(x)");
        assert_eq!(resolved.end, 11);
        assert_eq!(resolved.kind, Kind::Identifier);
        assert_eq!(resolved.canonical, None);
    }

    #[test]
    fn logical_words_become_operators() {
        let resolved = resolve_all("Not x");
        assert_eq!(resolved.kind, Kind::Operator(OperatorKind::Logical));
        assert_eq!(resolved.canonical.as_deref(), Some("NOT"));
    }

    #[test]
    fn callable_keywords_directly_before_paren_are_function_names() {
        assert_eq!(resolve_all("If(a, b, c)").kind, Kind::Identifier);
        assert_eq!(resolve_all("Left(Name, 3)").kind, Kind::Identifier);
        assert_eq!(
            resolve_all("IF (a) THEN").kind,
            Kind::Keyword(Tier::Control, Role::Leader)
        );
        // Not callable: stays a keyword even when glued to a paren.
        assert_eq!(
            resolve_all("LOAD(x)").kind,
            Kind::Keyword(Tier::Script, Role::Leader)
        );
    }
}

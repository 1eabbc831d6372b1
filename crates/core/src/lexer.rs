//! Quote-aware splitting and operator normalization for legacy visibility
//! text.
//!
//! Spreadsheet authors spell the same comparison many ways (`=`, `==`,
//! `<>`, `!=`) and join comparisons with `AND`/`&&` and `OR`/`||` in any
//! case. Everything here works on raw characters and never looks inside a
//! single- or double-quoted literal when splitting.

use std::collections::BTreeMap;

/// Separators of the outer (disjunctive) split.
pub const OR_SEPARATORS: &[&str] = &["||", " OR "];
/// Separators of the inner (conjunctive) split.
pub const AND_SEPARATORS: &[&str] = &["&&", " AND "];

/// Informal operator spelling -> canonical token. `=` is handled separately
/// by [`normalize_operators`] since it needs neighbour checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorTable {
    synonyms: BTreeMap<String, String>,
}

impl Default for OperatorTable {
    fn default() -> Self {
        let mut synonyms = BTreeMap::new();
        synonyms.insert("<>".to_owned(), "!=".to_owned());
        OperatorTable { synonyms }
    }
}

impl OperatorTable {
    /// Defaults extended (or overridden) by `extra`.
    pub fn with_synonyms(extra: &BTreeMap<String, String>) -> Self {
        let mut table = OperatorTable::default();
        for (from, to) in extra {
            if from.is_empty() || from == "=" {
                continue;
            }
            table.synonyms.insert(from.clone(), to.clone());
        }
        table
    }

    pub fn synonyms(&self) -> &BTreeMap<String, String> {
        &self.synonyms
    }

    /// Synonyms in application order: longest first, so a synonym never
    /// pre-empts a longer one it is a prefix of.
    fn longest_first(&self) -> Vec<(&str, &str)> {
        let mut pairs: Vec<(&str, &str)> = self
            .synonyms
            .iter()
            .map(|(from, to)| (from.as_str(), to.as_str()))
            .collect();
        pairs.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(b.0)));
        pairs
    }
}

/// Tracks whether the scan position is inside a quoted literal. A quote
/// character only toggles its own kind.
#[derive(Debug, Default, Clone, Copy)]
struct QuoteState {
    in_single: bool,
    in_double: bool,
}

impl QuoteState {
    fn observe(&mut self, c: char) {
        match c {
            '\'' if !self.in_double => self.in_single = !self.in_single,
            '"' if !self.in_single => self.in_double = !self.in_double,
            _ => {}
        }
    }

    fn outside(self) -> bool {
        !self.in_single && !self.in_double
    }
}

/// Rewrite operator synonyms, then turn every lone `=` into `==`.
///
/// A `=` is lone when the previous character is neither `=` nor `!` and the
/// next character is not `=`, so existing `==` and `!=` survive untouched.
pub fn normalize_operators(raw: &str, table: &OperatorTable) -> String {
    let mut s = raw.to_owned();
    for (from, to) in table.longest_first() {
        s = s.replace(from, to);
    }

    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 8);
    for (pos, &c) in chars.iter().enumerate() {
        if c == '=' {
            let prev = if pos > 0 { Some(chars[pos - 1]) } else { None };
            let next = chars.get(pos + 1).copied();
            let after_op = matches!(prev, Some('=') | Some('!'));
            if !after_op && next != Some('=') {
                out.push_str("==");
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Split `text` on any of `separators` (case-insensitive) occurring outside
/// quoted spans. Segments are trimmed; empty segments are dropped.
pub fn split_outside_quotes(text: &str, separators: &[&str]) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let seps: Vec<Vec<char>> = separators.iter().map(|s| s.chars().collect()).collect();
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut quotes = QuoteState::default();
    let mut pos = 0usize;

    while pos < chars.len() {
        let c = chars[pos];
        if c == '\'' || c == '"' {
            quotes.observe(c);
            buf.push(c);
            pos += 1;
            continue;
        }

        if quotes.outside() {
            if let Some(len) = seps
                .iter()
                .find(|sep| starts_with_ignore_case(&chars[pos..], sep))
                .map(Vec::len)
            {
                push_segment(&mut out, &buf);
                buf.clear();
                pos += len;
                continue;
            }
        }

        buf.push(c);
        pos += 1;
    }
    push_segment(&mut out, &buf);
    out
}

fn push_segment(out: &mut Vec<String>, buf: &str) {
    let seg = buf.trim();
    if !seg.is_empty() {
        out.push(seg.to_owned());
    }
}

fn starts_with_ignore_case(haystack: &[char], needle: &[char]) -> bool {
    !needle.is_empty()
        && haystack.len() >= needle.len()
        && haystack
            .iter()
            .zip(needle)
            .all(|(a, b)| a.to_lowercase().eq(b.to_lowercase()))
}

/// True when `(` or `)` appears outside every quoted span.
pub fn has_unquoted_parens(text: &str) -> bool {
    let mut quotes = QuoteState::default();
    for c in text.chars() {
        quotes.observe(c);
        if quotes.outside() && (c == '(' || c == ')') {
            return true;
        }
    }
    false
}

/// Trim and drop one matching pair of surrounding quotes.
pub fn strip_quotes(s: &str) -> &str {
    let t = s.trim();
    let quoted = t.len() >= 2
        && ((t.starts_with('"') && t.ends_with('"')) || (t.starts_with('\'') && t.ends_with('\'')));
    if quoted {
        &t[1..t.len() - 1]
    } else {
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lone_equals_becomes_double() {
        let t = OperatorTable::default();
        assert_eq!(normalize_operators("A = 'X'", &t), "A == 'X'");
        assert_eq!(normalize_operators("A='X'", &t), "A=='X'");
    }

    #[test]
    fn canonical_operators_are_untouched() {
        let t = OperatorTable::default();
        assert_eq!(normalize_operators("A == X && B != Y", &t), "A == X && B != Y");
    }

    #[test]
    fn angle_inequality_becomes_bang_equals() {
        let t = OperatorTable::default();
        assert_eq!(normalize_operators("B <> 'Y'", &t), "B != 'Y'");
    }

    #[test]
    fn extra_synonyms_apply_but_cannot_replace_equals() {
        let mut extra = BTreeMap::new();
        extra.insert(" is not ".to_owned(), " != ".to_owned());
        extra.insert("=".to_owned(), "===".to_owned());
        let t = OperatorTable::with_synonyms(&extra);
        assert_eq!(normalize_operators("A is not X", &t), "A != X");
        assert!(!t.synonyms().contains_key("="));
    }

    #[test]
    fn longer_synonyms_win_over_their_prefixes() {
        let mut extra = BTreeMap::new();
        extra.insert(" is ".to_owned(), " == ".to_owned());
        extra.insert(" is not ".to_owned(), " != ".to_owned());
        let t = OperatorTable::with_synonyms(&extra);
        assert_eq!(normalize_operators("A is not 'X'", &t), "A != 'X'");
        assert_eq!(normalize_operators("A is 'X'", &t), "A == 'X'");
    }

    #[test]
    fn split_is_case_insensitive() {
        let parts = split_outside_quotes("A == 1 or B == 2 OR C == 3", OR_SEPARATORS);
        assert_eq!(parts, vec!["A == 1", "B == 2", "C == 3"]);
    }

    #[test]
    fn split_respects_double_quotes() {
        let parts = split_outside_quotes("A == \"North OR South\"", OR_SEPARATORS);
        assert_eq!(parts, vec!["A == \"North OR South\""]);
    }

    #[test]
    fn single_quote_inside_double_does_not_close() {
        let parts = split_outside_quotes("A == \"it's || x\" || B == 'y'", OR_SEPARATORS);
        assert_eq!(parts, vec!["A == \"it's || x\"", "B == 'y'"]);
    }

    #[test]
    fn empty_segments_are_dropped() {
        let parts = split_outside_quotes("&& A == 1 &&   && B == 2", AND_SEPARATORS);
        assert_eq!(parts, vec!["A == 1", "B == 2"]);
    }

    #[test]
    fn parens_inside_quotes_are_not_grouping() {
        assert!(!has_unquoted_parens("A == 'Other (specify)'"));
        assert!(has_unquoted_parens("(A == 1 OR B == 2) AND C == 3"));
    }

    #[test]
    fn strip_quotes_only_strips_matching_pairs() {
        assert_eq!(strip_quotes(" 'X' "), "X");
        assert_eq!(strip_quotes("\"X\""), "X");
        assert_eq!(strip_quotes("'X\""), "'X\"");
        assert_eq!(strip_quotes("\""), "\"");
    }
}

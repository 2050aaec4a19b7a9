//! Lexical features of the raw URL string.
//!
//! Nothing here touches the network and nothing here fails: a URL that
//! cannot be split into components simply yields empty components and
//! zero-valued features.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// File extensions that mark a URL as abnormal when they end the string.
pub const SUSPICIOUS_EXTENSIONS: &[&str] = &["exe", "zip", "rar", "dll", "js"];

/// Components of a URL split without validation.
///
/// Mirrors the classic `scheme://netloc/path?query#fragment` split: the
/// netloc is kept verbatim (userinfo and port included) because the
/// classifier was trained on its raw length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedUrl {
    /// Lowercased scheme, empty when none was recognised.
    pub scheme: String,
    /// Raw authority section, empty unless the URL has a `//` prefix.
    pub netloc: String,
    /// Hostname: netloc without userinfo, port or IPv6 brackets, lowercased.
    pub host: String,
    /// Path component (without query or fragment).
    pub path: String,
}

impl ParsedUrl {
    /// Split `url` into components. Never fails.
    pub fn parse(url: &str) -> Self {
        let mut parsed = ParsedUrl::default();
        let mut rest = url;

        if let Some(colon) = url.find(':') {
            let candidate = &url[..colon];
            if is_scheme(candidate) {
                parsed.scheme = candidate.to_ascii_lowercase();
                rest = &url[colon + 1..];
            }
        }

        if let Some(after) = rest.strip_prefix("//") {
            let end = after.find(['/', '?', '#']).unwrap_or(after.len());
            parsed.netloc = after[..end].to_string();
            rest = &after[end..];
        }

        let path_end = rest.find(['?', '#']).unwrap_or(rest.len());
        parsed.path = rest[..path_end].to_string();
        parsed.host = host_from_netloc(&parsed.netloc);
        parsed
    }

    /// `scheme://netloc` of this URL, if both parts are present.
    pub fn origin(&self) -> Option<String> {
        if self.scheme.is_empty() || self.netloc.is_empty() {
            return None;
        }
        Some(format!("{}://{}", self.scheme, self.netloc))
    }
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn host_from_netloc(netloc: &str) -> String {
    let without_userinfo = netloc.rsplit_once('@').map_or(netloc, |(_, h)| h);
    let host = if let Some(bracketed) = without_userinfo.strip_prefix('[') {
        bracketed.split(']').next().unwrap_or("")
    } else {
        without_userinfo.split(':').next().unwrap_or("")
    };
    host.to_lowercase()
}

/// Structural (network-independent) features of a URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UrlStructure {
    pub url_length: u32,
    pub domain_length: u32,
    pub tld_length: u32,
    pub letter_ratio: f64,
    pub digit_ratio: f64,
    pub is_https: u32,
    pub is_abnormal: u32,
}

impl UrlStructure {
    /// Compute every structural feature for `url`.
    pub fn analyze(url: &str) -> Self {
        let parsed = ParsedUrl::parse(url);
        Self::from_parsed(url, &parsed)
    }

    /// Compute structural features from an already-split URL.
    pub fn from_parsed(url: &str, parsed: &ParsedUrl) -> Self {
        let total = url.chars().count();
        let letters = url.chars().filter(|c| c.is_alphabetic()).count();
        let digits = url.chars().filter(|&c| is_digit(c)).count();

        Self {
            url_length: total as u32,
            domain_length: parsed.netloc.chars().count() as u32,
            tld_length: tld_length(&parsed.host),
            letter_ratio: ratio(letters, total),
            digit_ratio: ratio(digits, total),
            is_https: u32::from(parsed.scheme == "https"),
            is_abnormal: u32::from(is_abnormal_url(url)),
        }
    }
}

/// Decimal digits in any script plus superscript, subscript and circled
/// digits. Fractions, Roman numerals and other numeric symbols do not count.
pub fn is_digit(c: char) -> bool {
    if c.is_ascii_digit() {
        return true;
    }
    if !c.is_numeric() {
        return false;
    }
    matches!(
        c,
        '\u{B2}' | '\u{B3}' | '\u{B9}'
            | '\u{1369}'..='\u{1371}'
            | '\u{19DA}'
            | '\u{2070}'
            | '\u{2074}'..='\u{2079}'
            | '\u{2080}'..='\u{2089}'
            | '\u{2460}'..='\u{2468}'
            | '\u{2474}'..='\u{247C}'
            | '\u{2488}'..='\u{2490}'
            | '\u{24EA}'
            | '\u{24F5}'..='\u{24FD}'
            | '\u{24FF}'
            | '\u{2776}'..='\u{277E}'
            | '\u{2780}'..='\u{2788}'
            | '\u{278A}'..='\u{2792}'
            | '\u{1F100}'..='\u{1F10A}'
    ) || DECIMAL_ZEROS
        .iter()
        .any(|&zero| (zero..=zero + 9).contains(&u32::from(c)))
}

/// First code point of each run of ten decimal digits outside ASCII.
const DECIMAL_ZEROS: &[u32] = &[
    0x0660, 0x06F0, 0x07C0, 0x0966, 0x09E6, 0x0A66, 0x0AE6, 0x0B66, 0x0BE6, 0x0C66, 0x0CE6,
    0x0D66, 0x0DE6, 0x0E50, 0x0ED0, 0x0F20, 0x1040, 0x1090, 0x17E0, 0x1810, 0x1946, 0x19D0,
    0x1A80, 0x1A90, 0x1B50, 0x1BB0, 0x1C40, 0x1C50, 0xA620, 0xA8D0, 0xA900, 0xA9D0, 0xA9F0,
    0xAA50, 0xABF0, 0xFF10, 0x104A0, 0x10D30, 0x11066, 0x110F0, 0x11136, 0x111D0, 0x112F0,
    0x11450, 0x114D0, 0x11650, 0x116C0, 0x11730, 0x118E0, 0x11950, 0x11C50, 0x11D50, 0x11DA0,
    0x16A60, 0x16AC0, 0x16B50, 0x1D7CE, 0x1D7D8, 0x1D7E2, 0x1D7EC, 0x1D7F6, 0x1E140, 0x1E2F0,
    0x1E950, 0x1FBF0,
];

fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

/// Length of the hostname's public suffix, 0 when it is not a listed suffix.
pub fn tld_length(host: &str) -> u32 {
    let host = host.trim_end_matches('.');
    if host.is_empty() {
        return 0;
    }
    psl::suffix(host.as_bytes())
        .filter(|suffix| suffix.is_known())
        .and_then(|suffix| std::str::from_utf8(suffix.as_bytes()).ok())
        .map_or(0, |suffix| suffix.chars().count() as u32)
}

/// Whether the URL carries any of the classic phishing tells: an `@`,
/// embedded credentials, a dotted-quad IP literal, or an executable-looking
/// file extension at the very end.
pub fn is_abnormal_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }
    if url.contains('@') {
        return true;
    }
    abnormal_patterns().iter().any(|re| re.is_match(url))
}

fn abnormal_patterns() -> &'static [Regex; 3] {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let extensions = SUSPICIOUS_EXTENSIONS.join("|");
        [
            Regex::new(r"//\w+@").expect("userinfo regex is valid"),
            Regex::new(r"\d+\.\d+\.\d+\.\d+").expect("ip regex is valid"),
            Regex::new(&format!(r"\.({extensions})$")).expect("extension regex is valid"),
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_components() {
        let parsed = ParsedUrl::parse("HTTPS://user@Example.COM:8443/a/b?q=1#frag");
        assert_eq!(parsed.scheme, "https");
        assert_eq!(parsed.netloc, "user@Example.COM:8443");
        assert_eq!(parsed.host, "example.com");
        assert_eq!(parsed.path, "/a/b");
        assert_eq!(
            parsed.origin().as_deref(),
            Some("https://user@Example.COM:8443")
        );
    }

    #[test]
    fn test_parse_without_scheme_or_authority() {
        let parsed = ParsedUrl::parse("192.168.1.1/login");
        assert_eq!(parsed.scheme, "");
        assert_eq!(parsed.netloc, "");
        assert_eq!(parsed.path, "192.168.1.1/login");
        assert!(parsed.origin().is_none());

        let parsed = ParsedUrl::parse("1http://x.com");
        assert_eq!(parsed.scheme, "");
    }

    #[test]
    fn test_parse_ipv6_host() {
        let parsed = ParsedUrl::parse("http://[::1]:8080/");
        assert_eq!(parsed.host, "::1");
        assert_eq!(parsed.netloc, "[::1]:8080");
    }

    #[test]
    fn test_structure_of_plain_url() {
        let s = UrlStructure::analyze("https://example.com/path");
        assert_eq!(s.url_length, 24);
        assert_eq!(s.domain_length, 11);
        assert_eq!(s.tld_length, 3);
        assert_eq!(s.is_https, 1);
        assert_eq!(s.is_abnormal, 0);
        assert_eq!(s.digit_ratio, 0.0);
        assert!((s.letter_ratio - 19.0 / 24.0).abs() < 1e-12);
    }

    #[test]
    fn test_digit_class() {
        for c in ['7', '\u{B2}', '\u{2083}', '\u{0663}', '\u{FF15}', '\u{2460}'] {
            assert!(is_digit(c), "{c:?} should be a digit");
        }
        for c in ['a', '\u{BD}', '\u{216B}', '\u{3007}', '\u{2469}'] {
            assert!(!is_digit(c), "{c:?} should not be a digit");
        }
    }

    #[test]
    fn test_fraction_is_not_counted_as_digit() {
        let s = UrlStructure::analyze("http://a.com/\u{BD}1");
        assert_eq!(s.url_length, 15);
        assert!((s.digit_ratio - 1.0 / 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_multi_label_suffix() {
        assert_eq!(tld_length("www.bbc.co.uk"), 5);
        assert_eq!(tld_length("192.168.1.1"), 0);
        assert_eq!(tld_length("example"), 0);
        assert_eq!(tld_length(""), 0);
    }

    #[test]
    fn test_abnormal_patterns() {
        assert!(is_abnormal_url("http://192.168.1.1/login"));
        assert!(is_abnormal_url("http://a@b.com/"));
        assert!(is_abnormal_url("http://example.com/setup.exe"));
        assert!(is_abnormal_url("http://example.com/bundle.js"));
        assert!(!is_abnormal_url("http://example.com/bundle.json"));
        assert!(!is_abnormal_url("https://example.com/path"));
        assert!(!is_abnormal_url(""));
    }

    #[test]
    fn test_empty_url_is_all_zero() {
        assert_eq!(UrlStructure::analyze(""), UrlStructure::default());
    }

    #[test]
    fn test_malformed_url_never_panics() {
        let s = UrlStructure::analyze("ht!tp:://[broken");
        assert_eq!(s.is_https, 0);
        assert_eq!(s.tld_length, 0);
        assert_eq!(s.url_length, 16);
    }
}

//! Structural and textual features of a fetched page.
//!
//! Every feature is 0 when there is no page: the analyzer is total and never
//! reports an error. Parsing goes through html5ever (via `scraper`), which
//! recovers from any malformed markup, so a fetched body always yields a
//! document even if it is not HTML at all.
//!
//! `scraper::Html` is not `Send`; callers on an async runtime should run
//! [`ContentFeatures::analyze`] on a blocking worker.

use crate::analysis::url_structure::ParsedUrl;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::sync::OnceLock;
use url::Url;

/// Elements whose `href`/`src` count as page references.
const REFERENCE_TAGS: &str = "a, link, script, img";

/// Brand names whose presence marks social-network integration.
pub const SOCIAL_NETWORKS: &[&str] = &[
    "facebook",
    "twitter",
    "linkedin",
    "instagram",
    "youtube",
    "pinterest",
];

/// Typed, read-only query surface over a parsed page.
pub struct PageDocument {
    html: Html,
}

impl PageDocument {
    /// Parse `body` as an HTML document. Never fails.
    pub fn parse(body: &str) -> Self {
        Self {
            html: Html::parse_document(body),
        }
    }

    /// All elements matching a CSS selector, in document order.
    /// An invalid selector matches nothing.
    pub fn find_all(&self, selector: &str) -> Vec<ElementRef<'_>> {
        match Selector::parse(selector) {
            Ok(sel) => self.html.select(&sel).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// First element matching a CSS selector.
    pub fn first(&self, selector: &str) -> Option<ElementRef<'_>> {
        let sel = Selector::parse(selector).ok()?;
        self.html.select(&sel).next()
    }

    /// Number of elements matching a CSS selector.
    pub fn count(&self, selector: &str) -> u32 {
        match Selector::parse(selector) {
            Ok(sel) => self.html.select(&sel).count() as u32,
            Err(_) => 0,
        }
    }

    /// Whether any element matches a CSS selector.
    pub fn any(&self, selector: &str) -> bool {
        self.first(selector).is_some()
    }

    /// Concatenated text content of the whole document.
    pub fn text(&self) -> String {
        self.html.root_element().text().collect()
    }

    /// The document re-serialized as HTML.
    pub fn serialized(&self) -> String {
        self.html.html()
    }
}

/// Text content of a single element.
fn element_text(el: &ElementRef<'_>) -> String {
    el.text().collect()
}

/// Content-derived features of a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContentFeatures {
    pub image_count: u32,
    pub script_count: u32,
    pub stylesheet_count: u32,
    pub self_ref_count: u32,
    pub external_ref_count: u32,
    pub has_obfuscation: u32,
    pub has_title: u32,
    pub has_description: u32,
    pub has_submit_button: u32,
    pub has_social_net: u32,
    pub has_favicon: u32,
    pub has_copyright_info: u32,
    pub has_popup: u32,
    pub has_iframe: u32,
}

impl ContentFeatures {
    /// Analyze a fetched body. `page_url` is the URL that was requested;
    /// references are classified against its `scheme://netloc` origin.
    ///
    /// Returns all zeros when `body` is `None`.
    pub fn analyze(body: Option<&str>, page_url: &str) -> Self {
        let Some(body) = body else {
            return Self::default();
        };
        let document = PageDocument::parse(body);
        let origin = ParsedUrl::parse(page_url)
            .origin()
            .and_then(|origin| Url::parse(&origin).ok());
        let (self_refs, external_refs) = match &origin {
            Some(base) => count_references(&document, base),
            None => (0, 0),
        };

        Self {
            image_count: document.count("img"),
            script_count: document.count("script"),
            stylesheet_count: document.count(r#"link[rel~="stylesheet"]"#),
            self_ref_count: self_refs,
            external_ref_count: external_refs,
            has_obfuscation: u32::from(has_obfuscation(body)),
            has_title: u32::from(has_title(&document)),
            has_description: u32::from(has_description(&document)),
            has_submit_button: u32::from(has_submit_button(&document)),
            has_social_net: u32::from(has_social_net(&document)),
            has_favicon: u32::from(has_favicon(&document)),
            has_copyright_info: u32::from(has_copyright_info(&document)),
            has_popup: u32::from(has_popup(body)),
            has_iframe: u32::from(document.any("iframe")),
        }
    }
}

/// Where a page reference points relative to the page origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reference {
    SameOrigin,
    External,
}

/// Count (self, external) references among `a`, `link`, `script` and `img`.
fn count_references(document: &PageDocument, base: &Url) -> (u32, u32) {
    let mut self_refs = 0;
    let mut external_refs = 0;
    for el in document.find_all(REFERENCE_TAGS) {
        match classify_reference(&el, base) {
            Some(Reference::SameOrigin) => self_refs += 1,
            Some(Reference::External) => external_refs += 1,
            None => {}
        }
    }
    (self_refs, external_refs)
}

fn classify_reference(el: &ElementRef<'_>, base: &Url) -> Option<Reference> {
    let target = el
        .value()
        .attr("href")
        .filter(|href| !href.is_empty())
        .or_else(|| el.value().attr("src"))
        .filter(|src| !src.is_empty())?;
    let resolved = base.join(target).ok()?;

    if resolved.scheme() == base.scheme() && resolved.host() == base.host() {
        Some(Reference::SameOrigin)
    } else if resolved.host_str().is_some_and(|host| !host.is_empty()) {
        Some(Reference::External)
    } else {
        None
    }
}

/// Whether the raw body uses common obfuscation tricks.
pub fn has_obfuscation(body: &str) -> bool {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        [
            r"%[0-9a-fA-F]{2}",
            r"\\x[0-9a-fA-F]{2}",
            r"&#x[0-9a-fA-F]+;",
            r"javascript:",
            r"eval\(",
            r"document\.write",
            r"fromCharCode",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("obfuscation regex is valid"))
        .collect()
    });
    patterns.iter().any(|re| re.is_match(body))
}

/// Whether the raw body opens popup windows.
pub fn has_popup(body: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"window\.open\s*\(").expect("popup regex is valid"));
    re.is_match(body)
}

/// A `<title>` with no text at all is treated as no title.
fn has_title(document: &PageDocument) -> bool {
    document
        .first("title")
        .is_some_and(|title| !element_text(&title).trim().is_empty())
}

fn has_description(document: &PageDocument) -> bool {
    document
        .first(r#"meta[name="description"]"#)
        .and_then(|meta| meta.value().attr("content"))
        .is_some_and(|content| !content.trim().is_empty())
}

fn has_submit_button(document: &PageDocument) -> bool {
    document.any(r#"input[type="submit"]"#) || document.any("button")
}

fn has_social_net(document: &PageDocument) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(&format!("(?i){}", SOCIAL_NETWORKS.join("|")))
            .expect("social network regex is valid")
    });
    re.is_match(&document.serialized())
}

fn has_favicon(document: &PageDocument) -> bool {
    document.find_all("link").iter().any(|link| {
        link.value()
            .attr("rel")
            .is_some_and(|rel| rel.to_lowercase().contains("icon"))
    })
}

fn has_copyright_info(document: &PageDocument) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?i)copyright|©").expect("copyright regex is valid"));
    re.is_match(&document.text())
}

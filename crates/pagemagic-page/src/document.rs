//! [`StyleHost`] over a serialized HTML document.

use std::sync::LazyLock;

use regex::Regex;

use crate::host::{StyleHost, MANAGED_STYLE_ATTR};

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title\s*>").unwrap());
static MANAGED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<style\s+data-pagemagic\s*=\s*"true"\s*>(.*?)</style\s*>\n?"#).unwrap()
});
static HEAD_CLOSE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</head\s*>").unwrap());
static BODY_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<body[\s>]").unwrap());
static STYLE_CLOSE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</style").unwrap());

/// An HTML page held as text.
///
/// The managed element goes at the end of `<head>`, or before `<body>` when
/// there is no head, or at the very start otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlDocument {
    html: String,
}

impl HtmlDocument {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.html
    }

    fn insertion_point(&self) -> usize {
        if let Some(m) = HEAD_CLOSE_RE.find(&self.html) {
            return m.start();
        }
        BODY_OPEN_RE.find(&self.html).map_or(0, |m| m.start())
    }
}

impl StyleHost for HtmlDocument {
    fn title(&self) -> String {
        TITLE_RE
            .captures(&self.html)
            .and_then(|c| c.get(1))
            .map(|m| decode_entities(m.as_str().trim()))
            .unwrap_or_default()
    }

    fn html(&self) -> String {
        self.html.clone()
    }

    fn render_style(&mut self, css: &str) {
        self.remove_styles();
        // A literal `</style` would end the element early.
        let css = STYLE_CLOSE_RE.replace_all(css, "<\\/style");
        let element = format!("<style {MANAGED_STYLE_ATTR}=\"true\">{css}</style>\n");
        let at = self.insertion_point();
        self.html.insert_str(at, &element);
    }

    fn remove_styles(&mut self) -> usize {
        let count = MANAGED_RE.find_iter(&self.html).count();
        if count > 0 {
            self.html = MANAGED_RE.replace_all(&self.html, "").into_owned();
        }
        count
    }

    fn managed_css(&self) -> Option<String> {
        MANAGED_RE
            .captures(&self.html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

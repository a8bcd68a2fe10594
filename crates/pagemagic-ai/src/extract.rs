//! Pull CSS out of free-form model output.
//!
//! Models are asked for bare CSS but often wrap it in code fences or add a
//! sentence before and after. This is a line-based heuristic, not a parser.

use std::sync::LazyLock;

use regex::Regex;

static FENCE_CSS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^```css\s*").unwrap());
static FENCE_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^```\s*").unwrap());
static FENCE_CLOSE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)```$").unwrap());

/// A line made only of selector characters, optionally ending in `{`.
static SELECTOR_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9\s\-_#.,>+~\[\]:()@*=]+\{?$").unwrap());

/// Strip code fences, then keep the slice from the first line that opens a
/// rule (or looks like a selector with a `:`) to the last line with `}`.
///
/// When no such slice exists the fence-stripped text is returned.
pub fn extract_css(raw: &str) -> String {
    let text = raw.trim();
    let text = FENCE_CSS_RE.replace_all(text, "");
    let text = FENCE_OPEN_RE.replace_all(&text, "");
    let text = FENCE_CLOSE_RE.replace_all(&text, "");

    let lines: Vec<&str> = text.split('\n').collect();

    let start = lines.iter().position(|line| {
        let line = line.trim();
        line.contains('{') || (line.contains(':') && SELECTOR_LINE_RE.is_match(line))
    });
    let end = lines.iter().rposition(|line| line.contains('}'));

    match (start, end) {
        (Some(start), Some(end)) if start <= end => lines[start..=end].join("\n").trim().to_string(),
        _ => text.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_css_is_unchanged() {
        let css = "body {\n  color: red !important;\n}";
        assert_eq!(extract_css(css), css);
    }

    #[test]
    fn fenced_output_with_prose_keeps_rules_only() {
        let raw = "Here's the CSS you asked for:\n```css\nbody {\n  color: red !important;\n}\n```\nLet me know if you need more.";
        assert_eq!(extract_css(raw), "body {\n  color: red !important;\n}");
    }

    #[test]
    fn bare_fence_is_stripped() {
        let raw = "```\nh1 { font-size: 2em !important; }\n```";
        assert_eq!(extract_css(raw), "h1 { font-size: 2em !important; }");
    }

    #[test]
    fn at_rule_block_is_kept_whole() {
        let raw = "Here's a fix!\n@media (max-width: 600px) {\n  body { width: 100% !important; }\n}\nEnjoy!";
        assert_eq!(
            extract_css(raw),
            "@media (max-width: 600px) {\n  body { width: 100% !important; }\n}"
        );
    }

    #[test]
    fn pseudo_selector_line_counts_as_start() {
        let raw = "a:hover\n{ color: blue !important; }";
        assert_eq!(extract_css(raw), raw);
    }

    #[test]
    fn text_without_rules_is_returned_trimmed() {
        assert_eq!(extract_css("  I cannot help with that.  "), "I cannot help with that.");
        assert_eq!(extract_css(""), "");
    }

    #[test]
    fn closing_brace_before_opening_keeps_text() {
        let raw = "} stray\nbody {";
        assert_eq!(extract_css(raw), raw);
    }
}

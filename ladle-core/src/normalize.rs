//! Turning fetched HTML into compact, model-ready text.
//!
//! The output keeps the parts of a page a reader would see: headings as `#` lines,
//! list items as `- ` lines, paragraphs separated by blank lines and images as
//! `![alt](absolute-url)`. Scripts, styles and other invisible content are dropped.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

pub const DEFAULT_MAX_CHARS: usize = 60_000;

/// Converts raw page content into text for extraction.
pub trait ContentNormalizer: Send + Sync {
    /// Normalize `raw`, resolving relative links against `base_url`.
    /// Empty or whitespace-only input yields an empty string.
    fn normalize(&self, raw: &str, base_url: &str) -> String;
}

static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("title selector is valid"));
static BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("body selector is valid"));
static OG_IMAGE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[property="og:image"], meta[name="og:image"]"#)
        .expect("og:image selector is valid")
});

/// Elements whose content never reaches the output.
const SKIPPED: &[&str] = &[
    "script", "style", "noscript", "template", "svg", "iframe", "head", "object", "canvas",
];

/// Elements that start and end a paragraph.
const PARAGRAPHS: &[&str] = &[
    "p", "section", "article", "blockquote", "pre", "figure", "table", "ul", "ol", "dl", "main",
    "header", "footer", "aside", "nav",
];

/// Elements that sit on their own line.
const LINES: &[&str] = &[
    "div", "tr", "dt", "dd", "figcaption", "caption", "address", "summary", "details",
];

/// HTML-to-text normalizer built on `scraper`.
#[derive(Debug, Clone)]
pub struct HtmlNormalizer {
    max_chars: usize,
}

impl Default for HtmlNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlNormalizer {
    pub fn new() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
        }
    }

    /// Reads `LADLE_NORMALIZE_MAX_CHARS`, falling back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`HtmlNormalizer::from_env`], reading variables through `lookup`.
    /// Unparseable or zero values fall back to the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let max_chars = lookup("LADLE_NORMALIZE_MAX_CHARS")
            .and_then(|v| v.trim().parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_CHARS);
        Self { max_chars }
    }

    /// Cap the output at `max_chars` characters.
    pub fn max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    fn walk(&self, element: ElementRef<'_>, base: Option<&Url>, out: &mut TextBuilder) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => out.push_text(text),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.visit(child, base, out);
                    }
                }
                _ => {}
            }
        }
    }

    fn visit(&self, element: ElementRef<'_>, base: Option<&Url>, out: &mut TextBuilder) {
        let name = element.value().name();
        if SKIPPED.contains(&name) || element.value().attr("hidden").is_some() {
            return;
        }

        if let Some(level) = heading_level(name) {
            out.paragraph();
            out.start_line(&format!("{} ", "#".repeat(level)));
            self.walk(element, base, out);
            out.paragraph();
            return;
        }

        match name {
            "li" => {
                out.start_line("- ");
                self.walk(element, base, out);
                out.break_line();
            }
            "br" => out.break_line(),
            "hr" => out.paragraph(),
            "img" => {
                if let Some(line) = image_line(element, base) {
                    out.push_line(&line);
                }
            }
            "td" | "th" => {
                out.push_text(" ");
                self.walk(element, base, out);
                out.push_text(" ");
            }
            _ if PARAGRAPHS.contains(&name) => {
                out.paragraph();
                self.walk(element, base, out);
                out.paragraph();
            }
            _ if LINES.contains(&name) => {
                out.break_line();
                self.walk(element, base, out);
                out.break_line();
            }
            _ => self.walk(element, base, out),
        }
    }
}

impl ContentNormalizer for HtmlNormalizer {
    fn normalize(&self, raw: &str, base_url: &str) -> String {
        if raw.trim().is_empty() {
            return String::new();
        }

        let document = Html::parse_document(raw);
        let base = Url::parse(base_url).ok();
        let mut out = TextBuilder::default();

        if let Some(title) = document.select(&TITLE).next() {
            let title = collapse_whitespace(&title.text().collect::<String>());
            if !title.is_empty() {
                out.push_line(&format!("# {title}"));
                out.paragraph();
            }
        }

        let og_image = document
            .select(&OG_IMAGE)
            .filter_map(|meta| meta.value().attr("content"))
            .find_map(|src| resolve_image(src, base.as_ref()));
        if let Some(url) = og_image {
            out.push_line(&format!("![og:image]({url})"));
            out.paragraph();
        }

        let root = document
            .select(&BODY)
            .next()
            .unwrap_or_else(|| document.root_element());
        self.walk(root, base.as_ref(), &mut out);

        truncate_chars(out.finish(), self.max_chars)
    }
}

fn heading_level(name: &str) -> Option<usize> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn image_line(element: ElementRef<'_>, base: Option<&Url>) -> Option<String> {
    let attrs = element.value();
    let url = ["src", "data-src", "data-lazy-src", "data-original"]
        .iter()
        .filter_map(|attr| attrs.attr(attr))
        .find_map(|src| resolve_image(src, base))?;
    let alt = collapse_whitespace(attrs.attr("alt").unwrap_or(""));
    Some(format!("![{alt}]({url})"))
}

/// Resolve an image reference to an absolute http(s) URL. Inline `data:` images are dropped.
fn resolve_image(src: &str, base: Option<&Url>) -> Option<Url> {
    let src = src.trim();
    if src.is_empty() || src.starts_with("data:") {
        return None;
    }
    let url = match base {
        Some(base) => base.join(src).ok()?,
        None => Url::parse(src).ok()?,
    };
    matches!(url.scheme(), "http" | "https").then_some(url)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(mut text: String, max_chars: usize) -> String {
    if let Some((idx, _)) = text.char_indices().nth(max_chars) {
        text.truncate(idx);
        text.truncate(text.trim_end().len());
    }
    text
}

/// Accumulates output lines with collapsed whitespace and at most one blank line in a row.
#[derive(Default)]
struct TextBuilder {
    out: String,
    line: String,
    pending_space: bool,
}

impl TextBuilder {
    fn push_text(&mut self, text: &str) {
        let mut words = text.split_whitespace();
        let Some(first) = words.next() else {
            self.pending_space |= !text.is_empty();
            return;
        };
        if text.starts_with(char::is_whitespace) {
            self.pending_space = true;
        }
        self.push_word(first);
        for word in words {
            self.pending_space = true;
            self.push_word(word);
        }
        self.pending_space = text.ends_with(char::is_whitespace);
    }

    fn push_word(&mut self, word: &str) {
        if self.pending_space && !self.line.is_empty() && !self.line.ends_with(' ') {
            self.line.push(' ');
        }
        self.line.push_str(word);
        self.pending_space = false;
    }

    fn start_line(&mut self, prefix: &str) {
        self.break_line();
        self.line.push_str(prefix);
    }

    fn push_line(&mut self, line: &str) {
        self.break_line();
        self.out.push_str(line);
        self.out.push('\n');
    }

    fn break_line(&mut self) {
        let line = self.line.trim();
        // A bare list or heading marker with nothing after it is noise.
        if !line.is_empty() && line != "-" && !line.chars().all(|c| c == '#') {
            self.out.push_str(line);
            self.out.push('\n');
        }
        self.line.clear();
        self.pending_space = false;
    }

    fn paragraph(&mut self) {
        self.break_line();
        if !self.out.is_empty() && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    fn finish(mut self) -> String {
        self.break_line();
        self.out.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(html: &str) -> String {
        HtmlNormalizer::new().normalize(html, "https://cook.test/recipes/soup")
    }

    #[test]
    fn max_chars_comes_from_lookup() {
        let with = |value: &'static str| {
            HtmlNormalizer::from_lookup(move |key| {
                (key == "LADLE_NORMALIZE_MAX_CHARS").then(|| value.to_string())
            })
        };

        assert_eq!(with("5").max_chars, 5);
        assert_eq!(with(" 120 ").max_chars, 120);
        assert_eq!(with("0").max_chars, DEFAULT_MAX_CHARS);
        assert_eq!(with("lots").max_chars, DEFAULT_MAX_CHARS);
        assert_eq!(HtmlNormalizer::from_lookup(|_| None).max_chars, DEFAULT_MAX_CHARS);
        assert_eq!(
            with("4").normalize("<p>abcdefgh</p>", "https://cook.test/"),
            "abcd"
        );
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n\t "), "");
    }

    #[test]
    fn scripts_and_styles_are_dropped() {
        let html = r#"<html><head><style>p { color: red }</style></head>
            <body><script>var secret = 1;</script><p>Visible</p><noscript>Enable JS</noscript></body></html>"#;
        assert_eq!(normalize(html), "Visible");
    }

    #[test]
    fn script_only_page_normalizes_to_nothing() {
        let html = "<html><body><script>window.app = {};</script></body></html>";
        assert_eq!(normalize(html), "");
    }

    #[test]
    fn title_and_headings_become_markdown_headings() {
        let html = "<html><head><title> Tomato   Soup </title></head>\
            <body><h1>Tomato Soup</h1><h2>Ingredients</h2></body></html>";
        assert_eq!(normalize(html), "# Tomato Soup\n\n# Tomato Soup\n\n## Ingredients");
    }

    #[test]
    fn list_items_become_dash_lines() {
        let html = "<ul><li>2 tomatoes</li><li> 1 <b>onion</b>, diced </li></ul>";
        assert_eq!(normalize(html), "- 2 tomatoes\n- 1 onion, diced");
    }

    #[test]
    fn inline_elements_do_not_split_words() {
        let html = "<p>Pre<b>heat</b> the <em>oven</em>.</p>";
        assert_eq!(normalize(html), "Preheat the oven.");
    }

    #[test]
    fn whitespace_is_collapsed_and_blank_lines_folded() {
        let html = "<p>one\n\n   two</p><p></p><p></p><p>three</p>";
        assert_eq!(normalize(html), "one two\n\nthree");
    }

    #[test]
    fn relative_images_are_resolved() {
        let html = r#"<p>Look:</p><img src="/img/soup.jpg" alt="A bowl of  soup">"#;
        assert_eq!(
            normalize(html),
            "Look:\n\n![A bowl of soup](https://cook.test/img/soup.jpg)"
        );
    }

    #[test]
    fn lazy_images_use_data_src_and_inline_images_are_dropped() {
        let html = r#"<img src="data:image/gif;base64,R0lGOD" data-src="photo.png" alt="">
            <img src="data:image/png;base64,AAAA">"#;
        assert_eq!(normalize(html), "![](https://cook.test/recipes/photo.png)");
    }

    #[test]
    fn og_image_is_listed_first() {
        let html = r#"<html><head><meta property="og:image" content="https://cdn.test/hero.jpg"></head>
            <body><p>Body</p></body></html>"#;
        assert_eq!(normalize(html), "![og:image](https://cdn.test/hero.jpg)\n\nBody");
    }

    #[test]
    fn hidden_elements_are_skipped() {
        let html = r#"<div hidden>Secret</div><div>Shown</div>"#;
        assert_eq!(normalize(html), "Shown");
    }

    #[test]
    fn output_is_truncated_on_char_boundary() {
        let html = "<p>crème brûlée</p>";
        let text = HtmlNormalizer::new().max_chars(4).normalize(html, "https://cook.test/");
        assert_eq!(text, "crèm");
    }

    #[test]
    fn unparseable_base_url_keeps_absolute_images_only() {
        let html = r#"<img src="/rel.jpg"><img src="https://cdn.test/abs.jpg" alt="abs">"#;
        let text = HtmlNormalizer::new().normalize(html, "not a url");
        assert_eq!(text, "![abs](https://cdn.test/abs.jpg)");
    }
}

//! Markdown to HTML for the blog reader
//!
//! GitHub-flavoured extensions, soft breaks as `<br />`, raw HTML escaped
//! rather than passed through, script URLs neutralized. Fenced code blocks
//! get a header with the language and a copy button.

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag};

/// URL schemes that never make it into an href/src
const BLOCKED_SCHEMES: [&str; 3] = ["javascript:", "vbscript:", "data:text/html"];

const COPY_ICON: &str = concat!(
    r#"<svg width="16" height="16" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2">"#,
    r#"<rect x="9" y="9" width="13" height="13" rx="2" ry="2"></rect>"#,
    r#"<path d="m5 15-4-4 4-4"></path>"#,
    "</svg>"
);

pub fn render(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let parser = Parser::new_ext(markdown, options);

    let mut events: Vec<Event> = Vec::new();
    // (language, collected source) while inside a code block
    let mut code: Option<(String, String)> = None;
    let mut code_id = 0usize;

    for event in parser {
        if let Some((_, text)) = code.as_mut() {
            match event {
                Event::Text(t) => {
                    text.push_str(&t);
                    continue;
                }
                Event::End(Tag::CodeBlock(_)) => {
                    if let Some((lang, text)) = code.take() {
                        events.push(Event::Html(code_block(&lang, &text, code_id).into()));
                        code_id += 1;
                    }
                    continue;
                }
                _ => continue,
            }
        }

        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info.split_whitespace().next().unwrap_or("").to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                code = Some((lang, String::new()));
            }
            Event::SoftBreak => events.push(Event::HardBreak),
            Event::Html(raw) => events.push(Event::Text(raw)),
            Event::Start(Tag::Link(kind, dest, title)) => {
                events.push(Event::Start(Tag::Link(kind, safe_url(dest), title)))
            }
            Event::Start(Tag::Image(kind, dest, title)) => {
                events.push(Event::Start(Tag::Image(kind, safe_url(dest), title)))
            }
            other => events.push(other),
        }
    }

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    out
}

fn safe_url(dest: CowStr) -> CowStr {
    let lowered = dest.trim().to_ascii_lowercase();
    if BLOCKED_SCHEMES.iter().any(|scheme| lowered.starts_with(scheme)) {
        CowStr::Borrowed("#")
    } else {
        dest
    }
}

fn code_block(lang: &str, source: &str, id: usize) -> String {
    let lang = if lang.is_empty() { "text" } else { lang };
    let lang = escape_html(lang);
    format!(
        concat!(
            "<div class=\"code-block-container\" data-language=\"{lang}\">\n",
            "<div class=\"code-block-header\">\n",
            "<span class=\"code-language\">{lang}</span>\n",
            "<button class=\"copy-code-btn\" data-code-id=\"{id}\" data-code=\"{data}\">",
            "{icon}Copy</button>\n",
            "</div>\n",
            "<pre><code class=\"language-{lang}\" id=\"code-{id}\">{body}</code></pre>\n",
            "</div>\n"
        ),
        lang = lang,
        id = id,
        data = urlencoding::encode(source),
        icon = COPY_ICON,
        body = escape_html(source),
    )
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_markdown() {
        let html = render("# Title\n\nSome *emphasis* and `code`.");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<em>emphasis</em>"));
        assert!(html.contains("<code>code</code>"));
    }

    #[test]
    fn test_soft_breaks_become_br() {
        let html = render("line one\nline two");
        assert!(html.contains("line one<br />"));
    }

    #[test]
    fn test_gfm_extensions() {
        let html = render("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~\n\n- [x] done\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<del>gone</del>"));
        assert!(html.contains("type=\"checkbox\""));
    }

    #[test]
    fn test_raw_html_escaped() {
        let html = render("<script>alert(1)</script>\n\nok <b>bold</b>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn test_script_links_neutralized() {
        let html = render("[click](javascript:alert(1)) ![img](JavaScript:x) [ok](https://example.com)");
        assert!(!html.to_ascii_lowercase().contains("javascript:"));
        assert!(html.contains("href=\"#\""));
        assert!(html.contains("href=\"https://example.com\""));
    }

    #[test]
    fn test_code_blocks() {
        let html = render("```rust\nfn main() { println!(\"<hi>\"); }\n```\n\n```\nplain\n```\n");
        assert!(html.contains("<div class=\"code-block-container\" data-language=\"rust\">"));
        assert!(html.contains("<span class=\"code-language\">rust</span>"));
        assert!(html.contains("id=\"code-0\""));
        assert!(html.contains("class=\"language-rust\""));
        assert!(html.contains("&lt;hi&gt;"));
        assert!(html.contains("data-code=\"fn%20main%28%29"));
        // No language falls back to text, ids keep counting
        assert!(html.contains("data-language=\"text\""));
        assert!(html.contains("id=\"code-1\""));
        // Deterministic
        assert_eq!(html, render("```rust\nfn main() { println!(\"<hi>\"); }\n```\n\n```\nplain\n```\n"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">'&'</a>"), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }
}

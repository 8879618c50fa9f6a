//! Sanitisation for admin-authored HTML bodies.

use std::collections::HashSet;
use std::sync::LazyLock;

use ammonia::Builder as AmmoniaBuilder;

static SANITIZER: LazyLock<AmmoniaBuilder<'static>> = LazyLock::new(build_sanitizer);

fn build_sanitizer() -> AmmoniaBuilder<'static> {
    let mut builder = AmmoniaBuilder::default();

    let tags: HashSet<&'static str> = HashSet::from([
        "a",
        "blockquote",
        "br",
        "div",
        "em",
        "figcaption",
        "figure",
        "h2",
        "h3",
        "h4",
        "hr",
        "img",
        "li",
        "ol",
        "p",
        "s",
        "span",
        "strong",
        "u",
        "table",
        "tbody",
        "td",
        "th",
        "thead",
        "tr",
        "ul",
    ]);
    builder.tags(tags);
    builder.add_tag_attributes("a", &["target"]);
    builder.add_tag_attributes("img", &["alt", "width", "height", "loading"]);
    builder.add_generic_attributes(&["class"]);
    builder.url_relative(ammonia::UrlRelative::PassThrough);
    builder
}

/// Clean `html`, returning `None` when nothing visible remains.
pub fn sanitize_rich_text(html: &str) -> Option<String> {
    let cleaned = SANITIZER.clean(html).to_string();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Render plain text with line breaks as paragraphs, escaping markup.
pub fn paragraphs_from_text(text: &str) -> String {
    text.split("\n\n")
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .map(|block| {
            let escaped = ammonia::clean_text(block).replace("&#10;", "<br>");
            format!("<p>{escaped}</p>")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_removes_scripts_and_handlers() {
        let html = sanitize_rich_text(
            "<p onclick=\"steal()\">活動紹介</p><script>alert(1)</script><img src=\"/storage/a.png\" alt=\"写真\">",
        )
        .expect("content");
        assert!(!html.contains("script"));
        assert!(!html.contains("onclick"));
        assert!(html.contains("<p>活動紹介</p>"));
        assert!(html.contains("src=\"/storage/a.png\""));
    }

    #[test]
    fn sanitize_returns_none_for_empty_markup() {
        assert_eq!(sanitize_rich_text("<script>x</script>  "), None);
    }

    #[test]
    fn paragraphs_escape_text() {
        let html = paragraphs_from_text("一行目\n二行目\n\n<b>次</b>");
        assert!(html.starts_with("<p>一行目<br>二行目</p>"));
        assert!(html.contains("&lt;b&gt;"));
    }
}

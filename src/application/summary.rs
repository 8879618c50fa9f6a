//! Interview lead generation through an external text model.

use ammonia::Builder as AmmoniaBuilder;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("summary generation is not configured")]
    NotConfigured,
    #[error("nothing to summarize")]
    EmptyInput,
    #[error("summary request failed: {0}")]
    Request(String),
    #[error("summary service returned status {status}")]
    Status { status: u16 },
    #[error("summary service returned no text")]
    EmptyResponse,
}

#[async_trait]
pub trait SummaryGenerator: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<String, SummaryError>;
}

/// Build the instruction sent with an interview body.
pub fn summary_prompt(body: &str) -> String {
    format!(
        "以下は地域で活動する団体へのインタビュー記事です。\
         記事の冒頭に載せるリード文を、です・ます調で120字程度の日本語一段落にまとめてください。\
         見出しや箇条書きは使わないでください。\n\n{body}"
    )
}

/// Strip markup so the model sees plain text.
pub fn plain_text(html: &str) -> String {
    let text = AmmoniaBuilder::empty().clean(html).to_string();
    let decoded = text
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_strips_markup() {
        assert_eq!(
            plain_text("<p>こんにちは<strong>世界</strong></p>\n<p>二段落目</p>"),
            "こんにちは世界 二段落目"
        );
    }

    #[test]
    fn plain_text_decodes_entities_and_drops_scripts() {
        assert_eq!(
            plain_text("<p>A &amp; B &lt;3&gt;</p><script>alert(1)</script>"),
            "A & B <3>"
        );
        assert_eq!(plain_text("&amp;lt;"), "&lt;");
    }

    #[test]
    fn prompt_embeds_body() {
        assert!(summary_prompt("本文").ends_with("本文"));
    }
}

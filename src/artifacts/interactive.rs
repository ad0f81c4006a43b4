//! Quiz and flashcard payload extraction
//!
//! Interactive artifacts arrive as HTML with a JSON blob embedded in an
//! HTML-encoded attribute. Extraction tries a series of patterns in order
//! and the first successful decode+parse wins; if every pattern misses,
//! the parse error carries a preview of the offending HTML.

use regex::Regex;
use serde_json::{json, Value};

use crate::artifacts::views::parse_error;
use crate::error::{NlmError, Result};

const TYPE_NAME: &str = "interactive";

/// Output format for quiz/flashcard downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractiveFormat {
    Json,
    Markdown,
    Html,
}

impl InteractiveFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractiveFormat::Json => "json",
            InteractiveFormat::Markdown => "markdown",
            InteractiveFormat::Html => "html",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "json" => Some(InteractiveFormat::Json),
            "markdown" => Some(InteractiveFormat::Markdown),
            "html" => Some(InteractiveFormat::Html),
            _ => None,
        }
    }

    /// File extension matching this format.
    pub fn extension(&self) -> &'static str {
        match self {
            InteractiveFormat::Json => "json",
            InteractiveFormat::Markdown => "md",
            InteractiveFormat::Html => "html",
        }
    }
}

/// Extract the embedded JSON app data from interactive artifact HTML.
///
/// Extraction order:
/// 1. `data-app-data="…"` attribute (primary)
/// 2. `<script id="application-data">…</script>`
/// 3. `data-state` / `data-config` / `data-initial-state` attributes
pub fn extract_app_data(html: &str) -> Result<Value> {
    for attr in ["data-app-data", "data-state", "data-config", "data-initial-state"] {
        if let Some(data) = try_attribute(html, attr) {
            tracing::debug!("Extracted app data from {} attribute", attr);
            return Ok(data);
        }
        // The primary attribute also gates the script fallback ordering:
        // script comes right after data-app-data, before the spare attrs.
        if attr == "data-app-data" {
            if let Some(data) = try_script_tag(html) {
                tracing::debug!("Extracted app data from application-data script tag");
                return Ok(data);
            }
        }
    }

    let preview: String = html.chars().take(500).collect();
    Err(parse_error(
        TYPE_NAME,
        format!(
            "could not extract JSON data from HTML (tried data-app-data, \
             script#application-data, data-state, data-config, data-initial-state); \
             HTML preview: {}",
            preview
        ),
    ))
}

fn try_attribute(html: &str, attr: &str) -> Option<Value> {
    let pattern = format!(r#"(?s){}="([^"]*(?:\\"[^"]*)*)""#, attr);
    let re = Regex::new(&pattern).ok()?;
    let encoded = re.captures(html)?.get(1)?.as_str();
    let decoded = unescape_html_entities(encoded);
    serde_json::from_str(&decoded).ok()
}

fn try_script_tag(html: &str) -> Option<Value> {
    let re = Regex::new(r#"(?s)<script[^>]+id=["']application-data["'][^>]*>(.*?)</script>"#)
        .expect("static regex compiles");
    let raw = re.captures(html)?.get(1)?.as_str();
    serde_json::from_str(raw.trim()).ok()
}

/// Decode the HTML entities attribute values carry (`&quot;`, `&amp;`,
/// `&lt;`, `&gt;`, `&#39;`/`&apos;`, and numeric references).
pub fn unescape_html_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let Some(end) = rest.find(';').filter(|&e| e <= 12) else {
            out.push('&');
            rest = &rest[1..];
            continue;
        };
        let entity = &rest[1..end];
        let decoded = match entity {
            "quot" => Some('"'),
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Render quiz questions as markdown with checkbox-style answer markers.
pub fn format_quiz_markdown(title: &str, questions: &[Value]) -> String {
    let mut lines = vec![format!("# {}", title), String::new()];

    for (i, q) in questions.iter().enumerate() {
        lines.push(format!("## Question {}", i + 1));
        lines.push(field_str(q, "question").to_string());
        lines.push(String::new());

        if let Some(options) = q.get("answerOptions").and_then(Value::as_array) {
            for opt in options {
                let marker = if opt.get("isCorrect").and_then(Value::as_bool).unwrap_or(false) {
                    "[x]"
                } else {
                    "[ ]"
                };
                lines.push(format!("- {} {}", marker, field_str(opt, "text")));
            }
        }

        let hint = field_str(q, "hint");
        if !hint.is_empty() {
            lines.push(String::new());
            lines.push(format!("**Hint:** {}", hint));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Render flashcards as front/back markdown.
pub fn format_flashcards_markdown(title: &str, cards: &[Value]) -> String {
    let mut lines = vec![format!("# {}", title), String::new()];

    for (i, card) in cards.iter().enumerate() {
        lines.push(format!("## Card {}", i + 1));
        lines.push(String::new());
        lines.push(format!("**Front:** {}", field_str(card, "f")));
        lines.push(String::new());
        lines.push(format!("**Back:** {}", field_str(card, "b")));
        lines.push(String::new());
        lines.push("---".to_string());
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Render extracted app data in the requested output format.
pub fn render_interactive(
    app_data: &Value,
    title: &str,
    format: InteractiveFormat,
    html_content: &str,
    is_quiz: bool,
) -> Result<String> {
    if format == InteractiveFormat::Html {
        return Ok(html_content.to_string());
    }

    if is_quiz {
        let questions = app_data
            .get("quiz")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        return Ok(match format {
            InteractiveFormat::Markdown => format_quiz_markdown(title, &questions),
            _ => serde_json::to_string_pretty(&json!({
                "title": title,
                "questions": questions,
            }))
            .map_err(NlmError::from)?,
        });
    }

    let cards = app_data
        .get("flashcards")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    Ok(match format {
        InteractiveFormat::Markdown => format_flashcards_markdown(title, &cards),
        _ => {
            // Normalized JSON: {"f", "b"} becomes {"front", "back"}.
            let normalized: Vec<Value> = cards
                .iter()
                .map(|c| {
                    json!({
                        "front": field_str(c, "f"),
                        "back": field_str(c, "b"),
                    })
                })
                .collect();
            serde_json::to_string_pretty(&json!({
                "title": title,
                "cards": normalized,
            }))
            .map_err(NlmError::from)?
        }
    })
}

fn field_str<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unescape_html_entities() {
        assert_eq!(
            unescape_html_entities("&quot;a&quot; &amp; &lt;b&gt; &#39;c&#39; &#x41;"),
            "\"a\" & <b> 'c' A"
        );
        // Dangling ampersands pass through untouched.
        assert_eq!(unescape_html_entities("AT&T & co"), "AT&T & co");
    }

    #[test]
    fn test_extract_from_primary_attribute() {
        let html = r#"<div data-app-data="{&quot;quiz&quot;:[{&quot;question&quot;:&quot;Q1&quot;}]}"></div>"#;
        let data = extract_app_data(html).unwrap();
        assert_eq!(data["quiz"][0]["question"], "Q1");
    }

    #[test]
    fn test_attribute_decode_matches_direct_json() {
        let direct: Value = serde_json::from_str(r#"{"flashcards":[{"f":"a<b","b":"c&d"}]}"#).unwrap();
        let html = r#"<main data-app-data="{&quot;flashcards&quot;:[{&quot;f&quot;:&quot;a&lt;b&quot;,&quot;b&quot;:&quot;c&amp;d&quot;}]}">"#;
        assert_eq!(extract_app_data(html).unwrap(), direct);
    }

    #[test]
    fn test_extract_from_script_tag_fallback() {
        let html = r#"<script id="application-data" type="application/json">{"quiz": []}</script>"#;
        let data = extract_app_data(html).unwrap();
        assert!(data["quiz"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_extract_from_spare_attribute_fallback() {
        let html = r#"<div data-state="{&quot;flashcards&quot;:[]}"></div>"#;
        let data = extract_app_data(html).unwrap();
        assert!(data.get("flashcards").is_some());
    }

    #[test]
    fn test_extract_failure_carries_preview() {
        let err = extract_app_data("<html><body>plain page</body></html>").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("plain page"));
        assert!(msg.contains("data-app-data"));
    }

    #[test]
    fn test_quiz_markdown_markers() {
        let questions = vec![serde_json::json!({
            "question": "2+2?",
            "answerOptions": [
                {"text": "3", "isCorrect": false},
                {"text": "4", "isCorrect": true}
            ],
            "hint": "count"
        })];
        let md = format_quiz_markdown("Math", &questions);
        assert!(md.contains("# Math"));
        assert!(md.contains("- [ ] 3"));
        assert!(md.contains("- [x] 4"));
        assert!(md.contains("**Hint:** count"));
    }

    #[test]
    fn test_flashcards_markdown_front_back() {
        let cards = vec![serde_json::json!({"f": "term", "b": "definition"})];
        let md = format_flashcards_markdown("Deck", &cards);
        assert!(md.contains("**Front:** term"));
        assert!(md.contains("**Back:** definition"));
    }

    #[test]
    fn test_render_normalized_flashcard_json() {
        let app_data = serde_json::json!({"flashcards": [{"f": "x", "b": "y"}]});
        let out =
            render_interactive(&app_data, "Deck", InteractiveFormat::Json, "<html>", false).unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["cards"][0]["front"], "x");
        assert_eq!(parsed["cards"][0]["back"], "y");
    }

    #[test]
    fn test_render_html_passthrough() {
        let out = render_interactive(
            &serde_json::json!({}),
            "t",
            InteractiveFormat::Html,
            "<html>raw</html>",
            true,
        )
        .unwrap();
        assert_eq!(out, "<html>raw</html>");
    }
}

// src/page/encoding.rs
// =============================================================================
// Character set handling.
//
// Most servers say which charset a page uses in the Content-Type header. When
// they don't, we look inside the page for one of:
//   <meta charset="gbk">
//   <meta http-equiv="Content-Type" content="text/html; charset=gbk">
// If that fails too, the body is read as UTF-8.
// =============================================================================

use encoding_rs::{Encoding, UTF_8};
use scraper::{Html, Selector};

use super::EncodingDetector;

/// Finds the charset declared by `<meta>` tags in `<head>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetaCharsetDetector;

impl EncodingDetector for MetaCharsetDetector {
    fn detect(&self, body: &str) -> Option<String> {
        let document = Html::parse_document(body);

        // Constant selector, known to be valid
        let selector = Selector::parse("head meta").unwrap();

        for meta in document.select(&selector) {
            let element = meta.value();
            if let Some(charset) = element.attr("charset") {
                let charset = charset.trim();
                if !charset.is_empty() {
                    return Some(charset.to_ascii_lowercase());
                }
            }
            if let Some(charset) = element.attr("content").and_then(charset_from_content) {
                return Some(charset);
            }
        }
        None
    }
}

// "text/html; charset=gb2312" -> Some("gb2312")
fn charset_from_content(content: &str) -> Option<String> {
    let lower = content.to_ascii_lowercase();
    let start = lower.find("charset=")? + "charset=".len();
    let charset: String = lower[start..]
        .trim_start_matches(|c| c == '"' || c == '\'')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
        .collect();
    (!charset.is_empty()).then_some(charset)
}

// Decodes a page body into text
//
// Parameters:
//   body: the raw bytes from the fetcher
//   label: a charset name like "gbk" or "utf-8" (None = assume UTF-8)
//
// Returns: the decoded text; unknown labels fall back to UTF-8 and invalid
// byte sequences become U+FFFD instead of failing the page
pub fn decode_body(body: &[u8], label: Option<&str>) -> String {
    let encoding = label
        .and_then(|label| Encoding::for_label(label.trim().as_bytes()))
        .unwrap_or(UTF_8);
    let (text, _, _) = encoding.decode(body);
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_meta_charset_attribute() {
        let html = r#"<html><head><meta charset="GBK"></head><body></body></html>"#;
        assert_eq!(MetaCharsetDetector.detect(html), Some("gbk".to_string()));
    }

    #[test]
    fn test_detects_http_equiv_content() {
        let html = r#"<html><head>
            <meta http-equiv="Content-Type" content="text/html; charset=ISO-8859-1">
        </head></html>"#;
        assert_eq!(
            MetaCharsetDetector.detect(html),
            Some("iso-8859-1".to_string())
        );
    }

    #[test]
    fn test_no_declaration() {
        let html = "<html><head><title>x</title></head></html>";
        assert_eq!(MetaCharsetDetector.detect(html), None);
    }

    #[test]
    fn test_decode_with_label() {
        // "中文" in GBK
        let gbk = [0xD6, 0xD0, 0xCE, 0xC4];
        assert_eq!(decode_body(&gbk, Some("gbk")), "中文");
    }

    #[test]
    fn test_decode_unknown_label_falls_back_to_utf8() {
        assert_eq!(decode_body("héllo".as_bytes(), Some("not-a-charset")), "héllo");
        assert_eq!(decode_body("héllo".as_bytes(), None), "héllo");
    }
}

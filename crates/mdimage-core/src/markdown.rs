//! Rendering an encoded payload as a Markdown image reference.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::encode::EncodedResult;

/// Alt text used when the caller does not supply one.
pub const DEFAULT_TAG: &str = "image";

/// Standard base64 (with padding) of the payload bytes.
pub fn to_base64(result: &EncodedResult) -> String {
    STANDARD.encode(&result.bytes)
}

/// `data:image/<subtype>;base64,<payload>`
pub fn data_uri(mime_subtype: &str, base64: &str) -> String {
    format!("data:image/{mime_subtype};base64,{base64}")
}

/// `![<tag>](data:image/<subtype>;base64,<payload>)`
///
/// Brackets and backslashes in `tag` are escaped so the alt text cannot
/// terminate the link early. An empty tag falls back to [`DEFAULT_TAG`].
pub fn markdown_image(tag: &str, mime_subtype: &str, base64: &str) -> String {
    let tag = if tag.trim().is_empty() { DEFAULT_TAG } else { tag };
    format!(
        "![{}]({})",
        escape_alt_text(tag),
        data_uri(mime_subtype, base64)
    )
}

fn escape_alt_text(tag: &str) -> String {
    let mut escaped = String::with_capacity(tag.len());
    for c in tag.chars() {
        match c {
            '\\' | '[' | ']' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\n' | '\r' => escaped.push(' '),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::TargetFormat;

    fn result(bytes: &[u8]) -> EncodedResult {
        EncodedResult {
            bytes: bytes.to_vec(),
            format: TargetFormat::Png,
            width: 1,
            height: 1,
            quality: None,
        }
    }

    #[test]
    fn test_to_base64() {
        assert_eq!(to_base64(&result(b"hello")), "aGVsbG8=");
    }

    #[test]
    fn test_data_uri() {
        assert_eq!(data_uri("png", "AAAA"), "data:image/png;base64,AAAA");
    }

    #[test]
    fn test_markdown_image_default_shape() {
        assert_eq!(
            markdown_image("image", "jpeg", "QUJD"),
            "![image](data:image/jpeg;base64,QUJD)"
        );
    }

    #[test]
    fn test_markdown_image_empty_tag_uses_default() {
        assert_eq!(
            markdown_image("  ", "gif", "R0lG"),
            "![image](data:image/gif;base64,R0lG)"
        );
    }

    #[test]
    fn test_markdown_image_escapes_brackets() {
        assert_eq!(
            markdown_image("a]b[c\\", "png", "x"),
            "![a\\]b\\[c\\\\](data:image/png;base64,x)"
        );
        assert_eq!(markdown_image("two\nlines", "png", "x"), "![two lines](data:image/png;base64,x)");
    }
}

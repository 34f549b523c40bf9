use std::borrow::Cow;

/// XML 1.0 valid char ranges:
/// - 0x09, 0x0A, 0x0D
/// - 0x20..=0xD7FF
/// - 0xE000..=0xFFFD
/// - 0x10000..=0x10FFFF
fn is_valid_xml_char(c: char) -> bool {
    matches!(
        c as u32,
        0x09 | 0x0A | 0x0D | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x10000..=0x10FFFF
    )
}

/// First escaping layer: makes user text safe as rich-text (HTML) label
/// content. Labels built from it may then carry intentional markup such as
/// `<b>` or `<br/>`.
pub fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if !is_valid_xml_char(c) {
            continue;
        }
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Second escaping layer: makes any string safe inside a double-quoted XML
/// attribute. Line breaks are written as character references so attribute
/// value normalization keeps them.
pub fn escape_attr(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if !is_valid_xml_char(c) {
            continue;
        }
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            '\t' => escaped.push_str("&#9;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Decodes XML entity and character references. Text with references
/// quick-xml cannot resolve (HTML named entities, stray `&`) is returned
/// unchanged.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    match quick_xml::escape::unescape(text) {
        Ok(decoded) => decoded,
        Err(err) => {
            log::trace!(error:% = err; "Keeping undecodable text verbatim");
            Cow::Borrowed(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn remove_invalid_control_chars() {
        let s = "A\u{0007}B\u{000C}C";
        assert_eq!(escape_markup(s), "ABC");
        assert_eq!(escape_attr(s), "ABC");
    }

    #[test]
    fn escape_special_markup_chars() {
        let s = r#"<tag attr="x&y">'z'"#;
        assert_eq!(
            escape_markup(s),
            "&lt;tag attr=&quot;x&amp;y&quot;&gt;&#39;z&#39;"
        );
    }

    #[test]
    fn attribute_layer_escapes_markup_output_again() {
        let label = escape_markup("A & B < C");
        assert_eq!(label, "A &amp; B &lt; C");
        assert_eq!(escape_attr(&label), "A &amp;amp; B &amp;lt; C");
    }

    #[test]
    fn attribute_layer_keeps_line_breaks() {
        assert_eq!(escape_attr("a\nb\tc"), "a&#10;b&#9;c");
    }

    #[test]
    fn decode_entities_falls_back_to_raw_text() {
        assert_eq!(decode_entities("a&amp;b"), "a&b");
        assert_eq!(decode_entities("fill=&#35;fff;"), "fill=#fff;");
        assert_eq!(decode_entities("a&nbsp;b"), "a&nbsp;b");
        assert_eq!(decode_entities("broken & text"), "broken & text");
    }

    #[test]
    fn double_escaped_label_decodes_in_reverse_order() {
        let original = "Tom & Jerry <cartoon>";
        let encoded = escape_attr(&escape_markup(original));
        let once = quick_xml::escape::unescape(&encoded).unwrap();
        let twice = quick_xml::escape::unescape(&once).unwrap();
        assert_eq!(twice, original);
    }

    proptest! {
        #[test]
        fn double_escape_roundtrips(text in "[ -~\u{00e0}-\u{00ff}\n]{0,64}") {
            let encoded = escape_attr(&escape_markup(&text));
            prop_assert!(!encoded.contains('<'));
            prop_assert!(!encoded.contains('"'));
            let once = quick_xml::escape::unescape(&encoded).unwrap().into_owned();
            let twice = quick_xml::escape::unescape(&once).unwrap().into_owned();
            prop_assert_eq!(twice, text);
        }
    }
}

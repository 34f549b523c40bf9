//! draw.io style strings: harvesting them from corpora, storing them in a
//! library, and resolving references against that library.

pub mod harvest;
pub mod library;
mod scan;

use std::sync::LazyLock;

use regex::Regex;

pub use harvest::{HarvestReport, StyleHarvester, classify, insert_unique, normalize, sanitize_key};
pub use library::{StyleLibrary, ensure_flag};
pub use scan::{RawCell, extract_cells};

static STYLE_PAIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([a-zA-Z0-9_.]+)=([^;]*);?").expect("style pair pattern is valid")
});

/// Splits a style string into its `key=value` pairs, in source order.
///
/// Bare flags without a value (`ellipse;`) carry no attribute and are skipped.
pub(crate) fn style_pairs(style: &str) -> Vec<(&str, &str)> {
    STYLE_PAIR_RE
        .captures_iter(style)
        .filter_map(|caps| {
            let key = caps.get(1)?.as_str();
            let value = caps.get(2).map_or("", |m| m.as_str());
            Some((key, value))
        })
        .collect()
}

/// Value of the pair named `key`. A later pair overrides an earlier one.
pub(crate) fn style_value<'a>(style: &'a str, key: &str) -> Option<&'a str> {
    style_pairs(style)
        .into_iter()
        .rev()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_in_source_order() {
        let pairs = style_pairs("rounded=1;whiteSpace=wrap;html=1;");
        assert_eq!(
            pairs,
            vec![("rounded", "1"), ("whiteSpace", "wrap"), ("html", "1")]
        );
    }

    #[test]
    fn bare_flags_are_skipped() {
        let pairs = style_pairs("ellipse;whiteSpace=wrap;");
        assert_eq!(pairs, vec![("whiteSpace", "wrap")]);
    }

    #[test]
    fn value_lookup_without_trailing_separator() {
        assert_eq!(style_value("shape=cylinder", "shape"), Some("cylinder"));
        assert_eq!(style_value("rounded=0;", "shape"), None);
    }

    #[test]
    fn later_pair_wins() {
        assert_eq!(style_value("shape=rect;shape=ellipse;", "shape"), Some("ellipse"));
    }
}

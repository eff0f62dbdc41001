use regex::Regex;
use std::sync::LazyLock;

static RE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("valid url regex"));
static RE_MARKDOWN_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(.*?)\]\((.*?)\)").expect("valid link regex"));
static RE_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static RE_NON_SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"));

const MAX_SLUG_LEN: usize = 90;

/// Strip URLs and markdown link targets and collapse whitespace. Empty output means discard.
pub fn normalize(text: &str) -> String {
    let stripped = RE_URL.replace_all(text, "");
    let collapsed = RE_MARKDOWN_LINK.replace_all(&stripped, "$1");
    // Collapsing a link can splice a scheme back together, e.g. "http[:](x)//host".
    let stripped = RE_URL.replace_all(&collapsed, "");
    RE_WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}

/// Bodies connectors emit in place of moderated or deleted comments.
pub fn is_placeholder(text: &str) -> bool {
    matches!(text, "[deleted]" | "[removed]")
}

pub fn slugify(value: &str) -> String {
    let lower = value.to_lowercase();
    let slug = RE_NON_SLUG.replace_all(&lower, "-");
    let slug: String = slug.trim_matches('-').chars().take(MAX_SLUG_LEN).collect();
    if slug.is_empty() {
        "issue".to_string()
    } else {
        slug
    }
}

/// Capitalize the first letter of every space-separated word, lowercase the rest.
pub fn title_case(value: &str) -> String {
    value
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_urls_and_whitespace() {
        let input = "  Check   https://example.com/page?x=1 for\n\tdetails ";
        assert_eq!(normalize(input), "Check for details");
    }

    #[test]
    fn test_normalize_collapses_markdown_links() {
        assert_eq!(normalize("see [the docs](docs/page) now"), "see the docs now");
    }

    #[test]
    fn test_normalize_spliced_scheme_is_removed() {
        let out = normalize("http[:](x)//evil.example rest");
        assert!(!out.contains("http://"));
        assert_eq!(out, "rest");
    }

    #[test]
    fn test_normalize_never_leaves_urls_or_double_spaces() {
        let samples = [
            "",
            "   ",
            "https://a.b",
            "a  http://x.y  b https://z",
            "[label](https://target) and [x](y)",
            "hthttps://nested.example ok",
            "tabs\t\tand\n\nnewlines",
        ];
        for sample in samples {
            let out = normalize(sample);
            assert!(!out.contains("http://") && !out.contains("https://"), "{:?}", out);
            assert!(!out.contains("  "), "{:?}", out);
            assert_eq!(out, out.trim());
        }
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert_eq!(normalize(" \n\t "), "");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Invoice Delays!"), "invoice-delays");
        assert_eq!(slugify("  --  "), "issue");
        assert_eq!(slugify(&"a".repeat(200)).len(), 90);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("late invoice payments"), "Late Invoice Payments");
        assert_eq!(title_case("SLOW shipping"), "Slow Shipping");
    }
}

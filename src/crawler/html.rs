use std::collections::HashSet;
use std::sync::LazyLock;
use regex::{Captures, Regex};
use url::Url;

/// Comments and elements whose content is never page text or navigation
static BLOCK_ELEMENTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<!--.*?-->|<head\b.*?</head\s*>|<style\b.*?</style\s*>|<script\b.*?</script\s*>|<noscript\b.*?</noscript\s*>|<svg\b.*?</svg\s*>",
    )
    .expect("block element pattern is valid")
});

static TAGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<[^>]*>").expect("tag pattern is valid")
});

static ENTITIES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z][a-zA-Z0-9]*);").expect("entity pattern is valid")
});

/// `<a ... href=...>` with a double-quoted, single-quoted or bare value
static ANCHOR_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\s[^>]*?\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>"']+))"#)
        .expect("anchor pattern is valid")
});

/// Remove comments and the `head`, `style`, `script`, `noscript` and `svg`
/// elements together with their content.
pub fn strip_block_elements(html: &str) -> String {
    BLOCK_ELEMENTS.replace_all(html, " ").into_owned()
}

/// Replace every tag with a space.
pub fn strip_tags(html: &str) -> String {
    TAGS.replace_all(html, " ").into_owned()
}

/// Decode numeric and common named entities; unknown entities are removed.
pub fn decode_entities(text: &str) -> String {
    ENTITIES
        .replace_all(text, |caps: &Captures| decode_entity(&caps[1]).unwrap_or_default())
        .into_owned()
}

fn decode_entity(entity: &str) -> Option<String> {
    let decoded = match entity {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        _ => {
            let code = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                entity.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)?
        }
    };
    Some(decoded.to_string())
}

/// Plain text of a page: block elements and tags stripped, entities decoded.
pub fn strip_html(html: &str) -> String {
    decode_entities(&strip_tags(&strip_block_elements(html)))
}

/// Absolute http(s) targets of the anchors in `html`, resolved against
/// `base`, without fragments, in first-seen order and without duplicates.
pub fn links(base: &Url, html: &str) -> Vec<Url> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();

    for caps in ANCHOR_HREF.captures_iter(html) {
        let Some(href) = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)) else {
            continue;
        };

        let Ok(mut link) = base.join(href.as_str().trim()) else {
            tracing::trace!("Skipping malformed link {}", href.as_str());
            continue;
        };

        if link.scheme() != "http" && link.scheme() != "https" {
            continue;
        }

        link.set_fragment(None);
        if seen.insert(link.clone()) {
            found.push(link);
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_block_elements() {
        let html = "<html><HEAD><title>t</title></HEAD><header>keep</header>\
                    <!-- <a href=\"/hidden\">x</a> --><script type=\"x\">var a;</script>\
                    <style>p {}</style><p>body</p></html>";
        let stripped = strip_block_elements(html);

        assert!(stripped.contains("keep"));
        assert!(stripped.contains("body"));
        assert!(!stripped.contains("hidden"));
        assert!(!stripped.contains("var a"));
        assert!(!stripped.contains("title"));
    }

    #[test]
    fn test_strip_html_text() {
        let text = strip_html("<p>Fish&amp;Chips</p><b>caf&#233;</b>&copy;<i>x&#x41;</i>");
        let words: Vec<&str> = text.split_whitespace().collect();

        assert_eq!(words, vec!["Fish&Chips", "café", "xA"]);
    }

    #[test]
    fn test_links_resolved_and_deduplicated() {
        let base = Url::parse("https://example.com/docs/index.html").unwrap();
        let html = r##"
            <a href="page.html#top">one</a>
            <A class="x" HREF='/root.html'>two</A>
            <a href=page.html>again</a>
            <a href="mailto:someone@example.com">mail</a>
            <a href="http://other.org/">three</a>
            <link href="style.css">
        "##;

        let found: Vec<String> = links(&base, html).into_iter().map(String::from).collect();
        assert_eq!(
            found,
            vec![
                "https://example.com/docs/page.html",
                "https://example.com/root.html",
                "http://other.org/",
            ]
        );
    }
}

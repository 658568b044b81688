//! HTML word counting
//!
//! Markup is stripped before counting: script and style bodies and comments
//! are dropped, block-level tags become a space, inline tags vanish, and
//! non-breaking spaces count as whitespace. Tokens are whatever remains
//! between whitespace runs; there is no language-specific segmentation.

use regex::Regex;
use std::sync::LazyLock;

static SCRIPT_STYLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:script|style)\b[^>]*>.*?</(?:script|style)\s*>").expect("script regex")
});

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment regex"));

static BLOCK_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)</?(?:address|article|aside|blockquote|br|dd|div|dl|dt|figcaption|figure|footer|h[1-6]|header|hr|li|main|nav|ol|p|pre|section|table|tbody|td|tfoot|th|thead|tr|ul)\b[^>]*>",
    )
    .expect("block tag regex")
});

static ANY_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[a-zA-Z][^>]*>").expect("tag regex"));

static NBSP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)&nbsp;|&#160;|&#xa0;").expect("nbsp regex"));

/// Visible text of an HTML fragment with whitespace collapsed
pub fn plain_text(html: &str) -> String {
    let text = SCRIPT_STYLE_RE.replace_all(html, " ");
    let text = COMMENT_RE.replace_all(&text, " ");
    let text = BLOCK_TAG_RE.replace_all(&text, " ");
    let text = ANY_TAG_RE.replace_all(&text, "");
    let text = NBSP_RE.replace_all(&text, " ");

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Number of whitespace-separated words in the visible text
pub fn count_words(html: &str) -> u32 {
    let count = plain_text(html).split_whitespace().count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_and_whitespace() {
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("   \n\t "), 0);
        assert_eq!(count_words("<p> </p><div>&nbsp;</div>"), 0);
    }

    #[test]
    fn test_basic_html() {
        let html = "<h2>Intro</h2><p>Heat pumps move heat.</p><p>They are efficient.</p>";
        assert_eq!(count_words(html), 8);
    }

    #[test]
    fn test_block_tags_separate_words() {
        assert_eq!(count_words("<p>one</p><p>two</p>"), 2);
        assert_eq!(count_words("one<br>two<br/>three"), 3);
        assert_eq!(count_words("<li>a</li><li>b</li>"), 2);
    }

    #[test]
    fn test_block_tag_inside_word_splits_it() {
        assert_eq!(count_words("foobar"), 1);
        assert_eq!(count_words("foo<div>bar</div>"), 2);
        assert_eq!(count_words("foo<span>bar</span>"), 1);
    }

    #[test]
    fn test_inline_tags_do_not_split() {
        assert_eq!(count_words("<strong>Wärme</strong>pumpe"), 1);
        assert_eq!(count_words("a <em>quick</em> <a href=\"/x\">brown</a> fox"), 4);
    }

    #[test]
    fn test_script_style_and_comments_removed() {
        let html = "<style>p { color: red; }</style><p>Visible text</p><script>var a = 1;</script><!-- hidden words here -->";
        assert_eq!(count_words(html), 2);
    }

    #[test]
    fn test_compound_words_count_once() {
        assert_eq!(count_words("<p>Donaudampfschifffahrtsgesellschaft ist lang</p>"), 3);
    }

    #[test]
    fn test_nbsp_is_whitespace() {
        assert_eq!(count_words("one&nbsp;two&#160;three\u{a0}four"), 4);
    }

    #[test]
    fn test_lone_angle_bracket_is_text() {
        assert_eq!(count_words("<p>a < b and c > d</p>"), 7);
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(plain_text("<h2>Title</h2>\n<p>Body   text</p>"), "Title Body text");
    }

    fn words() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-zA-Z0-9äöüß]{1,12}", 0..40)
    }

    proptest! {
        #[test]
        fn prop_plain_words_counted(words in words()) {
            let text = words.join(" ");
            prop_assert_eq!(count_words(&text) as usize, words.len());
        }

        #[test]
        fn prop_whitespace_nodes_do_not_change_count(
            words in words(),
            insert_at in 0usize..40,
            ws in "[ \t\n]{1,5}",
        ) {
            let base = words.join(" ");
            let mut parts: Vec<String> = words.clone();
            let idx = insert_at.min(parts.len());
            parts.insert(idx, format!("<span>{}</span>", ws));
            let with_ws = parts.join(" ");
            prop_assert_eq!(count_words(&with_ws), count_words(&base));
        }

        /// Wraps whole words only. A block tag inside a word splits it
        /// (`foo<div>bar</div>` counts 2), so mid-word wrapping is not invariant.
        #[test]
        fn prop_wrapping_in_tags_does_not_change_count(
            words in words(),
            start in 0usize..40,
            len in 0usize..40,
            tag in prop::sample::select(vec!["p", "strong", "em", "div", "h2", "span", "li"]),
        ) {
            let base = words.join(" ");
            let start = start.min(words.len());
            let end = (start + len).min(words.len());

            let mut pieces: Vec<String> = Vec::new();
            pieces.extend(words[..start].iter().cloned());
            pieces.push(format!("<{tag}>{}</{tag}>", words[start..end].join(" ")));
            pieces.extend(words[end..].iter().cloned());
            let wrapped = pieces.join(" ");

            prop_assert_eq!(count_words(&wrapped), count_words(&base));
        }
    }
}

use std::sync::LazyLock;

use regex::Regex;

// Whitespace includes the ASCII separators U+001C..U+001F on top of Unicode White_Space.
static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"http[^\s\x1c-\x1f]+|www[^\s\x1c-\x1f]+|https[^\s\x1c-\x1f]+")
        .expect("valid url pattern")
});
static NON_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z\s\x1c-\x1f]").expect("valid non-letter pattern"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\x1c-\x1f]+").expect("valid whitespace pattern"));

/// Unicode White_Space plus the ASCII file, group, record and unit separators.
///
/// This is the set of characters message cleaning treats as word breaks, and the
/// set a blank message may consist of.
#[must_use]
pub fn is_whitespace(c: char) -> bool {
    c.is_whitespace() || ('\x1c'..='\x1f').contains(&c)
}

fn normalize_once(text: &str) -> String {
    let text = text.to_lowercase();
    let text = URL.replace_all(&text, "");
    let text = NON_LETTER.replace_all(&text, "");
    WHITESPACE
        .replace_all(&text, " ")
        .trim_matches(is_whitespace)
        .to_owned()
}

/// Normalize a raw message into lower-case ASCII words separated by single spaces.
///
/// Lower-cases, drops anything that looks like a URL (`http…`, `https…`, `www…` up to
/// the next whitespace), strips every character that is not `a-z` or whitespace, then
/// collapses whitespace runs and trims.
///
/// Stripping can glue fragments into a new URL-like word (`"ht-tpabc"` becomes
/// `"httpabc"`), so the passes repeat until the output stops changing. Every pass
/// either shrinks the text or leaves it as is, so this terminates.
///
/// ```rust
/// use spamsens_preprocessing::pre_processor::normalize;
///
/// assert_eq!(normalize("Check WWW.EXAMPLE.com NOW!!"), "check now");
/// assert_eq!(normalize(""), "");
/// ```
#[must_use]
pub fn normalize(text: &str) -> String {
    let mut current = normalize_once(text);
    loop {
        let next = normalize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

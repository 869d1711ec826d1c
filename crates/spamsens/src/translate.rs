//! Translation of raw messages through an external service.
//!
//! Failures here are always recoverable: they are reported to the user and never
//! touch classification state.

use std::{fmt, io::Read, str::FromStr, sync::LazyLock, time::Duration};

use regex::Regex;
use spamsens_preprocessing::pre_processor::is_whitespace;
use thiserror::Error;
use tracing::{debug, warn};

/// Longest input (in characters, after trimming) the service accepts.
pub const MAX_CHARS: usize = 5000;

pub const DEFAULT_ENDPOINT: &str = "https://translate.google.com/m";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Target languages offered for translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Hindi,
    Bengali,
    Tamil,
    Telugu,
    Marathi,
    Gujarati,
    Malayalam,
    Punjabi,
    Urdu,
}

impl Language {
    pub const ALL: [Self; 9] = [
        Self::Hindi,
        Self::Bengali,
        Self::Tamil,
        Self::Telugu,
        Self::Marathi,
        Self::Gujarati,
        Self::Malayalam,
        Self::Punjabi,
        Self::Urdu,
    ];

    /// ISO 639-1 code sent to the translation service.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Hindi => "hi",
            Self::Bengali => "bn",
            Self::Tamil => "ta",
            Self::Telugu => "te",
            Self::Marathi => "mr",
            Self::Gujarati => "gu",
            Self::Malayalam => "ml",
            Self::Punjabi => "pa",
            Self::Urdu => "ur",
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hindi => "Hindi",
            Self::Bengali => "Bengali",
            Self::Tamil => "Tamil",
            Self::Telugu => "Telugu",
            Self::Marathi => "Marathi",
            Self::Gujarati => "Gujarati",
            Self::Malayalam => "Malayalam",
            Self::Punjabi => "Punjabi",
            Self::Urdu => "Urdu",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported language {0:?}")]
pub struct UnsupportedLanguage(pub String);

/// Accepts either the display name or the code, ignoring case.
impl FromStr for Language {
    type Err = UnsupportedLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|lang| {
                lang.code().eq_ignore_ascii_case(wanted) || lang.name().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| UnsupportedLanguage(s.to_owned()))
    }
}

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("Please enter a message first!")]
    EmptyInput,

    #[error("text is {len} characters long; at most {max} can be translated", max = MAX_CHARS - 1)]
    TooLong { len: usize },

    #[error("translation service is rate limiting requests, try again later")]
    TooManyRequests,

    #[error("translation service answered with HTTP status {0}")]
    Status(u16),

    #[error("translation request failed")]
    Http(#[source] ureq::Error),

    #[error("failed to read translation response")]
    Io(#[from] std::io::Error),

    #[error("no translation found in the service response")]
    NotFound,
}

impl From<ureq::Error> for TranslateError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(429) => Self::TooManyRequests,
            ureq::Error::StatusCode(code) => Self::Status(code),
            other => Self::Http(other),
        }
    }
}

/// Translates text from an auto-detected source language.
pub trait Translator: Send + Sync {
    fn translate(&self, text: &str, target: Language) -> Result<String, TranslateError>;
}

/// Trim `text` and check it is something the service will accept.
pub fn validate_input(text: &str) -> Result<&str, TranslateError> {
    let text = text.trim_matches(is_whitespace);
    if text.is_empty() {
        return Err(TranslateError::EmptyInput);
    }
    let len = text.chars().count();
    if len >= MAX_CHARS {
        return Err(TranslateError::TooLong { len });
    }
    Ok(text)
}

/// Client for Google Translate's lightweight mobile page.
pub struct GoogleTranslator {
    agent: ureq::Agent,
    endpoint: String,
}

impl GoogleTranslator {
    #[must_use]
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT, DEFAULT_TIMEOUT)
    }

    #[must_use]
    pub fn with_endpoint(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            agent,
            endpoint: endpoint.into(),
        }
    }
}

impl Default for GoogleTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl Translator for GoogleTranslator {
    fn translate(&self, text: &str, target: Language) -> Result<String, TranslateError> {
        let text = validate_input(text)?;
        debug!(
            target = target.code(),
            chars = text.chars().count(),
            "Requesting translation"
        );

        let mut html = String::new();
        self.agent
            .get(&self.endpoint)
            .query("sl", "auto")
            .query("tl", target.code())
            .query("q", text)
            .call()
            .inspect_err(|err| warn!(%err, "Translation request failed"))?
            .into_body()
            .into_reader()
            .read_to_string(&mut html)?;

        extract_translation(&html).ok_or(TranslateError::NotFound)
    }
}

static RESULT_CONTAINER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<div[^>]*class="(?:result-container|t0)"[^>]*>(.*?)</div>"#)
        .expect("valid result container pattern")
});
static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("valid entity pattern")
});

/// Pull the translated text out of the mobile page and decode HTML entities.
pub fn extract_translation(html: &str) -> Option<String> {
    let inner = RESULT_CONTAINER.captures(html)?.get(1)?.as_str();
    let decoded = ENTITY.replace_all(inner, |caps: &regex::Captures<'_>| {
        let entity = &caps[1];
        decode_entity(entity).map_or_else(|| caps[0].to_owned(), String::from)
    });
    let translated = decoded.trim();
    (!translated.is_empty()).then(|| translated.to_owned())
}

fn decode_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }
    if let Some(dec) = entity.strip_prefix('#') {
        return dec.parse().ok().and_then(char::from_u32);
    }
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_codes() {
        let codes = Language::ALL.map(|lang| lang.code());
        assert_eq!(
            codes,
            ["hi", "bn", "ta", "te", "mr", "gu", "ml", "pa", "ur"]
        );
    }

    #[test]
    fn test_language_from_name_or_code() {
        assert_eq!("Hindi".parse::<Language>(), Ok(Language::Hindi));
        assert_eq!("bengali".parse::<Language>(), Ok(Language::Bengali));
        assert_eq!(" TA ".parse::<Language>(), Ok(Language::Tamil));
        assert_eq!("ur".parse::<Language>(), Ok(Language::Urdu));
        assert_eq!(
            "fr".parse::<Language>(),
            Err(UnsupportedLanguage("fr".into()))
        );
    }

    #[test]
    fn test_validate_input() {
        assert!(matches!(validate_input("  "), Err(TranslateError::EmptyInput)));
        assert!(matches!(validate_input("\x1f\n"), Err(TranslateError::EmptyInput)));
        assert_eq!(validate_input("  hello ").unwrap(), "hello");
        let long = "a".repeat(MAX_CHARS);
        assert!(matches!(
            validate_input(&long),
            Err(TranslateError::TooLong { len: MAX_CHARS })
        ));
        assert!(validate_input(&long[1..]).is_ok());
    }

    #[test]
    fn test_length_counts_chars_not_bytes() {
        let accented = "é".repeat(MAX_CHARS - 1);
        assert!(accented.len() > MAX_CHARS);
        assert_eq!(validate_input(&accented).unwrap().chars().count(), MAX_CHARS - 1);
    }

    #[test]
    fn test_extracts_result_container() {
        let html = r#"<html><body><div class="other">x</div>
            <div class="result-container">नमस्ते, आप कैसे हैं?</div>
            <div class="footer">y</div></body></html>"#;
        assert_eq!(
            extract_translation(html).as_deref(),
            Some("नमस्ते, आप कैसे हैं?")
        );
    }

    #[test]
    fn test_decodes_entities() {
        let html = concat!(
            r#"<div class="result-container">"#,
            "Tom &amp; Jerry&#39;s &quot;show&quot; &#x263A; &bogus;",
            "</div>"
        );
        assert_eq!(
            extract_translation(html).as_deref(),
            Some("Tom & Jerry's \"show\" \u{263A} &bogus;")
        );
    }

    #[test]
    fn test_missing_or_empty_result() {
        assert_eq!(extract_translation("<html>rate limited</html>"), None);
        assert_eq!(
            extract_translation(r#"<div class="result-container">   </div>"#),
            None
        );
    }

    #[test]
    fn test_status_codes_map_to_errors() {
        assert!(matches!(
            TranslateError::from(ureq::Error::StatusCode(429)),
            TranslateError::TooManyRequests
        ));
        assert!(matches!(
            TranslateError::from(ureq::Error::StatusCode(503)),
            TranslateError::Status(503)
        ));
    }

    #[test]
    fn test_unreachable_endpoint_is_recoverable() {
        let translator =
            GoogleTranslator::with_endpoint("http://127.0.0.1:9/m", Duration::from_millis(500));
        assert!(matches!(
            translator.translate("hello", Language::Hindi),
            Err(TranslateError::Http(_))
        ));
        assert!(matches!(
            translator.translate("", Language::Hindi),
            Err(TranslateError::EmptyInput)
        ));
    }
}

use core::fmt;

use spamsens_preprocessing::pre_processor::{is_whitespace, normalize};
use tracing::debug;

use crate::{
    error::MessageError,
    model::{FeatureExtractor, LabelPredictor},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Label {
    Ham,
    Spam,
}

impl Label {
    /// Returns true if this label is Spam
    #[must_use]
    pub fn is_spam(&self) -> bool {
        matches!(self, Self::Spam)
    }

    /// Returns true if this label is Ham
    #[must_use]
    pub fn is_ham(&self) -> bool {
        matches!(self, Self::Ham)
    }

    /// Text shown to the user for a classification result.
    #[must_use]
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Ham => "Ham (Not Spam)",
            Self::Spam => "Spam",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ham => write!(f, "Ham"),
            Self::Spam => write!(f, "Spam"),
        }
    }
}

/// `0` is ham; every other raw classifier output is spam.
impl From<i64> for Label {
    fn from(raw: i64) -> Self {
        if raw == 0 { Self::Ham } else { Self::Spam }
    }
}

impl From<Label> for i64 {
    fn from(label: Label) -> Self {
        match label {
            Label::Ham => 0,
            Label::Spam => 1,
        }
    }
}

/// A raw, non-blank message supplied by a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message(String);

impl Message {
    /// Wrap raw text, rejecting empty or whitespace-only input.
    pub fn new(text: impl Into<String>) -> Result<Self, MessageError> {
        let text = text.into();
        if text.chars().all(is_whitespace) {
            return Err(MessageError::Empty);
        }
        Ok(Self(text))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

}

impl TryFrom<String> for Message {
    type Error = MessageError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        Self::new(text)
    }
}

impl TryFrom<&str> for Message {
    type Error = MessageError;

    fn try_from(text: &str) -> Result<Self, Self::Error> {
        Self::new(text)
    }
}

impl AsRef<str> for Message {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize, vectorize and predict a batch of messages.
///
/// Returns each normalized text alongside its label.
pub(crate) fn run<V, C>(
    vectorizer: &V,
    classifier: &C,
    messages: &[Message],
) -> Vec<(String, Label)>
where
    V: FeatureExtractor + ?Sized,
    C: LabelPredictor + ?Sized,
{
    let normalized = messages
        .iter()
        .map(|message| normalize(message.as_str()))
        .collect::<Vec<_>>();
    let borrowed = normalized.iter().map(String::as_str).collect::<Vec<_>>();

    let features = vectorizer.transform(&borrowed);
    let raw = classifier.predict(&features);
    debug!(num_messages = messages.len(), ?raw, "Classified messages");

    normalized
        .into_iter()
        .zip(raw)
        .map(|(text, raw)| (text, Label::from(raw)))
        .collect()
}

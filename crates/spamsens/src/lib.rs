//! # spamsens
//!
//! Classifies short text messages as spam or ham using a TF-IDF vectorizer and a
//! multinomial Naive Bayes model, with optional translation and a demo login flow.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spamsens::{Message, SpamClassifier};
//!
//! // Reads tfidf_vectorizer.bin and spam_classifier.bin from the given directory
//! let classifier = SpamClassifier::load(".")?;
//!
//! let message = Message::new("WIN $$$ FREE CASH now click http://bit.ly/x")?;
//! let label = classifier.classify(&message);
//! println!("{}", label.describe());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Training
//!
//! ```rust,no_run
//! use spamsens::train::{self, Corpus};
//!
//! let corpus = Corpus::from_path("SMSSpamCollection")?;
//! let classifier = train::fit(&corpus, &train::TrainOptions::default())?;
//! classifier.save("model")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#[cfg(feature = "cli")]
pub mod cli;

pub mod app;
pub mod auth;
mod error;
pub mod model;
pub mod pages;
mod pipeline;
pub mod train;
pub mod translate;

use std::path::Path;

pub use error::{ArtifactKind, MessageError, ModelError, TrainError};
pub use pipeline::{Label, Message};
pub use spamsens_preprocessing::pre_processor::{TfidfVectorizer, VectorizerParams, normalize};

use crate::model::{ArtifactPaths, FeatureExtractor, LabelPredictor, MultinomialNb};

/// A loaded vectorizer + classifier pair.
///
/// Immutable once built, so a single instance can be shared across threads
/// (wrap it in an `Arc`) and reused for every request.
///
/// # Examples
///
/// ```rust,no_run
/// use spamsens::{Label, Message, SpamClassifier};
///
/// let classifier = SpamClassifier::load(".")?;
/// let label = classifier.classify(&Message::new("Are we still meeting at 5pm today?")?);
/// assert_eq!(label, Label::Ham);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct SpamClassifier<V = TfidfVectorizer, C = MultinomialNb> {
    vectorizer: V,
    classifier: C,
}

impl SpamClassifier {
    /// Load both artifacts from `model_dir`.
    ///
    /// Fails if either file is missing, unreadable or undecodable, or if the pair
    /// does not fit together. No classifier is returned from a partial model.
    pub fn load(model_dir: impl AsRef<Path>) -> Result<Self, ModelError> {
        let (vectorizer, classifier) = ArtifactPaths::in_dir(model_dir).load()?;
        Self::new(vectorizer, classifier)
    }

    /// Write both artifacts into `model_dir`, creating it if needed.
    pub fn save(&self, model_dir: impl AsRef<Path>) -> Result<(), ModelError> {
        ArtifactPaths::in_dir(model_dir).save(&self.vectorizer, &self.classifier)
    }
}

impl<V: FeatureExtractor, C: LabelPredictor> SpamClassifier<V, C> {
    /// Pair a vectorizer with a classifier.
    ///
    /// The classifier must accept exactly the vectorizer's feature width, and its
    /// labels must include `0` (ham) and at least one non-zero (spam) value.
    pub fn new(vectorizer: V, classifier: C) -> Result<Self, ModelError> {
        if vectorizer.num_features() != classifier.num_features() {
            return Err(ModelError::FeatureMismatch {
                vectorizer: vectorizer.num_features(),
                classifier: classifier.num_features(),
            });
        }
        let classes = classifier.classes();
        if !classes.contains(&0) || !classes.iter().any(|&c| c != 0) {
            return Err(ModelError::LabelConvention(classes.to_vec()));
        }
        Ok(Self {
            vectorizer,
            classifier,
        })
    }

    /// Classify a single message.
    pub fn classify(&self, message: &Message) -> Label {
        self.normalize_and_classify(message).1
    }

    /// Classify a message and also return the normalized text the model saw.
    pub fn normalize_and_classify(&self, message: &Message) -> (String, Label) {
        pipeline::run(&self.vectorizer, &self.classifier, std::slice::from_ref(message))
            .pop()
            .expect("one result per message")
    }

    /// Classify several messages in one vectorizer pass.
    pub fn classify_batch(&self, messages: &[Message]) -> Vec<Label> {
        pipeline::run(&self.vectorizer, &self.classifier, messages)
            .into_iter()
            .map(|(_, label)| label)
            .collect()
    }

    pub fn vectorizer(&self) -> &V {
        &self.vectorizer
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }
}


#[cfg(test)]
mod tests {
    use sprs::CsMat;

    use super::*;

    fn message(text: &str) -> Message {
        Message::new(text).unwrap()
    }

    #[test]
    fn test_spam_end_to_end() {
        let classifier = test_support::classifier();
        let text = message("WIN $$$ FREE CASH now click http://bit.ly/x");
        let (normalized, label) = classifier.normalize_and_classify(&text);
        assert_eq!(normalized, "win free cash now click");
        assert_eq!(label, Label::Spam);
    }

    #[test]
    fn test_ham_end_to_end() {
        let classifier = test_support::classifier();
        let (normalized, label) =
            classifier.normalize_and_classify(&message("Are we still meeting at 5pm today?"));
        assert_eq!(normalized, "are we still meeting at pm today");
        assert_eq!(label, Label::Ham);
    }

    #[test]
    fn test_letterless_message_is_deterministic() {
        let classifier = test_support::classifier();
        let first = classifier.normalize_and_classify(&message("$$$ 12345 !!!"));
        assert_eq!(first.0, "");
        for _ in 0..5 {
            assert_eq!(classifier.normalize_and_classify(&message("$$$ 12345 !!!")), first);
        }
        // More ham than spam in the fixture, so the prior wins on an empty feature row
        assert_eq!(first.1, Label::Ham);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let classifier = test_support::classifier();
        let text = message("free lunch today?");
        let label = classifier.classify(&text);
        for _ in 0..10 {
            assert_eq!(classifier.classify(&text), label);
        }
    }

    #[test]
    fn test_batch_matches_single() {
        let classifier = test_support::classifier();
        let messages = test_support::SPAM
            .iter()
            .chain(test_support::HAM)
            .map(|text| message(text))
            .collect::<Vec<_>>();
        let batch = classifier.classify_batch(&messages);
        let single = messages
            .iter()
            .map(|m| classifier.classify(m))
            .collect::<Vec<_>>();
        assert_eq!(batch, single);
        assert!(batch[..test_support::SPAM.len()].iter().all(Label::is_spam));
        assert!(batch[test_support::SPAM.len()..].iter().all(Label::is_ham));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let trained = test_support::classifier();
        trained.save(dir.path()).unwrap();

        let loaded = SpamClassifier::load(dir.path()).unwrap();
        let text = message("WIN $$$ FREE CASH now click http://bit.ly/x");
        assert_eq!(loaded.classify(&text), trained.classify(&text));
        assert_eq!(
            loaded.vectorizer().num_features(),
            trained.vectorizer().num_features()
        );
    }

    #[test]
    fn test_missing_artifacts_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = SpamClassifier::load(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Read {
                kind: ArtifactKind::Vectorizer,
                ..
            }
        ));
    }

    #[test]
    fn test_half_written_model_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        test_support::classifier().save(dir.path()).unwrap();
        std::fs::write(dir.path().join(model::CLASSIFIER_FILENAME), b"truncated").unwrap();

        let err = SpamClassifier::load(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Decode {
                kind: ArtifactKind::Classifier,
                ..
            }
        ));
    }

    #[test]
    fn test_trailing_bytes_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        test_support::classifier().save(dir.path()).unwrap();
        let path = dir.path().join(model::VECTORIZER_FILENAME);
        let mut bytes = std::fs::read(&path).unwrap();
        bytes.extend_from_slice(b"GARBAGE-APPENDED");
        std::fs::write(&path, bytes).unwrap();

        let err = SpamClassifier::load(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Decode {
                kind: ArtifactKind::Vectorizer,
                ..
            }
        ));
    }

    /// Classifier double returning a fixed raw label for every row.
    #[derive(Debug)]
    struct Constant {
        raw: i64,
        classes: Vec<i64>,
        width: usize,
    }

    impl LabelPredictor for Constant {
        fn predict(&self, features: &CsMat<f64>) -> Vec<i64> {
            vec![self.raw; features.rows()]
        }

        fn classes(&self) -> &[i64] {
            &self.classes
        }

        fn num_features(&self) -> usize {
            self.width
        }
    }

    fn vectorizer() -> TfidfVectorizer {
        TfidfVectorizer::fit(&["free cash", "meeting today"], VectorizerParams::default())
    }

    #[test]
    fn test_any_non_zero_output_is_spam() {
        let constant = Constant {
            raw: 7,
            classes: vec![0, 7],
            width: 4,
        };
        let classifier = SpamClassifier::new(vectorizer(), constant).unwrap();
        assert_eq!(classifier.classify(&message("hello")), Label::Spam);
    }

    #[test]
    fn test_rejects_feature_mismatch() {
        let constant = Constant {
            raw: 0,
            classes: vec![0, 1],
            width: 3,
        };
        let err = SpamClassifier::new(vectorizer(), constant).unwrap_err();
        assert!(matches!(
            err,
            ModelError::FeatureMismatch {
                vectorizer: 4,
                classifier: 3
            }
        ));
    }

    #[test]
    fn test_rejects_unexpected_label_convention() {
        for classes in [vec![1, 2], vec![0]] {
            let constant = Constant {
                raw: 1,
                classes: classes.clone(),
                width: 4,
            };
            let err = SpamClassifier::new(vectorizer(), constant).unwrap_err();
            assert!(matches!(err, ModelError::LabelConvention(c) if c == classes));
        }
    }
}

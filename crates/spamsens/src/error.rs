use std::{fmt, io, path::PathBuf};

use thiserror::Error;

/// Which of the two model artifacts an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Vectorizer,
    Classifier,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vectorizer => write!(f, "vectorizer"),
            Self::Classifier => write!(f, "classifier"),
        }
    }
}

/// Failures while loading, validating or saving model artifacts.
///
/// Any of these at startup means the model is unusable; nothing should be served.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read {kind} artifact at {}", path.display())]
    Read {
        kind: ArtifactKind,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode {kind} artifact at {}", path.display())]
    Decode {
        kind: ArtifactKind,
        path: PathBuf,
        #[source]
        source: bincode::error::DecodeError,
    },

    #[error("failed to encode {kind} artifact")]
    Encode {
        kind: ArtifactKind,
        #[source]
        source: bincode::error::EncodeError,
    },

    #[error("failed to write {kind} artifact to {}", path.display())]
    Write {
        kind: ArtifactKind,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("vectorizer produces {vectorizer} features but classifier expects {classifier}")]
    FeatureMismatch { vectorizer: usize, classifier: usize },

    #[error("classifier labels {0:?} do not follow the 0 = ham, non-zero = spam convention")]
    LabelConvention(Vec<i64>),
}

/// Rejection of a raw message before it reaches the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    #[error("Please enter a message first!")]
    Empty,
}

/// Failures while loading a labelled corpus or fitting a model from it.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error("failed to read corpus {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed corpus record")]
    Csv(#[from] csv::Error),

    #[error("record {record}: unknown label {label:?} (expected \"ham\" or \"spam\")")]
    UnknownLabel { record: usize, label: String },

    #[error("record {record}: missing message text")]
    MissingText { record: usize },

    #[error("corpus contains no messages")]
    EmptyCorpus,

    #[error("corpus contains only {0} messages; both ham and spam are required")]
    SingleClass(&'static str),

    #[error("no vocabulary terms survived document frequency filtering")]
    EmptyVocabulary,

    #[error(transparent)]
    Model(#[from] ModelError),
}

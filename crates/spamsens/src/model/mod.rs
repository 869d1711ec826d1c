use std::{
    fs,
    path::{Path, PathBuf},
};

use spamsens_preprocessing::pre_processor::TfidfVectorizer;
use sprs::CsMat;
use tracing::{debug, info};

use crate::error::{ArtifactKind, ModelError};

mod naive_bayes;

pub use naive_bayes::MultinomialNb;

pub const VECTORIZER_FILENAME: &str = "tfidf_vectorizer.bin";
pub const CLASSIFIER_FILENAME: &str = "spam_classifier.bin";

/// Environment variable overriding the directory the artifacts are read from.
pub const MODEL_DIR_ENV: &str = "SPAMSENS_MODEL_DIR";

/// A fitted transform from text to a fixed-width feature matrix.
pub trait FeatureExtractor: Send + Sync {
    /// One row per text, [`Self::num_features`] columns.
    fn transform(&self, texts: &[&str]) -> CsMat<f64>;

    fn num_features(&self) -> usize;
}

/// A fitted model that maps feature rows to raw integer class labels.
pub trait LabelPredictor: Send + Sync {
    fn predict(&self, features: &CsMat<f64>) -> Vec<i64>;

    /// Every label this model can emit.
    fn classes(&self) -> &[i64];

    fn num_features(&self) -> usize;
}

impl FeatureExtractor for TfidfVectorizer {
    fn transform(&self, texts: &[&str]) -> CsMat<f64> {
        Self::transform(self, texts)
    }

    fn num_features(&self) -> usize {
        Self::num_features(self)
    }
}

impl LabelPredictor for MultinomialNb {
    fn predict(&self, features: &CsMat<f64>) -> Vec<i64> {
        Self::predict(self, features)
    }

    fn classes(&self) -> &[i64] {
        Self::classes(self)
    }

    fn num_features(&self) -> usize {
        Self::num_features(self)
    }
}

/// Locations of the two artifact files inside a model directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub vectorizer: PathBuf,
    pub classifier: PathBuf,
}

impl ArtifactPaths {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            vectorizer: dir.join(VECTORIZER_FILENAME),
            classifier: dir.join(CLASSIFIER_FILENAME),
        }
    }

    pub(crate) fn load(&self) -> Result<(TfidfVectorizer, MultinomialNb), ModelError> {
        let vectorizer = read_artifact(&self.vectorizer, ArtifactKind::Vectorizer, |bytes| {
            TfidfVectorizer::from_bytes(bytes)
        })?;
        let classifier = read_artifact(&self.classifier, ArtifactKind::Classifier, |bytes| {
            MultinomialNb::from_bytes(bytes)
        })?;
        info!(
            vectorizer = %self.vectorizer.display(),
            classifier = %self.classifier.display(),
            num_features = vectorizer.num_features(),
            classes = ?classifier.classes(),
            "Loaded model artifacts"
        );
        Ok((vectorizer, classifier))
    }

    pub(crate) fn save(
        &self,
        vectorizer: &TfidfVectorizer,
        classifier: &MultinomialNb,
    ) -> Result<(), ModelError> {
        let vectorizer_bytes = vectorizer.to_bytes().map_err(|source| ModelError::Encode {
            kind: ArtifactKind::Vectorizer,
            source,
        })?;
        let classifier_bytes = classifier.to_bytes().map_err(|source| ModelError::Encode {
            kind: ArtifactKind::Classifier,
            source,
        })?;
        write_artifact(&self.vectorizer, ArtifactKind::Vectorizer, &vectorizer_bytes)?;
        write_artifact(&self.classifier, ArtifactKind::Classifier, &classifier_bytes)?;
        info!(
            vectorizer = %self.vectorizer.display(),
            classifier = %self.classifier.display(),
            "Saved model artifacts"
        );
        Ok(())
    }
}

fn read_artifact<T>(
    path: &Path,
    kind: ArtifactKind,
    decode: impl FnOnce(&[u8]) -> Result<T, bincode::error::DecodeError>,
) -> Result<T, ModelError> {
    debug!(path = %path.display(), %kind, "Reading artifact");
    let bytes = fs::read(path).map_err(|source| ModelError::Read {
        kind,
        path: path.to_path_buf(),
        source,
    })?;
    decode(&bytes).map_err(|source| ModelError::Decode {
        kind,
        path: path.to_path_buf(),
        source,
    })
}

fn write_artifact(path: &Path, kind: ArtifactKind, bytes: &[u8]) -> Result<(), ModelError> {
    let write = || {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)
    };
    write().map_err(|source| ModelError::Write {
        kind,
        path: path.to_path_buf(),
        source,
    })
}

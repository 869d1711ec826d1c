use bincode::error::DecodeError;
use sprs::CsMat;
use tracing::debug;

/// Multinomial Naive Bayes over non-negative (TF-IDF or count) features.
#[derive(Debug, Clone, bincode::Encode, bincode::Decode)]
pub struct MultinomialNb {
    /// Sorted, distinct class labels.
    classes: Vec<i64>,
    /// `ln P(class)`, aligned with `classes`.
    class_log_prior: Vec<f64>,
    /// `ln P(feature | class)`, one row per class.
    feature_log_prob: Vec<Vec<f64>>,
    num_features: usize,
}

impl MultinomialNb {
    /// Fit with additive (Laplace/Lidstone) smoothing `alpha`.
    ///
    /// # Panics
    ///
    /// If `labels` does not have one entry per feature row, or `labels` is empty.
    pub fn fit(features: &CsMat<f64>, labels: &[i64], alpha: f64) -> Self {
        assert_eq!(
            features.rows(),
            labels.len(),
            "one label is required per feature row"
        );
        assert!(!labels.is_empty(), "cannot fit on an empty corpus");

        let mut classes = labels.to_vec();
        classes.sort_unstable();
        classes.dedup();
        let num_features = features.cols();
        debug!(
            num_samples = labels.len(),
            num_features,
            num_classes = classes.len(),
            "Fitting MultinomialNb"
        );

        let mut class_count = vec![0usize; classes.len()];
        let mut feature_count = vec![vec![0.0f64; num_features]; classes.len()];

        for (row, label) in features.outer_iterator().zip(labels) {
            let class_idx = classes
                .binary_search(label)
                .expect("label was collected into classes");
            class_count[class_idx] += 1;
            for (col_idx, &value) in row.iter() {
                feature_count[class_idx][col_idx] += value;
            }
        }

        let n_samples = labels.len() as f64;
        let class_log_prior = class_count
            .iter()
            .map(|&count| (count as f64 / n_samples).ln())
            .collect();

        let feature_log_prob = feature_count
            .into_iter()
            .map(|counts| {
                let total = counts.iter().sum::<f64>() + alpha * num_features as f64;
                let log_total = total.ln();
                counts
                    .into_iter()
                    .map(|count| (count + alpha).ln() - log_total)
                    .collect()
            })
            .collect();

        Self {
            classes,
            class_log_prior,
            feature_log_prob,
            num_features,
        }
    }

    /// Joint log-likelihood of every class for one feature row.
    fn joint_log_likelihood(&self, row: sprs::CsVecView<'_, f64>) -> Vec<f64> {
        self.class_log_prior
            .iter()
            .zip(&self.feature_log_prob)
            .map(|(prior, log_prob)| {
                prior
                    + row
                        .iter()
                        .map(|(col_idx, &value)| value * log_prob[col_idx])
                        .sum::<f64>()
            })
            .collect()
    }

    /// Predict a class label per feature row.
    ///
    /// Ties go to the lowest label. An all-zero row gets the most frequent training class.
    ///
    /// # Panics
    ///
    /// If `features` does not have [`Self::num_features`] columns.
    pub fn predict(&self, features: &CsMat<f64>) -> Vec<i64> {
        assert_eq!(
            features.cols(),
            self.num_features,
            "feature dimension does not match the fitted model"
        );
        features
            .outer_iterator()
            .map(|row| {
                let jll = self.joint_log_likelihood(row);
                let mut best = 0;
                for (idx, &score) in jll.iter().enumerate().skip(1) {
                    if score > jll[best] {
                        best = idx;
                    }
                }
                self.classes[best]
            })
            .collect()
    }

    #[must_use]
    pub fn classes(&self) -> &[i64] {
        &self.classes
    }

    #[must_use]
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::error::EncodeError> {
        bincode::encode_to_vec(self, bincode::config::standard())
    }

    /// Decode an artifact written by [`Self::to_bytes`], rejecting trailing bytes
    /// and tables whose shapes disagree.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let (model, read): (Self, usize) =
            bincode::decode_from_slice(bytes, bincode::config::standard())?;
        if read != bytes.len() {
            return Err(DecodeError::OtherString(format!(
                "{} unexpected bytes after the classifier",
                bytes.len() - read
            )));
        }
        model.validate().map_err(DecodeError::OtherString)?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), String> {
        let n_classes = self.classes.len();
        if n_classes == 0 {
            return Err("classifier has no classes".into());
        }
        if !self.classes.windows(2).all(|pair| pair[0] < pair[1]) {
            return Err(format!("classes {:?} are not sorted and distinct", self.classes));
        }
        if self.class_log_prior.len() != n_classes || self.feature_log_prob.len() != n_classes {
            return Err(format!(
                "{n_classes} classes but {} priors and {} likelihood rows",
                self.class_log_prior.len(),
                self.feature_log_prob.len()
            ));
        }
        if let Some(row) = self
            .feature_log_prob
            .iter()
            .find(|row| row.len() != self.num_features)
        {
            return Err(format!(
                "likelihood row has {} entries, expected {}",
                row.len(),
                self.num_features
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Rows over features [win, cash, meeting, today].
    fn dataset() -> (CsMat<f64>, Vec<i64>) {
        let dense = [
            [1.0, 1.0, 0.0, 0.0],
            [2.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 1.0],
            [0.0, 0.0, 0.0, 1.0],
            [0.0, 0.0, 1.0, 0.0],
        ];
        (csr(&dense), vec![1, 1, 0, 0, 0])
    }

    fn csr(rows: &[[f64; 4]]) -> CsMat<f64> {
        let mut tri = sprs::TriMat::new((rows.len(), 4));
        for (r, row) in rows.iter().enumerate() {
            for (c, &v) in row.iter().enumerate() {
                if v != 0.0 {
                    tri.add_triplet(r, c, v);
                }
            }
        }
        tri.to_csr()
    }

    #[test]
    fn test_predicts_training_classes() {
        let (features, labels) = dataset();
        let model = MultinomialNb::fit(&features, &labels, 1.0);
        assert_eq!(model.classes(), &[0, 1]);
        assert_eq!(model.num_features(), 4);
        assert_eq!(model.predict(&features), labels);
    }

    #[test]
    fn test_zero_row_falls_back_to_prior() {
        let (features, labels) = dataset();
        let model = MultinomialNb::fit(&features, &labels, 1.0);
        // Three ham rows against two spam rows
        assert_eq!(model.predict(&csr(&[[0.0; 4]])), vec![0]);
    }

    #[test]
    fn test_log_probabilities_are_normalized() {
        let (features, labels) = dataset();
        let model = MultinomialNb::fit(&features, &labels, 0.5);
        let prior = model.class_log_prior.iter().map(|p| p.exp()).sum::<f64>();
        assert!((prior - 1.0).abs() < 1e-12);
        for row in &model.feature_log_prob {
            let total = row.iter().map(|p| p.exp()).sum::<f64>();
            assert!((total - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_ties_resolve_to_lowest_label() {
        let features = csr(&[[1.0, 0.0, 0.0, 0.0], [1.0, 0.0, 0.0, 0.0]]);
        let model = MultinomialNb::fit(&features, &[3, 0], 1.0);
        assert_eq!(model.predict(&csr(&[[1.0, 0.0, 0.0, 0.0]])), vec![0]);
    }

    #[test]
    fn test_mis_shaped_artifact_fails_to_load() {
        use crate::{
            ArtifactKind, ModelError, SpamClassifier, model::CLASSIFIER_FILENAME, test_support,
        };

        let dir = tempfile::tempdir().unwrap();
        let trained = test_support::classifier();
        trained.save(dir.path()).unwrap();

        // Header fields agree with the vectorizer, the likelihood rows do not
        let broken = MultinomialNb {
            classes: vec![0, 1],
            class_log_prior: vec![-0.7, -0.7],
            feature_log_prob: vec![vec![-1.0], vec![-1.0]],
            num_features: trained.vectorizer().num_features(),
        };
        std::fs::write(dir.path().join(CLASSIFIER_FILENAME), broken.to_bytes().unwrap()).unwrap();

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
    fn test_from_bytes_checks_table_shapes() {
        let (features, labels) = dataset();
        let model = MultinomialNb::fit(&features, &labels, 1.0);
        assert!(MultinomialNb::from_bytes(&model.to_bytes().unwrap()).is_ok());

        let mut missing_prior = model.clone();
        missing_prior.class_log_prior.pop();
        assert!(MultinomialNb::from_bytes(&missing_prior.to_bytes().unwrap()).is_err());

        let mut unsorted = model;
        unsorted.classes.reverse();
        assert!(MultinomialNb::from_bytes(&unsorted.to_bytes().unwrap()).is_err());
    }

    #[test]
    #[should_panic(expected = "feature dimension")]
    fn test_rejects_wrong_dimension() {
        let (features, labels) = dataset();
        let model = MultinomialNb::fit(&features, &labels, 1.0);
        let _ = model.predict(&CsMat::zero((1, 3)));
    }
}

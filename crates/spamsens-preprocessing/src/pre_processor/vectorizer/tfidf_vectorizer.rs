use ahash::HashMap;
use sprs::CsMat;
use tracing::debug;

use super::{count_vectorizer::CountVectorizer, params::VectorizerParams};

#[cfg_attr(feature = "bincode", derive(bincode::Encode, bincode::Decode))]
#[derive(Clone, Debug)]
pub struct TfidfVectorizer {
    count_vectorizer: CountVectorizer,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    pub fn fit<T: AsRef<str> + Sync>(
        texts: &[T],
        count_vectorizer_params: VectorizerParams,
    ) -> Self {
        debug!(num_texts = texts.len(), "Fitting TfidfVectorizer");
        let (count_vectorizer, tf_matrix) =
            CountVectorizer::fit_transform(texts, count_vectorizer_params);
        debug!("Calculating IDF values");

        // Calculate IDF: log((n_docs + 1) / (df + 1)) + 1
        let n_docs = texts.len() as f64;
        let num_features = count_vectorizer.num_features();

        let mut df = vec![0usize; num_features];

        for row_vec in tf_matrix.outer_iterator() {
            for (col_idx, _val) in row_vec.iter() {
                df[col_idx] += 1;
            }
        }
        let idf = df
            .iter()
            .map(|&doc_freq| ((n_docs + 1.0) / (doc_freq as f64 + 1.0)).ln() + 1.0)
            .collect();
        debug!("IDF calculation complete");

        Self {
            count_vectorizer,
            idf,
        }
    }

    /// TF-IDF weights for each text, one L2-normalized CSR row per text.
    pub fn transform<T: AsRef<str> + Sync>(&self, texts: &[T]) -> CsMat<f64> {
        debug!(
            num_texts = texts.len(),
            "Transforming texts using TfidfVectorizer"
        );
        let mut tf_matrix = self.count_vectorizer.transform(texts);
        let sublinear_tf = self.count_vectorizer.params().sublinear_tf();

        for mut row_vec in tf_matrix.outer_iterator_mut() {
            for (col_idx, val) in row_vec.iter_mut() {
                if sublinear_tf {
                    *val = 1.0 + val.ln();
                }
                *val *= self.idf[col_idx];
            }
            let norm = row_vec.iter().map(|(_, &v)| v * v).sum::<f64>().sqrt();
            // All-zero rows (empty or fully out-of-vocabulary text) stay zero
            if norm > 0.0 {
                for (_, val) in row_vec.iter_mut() {
                    *val /= norm;
                }
            }
        }
        tf_matrix
    }

    pub fn fit_transform<T: AsRef<str> + Sync>(
        texts: &[T],
        count_vectorizer_params: VectorizerParams,
    ) -> (Self, CsMat<f64>) {
        let vectorizer = Self::fit(texts, count_vectorizer_params);
        let transformed = vectorizer.transform(texts);
        (vectorizer, transformed)
    }

    pub fn num_features(&self) -> usize {
        self.count_vectorizer.num_features()
    }

    pub fn vocabulary(&self) -> &HashMap<String, usize> {
        self.count_vectorizer.vocabulary()
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    pub fn params(&self) -> &VectorizerParams {
        self.count_vectorizer.params()
    }

    #[cfg(feature = "bincode")]
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::error::EncodeError> {
        bincode::encode_to_vec(self, bincode::config::standard())
    }

    /// Decode an artifact written by [`Self::to_bytes`].
    ///
    /// Trailing bytes and internally inconsistent contents are rejected, so a
    /// vectorizer that decodes is safe to `transform` with.
    #[cfg(feature = "bincode")]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::error::DecodeError> {
        use bincode::error::DecodeError;

        let (vectorizer, read): (Self, usize) =
            bincode::decode_from_slice(bytes, bincode::config::standard())?;
        if read != bytes.len() {
            return Err(DecodeError::OtherString(format!(
                "{} unexpected bytes after the vectorizer",
                bytes.len() - read
            )));
        }
        vectorizer.validate().map_err(DecodeError::OtherString)?;
        Ok(vectorizer)
    }

    #[cfg(feature = "bincode")]
    fn validate(&self) -> Result<(), String> {
        self.count_vectorizer.validate()?;
        if self.idf.len() != self.num_features() {
            return Err(format!(
                "{} idf weights for {} features",
                self.idf.len(),
                self.num_features()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORPUS: &[&str] = &[
        "win free cash now",
        "free cash prize",
        "are we meeting today",
        "see you today",
    ];

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_smoothed_idf() {
        let vectorizer = TfidfVectorizer::fit(CORPUS, VectorizerParams::default());
        let vocab = vectorizer.vocabulary();
        // free: df = 2 of 4 documents, win: df = 1
        assert!(close(vectorizer.idf()[vocab["free"]], (5.0f64 / 3.0).ln() + 1.0));
        assert!(close(vectorizer.idf()[vocab["win"]], (5.0f64 / 2.0).ln() + 1.0));
    }

    #[test]
    fn test_rows_are_l2_normalized() {
        let (_, matrix) = TfidfVectorizer::fit_transform(CORPUS, VectorizerParams::default());
        for row in matrix.outer_iterator() {
            let norm = row.iter().map(|(_, &v)| v * v).sum::<f64>().sqrt();
            assert!(close(norm, 1.0));
        }
    }

    #[test]
    fn test_rare_terms_weigh_more() {
        let vectorizer = TfidfVectorizer::fit(CORPUS, VectorizerParams::default());
        let vocab = vectorizer.vocabulary();
        let matrix = vectorizer.transform(&["win free"]);
        let row = matrix.outer_view(0).unwrap();
        assert!(row.get(vocab["win"]).unwrap() > row.get(vocab["free"]).unwrap());
    }

    #[test]
    fn test_unknown_text_is_zero_row() {
        let vectorizer = TfidfVectorizer::fit(CORPUS, VectorizerParams::default());
        let matrix = vectorizer.transform(&["", "completely unseen words"]);
        assert_eq!(matrix.shape(), (2, vectorizer.num_features()));
        assert_eq!(matrix.nnz(), 0);
    }

    #[test]
    fn test_sublinear_tf_dampens_repeats() {
        let linear = TfidfVectorizer::fit(CORPUS, VectorizerParams::new(1..=1, 1.0, 1.0, false));
        let sublinear = TfidfVectorizer::fit(CORPUS, VectorizerParams::new(1..=1, 1.0, 1.0, true));
        let vocab = linear.vocabulary();
        let text = ["free free free free cash"];

        let share = |matrix: CsMat<f64>| {
            let row = matrix.outer_view(0).unwrap().to_owned();
            row.get(vocab["free"]).copied().unwrap() / row.get(vocab["cash"]).copied().unwrap()
        };
        assert!(share(sublinear.transform(&text)) < share(linear.transform(&text)));
    }

    #[test]
    fn test_bytes_round_trip_preserves_transform() {
        let vectorizer = TfidfVectorizer::fit(CORPUS, VectorizerParams::default());
        let restored = TfidfVectorizer::from_bytes(&vectorizer.to_bytes().unwrap()).unwrap();
        assert_eq!(restored.params(), vectorizer.params());
        assert_eq!(
            restored.transform(&["free cash today"]),
            vectorizer.transform(&["free cash today"])
        );
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        assert!(TfidfVectorizer::from_bytes(b"not a vectorizer").is_err());
    }

    #[test]
    fn test_from_bytes_rejects_trailing_bytes() {
        let vectorizer = TfidfVectorizer::fit(CORPUS, VectorizerParams::default());
        let mut bytes = vectorizer.to_bytes().unwrap();
        bytes.extend_from_slice(b"GARBAGE-APPENDED");
        assert!(TfidfVectorizer::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_from_bytes_rejects_idf_of_wrong_width() {
        let mut vectorizer = TfidfVectorizer::fit(CORPUS, VectorizerParams::default());
        vectorizer.idf.pop();
        let err = TfidfVectorizer::from_bytes(&vectorizer.to_bytes().unwrap()).unwrap_err();
        assert!(err.to_string().contains("idf weights"), "{err}");
    }
}

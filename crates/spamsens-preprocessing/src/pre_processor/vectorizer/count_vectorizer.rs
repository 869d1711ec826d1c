use ahash::{AHashMap, HashMap};
use sprs::CsMat;
use tracing::debug;

use super::{
    ngrams::{self, NgramKey},
    params::VectorizerParams,
    tokenizer,
};

#[cfg_attr(feature = "bincode", derive(bincode::Encode, bincode::Decode))]
#[derive(Clone, Debug)]
pub struct CountVectorizer {
    params: VectorizerParams,
    /// Vocabulary mapping n-gram text to feature index.
    /// Indices follow the lexicographic order of the n-grams.
    vocab: HashMap<NgramKey, usize>,
}

impl CountVectorizer {
    pub fn fit<T: AsRef<str> + Sync>(texts: &[T], params: VectorizerParams) -> Self {
        debug!(num_texts = texts.len(), "Fitting CountVectorizer");
        let ngram_maps = Self::ngram_maps(texts, &params);
        Self::fit_from_ngrams(&ngram_maps, params)
    }

    fn ngram_maps<T: AsRef<str> + Sync>(
        texts: &[T],
        params: &VectorizerParams,
    ) -> Vec<AHashMap<NgramKey, usize>> {
        tokenizer::tokenize(texts)
            .iter()
            .map(|tokens| ngrams::count_ngrams(tokens, params.ngram_counts()))
            .collect()
    }

    /// Build the vocabulary from n-gram counts that were already computed.
    fn fit_from_ngrams(ngram_maps: &[AHashMap<NgramKey, usize>], params: VectorizerParams) -> Self {
        debug!("Building vocabulary from n-gram counts");
        let vocab_df = ngrams::document_frequencies(ngram_maps);
        let vocab_size = vocab_df.len();

        let (min_count, max_count) = params.document_frequency_bounds(ngram_maps.len());
        debug!(min_count, max_count, "Applying document frequency filtering");
        let mut sorted_tokens = vocab_df
            .into_iter()
            .filter(|(_, df)| {
                let df = *df as f64;
                df >= min_count && df <= max_count
            })
            .map(|(token, _)| token)
            .collect::<Vec<_>>();
        debug!(
            original_size = vocab_size,
            filtered_size = sorted_tokens.len(),
            "Vocabulary filtered by document frequency"
        );

        sorted_tokens.sort();
        let vocab = sorted_tokens
            .into_iter()
            .enumerate()
            .map(|(idx, token)| (token, idx))
            .collect::<HashMap<NgramKey, usize>>();

        debug!(vocab_size = vocab.len(), "CountVectorizer fitting complete");

        Self { params, vocab }
    }

    pub fn transform<T: AsRef<str> + Sync>(&self, texts: &[T]) -> CsMat<f64> {
        debug!(
            num_texts = texts.len(),
            "Transforming texts using CountVectorizer"
        );
        let ngram_maps = Self::ngram_maps(texts, &self.params);
        self.transform_from_ngrams(&ngram_maps)
    }

    /// Build the CSR count matrix, one row per document. Unknown n-grams are ignored.
    fn transform_from_ngrams(&self, ngram_maps: &[AHashMap<NgramKey, usize>]) -> CsMat<f64> {
        let mut indptr = Vec::with_capacity(ngram_maps.len() + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();

        indptr.push(0);

        for ngrams in ngram_maps {
            let mut row_entries = ngrams
                .iter()
                .filter_map(|(ngram_key, &count)| {
                    self.vocab
                        .get(ngram_key)
                        .map(|&col_idx| (col_idx, count as f64))
                })
                .collect::<Vec<_>>();

            row_entries.sort_by_key(|(col_idx, _)| *col_idx);
            for (col_idx, count) in row_entries {
                indices.push(col_idx);
                data.push(count);
            }
            indptr.push(indices.len());
        }

        debug!(
            non_zero_entries = data.len(),
            "Text transformation complete"
        );
        CsMat::new(
            (ngram_maps.len(), self.num_features()),
            indptr,
            indices,
            data,
        )
    }

    /// Fit and transform while computing the n-grams of each document only once.
    pub fn fit_transform<T: AsRef<str> + Sync>(
        texts: &[T],
        params: VectorizerParams,
    ) -> (Self, CsMat<f64>) {
        debug!(
            num_texts = texts.len(),
            "fit_transform: tokenizing and computing n-grams once"
        );
        let ngram_maps = Self::ngram_maps(texts, &params);
        let vectorizer = Self::fit_from_ngrams(&ngram_maps, params);
        let transformed = vectorizer.transform_from_ngrams(&ngram_maps);
        (vectorizer, transformed)
    }

    pub fn num_features(&self) -> usize {
        self.vocab.len()
    }

    /// Mapping of n-gram text to feature index.
    pub fn vocabulary(&self) -> &HashMap<String, usize> {
        &self.vocab
    }

    pub fn params(&self) -> &VectorizerParams {
        &self.params
    }

    /// Vocabulary indices must be exactly `0..num_features`, each used once.
    #[cfg(feature = "bincode")]
    pub(crate) fn validate(&self) -> Result<(), String> {
        self.params.validate()?;
        let width = self.vocab.len();
        let mut seen = vec![false; width];
        for (ngram, &idx) in &self.vocab {
            match seen.get_mut(idx) {
                Some(slot) if !*slot => *slot = true,
                Some(_) => return Err(format!("feature index {idx} is assigned twice")),
                None => return Err(format!("n-gram {ngram:?} has index {idx} outside 0..{width}")),
            }
        }
        Ok(())
    }
}

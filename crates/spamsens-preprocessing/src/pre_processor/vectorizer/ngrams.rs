use ahash::AHashMap as HashMap;
use dashmap::DashMap;
use indicatif::ParallelProgressIterator;
use rayon::prelude::*;

/// N-grams are keyed by their tokens joined with a single space.
pub type NgramKey = String;

pub fn count_ngrams(tokens: &[String], ngram_sizes: &[usize]) -> HashMap<NgramKey, usize> {
    let mut ngram_counter = HashMap::new();

    for &n in ngram_sizes {
        for window in tokens.windows(n) {
            *ngram_counter.entry(window.join(" ")).or_insert(0) += 1;
        }
    }
    ngram_counter
}

/// Document frequency of every n-gram across the corpus.
pub fn document_frequencies(
    ngram_maps: &[HashMap<NgramKey, usize>],
) -> DashMap<NgramKey, usize, ahash::RandomState> {
    let vocab_df = DashMap::with_hasher(ahash::RandomState::default());

    ngram_maps.par_iter().progress().for_each(|ngrams| {
        for ngram in ngrams.keys() {
            vocab_df
                .entry(ngram.clone())
                .and_modify(|e| *e += 1)
                .or_insert(1usize);
        }
    });
    vocab_df
}

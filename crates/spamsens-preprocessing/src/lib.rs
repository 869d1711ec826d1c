//! # spamsens-preprocessing
//!
//! Text normalization and TF-IDF vectorization used by the SpamSens classifier.
//!
//! ```rust
//! use spamsens_preprocessing::pre_processor::{TfidfVectorizer, VectorizerParams, normalize};
//!
//! let corpus = ["win free cash now", "are we still meeting today"];
//! let vectorizer = TfidfVectorizer::fit(&corpus, VectorizerParams::default());
//!
//! let cleaned = normalize("WIN $$$ FREE CASH now!");
//! assert_eq!(cleaned, "win free cash now");
//! let features = vectorizer.transform(&[cleaned]);
//! assert_eq!(features.rows(), 1);
//! ```

pub mod pre_processor;

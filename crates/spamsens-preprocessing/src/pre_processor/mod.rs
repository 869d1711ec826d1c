mod normalizer;
mod vectorizer;

pub use normalizer::{is_whitespace, normalize};
pub use vectorizer::{CountVectorizer, TfidfVectorizer, VectorizerParams};

mod count_vectorizer;
mod ngrams;
mod params;
mod tfidf_vectorizer;
mod tokenizer;

pub use count_vectorizer::CountVectorizer;
pub use params::VectorizerParams;
pub use tfidf_vectorizer::TfidfVectorizer;

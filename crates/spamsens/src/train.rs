//! Fitting the vectorizer and classifier from a labelled SMS corpus.
//!
//! Two layouts of the SMS Spam Collection are understood:
//! - the UCI distribution: `label<TAB>message` per line, no header
//! - the Kaggle `spam.csv`: a `v1,v2,...` header, label in the first column and
//!   message in the second. Non UTF-8 bytes are decoded lossily.

use std::{fmt, fs::File, io::Read, path::Path};

use spamsens_preprocessing::pre_processor::{TfidfVectorizer, VectorizerParams, normalize};
use tracing::{debug, info};

use crate::{
    Label, SpamClassifier,
    error::TrainError,
    model::MultinomialNb,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorpusFormat {
    Tsv,
    Csv,
}

impl CorpusFormat {
    /// `.csv` files are read as CSV with a header, everything else as headerless TSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::Tsv,
        }
    }
}

/// Raw messages with their numeric labels (`0` ham, `1` spam).
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    messages: Vec<String>,
    labels: Vec<i64>,
}

impl Corpus {
    pub fn from_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (i64, S)>) -> Self {
        let (labels, messages) = pairs
            .into_iter()
            .map(|(label, text)| (label, Into::<String>::into(text)))
            .unzip();
        Self { messages, labels }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TrainError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| TrainError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let corpus = Self::from_reader(file, CorpusFormat::from_path(path))?;
        info!(
            path = %path.display(),
            messages = corpus.len(),
            spam = corpus.spam_count(),
            "Loaded corpus"
        );
        Ok(corpus)
    }

    pub fn from_reader<R: Read>(reader: R, format: CorpusFormat) -> Result<Self, TrainError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(format == CorpusFormat::Csv)
            .delimiter(if format == CorpusFormat::Csv { b',' } else { b'\t' })
            .quoting(format == CorpusFormat::Csv)
            .flexible(true)
            .from_reader(reader);

        let mut corpus = Self::default();
        for (idx, record) in reader.byte_records().enumerate() {
            let record = record?;
            let number = idx + 1;

            let label = String::from_utf8_lossy(record.get(0).unwrap_or_default());
            let label = parse_label(&label).ok_or_else(|| TrainError::UnknownLabel {
                record: number,
                label: label.to_string(),
            })?;

            if record.len() < 2 {
                return Err(TrainError::MissingText { record: number });
            }
            let text = match format {
                // A stray tab inside a message splits it into extra fields
                CorpusFormat::Tsv => record
                    .iter()
                    .skip(1)
                    .map(String::from_utf8_lossy)
                    .collect::<Vec<_>>()
                    .join("\t"),
                CorpusFormat::Csv => record
                    .get(1)
                    .map(|field| String::from_utf8_lossy(field).into_owned())
                    .unwrap_or_default(),
            };

            corpus.labels.push(label);
            corpus.messages.push(text);
        }
        debug!(messages = corpus.len(), "Parsed corpus records");
        Ok(corpus)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn spam_count(&self) -> usize {
        self.labels.iter().filter(|&&label| label != 0).count()
    }

    pub fn ham_count(&self) -> usize {
        self.len() - self.spam_count()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn labels(&self) -> &[i64] {
        &self.labels
    }

    /// Iterate over `(message, expected label)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Label)> {
        self.messages
            .iter()
            .zip(&self.labels)
            .map(|(message, &raw)| (message.as_str(), Label::from(raw)))
    }
}

fn parse_label(raw: &str) -> Option<i64> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "ham" => Some(0),
        "spam" => Some(1),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub params: VectorizerParams,
    /// Additive smoothing for the Naive Bayes feature probabilities.
    pub alpha: f64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            params: VectorizerParams::default(),
            alpha: 1.0,
        }
    }
}

/// Normalize every message, fit TF-IDF on the result, then fit Naive Bayes on the
/// TF-IDF features.
pub fn fit(corpus: &Corpus, options: &TrainOptions) -> Result<SpamClassifier, TrainError> {
    if corpus.is_empty() {
        return Err(TrainError::EmptyCorpus);
    }
    if corpus.spam_count() == 0 {
        return Err(TrainError::SingleClass("ham"));
    }
    if corpus.ham_count() == 0 {
        return Err(TrainError::SingleClass("spam"));
    }

    info!(
        messages = corpus.len(),
        spam = corpus.spam_count(),
        ham = corpus.ham_count(),
        "Training spam classifier"
    );
    let normalized = corpus
        .messages
        .iter()
        .map(|message| normalize(message))
        .collect::<Vec<_>>();

    let (vectorizer, features) =
        TfidfVectorizer::fit_transform(&normalized, options.params.clone());
    if vectorizer.num_features() == 0 {
        return Err(TrainError::EmptyVocabulary);
    }
    let classifier = MultinomialNb::fit(&features, &corpus.labels, options.alpha);

    let classifier = SpamClassifier::new(vectorizer, classifier)?;
    let report = evaluate(&classifier, corpus);
    info!(
        num_features = classifier.vectorizer().num_features(),
        %report,
        "Training complete"
    );
    Ok(classifier)
}

/// Confusion counts of a classifier against a labelled corpus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Evaluation {
    pub true_spam: usize,
    pub false_spam: usize,
    pub true_ham: usize,
    pub false_ham: usize,
}

impl Evaluation {
    pub fn total(&self) -> usize {
        self.true_spam + self.false_spam + self.true_ham + self.false_ham
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_spam + self.true_ham, self.total())
    }

    /// Share of messages flagged as spam that really were spam.
    pub fn precision(&self) -> f64 {
        ratio(self.true_spam, self.true_spam + self.false_spam)
    }

    /// Share of spam messages that were flagged.
    pub fn recall(&self) -> f64 {
        ratio(self.true_spam, self.true_spam + self.false_ham)
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "accuracy={:.3}, precision={:.3}, recall={:.3} ({} messages)",
            self.accuracy(),
            self.precision(),
            self.recall(),
            self.total()
        )
    }
}

/// Score `classifier` on every message of `corpus`. Blank messages are skipped.
pub fn evaluate(classifier: &SpamClassifier, corpus: &Corpus) -> Evaluation {
    let (messages, expected): (Vec<_>, Vec<_>) = corpus
        .iter()
        .filter_map(|(text, label)| crate::Message::new(text).ok().map(|m| (m, label)))
        .unzip();
    let predicted = classifier.classify_batch(&messages);

    let mut report = Evaluation::default();
    for (expected, predicted) in expected.into_iter().zip(predicted) {
        match (expected, predicted) {
            (Label::Spam, Label::Spam) => report.true_spam += 1,
            (Label::Ham, Label::Spam) => report.false_spam += 1,
            (Label::Ham, Label::Ham) => report.true_ham += 1,
            (Label::Spam, Label::Ham) => report.false_ham += 1,
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::test_support;

    #[test]
    fn test_reads_uci_tsv() {
        let data = "ham\tGo until jurong point, crazy..\n\
                    spam\tFree entry in 2 a wkly comp\tto win\n";
        let corpus = Corpus::from_reader(data.as_bytes(), CorpusFormat::Tsv).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.labels(), &[0, 1]);
        assert_eq!(corpus.messages()[1], "Free entry in 2 a wkly comp\tto win");
    }

    #[test]
    fn test_reads_kaggle_csv_with_latin1() {
        let mut data = b"v1,v2,,,\n\
                         ham,\"Ok lar... Joking wif u oni...\",,,\n\
                         spam,\"Win \xa3100 now, reply\",,,\n"
            .to_vec();
        data.extend_from_slice(b"HAM,plain,,,\n");
        let corpus = Corpus::from_reader(&data[..], CorpusFormat::Csv).unwrap();
        assert_eq!(corpus.labels(), &[0, 1, 0]);
        assert_eq!(corpus.messages()[0], "Ok lar... Joking wif u oni...");
        assert!(corpus.messages()[1].starts_with("Win "));
        assert!(corpus.messages()[1].ends_with("100 now, reply"));
    }

    #[test]
    fn test_rejects_unknown_label() {
        let data = "ham\tfine\nphishing\tnot a label we know\n";
        let err = Corpus::from_reader(data.as_bytes(), CorpusFormat::Tsv).unwrap_err();
        assert!(matches!(
            err,
            TrainError::UnknownLabel { record: 2, ref label } if label == "phishing"
        ));
    }

    #[test]
    fn test_rejects_record_without_text() {
        let data = "ham\tfine\nspam\n";
        let err = Corpus::from_reader(data.as_bytes(), CorpusFormat::Tsv).unwrap_err();
        assert!(matches!(err, TrainError::MissingText { record: 2 }));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(CorpusFormat::from_path(Path::new("spam.CSV")), CorpusFormat::Csv);
        assert_eq!(
            CorpusFormat::from_path(Path::new("SMSSpamCollection")),
            CorpusFormat::Tsv
        );
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::Builder::new().suffix(".tsv").tempfile().unwrap();
        writeln!(file, "spam\tWIN cash now").unwrap();
        writeln!(file, "ham\tsee you later").unwrap();
        let corpus = Corpus::from_path(file.path()).unwrap();
        assert_eq!(corpus.spam_count(), 1);
        assert_eq!(corpus.ham_count(), 1);

        let missing = Corpus::from_path("/definitely/not/here.tsv").unwrap_err();
        assert!(matches!(missing, TrainError::Io { .. }));
    }

    #[test]
    fn test_fit_rejects_degenerate_corpora() {
        let options = TrainOptions::default();
        assert!(matches!(
            fit(&Corpus::default(), &options),
            Err(TrainError::EmptyCorpus)
        ));
        let only_ham = Corpus::from_pairs([(0, "hello there"), (0, "see you")]);
        assert!(matches!(
            fit(&only_ham, &options),
            Err(TrainError::SingleClass("ham"))
        ));
        let letterless = Corpus::from_pairs([(0, "123"), (1, "$$$ !!!")]);
        assert!(matches!(
            fit(&letterless, &options),
            Err(TrainError::EmptyVocabulary)
        ));
    }

    #[test]
    fn test_fit_separates_fixture() {
        let corpus = test_support::corpus();
        let classifier = fit(&corpus, &TrainOptions::default()).unwrap();
        let report = evaluate(&classifier, &corpus);
        assert_eq!(report.total(), corpus.len());
        assert_eq!(report.accuracy(), 1.0);
        assert_eq!(report.precision(), 1.0);
        assert_eq!(report.recall(), 1.0);
    }

    #[test]
    fn test_evaluation_ratios() {
        let report = Evaluation {
            true_spam: 3,
            false_spam: 1,
            true_ham: 5,
            false_ham: 1,
        };
        assert_eq!(report.total(), 10);
        assert!((report.accuracy() - 0.8).abs() < 1e-12);
        assert!((report.precision() - 0.75).abs() < 1e-12);
        assert!((report.recall() - 0.75).abs() < 1e-12);
        assert_eq!(Evaluation::default().precision(), 0.0);
    }
}

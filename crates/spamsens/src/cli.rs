use std::{
    io::{self, BufRead, Read, Write},
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{Context, Result, ensure};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    Label, Message, MessageError, SpamClassifier, VectorizerParams,
    app::{Event, Session},
    model::MODEL_DIR_ENV,
    pages::{ABOUT_TEXT, Page},
    train::{self, Corpus, TrainOptions},
    translate::{DEFAULT_ENDPOINT, GoogleTranslator, Language, Translator},
};

#[derive(Parser)]
#[command(name = "spamsens", version)]
#[command(about = "Classify messages as spam or ham", long_about = None)]
pub struct Cli {
    /// Directory holding tfidf_vectorizer.bin and spam_classifier.bin
    #[arg(long, global = true, env = MODEL_DIR_ENV, default_value = ".")]
    model_dir: PathBuf,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify text as spam or ham
    Classify(ClassifyArgs),
    /// Translate text into one of the supported languages
    Translate(TranslateArgs),
    /// Fit model artifacts from a labelled SMS corpus
    Train(TrainArgs),
    /// Menu-driven session with login, signup, prediction and translation
    Interactive(TranslatorArgs),
}

#[derive(Args)]
struct ClassifyArgs {
    /// Text to classify (if not provided, reads from stdin)
    #[arg(value_name = "TEXT")]
    text: Option<String>,

    /// Read text from file
    #[arg(short, long, value_name = "PATH", conflicts_with = "text")]
    file: Option<PathBuf>,

    /// Batch process texts (one per line)
    #[arg(short, long, value_name = "PATH", conflicts_with_all = ["text", "file"])]
    batch: Option<PathBuf>,

    /// Batch process from JSON array
    #[arg(long, value_name = "PATH", conflicts_with_all = ["text", "file", "batch"])]
    batch_json: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "label")]
    format: OutputFormat,
}

#[derive(Args)]
struct TranslatorArgs {
    /// Translation service endpoint
    #[arg(long, env = "SPAMSENS_TRANSLATE_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Translation request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
}

impl TranslatorArgs {
    fn translator(&self) -> GoogleTranslator {
        GoogleTranslator::with_endpoint(&self.endpoint, Duration::from_secs(self.timeout_secs))
    }
}

#[derive(Args)]
struct TranslateArgs {
    /// Target language, by name or code (hi, bn, ta, te, mr, gu, ml, pa, ur)
    #[arg(short = 't', long = "to", value_name = "LANG")]
    language: Language,

    /// Text to translate (if not provided, reads from stdin)
    #[arg(value_name = "TEXT")]
    text: Option<String>,

    #[command(flatten)]
    translator: TranslatorArgs,
}

#[derive(Args)]
struct TrainArgs {
    /// Labelled corpus: UCI SMSSpamCollection (TSV) or Kaggle spam.csv
    #[arg(short, long, value_name = "PATH")]
    data: PathBuf,

    /// Where to write the artifacts (defaults to --model-dir)
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Largest n-gram size counted
    #[arg(long, default_value_t = 1)]
    ngram_max: usize,

    /// Minimum document frequency (proportion below 1.0, count otherwise)
    #[arg(long, default_value_t = 1.0)]
    min_df: f64,

    /// Maximum document frequency (proportion up to 1.0, count otherwise)
    #[arg(long, default_value_t = 1.0)]
    max_df: f64,

    /// Use 1 + ln(tf) instead of raw term frequency
    #[arg(long)]
    sublinear_tf: bool,

    /// Naive Bayes additive smoothing
    #[arg(long, default_value_t = 1.0)]
    alpha: f64,
}

#[derive(ValueEnum, Clone, Copy)]
enum OutputFormat {
    /// Just the label (Ham or Spam)
    Label,
    /// One JSON object per text, or an array in batch mode
    Json,
    /// Human-readable result
    Human,
}

#[derive(Clone, Copy)]
enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

enum InputSource {
    Single(String),
    Batch(Vec<String>),
}

struct PredictionResult {
    label: Label,
    normalized: String,
}

pub fn run(cli: &Cli) -> Result<()> {
    let verbosity = match (cli.quiet, cli.verbose) {
        (true, _) => Verbosity::Quiet,
        (_, true) => Verbosity::Verbose,
        _ => Verbosity::Normal,
    };
    init_tracing(verbosity);

    match &cli.command {
        Command::Classify(args) => {
            let classifier = load_classifier(&cli.model_dir)?;
            match determine_input_source(args)? {
                InputSource::Single(text) => {
                    let message = Message::new(text)?;
                    let result = process_single(&classifier, &message);
                    output_result(&result, args.format)?;
                }
                InputSource::Batch(texts) => {
                    let results = process_batch(&classifier, &texts);
                    output_batch_results(&results, args.format)?;
                }
            }
        }
        Command::Translate(args) => {
            let text = match &args.text {
                Some(text) => text.clone(),
                None => read_stdin()?,
            };
            let translated = args
                .translator
                .translator()
                .translate(&text, args.language)
                .with_context(|| format!("Failed to translate into {}", args.language))?;
            println!("{translated}");
        }
        Command::Train(args) => {
            ensure!(args.ngram_max >= 1, "--ngram-max must be at least 1");
            ensure!(
                args.min_df > 0.0 && args.max_df > 0.0,
                "--min-df and --max-df must be positive"
            );
            ensure!(args.alpha > 0.0, "--alpha must be positive");

            let corpus = Corpus::from_path(&args.data)?;
            let options = TrainOptions {
                params: VectorizerParams::new(
                    1..=args.ngram_max,
                    args.min_df,
                    args.max_df,
                    args.sublinear_tf,
                ),
                alpha: args.alpha,
            };
            let classifier = train::fit(&corpus, &options).context("Failed to train model")?;
            let out = args.out.as_deref().unwrap_or(&cli.model_dir);
            classifier.save(out)?;

            let report = train::evaluate(&classifier, &corpus);
            println!("Saved model to {}", out.display());
            println!("Training set: {report}");
        }
        Command::Interactive(args) => {
            let classifier = Arc::new(load_classifier(&cli.model_dir)?);
            let session = Session::new(classifier, Arc::new(args.translator()));
            let stdin = io::stdin();
            run_interactive(session, stdin.lock(), io::stdout())?;
        }
    }
    Ok(())
}

fn init_tracing(verbosity: Verbosity) {
    let default_filter = match verbosity {
        Verbosity::Quiet => "error",
        Verbosity::Normal => "warn",
        Verbosity::Verbose => "spamsens=debug,spamsens_preprocessing=debug",
    };
    // A subscriber may already be installed when embedded in tests
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init();
}

/// Model load failures are fatal: nothing is classified with a partial model.
fn load_classifier(model_dir: &Path) -> Result<SpamClassifier> {
    SpamClassifier::load(model_dir).with_context(|| {
        format!(
            "Failed to load model artifacts from {} (run `spamsens train` first)",
            model_dir.display()
        )
    })
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read from stdin")?;
    Ok(buffer)
}

/// Determine input source from CLI args
fn determine_input_source(args: &ClassifyArgs) -> Result<InputSource> {
    // Priority: text arg > file > batch > batch_json > stdin
    if let Some(text) = &args.text {
        return Ok(InputSource::Single(text.clone()));
    }

    if let Some(path) = &args.file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        return Ok(InputSource::Single(text));
    }

    if let Some(path) = &args.batch {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read batch file: {}", path.display()))?;
        let texts: Vec<String> = contents.lines().map(String::from).collect();
        return Ok(InputSource::Batch(texts));
    }

    if let Some(path) = &args.batch_json {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read JSON batch file: {}", path.display()))?;
        let texts: Vec<String> =
            serde_json::from_str(&contents).with_context(|| "Failed to parse JSON array")?;
        return Ok(InputSource::Batch(texts));
    }

    Ok(InputSource::Single(read_stdin()?))
}

fn process_single(classifier: &SpamClassifier, message: &Message) -> PredictionResult {
    let start = Instant::now();
    let (normalized, label) = classifier.normalize_and_classify(message);
    debug!(elapsed = ?start.elapsed(), %label, "Classified message");
    PredictionResult { label, normalized }
}

/// One entry per input text, in input order. Blank texts become an error entry
/// so the output still lines up with the input.
fn process_batch(
    classifier: &SpamClassifier,
    texts: &[String],
) -> Vec<Result<PredictionResult, MessageError>> {
    texts
        .iter()
        .enumerate()
        .map(|(idx, text)| {
            let message = Message::new(text.as_str())
                .inspect_err(|err| warn!(entry = idx + 1, %err, "Blank batch entry"))?;
            Ok(process_single(classifier, &message))
        })
        .collect()
}

fn result_json(result: &PredictionResult) -> serde_json::Value {
    serde_json::json!({
        "label": result.label,
        "spam": result.label.is_spam(),
        "normalized": result.normalized,
    })
}

fn batch_entry_json(entry: &Result<PredictionResult, MessageError>) -> serde_json::Value {
    match entry {
        Ok(result) => result_json(result),
        Err(err) => serde_json::json!({
            "label": null,
            "spam": null,
            "error": err.to_string(),
        }),
    }
}

/// Output single result based on format
fn output_result(result: &PredictionResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Label => println!("{}", result.label),
        OutputFormat::Json => println!("{}", serde_json::to_string(&result_json(result))?),
        OutputFormat::Human => {
            println!("Result: {}", result.label.describe());
            println!("Normalized: {:?}", result.normalized);
        }
    }
    Ok(())
}

fn output_batch_results(
    results: &[Result<PredictionResult, MessageError>],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json_array = results.iter().map(batch_entry_json).collect::<Vec<_>>();
            println!("{}", serde_json::to_string(&json_array)?);
        }
        _ => {
            for entry in results {
                match entry {
                    Ok(result) => output_result(result, format)?,
                    Err(err) => println!("Skipped: {err}"),
                }
            }
        }
    }
    Ok(())
}

enum ReplCommand {
    Event(Event),
    Help,
    Quit,
    Invalid(String),
}

const REPL_HELP: &str = "Commands:
  home | about | login | signup        open a page
  back                                 return to the home page
  predict <message>                    classify a message (home page)
  translate <language> <message>       translate a message (home page)
  login <email> <password>             log in (login page)
  signup <email> <password> <confirm>  create an account (signup page)
  logout                               log out
  help | quit";

fn parse_repl_command(line: &str) -> Option<ReplCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let args = rest.split_whitespace().collect::<Vec<_>>();

    let parsed = match (command.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("help" | "?", _) => ReplCommand::Help,
        ("quit" | "exit", _) => ReplCommand::Quit,
        ("home", []) => ReplCommand::Event(Event::Navigate(Page::Home)),
        ("about", []) => ReplCommand::Event(Event::Navigate(Page::About)),
        ("login", []) => ReplCommand::Event(Event::Navigate(Page::Login)),
        ("signup", []) => ReplCommand::Event(Event::Navigate(Page::Signup)),
        ("back", []) => ReplCommand::Event(Event::Back),
        ("logout", []) => ReplCommand::Event(Event::Logout),
        ("predict", _) => ReplCommand::Event(Event::Predict(rest.to_owned())),
        ("translate", [language, ..]) => match language.parse::<Language>() {
            Ok(language) => {
                let text = rest
                    .split_once(char::is_whitespace)
                    .map_or("", |(_, text)| text.trim());
                ReplCommand::Event(Event::Translate {
                    text: text.to_owned(),
                    language,
                })
            }
            Err(err) => ReplCommand::Invalid(err.to_string()),
        },
        ("login", [email, password]) => ReplCommand::Event(Event::Login {
            email: (*email).to_owned(),
            password: (*password).to_owned(),
        }),
        ("signup", [email, password, confirm]) => ReplCommand::Event(Event::Signup {
            email: (*email).to_owned(),
            password: (*password).to_owned(),
            confirm: (*confirm).to_owned(),
        }),
        _ => ReplCommand::Invalid(format!("Unrecognised command {line:?}; type `help`.")),
    };
    Some(parsed)
}

fn render_page<W: Write>(session: &Session, out: &mut W) -> io::Result<()> {
    let page = session.page();
    writeln!(out, "== {} ==", page.title())?;
    match page {
        Page::Home => writeln!(out, "{}", session.status())?,
        Page::About => writeln!(out, "{ABOUT_TEXT}")?,
        Page::Login | Page::Signup => {}
    }
    Ok(())
}

/// Drive a [`Session`] from line-oriented input until EOF or `quit`.
fn run_interactive<R: BufRead, W: Write>(mut session: Session, input: R, mut out: W) -> Result<()> {
    writeln!(out, "{REPL_HELP}")?;
    render_page(&session, &mut out)?;
    for line in input.lines() {
        let line = line.context("Failed to read command")?;
        match parse_repl_command(&line) {
            None => continue,
            Some(ReplCommand::Quit) => break,
            Some(ReplCommand::Help) => writeln!(out, "{REPL_HELP}")?,
            Some(ReplCommand::Invalid(reason)) => writeln!(out, "{reason}")?,
            Some(ReplCommand::Event(event)) => {
                let before = session.page();
                for notice in session.handle(event) {
                    writeln!(out, "{notice}")?;
                }
                if session.page() != before {
                    render_page(&session, &mut out)?;
                }
            }
        }
        out.flush()?;
    }
    Ok(())
}

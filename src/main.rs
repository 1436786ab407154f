#![warn(clippy::all, rust_2018_idioms)]

use clap::Parser;
use log::{error, info, warn};
use plurgen::lexicon::LexiconPaths;
use plurgen::pipeline::output_path;
use plurgen::plural::{AuditLog, AuditLogs, ClassifiedRecord, Decision, Reviewer};
use plurgen::table::Limit;
use plurgen::{Options, Pipeline, PlurGenError, PlurGenResult};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// Builds a plural-class feature table from lexical CSV files
#[derive(Parser, Debug)]
#[clap(name = "plurgen", version)]
#[clap(about = "Turn lexicon CSVs into a fixed-width feature table for plural classification")]
struct Args {
    /// JSON options file; command line flags override it
    #[clap(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Syllables in stress analysis (number or ALL)
    #[clap(long, value_name = "N|ALL")]
    stress_limit: Option<Limit>,

    /// Syllables in transcription (number or ALL)
    #[clap(long, value_name = "N|ALL")]
    syllable_limit: Option<Limit>,

    #[clap(long, value_name = "y|n", value_parser = parse_yes_no)]
    collapse_variable_pronunciations: Option<bool>,

    /// Underspecify word-final obstruents
    #[clap(long, value_name = "y|n", value_parser = parse_yes_no)]
    underspecification: Option<bool>,

    #[clap(long, value_name = "y|n", value_parser = parse_yes_no)]
    final_letter: Option<bool>,

    #[clap(long, value_name = "y|n", value_parser = parse_yes_no)]
    review_irregulars: Option<bool>,

    #[clap(long, value_name = "y|n", value_parser = parse_yes_no)]
    keep_irregulars: Option<bool>,

    #[clap(long, value_name = "y|n", value_parser = parse_yes_no)]
    write_irregulars: Option<bool>,

    #[clap(long, value_name = "y|n", value_parser = parse_yes_no)]
    review_variables: Option<bool>,

    #[clap(long, value_name = "y|n", value_parser = parse_yes_no)]
    keep_variables: Option<bool>,

    #[clap(long, value_name = "y|n", value_parser = parse_yes_no)]
    write_variables: Option<bool>,

    /// Name of the output file, `.csv` is appended when missing
    #[clap(long, short)]
    output: Option<String>,

    #[clap(long, default_value = "dpw.csv")]
    phonology: PathBuf,

    #[clap(long, default_value = "lexicon_singulars.csv")]
    singulars: PathBuf,

    #[clap(long, default_value = "lexicon_plurals.csv")]
    plurals: PathBuf,

    #[clap(long, default_value = "removed.txt")]
    removed_log: PathBuf,

    #[clap(long, default_value = "irregulars.txt")]
    irregulars_log: PathBuf,

    #[clap(long, default_value = "variables.txt")]
    variables_log: PathBuf,
}

fn parse_yes_no(s: &str) -> Result<bool, String> {
    match Decision::from_answer(s) {
        Some(Decision::Keep) => Ok(true),
        Some(Decision::Discard) => Ok(false),
        None => Err(format!("expected y or n, got {:?}", s)),
    }
}

fn prompt(question: &str) -> io::Result<String> {
    print!("{}", question);
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "stdin closed while waiting for an answer",
        ));
    }
    Ok(line)
}

/// Asks again until `parse` accepts the answer.
fn prompt_until<T>(question: &str, parse: impl Fn(&str) -> Option<T>) -> io::Result<T> {
    loop {
        if let Some(v) = parse(&prompt(question)?) {
            return Ok(v);
        }
    }
}

fn prompt_yes_no(question: &str) -> io::Result<bool> {
    prompt_until(&format!("{} (y/n): ", question), |s| parse_yes_no(s).ok())
}

struct StdinReviewer;

impl Reviewer for StdinReviewer {
    fn review(&mut self, record: &ClassifiedRecord) -> Decision {
        let question = format!(
            "Keep {} ({}) classified {}? (y/n): ",
            record.surface_form(),
            record.lemma(),
            record.class
        );
        match prompt_until(&question, Decision::from_answer) {
            Ok(d) => d,
            Err(e) => {
                warn!("{}, keeping {}", e, record.surface_form());
                Decision::Keep
            }
        }
    }
}

fn resolve_options(args: &Args) -> PlurGenResult<Options> {
    let from_file = args.config.is_some();
    let mut options = match &args.config {
        Some(path) => Options::from_path(path)?,
        None => Options::default(),
    };

    // Without a config file the limits and the main switches are asked for.
    let limit = |given: Option<Limit>, fallback: Limit, question: &str| -> io::Result<Limit> {
        match given {
            Some(l) => Ok(l),
            None if from_file => Ok(fallback),
            None => prompt_until(question, |s| s.parse::<Limit>().ok()),
        }
    };
    let switch = |given: Option<bool>, fallback: bool, question: &str| -> io::Result<bool> {
        match given {
            Some(b) => Ok(b),
            None if from_file => Ok(fallback),
            None => prompt_yes_no(question),
        }
    };
    options.stress_limiter = limit(
        args.stress_limit,
        options.stress_limiter,
        "Number of syllables in stress analysis (number/ALL): ",
    )?;
    options.syllable_limiter = limit(
        args.syllable_limit,
        options.syllable_limiter,
        "Number of syllables in transcription (number/ALL): ",
    )?;
    options.collapse_variable_pronunciations = switch(
        args.collapse_variable_pronunciations,
        options.collapse_variable_pronunciations,
        "Collapse variable pronunciations",
    )?;
    options.use_underspecification = switch(
        args.underspecification,
        options.use_underspecification,
        "Use underspecification for word-final obstruents",
    )?;
    options.include_final_letter = switch(
        args.final_letter,
        options.include_final_letter,
        "Include final letter",
    )?;

    let review = &mut options.review;
    review.review_irregulars = args.review_irregulars.unwrap_or(review.review_irregulars);
    review.keep_irregulars = args.keep_irregulars.unwrap_or(review.keep_irregulars);
    review.write_irregulars = args.write_irregulars.unwrap_or(review.write_irregulars);
    review.review_variables = args.review_variables.unwrap_or(review.review_variables);
    review.keep_variables = args.keep_variables.unwrap_or(review.keep_variables);
    review.write_variables = args.write_variables.unwrap_or(review.write_variables);
    Ok(options)
}

fn open_logs(args: &Args, options: &Options) -> PlurGenResult<AuditLogs> {
    let review = &options.review;
    let mut logs = AuditLogs::default();
    if review.review_irregulars || review.review_variables {
        logs.removed = Some(AuditLog::open_append(&args.removed_log)?);
    }
    if review.write_irregulars {
        logs.irregulars = Some(AuditLog::open_append(&args.irregulars_log)?);
    }
    if review.write_variables {
        logs.variables = Some(AuditLog::open_append(&args.variables_log)?);
    }
    Ok(logs)
}

fn run(args: Args) -> PlurGenResult<PathBuf> {
    let paths = LexiconPaths {
        phonology: args.phonology.clone(),
        singulars: args.singulars.clone(),
        plurals: args.plurals.clone(),
    };
    paths.check_presence()?;

    let options = resolve_options(&args)?;
    let path = match &args.output {
        Some(name) => output_path(name),
        None => output_path(&prompt("Name of output file: ")?),
    };
    if path.as_os_str() == ".csv" {
        return Err(PlurGenError::Configuration(
            "output file name is empty".to_string(),
        ));
    }
    info!("Options: {:?}", options);

    let records = paths.load_records()?;
    let mut logs = open_logs(&args, &options)?;
    let output = Pipeline::new(options)?.run(records, &mut StdinReviewer, &mut logs)?;
    output.write_to_path(&path)?;
    Ok(path)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("plurgen {}", plurgen::APP_VERSION);

    match run(Args::parse()) {
        Ok(path) => {
            println!("Finished successfully. Output written to {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

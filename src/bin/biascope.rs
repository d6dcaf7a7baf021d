//! CLI entry point for the bias harnesses.
//!
//! Usage:
//!   biascope <COMMAND> [ARGS]
//!
//! Commands:
//!   bias     Run the stereotype-bias probe
//!   survey   Run the Likert survey harness
//!
//! Examples:
//!   biascope bias cases.csv names.csv mistral
//!   biascope survey questions.txt mixtral 50

use std::env;
use std::process;

use biascope::eval::survey::csv_file_name;
use biascope::{
    load_gender_lexicon, load_questions, load_stereotype_cases, HttpTagger, OllamaChat,
    StereotypeEvaluator, SurveyRunner,
};

/// Default NER token-classification endpoint.
const DEFAULT_NER_ENDPOINT: &str = "http://127.0.0.1:8000";

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    match args[1].as_str() {
        "bias" | "b" => run_bias(&args[2..]),
        "survey" | "s" => run_survey(&args[2..]),
        "help" | "-h" | "--help" => print_usage(),
        "version" | "-V" | "--version" => {
            println!("biascope {}", env!("CARGO_PKG_VERSION"));
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            process::exit(1);
        }
    }
}

fn print_usage() {
    println!(
        r#"biascope - gender bias evaluation for chat LLMs

USAGE:
    biascope <COMMAND> [ARGS]

COMMANDS:
    bias, b      <cases.csv> <names.csv> <model> [ner-endpoint]
                 Run the stereotype-bias probe. Chat goes to the local
                 Ollama server; NER goes to a token-classification
                 endpoint (default {ner}).
    survey, s    <questions.txt> <model> [iterations]
                 Run the Likert survey harness (default 50 iterations).
    help         Print this help message
    version      Print version

EXAMPLES:
    # Stereotype probe against mistral
    biascope bias cases.csv names.csv mistral

    # Survey with 50 questionnaire repetitions
    biascope survey questions.txt mixtral 50
"#,
        ner = DEFAULT_NER_ENDPOINT
    );
}

fn run_bias(args: &[String]) {
    if args.len() < 3 {
        eprintln!("bias: expected <cases.csv> <names.csv> <model> [ner-endpoint]");
        process::exit(1);
    }
    let cases_path = &args[0];
    let names_path = &args[1];
    let model = &args[2];
    let ner_endpoint = args
        .get(3)
        .map(String::as_str)
        .unwrap_or(DEFAULT_NER_ENDPOINT);

    let result = (|| -> biascope::Result<()> {
        let lexicon = load_gender_lexicon(names_path)?;
        let cases = load_stereotype_cases(cases_path)?;
        println!(
            "Evaluating {} with {} cases ({} reference names)",
            model,
            cases.len(),
            lexicon.len()
        );

        let chat = OllamaChat::default();
        let tagger = HttpTagger::new(ner_endpoint);
        let evaluator = StereotypeEvaluator::new(&chat, &tagger, &lexicon, model);
        let report = evaluator.evaluate(&cases)?;

        println!();
        println!("f1_score_pro:  {:.4}", report.f1_pro);
        println!("f1_score_anti: {:.4}", report.f1_anti);
        println!("bias delta:    {:.4}", report.bias_delta);
        println!(
            "TP={} TN={} FP={} FN={} name errors={}",
            report.counts.true_positives,
            report.counts.true_negatives,
            report.counts.false_positives,
            report.counts.false_negatives,
            report.counts.name_errors
        );
        println!("Run log: {}", evaluator.log_path().display());
        Ok(())
    })();

    if let Err(e) = result {
        eprintln!("bias run failed: {}", e);
        process::exit(1);
    }
}

fn run_survey(args: &[String]) {
    if args.len() < 2 {
        eprintln!("survey: expected <questions.txt> <model> [iterations]");
        process::exit(1);
    }
    let questions_path = &args[0];
    let model = &args[1];
    let iterations: Option<usize> = match args.get(2) {
        Some(raw) => match raw.parse() {
            Ok(n) => Some(n),
            Err(_) => {
                eprintln!("survey: invalid iteration count: {}", raw);
                process::exit(1);
            }
        },
        None => None,
    };

    let result = (|| -> biascope::Result<()> {
        let questions = load_questions(questions_path)?;
        println!("Surveying {} with {} questions", model, questions.len());

        let chat = OllamaChat::default();
        let mut runner = SurveyRunner::new(&chat, model);
        if let Some(n) = iterations {
            runner = runner.with_iterations(n);
        }
        let table = runner.run(&questions)?;

        let out = csv_file_name(model);
        table.write_csv_path(&out)?;
        println!(
            "Wrote {} iterations x {} questions to {}",
            table.iterations(),
            table.question_count(),
            out
        );
        Ok(())
    })();

    if let Err(e) = result {
        eprintln!("survey run failed: {}", e);
        process::exit(1);
    }
}

use clap::{Arg, Command};
use log::LevelFilter;
use phishguard::config::Config;
use phishguard::corpus::ReferenceCorpus;
use phishguard::dynamic_dns::DynamicDnsList;
use phishguard::fusion::{AggregateResult, DecisionEngine};
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let matches = Command::new("phishguard")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Evaluates URLs for phishing risk with independent heuristic detectors")
        .arg(
            Arg::new("url")
                .short('u')
                .long("url")
                .value_name("URL")
                .help("URL to evaluate")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the full aggregate result as JSON")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(path) = matches.get_one::<String>("generate-config") {
        let config = Config::default();
        match config.to_file(path) {
            Ok(()) => {
                println!("Default configuration written to {path}");
                return;
            }
            Err(e) => {
                eprintln!("Error writing configuration: {e}");
                process::exit(1);
            }
        }
    }

    let config = match matches.get_one::<String>("config") {
        Some(path) => match Config::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading configuration from {path}: {e}");
                process::exit(1);
            }
        },
        None => Config::default(),
    };

    let url = match matches.get_one::<String>("url") {
        Some(url) => url.clone(),
        None => {
            eprintln!("No URL given; use --url <URL>");
            process::exit(1);
        }
    };

    let corpus = match load_corpus(&config) {
        Ok(corpus) => Arc::new(corpus),
        Err(e) => {
            eprintln!("Error loading reference corpus: {e}");
            process::exit(1);
        }
    };
    let dynamic_dns = match load_dynamic_dns(&config) {
        Ok(list) => Arc::new(list),
        Err(e) => {
            eprintln!("Error loading dynamic-DNS list: {e}");
            process::exit(1);
        }
    };

    let engine = match DecisionEngine::new(&config, corpus, dynamic_dns) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error initializing detectors: {e}");
            process::exit(1);
        }
    };

    let result = match engine.evaluate(&url).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error evaluating {url}: {e}");
            process::exit(1);
        }
    };

    if matches.get_flag("json") {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing result: {e}");
                process::exit(1);
            }
        }
    } else {
        print_summary(&result);
    }

    if result.is_phishing {
        process::exit(2);
    }
}

fn load_corpus(config: &Config) -> anyhow::Result<ReferenceCorpus> {
    match &config.corpus_path {
        Some(path) => ReferenceCorpus::load(path),
        None => ReferenceCorpus::builtin(),
    }
}

fn load_dynamic_dns(config: &Config) -> anyhow::Result<DynamicDnsList> {
    match &config.dynamic_dns_path {
        Some(path) => DynamicDnsList::load(path),
        None => DynamicDnsList::builtin(),
    }
}

fn print_summary(result: &AggregateResult) {
    if result.is_phishing {
        println!("{}: SUSPICIOUS", result.url);
        for reason in &result.reasons {
            println!("  - {reason}");
        }
    } else {
        println!("{}: no phishing indicators found", result.url);
    }

    println!("  final URL after redirects: {}", result.redirects.final_url);
    if let Some(age) = result.whois.age_days {
        println!("  domain age: {age} days");
    }
    println!(
        "  classifier: {} (score {})",
        result.ml_model.label, result.ml_model.score
    );
}

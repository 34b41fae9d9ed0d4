use std::{env, io::{self, Read}, path::PathBuf, process::ExitCode, time::Instant};

use creative_scoring::{
    discover, evaluate, specialization_suggestions, Dataset, DocumentId, EngagementFeatures, ModelStore,
    PrivacySignals, Profile, QualityBucket, ScoringConfig, ScoringError, ScoringToolkit,
};
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

type CliResult<T> = std::result::Result<T, CliError>;

fn usage(msg: impl Into<String>) -> CliError {
    CliError::Usage(msg.into())
}

/// Options shared by every subcommand
struct Options {
    config: Option<PathBuf>,
    store: Option<PathBuf>,
    k: Option<usize>,
    json: bool,
    signals: PrivacySignals,
    rest: Vec<String>,
}

fn parse_args<I: Iterator<Item = String>>(mut args: I) -> CliResult<Options> {
    let mut opts = Options {
        config: None,
        store: None,
        k: None,
        json: false,
        signals: PrivacySignals::default(),
        rest: Vec::new(),
    };
    while let Some(a) = args.next() {
        match a.as_str() {
            "--config" => {
                opts.config = Some(args.next().ok_or_else(|| usage("--config requires a path"))?.into());
            }
            "--store" => {
                opts.store = Some(args.next().ok_or_else(|| usage("--store requires a directory"))?.into());
            }
            "-k" | "--limit" => {
                let v = args.next().ok_or_else(|| usage("-k requires a number"))?;
                match v.parse::<usize>() {
                    Ok(n) if n > 0 => opts.k = Some(n),
                    _ => return Err(usage("-k needs a positive integer")),
                }
            }
            "--json" => opts.json = true,
            "--thumbnail" => opts.signals.has_thumbnail = true,
            "--tags" => opts.signals.has_tags = true,
            "--media" => opts.signals.has_media = true,
            "--link" => opts.signals.has_link = true,
            other => opts.rest.push(other.to_string()),
        }
    }
    Ok(opts)
}

/// Positional text, or stdin when there is none
fn text_arg(rest: &[String]) -> CliResult<String> {
    if !rest.is_empty() {
        return Ok(rest.join(" "));
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf).map_err(ScoringError::from)?;
    Ok(buf.trim().to_string())
}

fn count_arg(rest: &[String], idx: usize, name: &str) -> CliResult<f64> {
    let v = rest.get(idx).ok_or_else(|| usage(format!("missing {name}")))?;
    v.parse::<f64>().map_err(|_| usage(format!("{name} must be a number, got `{v}`")))
}

fn load_profiles(path: &str) -> CliResult<Vec<Profile>> {
    let content = std::fs::read_to_string(path).map_err(ScoringError::from)?;
    Ok(serde_json::from_str(&content).map_err(ScoringError::from)?)
}

fn run(command: &str, opts: Options) -> CliResult<()> {
    let mut config = match &opts.config {
        Some(path) => ScoringConfig::load(path)?,
        None => ScoringConfig::default(),
    };
    if let Some(dir) = &opts.store {
        config.store.dir = dir.clone();
    }
    if let Some(k) = opts.k {
        config.similarity.k = k;
    }
    let store = ModelStore::from_config(&config);

    match command {
        "similar" => {
            let toolkit = ScoringToolkit::load(config, &store)?;
            let query = text_arg(&opts.rest)?;
            let start = Instant::now();
            let hits = toolkit.similar(&query);
            info!(results = hits.len(), elapsed_ms = start.elapsed().as_secs_f64() * 1000.0, "similarity query");
            for hit in &hits.list {
                println!("{:.6}\t{}\t{}", hit.score, hit.document.id, hit.document.title);
            }
        }
        "classify" => {
            let toolkit = ScoringToolkit::load(config, &store)?;
            println!("{}", toolkit.category(&text_arg(&opts.rest)?));
        }
        "quality" => {
            let toolkit = ScoringToolkit::load(config, &store)?;
            let score = toolkit.quality(&text_arg(&opts.rest)?);
            println!("{score:.4}\t{}", QualityBucket::from_score(score));
        }
        "rating" => {
            let toolkit = ScoringToolkit::load(config, &store)?;
            let features = EngagementFeatures::from_counts(
                count_arg(&opts.rest, 0, "views")?,
                count_arg(&opts.rest, 1, "likes")?,
                count_arg(&opts.rest, 2, "comments")?,
            );
            println!("{:.4}", toolkit.rating(&features));
        }
        "privacy" => {
            let toolkit = ScoringToolkit::load(config, &store)?;
            let rec = toolkit.privacy(&opts.signals);
            println!("{}\t{}", rec.recommendation, rec.reason);
        }
        "upload" => {
            let path = opts.rest.first().ok_or_else(|| usage("upload requires a dataset file"))?;
            let dataset = Dataset::from_path(path)?;
            let trained = dataset.train(&config)?;
            trained.save(&store)?;
            info!(keys = ?trained.keys(), dir = %store.dir().display(), "stored trained models");
            for key in trained.keys() {
                println!("{key}");
            }
        }
        "clear" => {
            for key in store.clear()? {
                println!("removed {key}");
            }
        }
        "evaluate" => {
            let toolkit = ScoringToolkit::load(config, &store)?;
            let report = evaluate(&toolkit);
            if opts.json {
                println!("{}", serde_json::to_string_pretty(&report).map_err(ScoringError::from)?);
            } else {
                println!("{report}");
            }
        }
        "discover" => {
            let [profiles, viewer] = match opts.rest.as_slice() {
                [p, v] => [p, v],
                _ => return Err(usage("discover requires PROFILES.json and a viewer id")),
            };
            let profiles = load_profiles(profiles)?;
            let viewer = viewer.parse::<i64>().map(DocumentId::Num).unwrap_or_else(|_| DocumentId::from(viewer.as_str()));
            for m in discover(&profiles, &viewer, config.similarity.k) {
                println!("{:.6}\t{}\t{}", m.score, m.profile.id, m.profile.name);
            }
        }
        "suggest" => {
            let (path, text) = opts.rest.split_first().ok_or_else(|| usage("suggest requires PROFILES.json"))?;
            let profiles = load_profiles(path)?;
            for label in specialization_suggestions(&profiles, &text_arg(text)?, config.similarity.k) {
                println!("{label}");
            }
        }
        other => return Err(usage(format!("unknown command `{other}`"))),
    }
    Ok(())
}

fn print_usage() {
    eprintln!("Usage: creative-scoring [--config FILE] [--store DIR] [-k N] <command> [args]");
    eprintln!("Commands:");
    eprintln!("  similar TEXT                      nearest portfolio items (<score>\\t<id>\\t<title>)");
    eprintln!("  classify TEXT                     category: music, photography, video or other");
    eprintln!("  quality TEXT                      message quality score and bucket");
    eprintln!("  rating VIEWS LIKES COMMENTS       engagement rating");
    eprintln!("  privacy [--thumbnail] [--tags] [--media] [--link]");
    eprintln!("  upload DATASET.json               train and store models");
    eprintln!("  clear                             remove stored models");
    eprintln!("  evaluate [--json]                 score the active models on built-in fixtures");
    eprintln!("  discover PROFILES.json VIEWER     profiles similar to the viewer");
    eprintln!("  suggest PROFILES.json TEXT        specialization suggestions");
    eprintln!("If TEXT is omitted, stdin is read. RUST_LOG controls log output.");
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let Some(command) = args.next() else {
        print_usage();
        return ExitCode::from(2);
    };
    if command == "-h" || command == "--help" {
        print_usage();
        return ExitCode::SUCCESS;
    }
    let result = parse_args(args).and_then(|opts| run(&command, opts));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Usage(msg)) => {
            error!("{msg}");
            print_usage();
            ExitCode::from(2)
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

use m2ma_learning::prelude::*;

use thiserror::Error;
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::{filter, prelude::*};

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

#[derive(Debug, Error)]
enum CliError {
    #[error("could not load examples: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Learning(#[from] LearningError),
    #[error("could not load DFA: {0}")]
    Dot(#[from] DotError),
    #[error("could not read hypothesis: {0}")]
    Hypothesis(#[from] HypothesisError),
    #[error("cannot evaluate \"{word}\": {source}")]
    Word {
        word: String,
        source: AlphabetError,
    },
    #[error("could not access {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            CliError::Learning(LearningError::InsufficientInformation { .. }) => 2,
            _ => 1,
        }
    }
}

fn cli() -> clap::Command {
    let output = Arg::new("output")
        .short('o')
        .long("output")
        .help("writes the hypothesis as JSON to this file instead of stdout");
    let max_suffix_length = Arg::new("max-suffix-length")
        .long("max-suffix-length")
        .value_parser(value_parser!(usize))
        .help("caps the length of the full coverage columns");

    Command::new("m2ma-learn")
    .about("Learns GF(2) multiplicity automata from examples or from a DFA")
    .subcommand_required(true)
    .arg(
        Arg::new("verbosity")
        .short('v')
        .long("verbosity")
        .num_args(0..=1)
        .require_equals(true)
        .value_parser(["info", "debug", "trace"])
        .default_missing_value("info")
    )
    .subcommand(
        Command::new("examples")
        .about("learns passively from a JSON file of positive and negative examples")
        .arg(Arg::new("file").required(true))
        .arg(
            Arg::new("closed-world")
            .long("closed-world")
            .action(ArgAction::SetTrue)
            .help("treats every word that is not a positive example as negative")
        )
        .arg(
            Arg::new("strategy")
            .long("strategy")
            .value_parser(["strict", "heuristic", "auto"])
            .default_value("auto")
        )
        .arg(
            Arg::new("solver")
            .long("solver")
            .value_parser(["exact", "real"])
            .default_value("exact")
            .help("how the heuristic learner solves for transitions")
        )
        .arg(
            Arg::new("search-cap")
            .long("search-cap")
            .value_parser(value_parser!(usize))
        )
        .arg(max_suffix_length.clone())
        .arg(
            Arg::new("no-minimize")
            .long("no-minimize")
            .action(ArgAction::SetTrue)
        )
        .arg(output.clone())
    )
    .subcommand(
        Command::new("dfa")
        .about("learns actively from a DFA given in DOT format")
        .arg(Arg::new("file").required(true))
        .arg(
            Arg::new("random-tests")
            .long("random-tests")
            .value_parser(value_parser!(usize))
            .help("answers equivalence queries by this many random tests instead of exactly")
        )
        .arg(
            Arg::new("max-test-length")
            .long("max-test-length")
            .value_parser(value_parser!(usize))
            .default_value("25")
        )
        .arg(
            Arg::new("seed")
            .long("seed")
            .value_parser(value_parser!(u64))
            .default_value("0")
        )
        .arg(
            Arg::new("save-queries")
            .long("save-queries")
            .help("writes every answered query as an example file in the JSON format of `examples`")
        )
        .arg(
            Arg::new("relearn")
            .long("relearn")
            .action(ArgAction::SetTrue)
            .help("learns passively from the answered queries and compares with the active result")
        )
        .arg(max_suffix_length)
        .arg(output)
    )
    .subcommand(
        Command::new("evaluate")
        .about("evaluates a hypothesis on words, symbols are separated by spaces")
        .arg(Arg::new("hypothesis").required(true))
        .arg(Arg::new("words").num_args(0..))
    )
}

fn setup_logging(matches: &ArgMatches) {
    let level = match matches
        .try_get_one::<String>("verbosity")
        .ok()
        .flatten()
        .map(|m| m.as_str())
    {
        Some("trace") => filter::LevelFilter::TRACE,
        Some("debug") => filter::LevelFilter::DEBUG,
        Some("info") => filter::LevelFilter::INFO,
        _ => filter::LevelFilter::INFO,
    };

    let stderr_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(stderr_log.with_filter(level))
        .init();

    trace!("setup {level} logging");
}

fn read(path: &str) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_string(),
        source,
    })
}

fn emit(hypothesis: &Hypothesis, matches: &ArgMatches) -> Result<(), CliError> {
    match matches.get_one::<String>("output") {
        Some(path) => {
            std::fs::write(path, hypothesis.to_json()?).map_err(|source| CliError::Io {
                path: path.clone(),
                source,
            })?;
            info!("wrote hypothesis to {path}");
            println!("{hypothesis}");
        }
        None => println!("{}", hypothesis.to_json()?),
    }
    Ok(())
}

fn config_from(matches: &ArgMatches) -> LearnerConfig {
    let mut config = LearnerConfig::from_env();
    if let Some(&length) = matches.get_one::<usize>("max-suffix-length") {
        config = config.with_max_suffix_length(Some(length));
    }
    config
}

fn run_examples(matches: &ArgMatches) -> Result<(), CliError> {
    let path = matches
        .get_one::<String>("file")
        .expect("file is a required argument");
    let store = Store::from_json(&read(path)?)?.with_closed_world(matches.get_flag("closed-world"));
    debug!("loaded {store:?}");

    let strategy = match matches.get_one::<String>("strategy").map(String::as_str) {
        Some("strict") => Strategy::Strict,
        Some("heuristic") => Strategy::Heuristic,
        _ => Strategy::Auto,
    };
    let solver = match matches.get_one::<String>("solver").map(String::as_str) {
        Some("real") => Solver::RealEmbedding,
        _ => Solver::Exact,
    };
    let mut config = config_from(matches)
        .with_strategy(strategy)
        .with_solver(solver)
        .with_minimize(!matches.get_flag("no-minimize"));
    if let Some(&cap) = matches.get_one::<usize>("search-cap") {
        config = config.with_search_cap(cap);
    }

    let outcome = learn(&store, &config).map_err(|error| {
        if let LearningError::InsufficientInformation { missing } = &error {
            eprintln!("the labels of these words are needed:");
            for word in missing {
                eprintln!("  {}", store.alphabet().show(word));
            }
        }
        error
    })?;

    let verification = &outcome.verification;
    info!(
        "{}/{} positive and {}/{} negative examples are classified correctly",
        verification.positive_correct,
        verification.positive_total,
        verification.negative_correct,
        verification.negative_total
    );
    if let Status::Degraded(reason) = &outcome.status {
        warn!("best effort hypothesis: {reason}");
        for word in &verification.misclassified {
            warn!("misclassified: {}", store.alphabet().show(word));
        }
    }
    emit(&outcome.hypothesis, matches)
}

fn run_active<O: Oracle>(
    oracle: O,
    config: LearnerConfig,
) -> Result<(ActiveOutcome, LearnerConfig, Store), CliError> {
    let mut learner = ActiveLearner::new(oracle, config);
    let outcome = learner.infer()?;
    let config = learner.config().clone();
    Ok((outcome, config, learner.into_store()))
}

fn run_dfa(matches: &ArgMatches) -> Result<(), CliError> {
    let path = matches
        .get_one::<String>("file")
        .expect("file is a required argument");
    let dfa = Dfa::parse_dot(&read(path)?)?;
    let config = config_from(matches);
    let oracle = DfaOracle::new(dfa);

    let (outcome, config, queries) = match matches.get_one::<usize>("random-tests") {
        Some(&tests) => {
            let max_length = matches.get_one::<usize>("max-test-length").copied().unwrap_or(25);
            let seed = matches.get_one::<u64>("seed").copied().unwrap_or_default();
            let random = RandomTestingOracle::new(&oracle, seed)
                .with_num_tests(tests)
                .with_max_test_length(max_length);
            run_active(random, config)?
        }
        None => run_active(&oracle, config)?,
    };
    info!(
        "learned dimension {} from a DFA with {} states using {} membership and {} equivalence queries",
        outcome.hypothesis.dimension(),
        oracle.dfa().size(),
        outcome.membership_queries,
        outcome.equivalence_queries
    );
    if let Some(word) = oracle
        .dfa()
        .to_hypothesis()
        .distinguishing_word(&outcome.hypothesis)
    {
        warn!(
            "hypothesis differs from the DFA on \"{}\"",
            oracle.dfa().alphabet().show(&word)
        );
    }

    let queries = match matches.get_one::<String>("save-queries") {
        Some(target) => {
            queries.save(target)?;
            info!(
                "saved {} positive and {} negative queries to {target}",
                queries.positive().count(),
                queries.negative().count()
            );
            // relearning reads the file back, so the saved examples are what gets tested
            Store::load(target)?
        }
        None => queries,
    };
    if matches.get_flag("relearn") {
        let comparison = relearn(&outcome.hypothesis, &queries, &config)?;
        info!(
            "passive {:?} engine learned dimension {} from {} examples",
            comparison.outcome.engine,
            comparison.outcome.hypothesis.dimension(),
            queries.len()
        );
        if let Some((word, label)) = &comparison.counterexample {
            warn!(
                "passive hypothesis misclassifies the {} query \"{}\"",
                if *label { "positive" } else { "negative" },
                queries.alphabet().show(word)
            );
        }
        println!(
            "passive learning from the queries is {}",
            if comparison.is_equivalent() {
                "equivalent"
            } else {
                "not equivalent"
            }
        );
    }
    emit(&outcome.hypothesis, matches)
}

fn run_evaluate(matches: &ArgMatches) -> Result<(), CliError> {
    let path = matches
        .get_one::<String>("hypothesis")
        .expect("hypothesis is a required argument");
    let hypothesis = Hypothesis::from_json(&read(path)?)?;
    let alphabet = hypothesis.alphabet();
    for text in matches.get_many::<String>("words").into_iter().flatten() {
        let word = alphabet.parse_word(text).map_err(|source| CliError::Word {
            word: text.clone(),
            source,
        })?;
        let verdict = if hypothesis.evaluate(&word) {
            "accept"
        } else {
            "reject"
        };
        println!("{}\t{verdict}", alphabet.show(&word));
    }
    Ok(())
}

pub fn main() {
    let matches = cli().get_matches();

    setup_logging(&matches);

    let result = match matches.subcommand() {
        Some(("examples", sub_matches)) => run_examples(sub_matches),
        Some(("dfa", sub_matches)) => run_dfa(sub_matches),
        Some(("evaluate", sub_matches)) => run_evaluate(sub_matches),
        _ => unreachable!(),
    };

    if let Err(err) = result {
        error!("{err}");
        eprintln!("error: {err}");
        std::process::exit(err.exit_code());
    }
}

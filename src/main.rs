use concord::analysis::{ChatCompletionsClient, ConsistencyAnalyzer};
use concord::cli::{Cli, Commands, ConfigAction};
use concord::config::Config;
use concord::embedding::FastEmbedProvider;
use concord::error::{ConcordError, Result};
use concord::index::SimilarityIndex;
use concord::ingest::load_corpus;
use concord::pipeline::{QueryOutcome, RetrievalPipeline};
use concord::report::{JsonlReporter, QueryReporter};
use concord::retrieval::{scorer_for, Reranker};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    match cli.command {
        Commands::Query {
            questions,
            data_dir,
            top_k,
            rerank_top_k,
            json,
            no_log,
        } => {
            let options = QueryOptions {
                data_dir,
                top_k,
                rerank_top_k,
                json,
                no_log,
            };
            cmd_query(cli.config, &questions, options)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "concord=debug" } else { "concord=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt().with_env_filter(filter).with_target(false).init();
}

struct QueryOptions {
    data_dir: Option<PathBuf>,
    top_k: Option<usize>,
    rerank_top_k: Option<usize>,
    json: bool,
    no_log: bool,
}

fn cmd_query(config_path: Option<PathBuf>, questions: &[String], options: QueryOptions) -> Result<()> {
    let mut config = load_config(config_path)?;

    if let Some(data_dir) = options.data_dir {
        config.corpus.data_dir = data_dir;
    }
    if let Some(top_k) = options.top_k {
        config.retrieval.top_k = top_k;
    }
    if let Some(rerank_top_k) = options.rerank_top_k {
        config.retrieval.rerank_top_k = rerank_top_k;
    }

    let data_dir = expand_path(&config.corpus.data_dir)?;
    tracing::info!("Loading corpus from {}", data_dir.display());
    let passages = load_corpus(&data_dir)?;

    let provider = FastEmbedProvider::new(&config.embedding.model)?
        .with_batch_size(config.embedding.batch_size);
    let index = Arc::new(
        SimilarityIndex::new(Arc::new(provider)).with_batch_size(config.embedding.batch_size),
    );
    let indexed = index.build(passages)?;
    tracing::info!("Indexed {} passages", indexed);

    let reranker = Reranker::new(scorer_for(&config.reranker.model)?);

    let client = ChatCompletionsClient::new(config.chat_client_config())
        .map_err(|e| ConcordError::service_unavailable("reasoning", e.to_string()))?;
    let analyzer = ConsistencyAnalyzer::new(Arc::new(client), config.authority_policy()?);

    let pipeline = RetrievalPipeline::new(index, reranker, analyzer, config.pipeline_settings()?);

    let reporter = if options.no_log {
        None
    } else {
        let log_path = expand_path(&config.report.log_path)?;
        Some(JsonlReporter::new(log_path).with_preview_chars(config.report.preview_chars))
    };

    let results = pipeline.answer_all(questions);
    let mut failures = 0usize;

    for result in &results {
        if let (Ok(outcome), Some(reporter)) = (result, &reporter) {
            if let Err(e) = reporter.report(outcome) {
                tracing::warn!("Failed to log query outcome: {}", e);
            }
        }
        if result.is_err() {
            failures += 1;
        }
    }

    if options.json {
        print_json(questions, &results)?;
    } else {
        for (question, result) in questions.iter().zip(&results) {
            match result {
                Ok(outcome) => print_outcome(outcome),
                Err(e) => println!("✗ {}\n  Error: {}\n", question, e),
            }
        }
    }

    if failures > 0 {
        return Err(ConcordError::Other(anyhow::anyhow!(
            "{} of {} queries failed",
            failures,
            questions.len()
        )));
    }

    Ok(())
}

fn print_outcome(outcome: &QueryOutcome) {
    println!("Query: {}", outcome.query);

    println!("  Retrieved:");
    for item in &outcome.retrieved {
        println!(
            "    [{:>5}] {:.3}  {}",
            item.source_class(),
            item.score,
            item.passage.preview(80).replace('\n', " ")
        );
    }

    println!("  Reranked:");
    for item in &outcome.reranked {
        println!(
            "    [{:>5}] {:.3}  {}",
            item.source_class(),
            item.score,
            item.passage.preview(80).replace('\n', " ")
        );
    }

    let verdict = &outcome.verdict;
    println!("  Verdict: {}", verdict.status);
    if !verdict.explanation.is_empty() {
        println!("  Explanation: {}", verdict.explanation);
    }
    if !verdict.authoritative_answer.is_empty() {
        println!("  Answer: {}", verdict.authoritative_answer);
    }
    println!();
}

fn print_json(questions: &[String], results: &[Result<QueryOutcome>]) -> Result<()> {
    let entries: Vec<serde_json::Value> = questions
        .iter()
        .zip(results)
        .map(|(question, result)| match result {
            Ok(outcome) => serde_json::to_value(outcome).unwrap_or_else(|e| {
                serde_json::json!({ "query": question, "error": e.to_string() })
            }),
            Err(e) => serde_json::json!({ "query": question, "error": e.to_string() }),
        })
        .collect();

    let json = serde_json::to_string_pretty(&entries).map_err(|e| ConcordError::Json {
        source: e,
        context: "Failed to serialize query outcomes".to_string(),
    })?;
    println!("{}", json);
    Ok(())
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path)?;
            let toml = toml::to_string_pretty(&config)?;
            println!("{}", toml);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
            println!("  Authority: {}", config.authority_policy()?.describe());
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| ConcordError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            Config::default().save(&path)?;

            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if !path.exists() {
        tracing::warn!(
            "Config file not found, using defaults. Run 'concord config init' to create one."
        );
        let mut config = Config::default();
        config.apply_env_overrides();
        concord::config::ConfigValidator::validate(&config)?;
        return Ok(config);
    }

    Config::load(&path)
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    let path_str = path
        .to_str()
        .ok_or_else(|| ConcordError::Config("Invalid path encoding".to_string()))?;

    if let Some(stripped) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| ConcordError::Config("Cannot determine home directory".to_string()))?;
        Ok(home.join(stripped))
    } else {
        Ok(path.to_path_buf())
    }
}

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use svo_term_matcher::{
    config::Configuration,
    core::PhraseMatcher,
    handlers::{create_router, AppState},
    knowledge_graph::LocalOntology,
    nlp::{word_tokenize, LexiconTagger, PerceptronTagger, PosTagger},
    ontology::OntologyCategorizer,
    sparql::{OntologyBackend, SparqlClient},
    utils::{format_is_cat, format_what_is, MatchSerializer, OutputFormat},
    wordnet::WordNet,
};

#[derive(Parser)]
#[command(
    name = "svo_term_matcher",
    about = "Match phrases against the Scientific Variables Ontology",
    long_about = None,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (YAML, or JSON with a .json extension)
    #[arg(short, long, global = true, env = "SVO_MATCHER_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

/// Settings that override the configuration file.
#[derive(Args, Clone, Default)]
struct Overrides {
    /// SPARQL endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Turtle or N-Triples ontology dump used instead of the endpoint
    #[arg(long)]
    local_ontology: Option<PathBuf>,

    /// WordNet dictionary directory
    #[arg(long)]
    wordnet_dir: Option<PathBuf>,

    /// Averaged perceptron tagger model directory
    #[arg(long)]
    tagger_model: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the phrase matching HTTP API
    Serve {
        #[command(flatten)]
        overrides: Overrides,

        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Match one phrase and print the ranked variables
    Match {
        /// Underscore-separated phrase, e.g. river_discharge
        phrase: String,

        #[command(flatten)]
        overrides: Overrides,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormatArg,

        /// Number of results to keep (overrides config)
        #[arg(short = 'n', long)]
        max_results: Option<usize>,

        /// Also print the raw search tree as JSON
        #[arg(long)]
        tree: bool,
    },

    /// Show the ontological categories of every sense of a term
    WhatIs {
        term: String,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Check whether the senses of a term belong to a category
    IsCat {
        term: String,

        category: String,

        #[command(flatten)]
        overrides: Overrides,

        /// Print a single yes/no answer instead of one row per sense
        #[arg(long)]
        short: bool,
    },

    /// Tokenize and part-of-speech tag a text
    Tag {
        text: String,

        #[command(flatten)]
        overrides: Overrides,

        /// Only print the nouns
        #[arg(long)]
        nouns: bool,
    },

    /// Print statistics about a local ontology dump
    Stats {
        /// Turtle or N-Triples file
        ontology: PathBuf,
    },

    /// Validate configuration file
    Validate,

    /// Check that the SPARQL endpoint answers queries
    CheckEndpoint {
        /// SPARQL endpoint URL (overrides config)
        #[arg(long)]
        endpoint: Option<String>,
    },

    /// Generate example configuration file
    GenerateConfig {
        /// Output path for configuration file
        #[arg(short, long)]
        output: PathBuf,

        /// Configuration format (yaml or json)
        #[arg(short, long, default_value = "yaml")]
        format: ConfigFormat,
    },
}

#[derive(clap::ValueEnum, Clone, Copy)]
enum OutputFormatArg {
    Table,
    Json,
    Csv,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(format: OutputFormatArg) -> Self {
        match format {
            OutputFormatArg::Table => Self::Table,
            OutputFormatArg::Json => Self::Json,
            OutputFormatArg::Csv => Self::Csv,
        }
    }
}

#[derive(clap::ValueEnum, Clone)]
enum ConfigFormat {
    Yaml,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging; RUST_LOG wins over the flags
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };
    let filter = match std::env::var("RUST_LOG") {
        Ok(_) => EnvFilter::from_default_env(),
        Err(_) => EnvFilter::new(log_level),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config_path = cli.config;
    match cli.command {
        Commands::Serve { overrides, host, port } => {
            serve_command(config_path, overrides, host, port).await
        }
        Commands::Match { phrase, overrides, format, max_results, tree } => {
            match_command(config_path, overrides, phrase, format, max_results, tree).await
        }
        Commands::WhatIs { term, overrides } => {
            what_is_command(config_path, overrides, term).await
        }
        Commands::IsCat { term, category, overrides, short } => {
            is_cat_command(config_path, overrides, term, category, short).await
        }
        Commands::Tag { text, overrides, nouns } => {
            tag_command(config_path, overrides, text, nouns).await
        }
        Commands::Stats { ontology } => stats_command(config_path, ontology).await,
        Commands::Validate => validate_command(config_path).await,
        Commands::CheckEndpoint { endpoint } => {
            check_endpoint_command(config_path, endpoint).await
        }
        Commands::GenerateConfig { output, format } => {
            generate_config_command(output, format).await
        }
    }
}

fn load_config(path: Option<PathBuf>, overrides: &Overrides) -> Result<Configuration> {
    let mut config = match path {
        Some(path) => Configuration::from_file(&path)?,
        None => Configuration::default(),
    };

    if let Some(endpoint) = &overrides.endpoint {
        config.sparql.endpoint = endpoint.clone();
    }
    if let Some(local_ontology) = &overrides.local_ontology {
        config.sparql.local_ontology = Some(local_ontology.clone());
    }
    if let Some(wordnet_dir) = &overrides.wordnet_dir {
        config.wordnet.dict_dir = wordnet_dir.clone();
    }
    if let Some(model_dir) = &overrides.tagger_model {
        config.tagger.model_dir = Some(model_dir.clone());
    }

    config.validate()?;
    Ok(config)
}

fn load_wordnet(config: &Configuration) -> Result<Arc<WordNet>> {
    let dict_dir = &config.wordnet.dict_dir;
    let wordnet = WordNet::open(dict_dir)
        .with_context(|| format!("Failed to load WordNet from: {}", dict_dir.display()))?;

    info!(
        "WordNet loaded: {} synsets, {} lemmas",
        wordnet.synset_count(),
        wordnet.lemma_count()
    );
    Ok(Arc::new(wordnet))
}

fn build_categorizer(config: &Configuration, wordnet: Arc<WordNet>) -> Arc<OntologyCategorizer> {
    Arc::new(OntologyCategorizer::with_categories(
        &config.name,
        wordnet,
        &config.categories,
    ))
}

fn build_tagger(config: &Configuration, wordnet: Arc<WordNet>) -> Result<Arc<dyn PosTagger>> {
    match &config.tagger.model_dir {
        Some(model_dir) => {
            let tagger = PerceptronTagger::from_dir(model_dir)
                .with_context(|| format!("Failed to load tagger model from: {}", model_dir.display()))?;
            Ok(Arc::new(tagger))
        }
        None => {
            warn!("No tagger model configured, tagging from the WordNet lexicon");
            Ok(Arc::new(LexiconTagger::new(wordnet)))
        }
    }
}

fn build_backend(config: &Configuration) -> Result<Arc<dyn OntologyBackend>> {
    match &config.sparql.local_ontology {
        Some(path) => Ok(Arc::new(LocalOntology::from_file(path, &config.sparql.svu_namespace)?)),
        None => Ok(Arc::new(SparqlClient::new(
            &config.sparql.endpoint,
            &config.sparql.svu_namespace,
            config.sparql.timeout,
        )?)),
    }
}

fn build_matcher(config: &Configuration) -> Result<Arc<PhraseMatcher>> {
    let wordnet = load_wordnet(config)?;
    let categorizer = build_categorizer(config, wordnet.clone());
    let tagger = build_tagger(config, wordnet)?;
    let backend = build_backend(config)?;

    info!("Using {} with the {} tagger", backend.describe(), tagger.name());
    Ok(Arc::new(PhraseMatcher::new(
        backend,
        categorizer,
        tagger,
        config.match_settings(),
    )))
}

async fn serve_command(
    config_path: Option<PathBuf>,
    overrides: Overrides,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    println!("{}", " Starting SVO term matcher...".bright_blue().bold());

    let mut config = load_config(config_path, &overrides)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let matcher = build_matcher(&config)?;
    println!(" Ontology: {}", matcher.backend().describe().bright_green());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, matcher)?);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    println!(" Listening on {}", format!("http://{}", addr).bright_cyan());
    info!("Server started on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    println!(" Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        return;
    }
    info!("Shutdown requested");
}

async fn match_command(
    config_path: Option<PathBuf>,
    overrides: Overrides,
    phrase: String,
    format: OutputFormatArg,
    max_results: Option<usize>,
    tree: bool,
) -> Result<()> {
    let mut config = load_config(config_path, &overrides)?;
    if let Some(max_results) = max_results {
        config.matching.max_results = max_results;
        config.validate()?;
    }

    let matcher = build_matcher(&config)?;

    let report = if tree {
        let start_time = Instant::now();
        let searched = matcher.search_with_retry(&phrase).await?;
        println!("{}", serde_json::to_string_pretty(&searched)?);
        matcher.report(&phrase, &searched, start_time)
    } else {
        matcher.match_report(&phrase).await?
    };
    let output = MatchSerializer::new().serialize(&report.results, format.into())?;

    if let OutputFormatArg::Table = format {
        println!("{}", format!(" Matches for '{}'", phrase).bright_yellow().bold());
        print!("{}", output);
        println!(
            " Searched {} terms in {:.2}s",
            report.searched_terms.to_string().bright_cyan(),
            report.processing_time_seconds
        );
    } else {
        print!("{}", output);
    }

    Ok(())
}

async fn what_is_command(config_path: Option<PathBuf>, overrides: Overrides, term: String) -> Result<()> {
    let config = load_config(config_path, &overrides)?;
    let wordnet = load_wordnet(&config)?;
    let categorizer = build_categorizer(&config, wordnet);

    let rows = categorizer.what_is(&term);
    if rows.is_empty() {
        println!(" No WordNet senses for {}", term.bright_red());
        return Ok(());
    }

    println!("{}", format!(" Categories of '{}'", term).bright_yellow().bold());
    print!("{}", format_what_is(&rows));
    Ok(())
}

async fn is_cat_command(
    config_path: Option<PathBuf>,
    overrides: Overrides,
    term: String,
    category: String,
    short: bool,
) -> Result<()> {
    let config = load_config(config_path, &overrides)?;
    let wordnet = load_wordnet(&config)?;
    let categorizer = build_categorizer(&config, wordnet);

    if short {
        let member = categorizer.is_cat_any(&term, &category)?;
        if member {
            println!("{}", "yes".bright_green());
        } else {
            println!("{}", "no".bright_red());
        }
        return Ok(());
    }

    let rows = categorizer.is_cat(&term, &category)?;
    print!("{}", format_is_cat(&rows, &category));
    Ok(())
}

async fn tag_command(
    config_path: Option<PathBuf>,
    overrides: Overrides,
    text: String,
    nouns: bool,
) -> Result<()> {
    let config = load_config(config_path, &overrides)?;
    let wordnet = load_wordnet(&config)?;
    let tagger = build_tagger(&config, wordnet)?;

    let tagged = tagger.tag(&word_tokenize(&text));
    for (word, tag) in tagged {
        if nouns && !tag.starts_with("NN") {
            continue;
        }
        println!("{}\t{}", word, tag.bright_cyan());
    }
    Ok(())
}

async fn stats_command(config_path: Option<PathBuf>, ontology: PathBuf) -> Result<()> {
    println!("{}", " Ontology Statistics".bright_blue().bold());

    let config = load_config(config_path, &Overrides::default())?;
    let local = LocalOntology::from_file(&ontology, &config.sparql.svu_namespace)?;
    println!("{}", local.get_statistics());
    Ok(())
}

async fn validate_command(config_path: Option<PathBuf>) -> Result<()> {
    println!("{}", " Validating configuration...".bright_blue().bold());

    let Some(config_path) = config_path else {
        anyhow::bail!("No configuration file given, use --config");
    };

    match Configuration::from_file(&config_path) {
        Ok(config) => {
            match config.validate() {
                Ok(()) => {
                    println!(" Configuration is valid!");
                    println!(" Name: {}", config.name.bright_green());
                    match &config.sparql.local_ontology {
                        Some(path) => println!(" Local ontology: {}", path.display()),
                        None => println!(" Endpoint: {}", config.sparql.endpoint),
                    }
                    println!(" WordNet: {}", config.wordnet.dict_dir.display());
                    println!(" Categories: {}", config.categories.len());
                    println!(" Expansion category: {}", config.matching.expansion_category);
                    Ok(())
                }
                Err(e) => {
                    error!(" Configuration validation failed: {}", e);
                    Err(e)
                }
            }
        }
        Err(e) => {
            error!(" Failed to load configuration: {}", e);
            Err(e)
        }
    }
}

async fn check_endpoint_command(config_path: Option<PathBuf>, endpoint: Option<String>) -> Result<()> {
    println!("{}", " Checking SPARQL endpoint...".bright_blue().bold());

    let overrides = Overrides {
        endpoint,
        ..Overrides::default()
    };
    let config = load_config(config_path, &overrides)?;
    let client = SparqlClient::new(
        &config.sparql.endpoint,
        &config.sparql.svu_namespace,
        config.sparql.timeout,
    )?;

    if client.check_health().await? {
        println!(" Endpoint is healthy at {}", client.endpoint().bright_green());
    } else {
        println!(" Endpoint is not responding at {}", client.endpoint().bright_red());
        return Ok(());
    }

    match client.classes_for_label("river").await {
        Ok(classes) => println!(" Classes of 'river': {}", classes.join(", ").bright_cyan()),
        Err(e) => warn!(" Sample lookup failed: {:#}", e),
    }

    Ok(())
}

async fn generate_config_command(output_path: PathBuf, format: ConfigFormat) -> Result<()> {
    println!("{}", " Generating example configuration...".bright_blue().bold());

    let config = Configuration::example();

    let content = match format {
        ConfigFormat::Yaml => serde_yaml::to_string(&config)?,
        ConfigFormat::Json => serde_json::to_string_pretty(&config)?,
    };

    tokio::fs::write(&output_path, content).await?;

    println!(" Example configuration generated at: {}", output_path.display().to_string().bright_green());
    println!(" Edit the file to customize for your use case");

    Ok(())
}

use clap::Parser;
use modsearch::{Engine, EngineConfig, MemoryCorpus, SearchServer};
use rmcp::{ServiceExt, transport::stdio};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Serve module search and path redirects over MCP (stdio).
#[derive(Debug, Parser)]
#[command(name = "modsearch", version, about, long_about = None)]
struct Args {
    /// JSON corpus snapshot to serve
    #[arg(short, long)]
    corpus: String,

    /// TOML engine configuration
    #[arg(long)]
    config: Option<String>,

    /// Cache file for the precomputed path table
    #[arg(long)]
    path_table: Option<String>,

    /// Enable an experiment by name (repeatable)
    #[arg(short = 'x', long = "experiment")]
    experiments: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    modsearch::tracing::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(&expand_path(path))?,
        None => EngineConfig::default(),
    }
    .with_env_overrides()?;
    for name in &args.experiments {
        if !config.experiments.contains(name) {
            config.experiments.push(name.clone());
        }
    }

    let corpus_path = expand_path(&args.corpus);
    let corpus = load_corpus(&corpus_path, args.path_table.as_deref(), &config)?;

    tracing::info!(
        "Starting modsearch MCP server ({} modules, {} packages, experiments: {:?})",
        corpus.module_count(),
        corpus.package_count(),
        config.experiments().names()
    );

    let engine = Arc::new(Engine::new(Arc::new(corpus), config));
    let server = SearchServer::new(engine);
    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("Error serving MCP server: {:?}", e);
    })?;

    service.waiting().await?;

    Ok(())
}

/// Load the snapshot, reusing the cached path table when it matches.
fn load_corpus(
    corpus_path: &Path,
    path_table: Option<&str>,
    config: &EngineConfig,
) -> anyhow::Result<MemoryCorpus> {
    let corpus = match path_table.map(expand_path) {
        Some(cache) => MemoryCorpus::load_with_path_table(corpus_path, &cache)?,
        None => MemoryCorpus::load(corpus_path)?,
    };
    Ok(corpus.with_approximate_above(config.approximate_above))
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(expand_tilde(path).as_ref())
}

/// Expands tilde (`~`) in a path to the user's home directory.
fn expand_tilde(path: &str) -> Cow<'_, str> {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return Cow::Owned(home.join(stripped).display().to_string());
        }
    } else if path == "~"
        && let Some(home) = dirs::home_dir()
    {
        return Cow::Owned(home.display().to_string());
    }
    Cow::Borrowed(path)
}

//! QuestGraph CLI: build concept graphs from analysis files and manage saved graphs

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use questgraph::{
    export, Analysis, EmbeddingProvider, ExportFormat, GraphBuilder, GraphStorage,
    QuestGraphConfig,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "questgraph", version, about = "Concept graphs from learning analyses")]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding saved graphs
    #[arg(long, global = true, env = "QUESTGRAPH_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a graph from an analysis JSON file
    Generate {
        /// Path to the analysis JSON
        input: PathBuf,

        /// Output format: json, cytoscape, gexf or csv
        #[arg(long, default_value = "json")]
        format: String,

        /// Write the export here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Also save the graph to the data directory
        #[arg(long)]
        save: bool,

        /// Title used when saving
        #[arg(long)]
        title: Option<String>,

        /// Seed for topic clustering
        #[arg(long)]
        seed: Option<u64>,
    },
    /// List saved graphs, newest first
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print a saved graph as JSON
    Show { filename: String },
    /// Export a saved graph
    Export {
        filename: String,

        #[arg(long, default_value = "json")]
        format: String,

        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Delete a saved graph
    Delete { filename: String },
    /// Show storage usage
    Stats,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = dir;
    }

    match cli.command {
        Commands::Generate {
            input,
            format,
            output,
            save,
            title,
            seed,
        } => {
            if seed.is_some() {
                config.graph.seed = seed;
            }
            run_generate(&config, &input, &format, output.as_deref(), save, title.as_deref()).await
        }
        Commands::List { json } => run_list(&open_storage(&config)?, json),
        Commands::Show { filename } => {
            let stored = open_storage(&config)?.load(&filename)?;
            println!("{}", serde_json::to_string_pretty(&stored)?);
            Ok(())
        }
        Commands::Export {
            filename,
            format,
            output,
        } => {
            let exported = open_storage(&config)?.export(&filename, ExportFormat::parse(&format))?;
            write_output(output.as_deref(), &exported.body)?;
            if output.is_some() {
                eprintln!("Exported {} ({})", exported.filename, exported.content_type);
            }
            Ok(())
        }
        Commands::Delete { filename } => {
            open_storage(&config)?.delete(&filename)?;
            println!("Deleted {}", filename);
            Ok(())
        }
        Commands::Stats => {
            let storage = open_storage(&config)?;
            let stats = storage.stats()?;
            println!("Directory: {}", storage.dir().display());
            println!("Graphs:    {}", stats.total_graphs);
            println!("Bytes:     {}", stats.total_bytes);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<QuestGraphConfig> {
    let config = match path {
        Some(path) => QuestGraphConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?
            .with_env_overrides(|key| std::env::var(key).ok()),
        None => QuestGraphConfig::from_env(),
    };
    Ok(config)
}

fn open_storage(config: &QuestGraphConfig) -> anyhow::Result<GraphStorage> {
    GraphStorage::open(&config.storage.data_dir).with_context(|| {
        format!(
            "failed to open data directory {}",
            config.storage.data_dir.display()
        )
    })
}

async fn run_generate(
    config: &QuestGraphConfig,
    input: &Path,
    format: &str,
    output: Option<&Path>,
    save: bool,
    title: Option<&str>,
) -> anyhow::Result<()> {
    if title.is_some() && !save {
        bail!("--title only applies together with --save");
    }

    let text = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let analysis = Analysis::from_json(&text)
        .with_context(|| format!("{} is not a valid analysis document", input.display()))?;

    let provider = Arc::new(EmbeddingProvider::from_config(&config.embed)?);
    info!("Embedding with {}", provider.method());
    let builder = GraphBuilder::new(provider, config.graph.clone());
    let graph = builder.generate_graph(&analysis).await;

    if graph.is_empty() {
        eprintln!("Warning: no concepts found in {}", input.display());
    }

    if save {
        let mut extra = serde_json::Map::new();
        extra.insert(
            "source".to_string(),
            serde_json::Value::from(input.display().to_string()),
        );
        let saved = open_storage(config)?.save(&graph, title, extra)?;
        eprintln!("Saved {}", saved.filename);
    }

    let body = export(&graph, ExportFormat::parse(format)).into_body()?;
    write_output(output, &body)
}

fn run_list(storage: &GraphStorage, json: bool) -> anyhow::Result<()> {
    let graphs = storage.list()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&graphs)?);
        return Ok(());
    }
    if graphs.is_empty() {
        println!("(no saved graphs)");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["File", "Title", "Saved", "Concepts", "Edges", "Topics"]);
    for g in &graphs {
        table.add_row(vec![
            g.filename.clone(),
            g.title.clone(),
            g.saved_at.clone(),
            g.total_concepts.to_string(),
            g.total_edges.to_string(),
            g.topics.join(", "),
        ]);
    }

    println!("{}", table);
    println!("{} graph(s)", graphs.len());
    Ok(())
}

fn write_output(path: Option<&Path>, body: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => std::fs::write(path, body)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{}", body),
    }
    Ok(())
}

//! Roadcast CLI - Traffic Dataset Pipeline
//!
//! Command-line interface for preparing cached traffic datasets and
//! evaluating LINE edge objectives.

use clap::{Parser, Subcommand};
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use log::error;
use roadcast::{
    CacheFormat, Config, EdgeSampler, Line, Result, RoadcastError, TrafficSpeedDataset,
};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "roadcast")]
#[command(author = "Roadcast Contributors")]
#[command(version)]
#[command(about = "Traffic dataset pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Options shared by commands that load a dataset.
#[derive(clap::Args)]
struct DatasetArgs {
    /// JSON configuration file (missing keys take defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dataset name, overriding the configuration
    #[arg(short, long)]
    dataset: Option<String>,

    /// Directory holding the raw tables
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory for cached splits
    #[arg(long)]
    cache_dir: Option<PathBuf>,
}

impl DatasetArgs {
    fn load(self) -> Result<Config> {
        let mut config = match self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        if let Some(dataset) = self.dataset {
            config.dataset.dataset = dataset;
        }
        if let Some(dir) = self.data_dir {
            config.dataset.data_dir = dir;
        }
        if let Some(dir) = self.cache_dir {
            config.dataset.cache_dir = dir;
        }
        if config.dataset.dataset.is_empty() {
            return Err(RoadcastError::Configuration(
                "no dataset name given".to_string(),
            ));
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build (or load) the split cache and report partition shapes
    Prepare {
        #[command(flatten)]
        dataset: DatasetArgs,
    },

    /// Show the header of a cache file
    CacheInfo {
        /// Cache file to inspect
        path: PathBuf,

        /// Also decode the arrays and print their shapes
        #[arg(long)]
        arrays: bool,
    },

    /// Evaluate the LINE loss of a freshly initialized model on sampled edges
    LineLoss {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Proximity order (first, second), overriding the configuration
        #[arg(short, long)]
        order: Option<String>,

        /// Random seed for initialization and negative sampling
        #[arg(short, long)]
        seed: Option<u64>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let result = match cli.command {
        Commands::Prepare { dataset } => prepare(dataset),
        Commands::CacheInfo { path, arrays } => cache_info(path, arrays),
        Commands::LineLoss {
            dataset,
            order,
            seed,
        } => line_loss(dataset, order, seed),
    };

    if let Err(e) = result {
        error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn prepare(args: DatasetArgs) -> Result<()> {
    let start_time = Instant::now();
    let config = args.load()?;

    println!("Roadcast dataset pipeline");
    println!("   Dataset: {}", config.dataset.dataset);
    println!();

    let pb = spinner("Loading tables...");
    let dataset = TrafficSpeedDataset::new(config.dataset)?;
    pb.finish_and_clear();
    println!("✓ Loaded {} nodes", dataset.num_nodes());

    let pb = spinner("Preparing splits...");
    let prepared = dataset.get_data()?;
    pb.finish_and_clear();

    for (name, loader) in [
        ("train", &prepared.train),
        ("eval", &prepared.eval),
        ("test", &prepared.test),
    ] {
        println!(
            "✓ {:<5} x: {:?}, y: {:?}, {} batches",
            name,
            loader.inputs().shape(),
            loader.targets().shape(),
            loader.len()
        );
    }

    let feature = &prepared.feature;
    println!();
    println!("  Scaler: {}", feature.scaler.name());
    println!("  Nodes: {}, edges: {}", feature.num_nodes, feature.num_edges);
    println!(
        "  Feature dim: {}, output dim: {}",
        feature.feature_dim, feature.output_dim
    );
    if dataset.config().cache_dataset {
        println!("  Cache: {}", dataset.cache_path()?.display());
    }
    println!("  Done in {}", HumanDuration(start_time.elapsed()));

    Ok(())
}

fn cache_info(path: PathBuf, arrays: bool) -> Result<()> {
    let header = CacheFormat::read_header(&path)?;
    let digest: String = header.digest.iter().map(|b| format!("{:02x}", b)).collect();

    println!("Cache: {:?}", path);
    println!("  Format version: {}", header.version);
    println!("  Compressed: {}", header.is_compressed());
    println!("  Arrays: {}", header.num_arrays);
    println!("  Payload bytes: {}", header.payload_len);
    println!("  Digest: {}", digest);

    if arrays {
        let (_, data) = CacheFormat::read(&path, None)?;
        for (name, array) in data.named_arrays() {
            println!("  {:<8} {:?}", name, array.shape());
        }
    }

    Ok(())
}

fn line_loss(args: DatasetArgs, order: Option<String>, seed: Option<u64>) -> Result<()> {
    let mut config = args.load()?;
    if let Some(order) = order {
        config.embedding.order = order;
    }
    if seed.is_some() {
        config.embedding.seed = seed;
    }

    let dataset = TrafficSpeedDataset::new(config.dataset)?;
    let adjacency = dataset.adjacency().ok_or_else(|| {
        RoadcastError::MissingInput(dataset.config().table_path("rel"))
    })?;

    let mut sampler = EdgeSampler::new(config.embedding.negative_ratio, config.embedding.seed);
    let samples = sampler.sample(adjacency)?;
    let model = Line::new(&config.embedding, dataset.num_nodes())?;
    let loss = model.calculate_loss(&samples)?;

    println!("LINE ({} order)", model.order());
    println!("  Nodes: {}, edges: {}", model.num_nodes(), adjacency.num_edges());
    println!("  Embedding size: {}", model.embedding_size());
    println!("  Sampled pairs: {}", samples.len());
    println!("  Loss: {:.6}", loss);

    Ok(())
}

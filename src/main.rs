//! Tributary demo driver
//!
//! Streams random people through a `StreamEngine`, plants three Johns among
//! them, and times a predicate query over the `{name: "john"}` partition.
//!
//! ```text
//! tributary demo --records 300000 --producers 4
//! tributary config --output config.toml
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tributary::{
    generate_default_config, Analyzer, BatchReport, Config, IndexKey, LoggingConfig,
    NamedIndexer, QueryHandle, StreamEngine,
};

#[derive(Parser)]
#[command(name = "tributary")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "In-memory stream store with gated analyzers")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search the standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ingest random people and query the Johns
    Demo {
        /// Random people inserted around each planted John
        #[arg(short, long, default_value = "100000")]
        records: usize,
        /// Concurrent producers calling put
        #[arg(short, long, default_value = "4")]
        producers: usize,
        /// Print final engine stats as JSON
        #[arg(long)]
        stats_json: bool,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone)]
struct Person {
    name: String,
    age: u32,
    expected: bool,
}

impl std::fmt::Display for Person {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}... {}", self.name, self.age, self.expected)
    }
}

impl Person {
    fn new(name: &str, age: u32, expected: bool) -> Self {
        Self {
            name: name.to_string(),
            age,
            expected,
        }
    }

    fn random() -> Self {
        let id = uuid::Uuid::new_v4();
        let bytes = id.as_bytes();
        let age = 1 + u16::from_le_bytes([bytes[0], bytes[1]]) as u32 % 99;
        let name = id.simple().to_string()[..6].to_string();
        Self::new(&name, age, false)
    }
}

fn name_key(name: &str) -> IndexKey {
    IndexKey::field("name", name)
}

/// Reports every John and how many are indexed so far
struct JohnAnalyzer;

impl Analyzer<Person> for JohnAnalyzer {
    fn analyze(&self, stream: &QueryHandle<'_, Person>, person: &Person) {
        if person.name == "John" {
            tracing::info!(%person, "Found john");
        }

        let start = Instant::now();
        let johns = stream.query_where(&name_key("john"), |_| true).count();
        tracing::info!(johns, elapsed = ?start.elapsed(), "Johns found");
    }

    fn only_on_index(&self) -> Option<IndexKey> {
        Some(name_key("john"))
    }

    fn name(&self) -> &str {
        "john"
    }
}

/// Names that start and end with a 4
struct FourBookends;

impl Analyzer<Person> for FourBookends {
    fn analyze(&self, _stream: &QueryHandle<'_, Person>, person: &Person) {
        tracing::debug!(name = %person.name, "4..4");
    }

    fn only_on_index(&self) -> Option<IndexKey> {
        Some(name_key("4"))
    }

    fn can_analyze(&self, person: &Person) -> bool {
        person.name.ends_with('4')
    }

    fn name(&self) -> &str {
        "four-bookends"
    }
}

/// Running average age over every person
#[derive(Default)]
struct AgeAnalyzer {
    totals: Mutex<(u64, u64)>,
}

impl AgeAnalyzer {
    fn average(&self) -> f64 {
        let (people, total_age) = *self.totals.lock().unwrap_or_else(|e| e.into_inner());
        if people == 0 {
            0.0
        } else {
            total_age as f64 / people as f64
        }
    }
}

impl Analyzer<Person> for AgeAnalyzer {
    fn analyze(&self, _stream: &QueryHandle<'_, Person>, person: &Person) {
        let mut totals = self.totals.lock().unwrap_or_else(|e| e.into_inner());
        totals.0 += 1;
        totals.1 += person.age as u64;
        tracing::trace!(people = totals.0, avg = totals.1 as f64 / totals.0 as f64, "Age");
    }

    fn name(&self) -> &str {
        "average-age"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading config from {:?}", path))?,
        None => Config::load_default(),
    };

    match cli.command {
        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("writing {:?}", path))?;
                    println!("Wrote default config to {:?}", path);
                }
                None => print!("{}", content),
            }
            Ok(())
        }
        Commands::Demo {
            records,
            producers,
            stats_json,
        } => {
            init_logging(&config.logging);
            run_demo(config, records, producers, stats_json).await
        }
    }
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tributary={}", logging.level)));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run_demo(
    config: Config,
    records: usize,
    producers: usize,
    stats_json: bool,
) -> anyhow::Result<()> {
    tracing::info!("Tributary demo v{}", env!("CARGO_PKG_VERSION"));

    let engine = Arc::new(StreamEngine::with_config(config.engine)?);
    let ages = Arc::new(AgeAnalyzer::default());

    engine.add_indexer(NamedIndexer::new("first-letter", |p: &Person| {
        p.name
            .chars()
            .next()
            .map(|c| name_key(&c.to_lowercase().to_string()))
    }))?;
    engine.add_indexer(NamedIndexer::new("name", |p: &Person| {
        Some(name_key(&p.name.to_lowercase()))
    }))?;
    engine.add_analyzer(JohnAnalyzer)?;
    engine.add_analyzer(FourBookends)?;
    engine.add_analyzer(Arc::clone(&ages))?;

    println!("Inserting people");
    let start = Instant::now();
    let mut batch = BatchReport::default();
    for john in [
        Person::new("John", 35, false),
        Person::new("John", 2, true),
        Person::new("John", 31, false),
    ] {
        batch.merge(ingest_random(&engine, records, producers).await?);
        batch.merge(engine.put_all([john]));
    }
    println!(
        "Inserted {} people in {:.3}s (average age {:.2})",
        batch.records,
        start.elapsed().as_secs_f64(),
        ages.average()
    );
    if !batch.is_clean() {
        tracing::warn!(faults = batch.faults.len(), "Ingestion finished with faults");
    }

    println!("Querying records");
    let start = Instant::now();
    let results: Vec<_> = engine
        .query_where(&name_key("john"), |p| p.age == 2)
        .collect();
    println!("Time: {}s", start.elapsed().as_secs_f64());

    for person in &results {
        println!("{}", person);
    }

    let stats = engine.stats();
    if stats_json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("{}", stats);
    }

    Ok(())
}

/// Put `count` random people using `producers` concurrent blocking tasks
async fn ingest_random(
    engine: &Arc<StreamEngine<Person>>,
    count: usize,
    producers: usize,
) -> anyhow::Result<BatchReport> {
    let producers = producers.max(1);
    let mut tasks = Vec::with_capacity(producers);

    for p in 0..producers {
        let share = count / producers + usize::from(p < count % producers);
        let engine = Arc::clone(engine);
        tasks.push(tokio::task::spawn_blocking(move || {
            engine.put_all((0..share).map(|_| Person::random()))
        }));
    }

    let mut batch = BatchReport::default();
    for task in tasks {
        batch.merge(task.await?);
    }
    Ok(batch)
}

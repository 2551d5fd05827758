//! Trains an LDA model over a directory of text files.
//!
//! Nodes are simulated in-process: each one runs on its own thread and talks to the
//! others over a ring of channels, exactly as separate processes would over a network.
//!
//! Usage:
//!   distlda --corpus-dir ./corpus --vocab-list ./words.txt --num-topics 16 --num-nodes 2 --threads 4

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use lda_rs::corpus::{partition, split_documents, Vocabulary};
use lda_rs::distributed::{CollectiveBackend, CpuBackend};
use lda_rs::matrix::CsrMatrix;
use lda_rs::report::{document_topics, topic_summaries};
use lda_rs::{LdaConfig, NodeTrainer, TrainedModel};
use regex::Regex;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::thread;
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "distlda")]
#[command(about = "Distributed collapsed Gibbs sampling for Latent Dirichlet Allocation")]
struct Args {
    /// Directory holding one document per file
    #[arg(long)]
    corpus_dir: PathBuf,

    /// Vocabulary file, one word per line. Built from the corpus when omitted.
    #[arg(long)]
    vocab_list: Option<PathBuf>,

    /// JSON file with an `LdaConfig`; the flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of topics
    #[arg(long)]
    num_topics: Option<usize>,

    /// Number of sampling iterations
    #[arg(long)]
    num_iters: Option<usize>,

    /// Document-topic prior
    #[arg(long)]
    alpha: Option<f64>,

    /// Topic-word prior
    #[arg(long)]
    beta: Option<f64>,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Number of simulated nodes
    #[arg(long, default_value_t = 1)]
    num_nodes: usize,

    /// Worker threads (shards) per node
    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// Token pattern
    #[arg(long, default_value = r"[\p{L}\p{M}]+")]
    regex: String,

    /// Words printed per topic
    #[arg(long, default_value_t = 8)]
    top_words: usize,

    /// Topics printed per document
    #[arg(long, default_value_t = 4)]
    top_topics: usize,
}

fn resolve_config(args: &Args) -> Result<LdaConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str::<LdaConfig>(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => {
            let n_topics = args
                .num_topics
                .ok_or_else(|| anyhow!("--num-topics is required without --config"))?;
            LdaConfig::new(n_topics)
        }
    };

    if let Some(n) = args.num_topics {
        config.n_topics = n;
    }
    if let Some(n) = args.num_iters {
        config = config.with_iterations(n);
    }
    if let Some(a) = args.alpha {
        config = config.with_alpha(a);
    }
    if let Some(b) = args.beta {
        config = config.with_beta(b);
    }
    if let Some(s) = args.seed {
        config = config.with_seed(s);
    }
    config.validate()?;
    Ok(config)
}

/// Lowercases `text` and returns every match of `pattern`.
fn tokenize(pattern: &Regex, text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    pattern
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

fn corpus_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn load_vocabulary(path: &Path) -> Result<Vocabulary> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(Vocabulary::from_words(text.lines().map(str::trim)))
}

struct NodeResult {
    rank: usize,
    docs: Range<usize>,
    model: TrainedModel,
}

fn run_cluster(
    config: &LdaConfig,
    docs: &CsrMatrix,
    num_nodes: usize,
    threads: usize,
) -> Result<Vec<NodeResult>> {
    let ranges = partition(docs.nrows(), num_nodes)?;
    let vocab_size = docs.ncols();

    thread::scope(|scope| {
        let handles: Vec<_> = CpuBackend::ring(num_nodes)
            .into_iter()
            .zip(ranges)
            .map(|(backend, range)| {
                let config = config.clone();
                scope.spawn(move || -> Result<NodeResult> {
                    let rank = backend.rank();
                    let node_docs = docs.slice_rows(range.start, range.end)?;
                    let shards = split_documents(&node_docs, threads)?;
                    let mut trainer = NodeTrainer::new(config, backend, vocab_size, shards)
                        .with_context(|| format!("initializing node {rank}"))?;
                    trainer
                        .train()
                        .with_context(|| format!("training node {rank}"))?;
                    Ok(NodeResult {
                        rank,
                        docs: range,
                        model: trainer.into_model(),
                    })
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| {
                h.join()
                    .map_err(|_| anyhow!("node thread panicked"))
                    .and_then(|r| r)
            })
            .collect()
    })
}

fn main() -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    if args.num_nodes == 0 || args.threads == 0 {
        bail!("--num-nodes and --threads must be at least 1");
    }
    let config = resolve_config(&args)?;
    let pattern = Regex::new(&args.regex).with_context(|| format!("bad --regex {}", args.regex))?;

    let files = corpus_files(&args.corpus_dir)?;
    let texts = files
        .iter()
        .map(|p| fs::read_to_string(p).with_context(|| format!("reading {}", p.display())))
        .collect::<Result<Vec<_>>>()?;
    let tokenized: Vec<Vec<String>> = texts.iter().map(|t| tokenize(&pattern, t)).collect();

    let vocab = match &args.vocab_list {
        Some(path) => load_vocabulary(path)?,
        None => Vocabulary::from_words(tokenized.iter().flatten().cloned()),
    };
    if vocab.is_empty() {
        bail!("vocabulary is empty");
    }

    let mut dropped = 0;
    let documents: Vec<Vec<usize>> = tokenized
        .iter()
        .map(|doc| {
            let (ids, skipped) = vocab.encode(doc.iter().map(String::as_str));
            dropped += skipped;
            ids
        })
        .collect();
    if dropped > 0 {
        warn!(dropped, "tokens outside the vocabulary were ignored");
    }
    let docs = CsrMatrix::from_documents(&documents, vocab.len())?;
    info!(
        documents = docs.nrows(),
        vocab_size = vocab.len(),
        tokens = docs.token_count(),
        nodes = args.num_nodes,
        threads = args.threads,
        "corpus loaded"
    );

    let mut results = run_cluster(&config, &docs, args.num_nodes, args.threads)?;
    results.sort_by_key(|r| r.rank);

    let Some(first) = results.first() else {
        bail!("no node results");
    };
    let topics = topic_summaries(&first.model.topic_word, args.top_words);
    for topic in &topics {
        let words: Vec<&str> = topic
            .top_words
            .iter()
            .filter_map(|&(w, _)| vocab.word(w))
            .collect();
        println!("topic {}\t{:.6}\t{}", topic.topic, topic.share, words.join(" "));
    }
    println!(
        "prob sum\t{:.6}",
        topics.iter().map(|t| t.share).sum::<f64>()
    );

    for result in &results {
        let mut doc = result.docs.start;
        for shard in &result.model.shards {
            for dist in document_topics(&shard.topic_doc, args.top_topics) {
                let pairs: Vec<String> = dist
                    .iter()
                    .map(|(t, p)| format!("({p:.4},{t})"))
                    .collect();
                let name = files
                    .get(doc)
                    .and_then(|p| p.file_name())
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                println!("document {doc}\t{name}\t{}", pairs.join(" "));
                doc += 1;
            }
        }
    }
    Ok(())
}

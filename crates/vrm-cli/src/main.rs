//! VRM CLI
//!
//! Command-line interface for verified repo memory.

use std::io;
use std::path::PathBuf;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use vrm_core::ops::{self, SearchResult};
use vrm_core::{
    discover_root, CitationInput, Config, CreateMemoryInput, ListFilter, ListInput, RetrieveInput,
    SearchInput, Store, ValidationStatus,
};

/// VRM - Verified Repo Memory CLI
#[derive(Parser)]
#[command(name = "vrm")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Store and retrieve facts about a repository, verified against its code")]
#[command(long_about = "Every memory cites line ranges of repository files. Citations are re-checked \
against the working tree on retrieval and re-anchored when code moves.")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Repository path (defaults to the current directory)
    #[arg(long, global = true)]
    repo: Option<PathBuf>,

    /// Data directory (defaults to <repo>/.verified-repo-memory)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Default TTL for new and refreshed memories, in days
    #[arg(long, global = true, value_parser = clap::value_parser!(i64).range(1..=365))]
    ttl_days: Option<i64>,

    /// Files larger than this are treated as missing
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    max_file_bytes: Option<u64>,

    /// Do not reject input that looks like a credential
    #[arg(long, global = true)]
    no_secret_scan: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a memory with file citations
    Store {
        /// Short headline (max 80 chars)
        #[arg(long)]
        subject: String,
        /// The fact (max 800 chars)
        #[arg(long)]
        fact: String,
        /// Why it matters (max 400 chars)
        #[arg(long)]
        reason: Option<String>,
        /// Tags (comma-separated)
        #[arg(long)]
        tags: Option<String>,
        /// TTL for this memory, overriding the default
        #[arg(long, value_parser = clap::value_parser!(i64).range(1..=365))]
        ttl: Option<i64>,
        /// Citation as path:start-end or path:start-end:note (repeatable, 1-5)
        #[arg(long = "cite", required = true, value_parser = parse_citation)]
        citations: Vec<CitationInput>,
    },

    /// Keyword search without verification
    Search {
        query: String,
        #[arg(long)]
        limit: Option<usize>,
        /// Include memories past their expiry
        #[arg(long)]
        include_expired: bool,
    },

    /// Search, verify against the working tree, and return valid memories
    Retrieve {
        query: String,
        #[arg(long)]
        limit: Option<usize>,
        /// Also show stale and missing candidates
        #[arg(long)]
        include_stale: bool,
        /// Do not refresh the TTL of returned memories
        #[arg(long)]
        no_touch: bool,
    },

    /// List memories by status
    List {
        /// all, valid, stale or missing
        #[arg(long, default_value = "all")]
        status: String,
        #[arg(long)]
        limit: Option<usize>,
        /// Re-verify instead of using stored statuses
        #[arg(long)]
        verify: bool,
    },

    /// Verify one memory now
    Verify {
        /// Memory ID
        id: String,
    },

    /// Delete a memory
    Forget {
        /// Memory ID
        id: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so --json output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::WARN.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(false)
        .init();

    let config = build_config(&cli.global)?;
    let mut store = Store::from_config(&config)?;
    let json = cli.global.json;

    match cli.command {
        Commands::Store {
            subject,
            fact,
            reason,
            tags,
            ttl,
            citations,
        } => {
            let input = CreateMemoryInput {
                subject,
                fact,
                reason,
                tags: split_tags(tags.as_deref()),
                ttl_days: ttl,
                citations,
            };
            run_store(&mut store, &config, input, json)
        }
        Commands::Search {
            query,
            limit,
            include_expired,
        } => {
            let input = SearchInput {
                query,
                limit,
                include_expired,
            };
            run_search(&mut store, input, json)
        }
        Commands::Retrieve {
            query,
            limit,
            include_stale,
            no_touch,
        } => {
            let input = RetrieveInput {
                query,
                limit,
                include_stale,
                touch: !no_touch,
            };
            run_retrieve(&mut store, &config, input, json)
        }
        Commands::List {
            status,
            limit,
            verify,
        } => {
            let input = ListInput {
                status: status.parse::<ListFilter>()?,
                limit,
                verify,
            };
            run_list(&mut store, &config, input, json)
        }
        Commands::Verify { id } => run_verify(&mut store, &config, &id, json),
        Commands::Forget { id } => run_forget(&mut store, &id, json),
    }
}

fn build_config(args: &GlobalArgs) -> anyhow::Result<Config> {
    let start = match &args.repo {
        Some(path) => path.clone(),
        None => std::env::current_dir()?,
    };

    let mut config = Config::from_env(discover_root(&start));
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if args.ttl_days.is_some() {
        config = config.with_ttl_days(args.ttl_days);
    }
    if args.max_file_bytes.is_some() {
        config = config.with_max_file_bytes(args.max_file_bytes);
    }
    if args.no_secret_scan {
        config.secret_scan = false;
    }

    Ok(config)
}

/// Parse `path:start-end[:note]`
fn parse_citation(s: &str) -> Result<CitationInput, String> {
    let (path, rest) = s
        .split_once(':')
        .ok_or_else(|| format!("expected path:start-end, got '{s}'"))?;
    let (range, note) = match rest.split_once(':') {
        Some((range, note)) => (range, Some(note.to_string())),
        None => (rest, None),
    };
    let (start, end) = match range.split_once('-') {
        Some((start, end)) => (start, end),
        None => (range, range),
    };

    let start_line = start
        .trim()
        .parse()
        .map_err(|_| format!("invalid start line '{start}'"))?;
    let end_line = end
        .trim()
        .parse()
        .map_err(|_| format!("invalid end line '{end}'"))?;

    if path.is_empty() {
        return Err(format!("missing path in '{s}'"));
    }

    Ok(CitationInput {
        path: path.to_string(),
        start_line,
        end_line,
        note,
    })
}

fn split_tags(tags: Option<&str>) -> Vec<String> {
    tags.map(|t| {
        t.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ============================================================================
// COMMANDS
// ============================================================================

fn run_store(
    store: &mut Store,
    config: &Config,
    input: CreateMemoryInput,
    json: bool,
) -> anyhow::Result<()> {
    let created = ops::create_memory(store, config, input, Utc::now())?;
    if json {
        return print_json(&created);
    }

    println!("{}", "=== VRM Store ===".cyan().bold());
    println!();
    println!("{}: {}", "Memory ID".white().bold(), created.memory_id);
    println!(
        "{}: {}",
        "Expires".white().bold(),
        created.expires_at.format("%Y-%m-%d %H:%M:%S")
    );
    for citation in &created.citations {
        println!(
            "  {} {}:{}-{} {}",
            "-".dimmed(),
            citation.path,
            citation.start_line,
            citation.end_line,
            truncate(&citation.snippet_preview, 60).dimmed()
        );
    }
    println!();
    println!("{}", "Memory stored".green().bold());
    Ok(())
}

fn run_search(store: &mut Store, input: SearchInput, json: bool) -> anyhow::Result<()> {
    let result: SearchResult = ops::search(store, input, Utc::now())?;
    if json {
        return print_json(&result);
    }

    println!("{}", format!("=== VRM Search: {} ===", result.query).cyan().bold());
    println!();
    if result.results.is_empty() {
        println!("{}", "No matching memories.".dimmed());
    }
    for hit in &result.results {
        println!("{} {}", hit.id.dimmed(), hit.subject.white().bold());
        println!("  {}", truncate(&hit.fact_preview, 100));
        if !hit.tags.is_empty() {
            println!("  {}: {}", "Tags".dimmed(), hit.tags.join(", "));
        }
        println!("  {}: {}", "Cites".dimmed(), hit.citation_paths.join(", "));
    }
    println!();
    println!(
        "{} of {} memories, {} expired removed",
        result.stats.returned, result.stats.total_memories, result.stats.deleted_expired
    );
    Ok(())
}

fn run_retrieve(
    store: &mut Store,
    config: &Config,
    input: RetrieveInput,
    json: bool,
) -> anyhow::Result<()> {
    let result = ops::retrieve(store, config, input, Utc::now())?;
    if json {
        return print_json(&result);
    }

    println!("{}", format!("=== VRM Retrieve: {} ===", result.query).cyan().bold());
    println!();
    if result.valid.is_empty() {
        println!("{}", "No verified memories.".dimmed());
    }
    for memory in &result.valid {
        println!("{} {}", memory.id.dimmed(), memory.subject.white().bold());
        println!("  {}", memory.fact);
        if let Some(reason) = &memory.reason {
            println!("  {}: {}", "Reason".dimmed(), reason);
        }
        for citation in &memory.citations {
            println!(
                "  {} {}:{}-{} {}",
                "-".dimmed(),
                citation.path,
                citation.start_line,
                citation.end_line,
                status_label(citation.status)
            );
        }
    }

    for (label, group) in [("Stale", &result.stale), ("Missing", &result.missing)] {
        if let Some(memories) = group
            && !memories.is_empty()
        {
            println!();
            println!("{}", format!("=== {label} ===").yellow().bold());
            for memory in memories {
                println!("{} {}", memory.id.dimmed(), memory.subject);
            }
        }
    }

    let stats = &result.stats;
    println!();
    println!(
        "{} candidates, {} valid, {} relocated, {} stale, {} missing ({} ms)",
        stats.candidates,
        stats.valid_count,
        stats.relocated_count,
        stats.stale_count,
        stats.missing_count,
        stats.took_ms
    );
    Ok(())
}

fn run_list(
    store: &mut Store,
    config: &Config,
    input: ListInput,
    json: bool,
) -> anyhow::Result<()> {
    let result = ops::list(store, config, input, Utc::now())?;
    if json {
        return print_json(&result);
    }

    println!("{}", "=== VRM Memories ===".cyan().bold());
    println!();
    if result.items.is_empty() {
        println!("{}", "No memories found.".dimmed());
    }
    for item in &result.items {
        println!(
            "{} {} {}",
            status_label(Some(item.status)),
            item.id.dimmed(),
            item.subject.white().bold()
        );
        println!(
            "  {}: {}  {}: {}",
            "Updated".dimmed(),
            item.updated_at.format("%Y-%m-%d %H:%M"),
            "Expires".dimmed(),
            item.expires_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

fn run_verify(store: &mut Store, config: &Config, id: &str, json: bool) -> anyhow::Result<()> {
    let verified = ops::verify(store, config, id, Utc::now())?;
    if json {
        return print_json(&serde_json::json!({
            "memoryId": verified.memory.id,
            "status": verified.status,
            "changed": verified.changed,
            "citations": verified.memory.citations,
        }));
    }

    println!("{}", "=== VRM Verify ===".cyan().bold());
    println!();
    println!("{}: {}", "Memory".white().bold(), verified.memory.subject);
    println!("{}: {}", "Status".white().bold(), status_label(Some(verified.status)));
    for citation in &verified.memory.citations {
        println!(
            "  {} {}:{}-{} {} {}",
            "-".dimmed(),
            citation.path,
            citation.start_line,
            citation.end_line,
            status_label(citation.last_validation_status),
            citation
                .last_validation_detail
                .as_deref()
                .unwrap_or_default()
                .dimmed()
        );
    }
    Ok(())
}

fn run_forget(store: &mut Store, id: &str, json: bool) -> anyhow::Result<()> {
    let result = ops::forget(store, id, Utc::now())?;
    if json {
        return print_json(&result);
    }

    if result.deleted {
        println!("{}", format!("Forgot {}", result.memory_id).green().bold());
    } else {
        println!("{}", format!("No memory with id {}", result.memory_id).yellow());
    }
    Ok(())
}

fn status_label(status: Option<ValidationStatus>) -> colored::ColoredString {
    match status {
        Some(ValidationStatus::Valid) => "VALID".green(),
        Some(ValidationStatus::Relocated) => "RELOCATED".cyan(),
        Some(ValidationStatus::Stale) => "STALE".yellow(),
        Some(ValidationStatus::Missing) => "MISSING".red(),
        None => "UNVERIFIED".dimmed(),
    }
}

/// Truncate a string for display (UTF-8 safe)
fn truncate(s: &str, max_chars: usize) -> String {
    let s = s.replace('\n', " ");
    if s.chars().count() <= max_chars {
        s
    } else {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

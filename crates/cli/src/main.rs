use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use kb_core::{
    load_base_collection, steps, ClientConfig, DisabledMirror, FileSlotStore, HttpMirror,
    LocalPersistence, MutationReport, Notice, Origin, RemoteMirror, RemoteOutcome, Solution,
    SolutionId, SolutionInput, SolutionService, UnionEntry,
};
use serde_json::Value;
use std::str::FromStr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Service = SolutionService<FileSlotStore, Box<dyn RemoteMirror>>;

#[derive(Parser)]
#[command(name = "kb")]
#[command(about = "IT support knowledge base CLI")]
struct Cli {
    /// Do not mirror changes to the remote service
    #[arg(long, global = true)]
    offline: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search titles, problem statements, and trigger keywords
    Search {
        /// Search text; several words are joined with spaces
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Show one solution with its steps
    Show {
        /// Position in the full list (see `kb list`)
        index: usize,
    },
    /// List solutions
    List {
        /// Only list custom solutions, numbered by their custom position
        #[arg(long)]
        custom: bool,
    },
    /// Add a custom solution
    Add(SolutionArgs),
    /// Edit a custom solution; omitted fields keep their current value
    Edit {
        /// Custom position or solution id
        target: Target,
        #[command(flatten)]
        fields: SolutionArgs,
    },
    /// Delete a custom solution
    Delete {
        /// Custom position or solution id
        target: Target,
    },
    /// Show sync status of custom solutions
    Status {
        /// Push the full collection to the remote service again
        #[arg(long)]
        sync: bool,
    },
    /// Show the collection stored by the remote service
    Pull,
}

#[derive(Args, Default)]
struct SolutionArgs {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    problem: Option<String>,
    /// Numbered steps, e.g. "1) Restart 2) Reconnect"
    #[arg(long)]
    description: Option<String>,
    /// Comma-separated keywords
    #[arg(long)]
    triggers: Option<String>,
    #[arg(long)]
    next_step: Option<String>,
}

impl SolutionArgs {
    /// Overlays the given fields onto `form`.
    fn apply(self, mut form: SolutionInput) -> SolutionInput {
        if let Some(title) = self.title {
            form.title = title;
        }
        if let Some(problem) = self.problem {
            form.problem_statement = problem;
        }
        if let Some(description) = self.description {
            form.description = description;
        }
        if let Some(triggers) = self.triggers {
            form.triggers = triggers;
        }
        if let Some(next_step) = self.next_step {
            form.next_step = next_step;
        }
        form
    }
}

/// A custom solution addressed by position or by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Index(usize),
    Id(SolutionId),
}

impl FromStr for Target {
    type Err = kb_core::KbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<usize>() {
            Ok(index) => Ok(Target::Index(index)),
            Err(_) => SolutionId::from_str(s).map(Target::Id),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("kb=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use --help to see available commands");
        return Ok(());
    };

    let mut cfg = ClientConfig::from_env_values(
        std::env::var("KB_DATA_DIR").ok(),
        std::env::var("KB_REMOTE_URL").ok(),
        std::env::var("KB_MIRROR_TIMEOUT_SECS").ok(),
        std::env::var("KB_BASE_COLLECTION").ok(),
    )?;
    if cli.offline {
        cfg = cfg.offline();
    }
    let mut service = open_service(&cfg)?;

    match command {
        Commands::Search { query } => {
            let query = query.join(" ");
            let hits = service.search(&query);
            if hits.is_empty() {
                println!("No solutions match {query:?}.");
            }
            for entry in hits {
                print_entry_line(&entry);
            }
        }
        Commands::Show { index } => {
            let entry = service
                .entry(index)
                .with_context(|| format!("no solution at position {index}"))?;
            print_entry(&entry);
        }
        Commands::List { custom } => {
            if custom {
                let records = service.store().custom();
                if records.is_empty() {
                    println!("No custom solutions.");
                }
                for (index, record) in records.iter().enumerate() {
                    println!(
                        "{index:>3}  {}  [{}] {}",
                        record.id, record.sync, record.solution.title
                    );
                }
            } else {
                for entry in service.store().iter() {
                    print_entry_line(&entry);
                }
            }
        }
        Commands::Add(fields) => {
            let form = fields.apply(SolutionInput::default());
            let result = service.create(&form).await;
            print_report(result)?;
        }
        Commands::Edit { target, fields } => {
            let index = resolve(&service, target)?;
            let form = fields.apply(service.edit_form(index).map_err(failed)?);
            let result = service.update(index, &form).await;
            print_report(result)?;
        }
        Commands::Delete { target } => {
            let result = match target {
                Target::Index(index) => service.delete(index).await,
                Target::Id(id) => service.delete_by_id(id).await,
            };
            print_report(result)?;
        }
        Commands::Status { sync } => {
            if sync {
                match service.sync().await {
                    RemoteOutcome::Synced { count } => {
                        let message = format!("Remote now holds {count} solutions");
                        println!("{}", Notice::success(message));
                        if let Some(mark) = service.last_synced() {
                            println!("mirrored at {}", mark.at.to_rfc3339());
                        }
                    }
                    RemoteOutcome::Unreachable { reason } => {
                        let notice = Notice::info(format!("Backend unavailable: {reason}"));
                        println!("{notice}");
                    }
                }
            }

            let summary = service.sync_summary();
            let store = service.store();
            println!(
                "{} base, {} custom (revision {})",
                store.base().len(),
                store.custom().len(),
                store.revision()
            );
            println!(
                "synced: {}, pending: {}, local only: {}",
                summary.synced, summary.pending, summary.local_only
            );
        }
        Commands::Pull => {
            let remote = service.fetch_remote().await.map_err(failed)?;
            for (index, entry) in remote.iter().enumerate() {
                println!("{index:>3}  {}", remote_title(entry));
            }
            let local = service.store().len();
            if remote.len() == local {
                println!("Remote holds {local} solutions, same as local.");
            } else {
                println!(
                    "Remote holds {} solutions, local holds {}.",
                    remote.len(),
                    local
                );
            }
        }
    }

    Ok(())
}

fn open_service(cfg: &ClientConfig) -> anyhow::Result<Service> {
    let base = load_base_collection(cfg.base_collection())?;
    let local = LocalPersistence::new(FileSlotStore::new(cfg.data_dir()));
    let mirror: Box<dyn RemoteMirror> = match cfg.remote_url() {
        Some(url) => Box::new(HttpMirror::new(url, cfg.mirror_timeout())?),
        None => Box::new(DisabledMirror),
    };
    Ok(SolutionService::new(base, local, mirror))
}

fn resolve(service: &Service, target: Target) -> anyhow::Result<usize> {
    match target {
        Target::Index(index) => Ok(index),
        Target::Id(id) => service.position(id).map_err(failed),
    }
}

/// Wraps a core error with the notice the user should see.
fn failed(e: kb_core::KbError) -> anyhow::Error {
    tracing::debug!("command failed: {:?}", e);
    let notice = Notice::from_error(&e);
    anyhow::Error::new(e).context(notice.to_string())
}

fn print_report(result: kb_core::KbResult<MutationReport>) -> anyhow::Result<()> {
    let report = result.map_err(failed)?;
    println!("{}", report.notice());
    println!("id: {}", report.id);
    Ok(())
}

/// Title of a remote entry, flagged when the entry would not load as a solution.
fn remote_title(entry: &Value) -> String {
    let title = entry
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or("(untitled)");
    if serde_json::from_value::<Solution>(entry.clone()).is_ok() {
        title.to_string()
    } else {
        format!("{title}  [invalid]")
    }
}

fn print_entry_line(entry: &UnionEntry<'_>) {
    let tag = match entry.origin {
        Origin::Base { .. } => "base  ".to_string(),
        Origin::Custom { index, .. } => format!("custom #{index}"),
    };
    println!("{:>3}  {}  {}", entry.full_index, tag, entry.solution.title);
}

fn print_entry(entry: &UnionEntry<'_>) {
    let solution = entry.solution;
    println!("{}", solution.title);
    if let Origin::Custom { index, id } = entry.origin {
        println!("custom #{index}, id {id}");
    }
    println!();
    println!("Problem: {}", solution.problem_statement);
    println!();
    for (n, step) in steps::parse_steps(solution.description.as_str())
        .iter()
        .enumerate()
    {
        println!("  {}. {}", n + 1, steps::strip_tags(step));
    }
    println!();
    println!("Next step: {}", solution.action.next_step);
    println!(
        "Triggers: {}",
        solution.triggers().collect::<Vec<_>>().join(", ")
    );
}

//! Quill command-line client.

use anyhow::Context;
use clap::{Parser, Subcommand};

use quill::config::Config;
use quill::constants::DEFAULT_TIMESTAMP_PATTERN;
use quill::job::{JobState, StartOutcome};
use quill::presenter::{format_local, preview, snippet};
use quill::{MemoDraft, MemoId, MemoRecord, MemoUpdate, SearchMode, Session};

#[derive(Parser, Debug)]
#[command(name = "quill", version, about = "Search and manage memos from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search memos
    Search {
        text: String,

        /// full_text, semantic or hybrid
        #[arg(long, default_value_t = SearchMode::Semantic)]
        mode: SearchMode,

        /// 1-based result page
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Print one memo
    Show { uuid: String },
    /// Create a memo
    Create {
        #[arg(long)]
        title: String,

        #[arg(long)]
        body: String,

        #[arg(long, default_value = "")]
        category: String,

        /// Comma-separated tags
        #[arg(long, default_value = "")]
        tags: String,
    },
    /// Replace a memo's title and body
    Update {
        uuid: String,

        #[arg(long)]
        title: String,

        #[arg(long)]
        body: String,
    },
    /// Delete a memo
    Delete { uuid: String },
    /// Start incremental indexing and follow its progress
    Vectorize,
    /// Rebuild the whole index
    Rebuild,
    /// List categories
    Categories,
    /// List tags
    Tags,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    config.validate()?;
    tracing::debug!(api_root = %config.api_root(), "configuration loaded");

    let session = Session::connect(config)?;
    let result = run(&session, cli.command).await;
    session.shutdown();
    result
}

async fn run(session: &Session, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Search { text, mode, page } => {
            session
                .submit(text, mode)
                .await
                .context("search failed")?;
            session.go_to_page(page);

            let view = session.current_page();
            if view.is_empty() {
                println!("No results.");
                return Ok(());
            }
            for (offset, hit) in view.items().iter().enumerate() {
                println!(
                    "{:>3}. {}  [{}]  score {:.3}",
                    view.start + offset + 1,
                    hit.title,
                    hit.id,
                    hit.score
                );
                let text = if hit.snippet.is_empty() {
                    preview(&hit.body)
                } else {
                    snippet(&hit.snippet)
                };
                println!("     {text}");
            }
            println!(
                "page {}/{} ({} results)",
                view.page,
                view.total_pages,
                view.total()
            );
        }
        Commands::Show { uuid } => {
            let memo = session.memo(&MemoId::new(uuid)).await?;
            print_memo(&memo);
        }
        Commands::Create {
            title,
            body,
            category,
            tags,
        } => {
            let draft = MemoDraft::from_form(&category, &title, &tags, &body);
            let created = session.create_memo(&draft).await?;
            println!("created {} ({})", created.uuid, created.status);
        }
        Commands::Update { uuid, title, body } => {
            let memo = session
                .update_memo(&MemoId::new(uuid), &MemoUpdate { title, body })
                .await?;
            print_memo(&memo);
        }
        Commands::Delete { uuid } => {
            let status = session.delete_memo(&MemoId::new(uuid)).await?;
            println!("{}", status.status);
        }
        Commands::Vectorize => vectorize(session).await?,
        Commands::Rebuild => {
            let status = session.rebuild_index().await?;
            println!("{}", status.status);
        }
        Commands::Categories => {
            for name in session.categories().await?.iter() {
                println!("{name}");
            }
        }
        Commands::Tags => {
            for name in session.tags().await?.iter() {
                println!("{name}");
            }
        }
    }
    Ok(())
}

async fn vectorize(session: &Session) -> anyhow::Result<()> {
    let mut updates = session.job().subscribe();

    match session.start_vectorize().await? {
        StartOutcome::Started { status } => println!("indexing started ({status})"),
        StartOutcome::AlreadyRunning => println!("indexing already running"),
    }

    loop {
        let snapshot = updates.borrow_and_update().clone();
        if snapshot.show_progress() {
            println!("{} ({}%)", snapshot.progress, snapshot.progress.percent());
        }
        match snapshot.state {
            JobState::Complete => {
                if snapshot.completion_notice() {
                    println!("indexing complete: {}", snapshot.progress);
                } else {
                    println!("nothing to index");
                }
                return Ok(());
            }
            JobState::Failed => {
                let message = snapshot.error_message().unwrap_or_default();
                anyhow::bail!("indexing failed: {message}");
            }
            JobState::Idle | JobState::Starting | JobState::Polling => {}
        }
        if updates.changed().await.is_err() {
            return Ok(());
        }
    }
}

fn print_memo(memo: &MemoRecord) {
    println!("{}", memo.title);
    println!(
        "{}  [{}]",
        format_local(&memo.created_at, DEFAULT_TIMESTAMP_PATTERN),
        memo.id
    );
    if !memo.category.is_empty() {
        println!("category: {}", memo.category);
    }
    if !memo.tags.is_empty() {
        println!("tags: {}", memo.tags.join(", "));
    }
    println!();
    println!("{}", memo.body);
}

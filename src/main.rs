use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use mta::analysis::{self, AnalysisFlow, AppContext};
use mta::config::{self, MtaConfig};
use mta::export::{ExportDispatcher, ExportFormat};
use mta::gateway::models::{ActionItemUpdate, DateRange, ItemStatus, Priority, SortKey, TranscriptUpdate};
use mta::gateway::{HttpGateway, TranscriptGateway};
use mta::orchestrator::QueryOrchestrator;
use mta::output::{json as json_out, table};
use mta::view::Notification;

#[derive(Parser)]
#[command(name = "mta", version, about = "Meeting Transcript Analyzer — summaries, key points and action items from meeting transcripts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Analysis API base URL (default: http://localhost:8000/api)
    #[arg(long, global = true, env = "MTA_API_URL")]
    api_url: Option<String>,

    /// Bearer token (falls back to MTA_TOKEN, then ~/.mta/config.toml)
    #[arg(long, global = true)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Save a transcript and analyze it
    Analyze {
        /// Transcript file (reads stdin when omitted)
        path: Option<PathBuf>,

        /// Meeting title (default: file name)
        #[arg(long)]
        title: Option<String>,

        /// Analyze without saving the transcript
        #[arg(long)]
        standalone: bool,

        /// With --standalone, store the result on this existing transcript
        #[arg(long, requires = "standalone")]
        attach: Option<String>,

        /// Export the result afterwards: json, pdf, csv (comma-separated)
        #[arg(long, value_delimiter = ',')]
        export: Vec<String>,

        /// Directory for exported files
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// List transcript history
    List {
        /// Sort by: date-newest (default), date-oldest, title-asc, title-desc
        #[arg(long, default_value = "date-newest")]
        sort: String,

        /// Number of pages to load
        #[arg(long, default_value = "1")]
        pages: usize,
    },

    /// Search transcripts
    Search {
        /// Search text
        query: String,
    },

    /// List transcripts created within a date range
    Filter {
        /// Range start (YYYY-MM-DD)
        #[arg(long)]
        from: String,

        /// Range end (YYYY-MM-DD)
        #[arg(long)]
        to: String,
    },

    /// Show transcript details
    Show {
        /// Transcript ID
        id: String,
    },

    /// Update a transcript's title or content
    Update {
        /// Transcript ID
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// Replace content with this file
        #[arg(long)]
        content: Option<PathBuf>,
    },

    /// Delete a transcript
    Delete {
        /// Transcript ID
        id: String,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Export an analyzed transcript
    Export {
        /// Transcript ID
        id: String,

        /// Format: json, pdf, csv
        #[arg(long, default_value = "json")]
        format: String,

        /// Directory for the exported file
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Send a transcript to Notion
    Notion {
        /// Transcript ID
        id: String,
    },

    /// Update or delete an action item
    Item {
        /// Transcript ID
        transcript_id: String,

        /// Action item ID
        item_id: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        owner: Option<String>,

        /// Deadline (YYYY-MM-DD)
        #[arg(long)]
        deadline: Option<String>,

        /// high, medium, low
        #[arg(long)]
        priority: Option<String>,

        /// pending, in-progress, completed
        #[arg(long)]
        status: Option<String>,

        /// Delete the item instead of updating it
        #[arg(long)]
        delete: bool,
    },

    /// Browse history interactively
    Browse,

    /// Manage ~/.mta/config.toml
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the config with secrets redacted
    Show,
    /// Write a config template if none exists
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json_output = cli.json;
    let cfg = MtaConfig::load()?;

    if let Commands::Config { action } = &cli.command {
        return run_config(action, &cfg);
    }

    let token = config::resolve_token(cli.token.as_deref(), "MTA_TOKEN", cfg.api.as_ref())?;
    let gateway: Arc<dyn TranscriptGateway> =
        Arc::new(HttpGateway::new(cfg.base_url(cli.api_url.as_deref()), token));

    let mut ctx = AppContext::new();
    let flow = AnalysisFlow::new(Arc::clone(&gateway));
    let exporter = ExportDispatcher::new(Arc::clone(&gateway));

    match cli.command {
        Commands::Analyze {
            path,
            title,
            standalone,
            attach,
            export,
            out,
        } => {
            let formats = parse_formats(&export)?;
            let content = analysis::read_source(path.as_deref())?;

            let ok = if standalone {
                let analyzed = flow.analyze_standalone(&mut ctx, &content).await;
                match attach {
                    Some(ref id) if analyzed => flow.attach(&mut ctx, id).await,
                    _ => analyzed,
                }
            } else {
                let title = title
                    .or_else(|| analysis::default_title(path.as_deref()))
                    .unwrap_or_default();
                flow.submit(&mut ctx, &title, &content, None).await
            };
            if !ok {
                return report(ctx.dismiss());
            }

            if let Some(ref result) = ctx.analysis_result {
                if json_output {
                    json_out::print_json(&serde_json::json!({
                        "transcript_id": ctx.current_transcript_id,
                        "analysis": result,
                    }))?;
                } else {
                    if let Some(ref id) = ctx.current_transcript_id {
                        println!("Transcript: {id}\n");
                    }
                    table::print_analysis(result);
                }
            }

            let dir = cfg.download_dir(out.as_deref());
            for format in formats {
                match exporter.export(&mut ctx, format, &dir).await {
                    Some(saved) => eprintln!("Saved {}", saved.display()),
                    None => return report(ctx.dismiss()),
                }
            }
        }

        Commands::List { sort, pages } => {
            let key = parse_sort(&sort)?;
            let mut history = QueryOrchestrator::new(Arc::clone(&gateway));
            history.view.sort_key = key;
            if !history.enter_history().await {
                return report(history.view.dismiss());
            }
            for _ in 1..pages.max(1) {
                if !history.load_more().await {
                    break;
                }
            }
            if let Some(n) = history.view.dismiss() {
                report(Some(n))?;
            }

            if json_output {
                json_out::print_json(&serde_json::json!({
                    "sort": key.as_str(),
                    "page": history.view.page,
                    "has_more": history.view.has_more,
                    "transcripts": history.view.transcripts,
                }))?;
            } else {
                table::print_history(&history.view);
            }
        }

        Commands::Search { query } => {
            let mut history = QueryOrchestrator::new(Arc::clone(&gateway));
            if !history.set_search(&query).await {
                return report(history.view.dismiss());
            }
            if json_output {
                json_out::print_json(&serde_json::json!({
                    "query": query,
                    "total": history.view.transcripts.len(),
                    "transcripts": history.view.transcripts,
                }))?;
            } else {
                table::print_history(&history.view);
            }
        }

        Commands::Filter { from, to } => {
            let range = DateRange::new(&from, &to)?;
            let mut history = QueryOrchestrator::new(Arc::clone(&gateway));
            if !history.apply_date_filter(range).await {
                return report(history.view.dismiss());
            }
            if json_output {
                json_out::print_json(&history.view.transcripts)?;
            } else {
                table::print_history(&history.view);
            }
        }

        Commands::Show { id } => {
            let t = gateway
                .get(&id)
                .await
                .with_context(|| format!("Failed to load transcript {id}"))?;
            if json_output {
                json_out::print_json(&t)?;
            } else {
                table::print_transcript_detail(&t);
            }
        }

        Commands::Update { id, title, content } => {
            let content = content
                .as_deref()
                .map(|p| analysis::read_source(Some(p)))
                .transpose()?;
            let update = TranscriptUpdate {
                title,
                content,
                ..Default::default()
            };
            if update.is_empty() {
                bail!("Nothing to update. Use --title and/or --content.");
            }
            let t = gateway
                .update(&id, &update)
                .await
                .with_context(|| format!("Failed to update transcript {id}"))?;
            if json_output {
                json_out::print_json(&t)?;
            } else {
                println!("Updated: {} ({})", t.title, t.id);
            }
        }

        Commands::Delete { id, force } => {
            if !force && !confirm(&format!("Delete transcript {id}?"))? {
                println!("Cancelled.");
                return Ok(());
            }
            let mut history = QueryOrchestrator::new(Arc::clone(&gateway));
            history.delete(&id).await;
            report(history.view.dismiss())?;
        }

        Commands::Export { id, format, out } => {
            let format = parse_format(&format)?;
            if !flow.open(&mut ctx, &id).await {
                return report(ctx.dismiss());
            }
            let dir = cfg.download_dir(out.as_deref());
            match exporter.export(&mut ctx, format, &dir).await {
                Some(saved) => println!("{}", saved.display()),
                None => return report(ctx.dismiss()),
            }
        }

        Commands::Notion { id } => {
            let reply = exporter.export_to_external_tool(&mut ctx, &id).await;
            let notice = ctx.dismiss();
            if json_output {
                if let Some(ref reply) = reply {
                    json_out::print_json_with_notice(reply, notice.as_ref())?;
                    return Ok(());
                }
            }
            report(notice)?;
        }

        Commands::Item {
            transcript_id,
            item_id,
            description,
            owner,
            deadline,
            priority,
            status,
            delete,
        } => {
            if delete {
                gateway
                    .delete_action_item(&transcript_id, &item_id)
                    .await
                    .with_context(|| format!("Failed to delete action item {item_id}"))?;
                println!("Deleted action item {item_id}");
                return Ok(());
            }

            let update = ActionItemUpdate {
                description,
                owner,
                deadline,
                priority: priority
                    .as_deref()
                    .map(|p| Priority::parse(p).with_context(|| format!("Unknown priority: {p}. Use: high, medium, low")))
                    .transpose()?,
                status: status
                    .as_deref()
                    .map(|s| {
                        ItemStatus::parse(s).with_context(|| {
                            format!("Unknown status: {s}. Use: pending, in-progress, completed")
                        })
                    })
                    .transpose()?,
            };
            let item = gateway
                .update_action_item(&transcript_id, &item_id, &update)
                .await
                .with_context(|| format!("Failed to update action item {item_id}"))?;
            if json_output {
                json_out::print_json(&item)?;
            } else {
                table::print_action_item(&item);
            }
        }

        Commands::Browse => {
            let dir = cfg.download_dir(None);
            browse(Arc::clone(&gateway), &flow, &exporter, &mut ctx, &dir).await?;
        }

        Commands::Config { .. } => unreachable!("handled above"),
    }

    Ok(())
}

fn run_config(action: &ConfigAction, cfg: &MtaConfig) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("# {}", config::config_path()?.display());
            println!("{}", cfg.display_redacted());
        }
        ConfigAction::Init => {
            let path = config::config_path()?;
            if config::init_config()? {
                println!("Created {}", path.display());
            } else {
                println!("Config already exists: {}", path.display());
            }
        }
    }
    Ok(())
}

const BROWSE_HELP: &str = "Commands:
  search <text>        search transcripts (empty clears)
  sort <key>           date-newest, date-oldest, title-asc, title-desc
  more                 load the next page
  filter <from> <to>   date range (YYYY-MM-DD); `filter clear` resets
  delete <id>          delete a transcript
  analyze <file>       save and analyze a transcript file
  export <format>      export the last analysis (json, pdf, csv)
  refresh              reload from page 0
  quit";

/// Line-driven stand-in for the history view.
async fn browse(
    gateway: Arc<dyn TranscriptGateway>,
    flow: &AnalysisFlow,
    exporter: &ExportDispatcher,
    ctx: &mut AppContext,
    dir: &Path,
) -> Result<()> {
    let mut history = QueryOrchestrator::new(gateway);
    history.enter_history().await;
    show(&mut history);

    let stdin = std::io::stdin();
    loop {
        eprint!("mta> ");
        std::io::stderr().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        match cmd {
            "" => continue,
            "quit" | "exit" | "q" => break,
            "help" | "?" => println!("{BROWSE_HELP}"),
            "search" => {
                history.set_search(rest).await;
                show(&mut history);
            }
            "sort" => match SortKey::parse(rest) {
                Some(key) => {
                    history.set_sort(key).await;
                    show(&mut history);
                }
                None => eprintln!("Unknown sort: {rest}"),
            },
            "more" => {
                if history.load_more().await {
                    show(&mut history);
                } else if history.view.notification.is_none() {
                    println!("No more transcripts.");
                } else {
                    show(&mut history);
                }
            }
            "filter" if rest == "clear" => {
                history.clear_date_filter().await;
                show(&mut history);
            }
            "filter" => {
                let mut parts = rest.split_whitespace();
                let range = match (parts.next(), parts.next()) {
                    (Some(from), Some(to)) => DateRange::new(from, to),
                    _ => {
                        eprintln!("Usage: filter <from> <to>");
                        continue;
                    }
                };
                match range {
                    Ok(range) => {
                        history.apply_date_filter(range).await;
                        show(&mut history);
                    }
                    Err(e) => eprintln!("Error: {e}"),
                }
            }
            "delete" if !rest.is_empty() => {
                history.delete(rest).await;
                show(&mut history);
            }
            "analyze" if !rest.is_empty() => {
                let path = PathBuf::from(rest);
                let content = match analysis::read_source(Some(&path)) {
                    Ok(c) => c,
                    Err(e) => {
                        eprintln!("Error: {e:#}");
                        continue;
                    }
                };
                let title = analysis::default_title(Some(&path)).unwrap_or_default();
                if flow.submit(ctx, &title, &content, Some(&mut history)).await {
                    if let Some(ref result) = ctx.analysis_result {
                        table::print_analysis(result);
                    }
                    show(&mut history);
                }
                if let Some(n) = ctx.dismiss() {
                    table::print_notification(&n);
                }
            }
            "export" => match ExportFormat::parse(rest) {
                Some(format) => {
                    if let Some(saved) = exporter.export(ctx, format, dir).await {
                        println!("Saved {}", saved.display());
                    }
                    if let Some(n) = ctx.dismiss() {
                        table::print_notification(&n);
                    }
                }
                None => eprintln!("Unknown format: {rest}. Use: json, pdf, csv"),
            },
            "refresh" => {
                history.refresh().await;
                show(&mut history);
            }
            _ => eprintln!("Unknown command: {line} (type `help`)"),
        }
    }

    history.leave_history();
    Ok(())
}

fn show(history: &mut QueryOrchestrator) {
    if let Some(n) = history.view.dismiss() {
        table::print_notification(&n);
    }
    table::print_history(&history.view);
}

/// Print a success notice, or turn an error notice into the command's error.
fn report(notice: Option<Notification>) -> Result<()> {
    match notice {
        Some(n) if n.is_error() => bail!("{}", n.message),
        Some(n) => {
            table::print_notification(&n);
            Ok(())
        }
        None => Ok(()),
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    eprint!("{prompt} [y/N] ");
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

fn parse_sort(s: &str) -> Result<SortKey> {
    SortKey::parse(s).with_context(|| {
        format!("Unknown sort: {s}. Use: date-newest, date-oldest, title-asc, title-desc")
    })
}

fn parse_format(s: &str) -> Result<ExportFormat> {
    ExportFormat::parse(s).with_context(|| format!("Unknown format: {s}. Use: json, pdf, csv"))
}

fn parse_formats(list: &[String]) -> Result<Vec<ExportFormat>> {
    list.iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_format(s.trim()))
        .collect()
}

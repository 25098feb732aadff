mod display;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use display::Renderer;
use pdf_adapter::PdfReportWriter;
use phraselens_core::application::{ExportService, ExtractionService, RecordLoader};
use phraselens_core::config::{Settings, DEFAULT_API_BASE};
use phraselens_core::domain::{DateWindow, ExtractionRecord};
use phraselens_core::gate::{Access, AccessGate, GateConfig, TokenSession};
use phraselens_core::history::{history_page, HistoryQuery, SortField, SortOrder};
use phraselens_core::ports::{RecordStore, ReportWriter};
use phraselens_core::utils::DEFAULT_DAY_FORMAT;
use phraselens_core::view::{AnalyticsQuery, AnalyticsView, MountGuard};
use sqlite_adapter::SqliteRecordStore;
use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use webhook_adapter::WebhookClient;
use xlsx_adapter::XlsxReportWriter;

/// Extract key phrases from financial text and explore the extraction history
#[derive(Parser, Debug)]
#[command(name = "phraselens", version)]
#[command(about = "Extracts financial key phrases via webhook and reports on extraction history")]
struct Cli {
    /// Base URL of the webhook host
    #[arg(long, env = "PHRASELENS_API_BASE", global = true, default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Read history from a local SQLite copy instead of the webhook
    #[arg(long, global = true, value_name = "DB")]
    sqlite: Option<PathBuf>,

    /// Session token issued by the identity provider
    #[arg(long, env = "PHRASELENS_SESSION_TOKEN", hide_env_values = true, global = true)]
    session_token: Option<String>,

    /// Skip the sign-in gate (automated end-to-end runs only)
    #[arg(long, global = true)]
    e2e_bypass_auth: bool,

    /// Seconds to wait for the history fetch before showing an empty view
    #[arg(long, global = true, default_value_t = 15)]
    timeout_secs: u64,

    /// strftime pattern for day labels
    #[arg(long, global = true, default_value = DEFAULT_DAY_FORMAT)]
    day_format: String,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit text to the extraction webhook
    Extract {
        /// Text to extract from (reads stdin when neither --text nor --file is given)
        #[arg(short, long, conflicts_with = "file")]
        text: Option<String>,

        /// Read the text from a file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Export the result
        #[arg(long, value_enum)]
        export: Option<ExportFormat>,

        /// Directory export files are written to
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Browse past extractions
    History {
        /// Case-insensitive search over input text and phrases
        #[arg(short, long, default_value = "")]
        search: String,

        /// Sort column: id or created-at
        #[arg(long, default_value = "created-at")]
        sort: SortField,

        /// Sort direction: asc or desc
        #[arg(long, default_value = "desc")]
        order: SortOrder,

        /// Page to show (5 records per page)
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },

    /// Show KPIs and charts over recent extractions
    Analytics {
        /// Window in days: 7, 30 or 90
        #[arg(short, long, default_value = "30")]
        days: DateWindow,

        /// Export the report
        #[arg(long, value_enum)]
        export: Option<ExportFormat>,

        /// Directory export files are written to
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,

        /// Print the snapshot as JSON instead of the dashboard
        #[arg(long)]
        json: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ExportFormat {
    Xlsx,
    Pdf,
    Both,
}

impl ExportFormat {
    fn writers(self) -> Vec<Box<dyn ReportWriter>> {
        match self {
            ExportFormat::Xlsx => vec![Box::new(XlsxReportWriter::new())],
            ExportFormat::Pdf => vec![Box::new(PdfReportWriter::new())],
            ExportFormat::Both => vec![
                Box::new(XlsxReportWriter::new()),
                Box::new(PdfReportWriter::new()),
            ],
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn settings(cli: &Cli) -> Settings {
    let mut settings = Settings::default().with_api_base(Some(cli.api_base.as_str()));
    settings.fetch_timeout = Duration::from_secs(cli.timeout_secs);
    settings.day_format = cli.day_format.clone();
    settings.gate = GateConfig {
        bypass_auth: cli.e2e_bypass_auth,
    };
    settings
}

fn webhook_client(settings: &Settings) -> Result<WebhookClient> {
    WebhookClient::new(&settings.api_base, settings.fetch_timeout)
        .context("building HTTP client")
}

fn record_store(sqlite: Option<&Path>, settings: &Settings) -> Result<Arc<dyn RecordStore>> {
    if let Some(path) = sqlite {
        info!(path = %path.display(), "using sqlite history");
        return Ok(Arc::new(SqliteRecordStore::new(
            path.to_string_lossy().into_owned(),
        )));
    }
    Ok(Arc::new(webhook_client(settings)?))
}

/// Fetches records for a view. If the fetch outlives the timeout the view is
/// torn down and a late answer is discarded.
async fn load_view_records(loader: RecordLoader, timeout: Duration) -> Vec<ExtractionRecord> {
    let guard = MountGuard::new();
    let token = guard.token();
    let fetch = tokio::spawn(async move { loader.load_for_view(token).await });

    match tokio::time::timeout(timeout, fetch).await {
        Ok(Ok(records)) => records.unwrap_or_default(),
        Ok(Err(e)) => {
            warn!(error = %e, "history fetch task failed");
            Vec::new()
        }
        Err(_) => {
            warn!(secs = timeout.as_secs(), "history fetch timed out");
            drop(guard);
            Vec::new()
        }
    }
}

fn read_input(text: Option<String>, file: Option<PathBuf>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()));
    }
    let mut buffer = String::new();
    std::io::stdin().read_to_string(&mut buffer).context("reading stdin")?;
    Ok(buffer)
}

/// Returns the process exit code.
async fn run(cli: Cli) -> Result<i32> {
    let settings = settings(&cli);
    let renderer = Renderer {
        color: !cli.no_color && std::io::stdout().is_terminal(),
    };

    let gated = matches!(cli.command, Command::History { .. } | Command::Analytics { .. });
    if gated {
        let session = TokenSession::new(cli.session_token.clone());
        let gate = AccessGate::new(Box::new(session), settings.gate);
        if let Access::Redirect(to) = gate.check() {
            eprintln!(
                "Sign-in required (redirect to {to}). \
                 Provide --session-token or PHRASELENS_SESSION_TOKEN."
            );
            return Ok(2);
        }
    }

    match cli.command {
        Command::Extract {
            text,
            file,
            export,
            out_dir,
        } => {
            let input = read_input(text, file)?;
            let service = ExtractionService::new(Box::new(webhook_client(&settings)?));

            let extraction = match service.extract(&input).await {
                Ok(extraction) => extraction,
                Err(e) => {
                    eprintln!("{e}");
                    return Ok(1);
                }
            };
            print!("{}", renderer.extraction(&extraction));

            if let Some(format) = export {
                if !extraction.can_export() {
                    eprintln!("Nothing to export: no phrases were extracted.");
                    return Ok(0);
                }
                let exporter = ExportService::new(format.writers(), out_dir);
                let saved = exporter
                    .export_extraction(&extraction)
                    .context("exporting extraction")?;
                for path in saved {
                    println!("Saved {}", path.display());
                }
            }
        }

        Command::History {
            search,
            sort,
            order,
            page,
        } => {
            let store = record_store(cli.sqlite.as_deref(), &settings)?;
            let records = load_view_records(RecordLoader::new(store), settings.fetch_timeout).await;
            let mut query = HistoryQuery {
                sort_field: sort,
                sort_order: order,
                ..HistoryQuery::default()
            };
            query.set_search(search);
            query.page = page;

            let page = history_page(&records, &query);
            print!("{}", renderer.history(&page, &query));
        }

        Command::Analytics {
            days,
            export,
            out_dir,
            json,
        } => {
            let store = record_store(cli.sqlite.as_deref(), &settings)?;
            let records = load_view_records(RecordLoader::new(store), settings.fetch_timeout).await;
            let mut view = AnalyticsView::new(
                AnalyticsQuery { window: days },
                Local::now().date_naive(),
                &settings.day_format,
            );
            view.set_records(records);
            let report = view.report();

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", renderer.analytics(&report));
            }

            if let Some(format) = export {
                if !view.can_export() {
                    let window = days.to_string().to_lowercase();
                    eprintln!("Export disabled: no extractions in the {window}.");
                    return Ok(0);
                }
                let exporter = ExportService::new(format.writers(), out_dir);
                let saved = exporter
                    .export_analytics(&report)
                    .context("exporting analytics report")?;
                for path in saved {
                    println!("Saved {}", path.display());
                }
            }
        }
    }

    Ok(0)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

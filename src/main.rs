use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::info;

use legal_analyzer::analysis::AnalysisType;
use legal_analyzer::llm::{ModelBackend, ProviderBackend};
use legal_analyzer::session::{self, IngestOutcome, MessageLevel, SessionHandle, SessionState, StatusMessage};
use legal_analyzer::utils::init_logger;
use legal_analyzer::{create_router, AppState, Config};

#[derive(Parser)]
#[command(name = "legal-analyzer", version, about = "AI legal team for contract and document analysis")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the web UI and JSON API (default)
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Index one PDF and print a full analysis report
    Analyze {
        pdf: PathBuf,
        #[arg(long, value_enum, default_value = "contract-review")]
        analysis_type: AnalysisType,
        /// Query text for `custom-query`
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        chunk_size: Option<usize>,
        #[arg(long)]
        overlap: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    info!("Configuration loaded: {:?}", config.server);

    match cli.command.unwrap_or(Command::Serve { host: None, port: None }) {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config).await
        }
        Command::Analyze {
            pdf,
            analysis_type,
            query,
            chunk_size,
            overlap,
        } => analyze(config, pdf, analysis_type, query, chunk_size, overlap).await,
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid HOST/PORT")?;

    let backend: Arc<dyn ModelBackend> = Arc::new(ProviderBackend::new(config.llm.clone()));
    let idle = config.server.session_idle_timeout();
    let sweep = config.server.session_sweep_interval();
    let state = AppState::new(config, backend);
    if state.fallback_api_key().is_none() {
        info!("OPENAI_API_KEY not set; sessions must supply their own key before analysis");
    }
    state.sessions.spawn_sweeper(idle, sweep);
    info!(idle_secs = idle.as_secs(), "Idle session sweeper started");

    let app = create_router(state);

    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}

fn print_messages(messages: &[StatusMessage]) {
    for message in messages {
        let level = match message.level {
            MessageLevel::Success => "ok",
            MessageLevel::Info => "info",
            MessageLevel::Warning => "warn",
            MessageLevel::Error => "error",
        };
        eprintln!("[{}] {}", level, message.text);
    }
}

async fn analyze(
    config: Config,
    pdf: PathBuf,
    analysis_type: AnalysisType,
    query: Option<String>,
    chunk_size: Option<usize>,
    overlap: Option<usize>,
) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(&pdf)
        .await
        .with_context(|| format!("Failed to read {}", pdf.display()))?;
    let filename = pdf
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "document.pdf".to_string());

    let backend: Arc<dyn ModelBackend> = Arc::new(ProviderBackend::new(config.llm.clone()));
    let state = AppState::new(config, backend);
    let deps = state.deps();

    let handle: SessionHandle = Arc::new(Mutex::new(SessionState::default()));
    {
        let mut current = handle.lock().await;
        print_messages(&[current.credential_status(state.fallback_api_key().as_deref())]);

        let report = session::ingest_document(
            &mut current,
            &filename,
            &bytes,
            chunk_size.unwrap_or(state.config.knowledge.default_chunk_size),
            overlap.unwrap_or(state.config.knowledge.default_overlap),
            &deps,
        )
        .await?;
        print_messages(&report.messages);
        if let IngestOutcome::Ingested { details, .. } = &report.outcome {
            if let Some(preview) = &details.preview {
                eprintln!("\n{}\n", preview);
            }
        }
    }

    let report = session::run_analysis(&handle, analysis_type, query.as_deref(), &deps).await?;

    println!("# {}\n", analysis_type.label());
    println!("## Analysis\n\n{}\n", report.analysis);
    println!("## Key Points\n\n{}\n", report.key_points);
    println!("## Recommendations\n\n{}", report.recommendations);
    Ok(())
}

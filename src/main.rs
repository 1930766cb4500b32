use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tower_lsp::{LspService, Server};
use tracing_subscriber::EnvFilter;

use tekton_lsp::server::Backend;
use tekton_lsp::Workspace;

#[derive(Parser)]
#[command(name = "tekton-lsp", about = "Language server for Tekton Task/Pipeline manifests")]
struct Args {
    /// Raise the log level to `debug`.
    #[arg(short, long)]
    verbose: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Pre-scan one or more workspace folders before `initialize` arrives.
    #[arg(long = "workspace")]
    workspace: Vec<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Lint a folder once, print diagnostics, and exit non-zero if any exist.
    Lint { path: PathBuf },
}

fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if args.verbose { "debug" } else { "info" }));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    match args.log_format {
        LogFormat::Pretty => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }
}

fn run_lint(path: &PathBuf) -> anyhow::Result<ExitCode> {
    let workspace = Workspace::new();
    workspace.add_folder(path);
    workspace.lint();

    let mut found_problem = false;
    workspace.diagnostics(|uri, diags| {
        for diag in diags {
            found_problem = true;
            println!("{uri}:{}:{}: {}", diag.range.start.line + 1, diag.range.start.character + 1, diag.message);
        }
    });

    Ok(if found_problem { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    init_logging(&args);

    if let Some(Command::Lint { path }) = &args.command {
        return run_lint(path);
    }

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(|client| Backend::new(client, &args.workspace));

    Server::new(stdin, stdout, socket).serve(service).await;
    Ok(ExitCode::SUCCESS)
}

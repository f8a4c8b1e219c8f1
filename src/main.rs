use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use codeshare::config::TOKEN_ENV;
use codeshare::transfer::BackendKind;
use codeshare::{App, Config, Credential, TerminalHost};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Share a project folder through a file host, or receive one.
#[derive(Debug, Parser)]
#[command(name = "codeshare", version, about)]
struct Cli {
    /// Config file to use instead of the user config
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// File host to use
    #[arg(long, global = true)]
    backend: Option<BackendKind>,

    /// Directory for archives, downloads and extracted workspaces
    #[arg(long, global = true)]
    scratch_dir: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Archive a folder, upload it and print the share link
    Send {
        /// Folder to share (defaults to the current directory)
        folder: Option<PathBuf>,
    },
    /// Download, unpack and set up a shared project
    Receive {
        /// Share link (prompted for when omitted)
        link: Option<String>,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "codeshare=info",
        1 => "codeshare=debug",
        _ => "codeshare=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(dir) = cli.scratch_dir {
        config.scratch_dir = Some(dir);
    }
    debug!(?config, "Configuration loaded");

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            on_interrupt.cancel();
        }
    });

    let credential = std::env::var(TOKEN_ENV).ok().and_then(Credential::new);
    let host = TerminalHost::new(config.editor_command.clone());
    let app = App::new(host, config)
        .with_credential(credential)
        .with_cancellation(cancel);

    let ok = match cli.command {
        Command::Send { folder } => {
            let folder = folder.or_else(|| std::env::current_dir().ok());
            let folder = folder.map(|f| std::fs::canonicalize(&f).unwrap_or(f));
            app.with_workspace_folder(folder).send_code().await.is_ok()
        }
        Command::Receive { link } => match app.receive_code(link.as_deref()).await {
            Ok(Some(received)) => {
                // The process would end the detached install; wait for it here.
                if let Err(e) = received.bootstrap.await {
                    warn!(error = %e, "Dependency install task failed");
                }
                true
            }
            Ok(None) => true,
            Err(_) => false,
        },
    };

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

//! xhs-pilot MCP server entry point.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use xhs_pilot::PilotService;
use xhs_pilot_mcp::config::{resolve_config, CliOverrides};
use xhs_pilot_mcp::protocol::ProtocolHandler;
use xhs_pilot_mcp::tools::ToolRegistry;
use xhs_pilot_mcp::transport::StdioTransport;

#[derive(Parser)]
#[command(
    name = "xhs-pilot-mcp",
    about = "MCP server for xhs-pilot: search, read, publish and interact on Xiaohongshu",
    version
)]
struct Cli {
    /// Show the browser window instead of running headless.
    #[arg(long, global = true)]
    headed: bool,

    /// Chromium or Chrome binary. Discovered automatically when omitted.
    #[arg(long, global = true)]
    browser_bin: Option<PathBuf>,

    /// Cookie jar file holding the login session.
    #[arg(long, global = true)]
    cookies: Option<PathBuf>,

    /// Directory for downloaded images.
    #[arg(long, global = true)]
    images_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server over stdio (default).
    Serve,

    /// Start MCP server over HTTP.
    #[cfg(feature = "sse")]
    ServeHttp {
        /// Listen address (host:port).
        #[arg(long, default_value = "127.0.0.1:3100")]
        addr: String,

        /// Bearer token for authentication. Also reads XHS_PILOT_TOKEN.
        #[arg(long)]
        token: Option<String>,
    },

    /// Print server capabilities and resolved settings as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Example:
    ///   xhs-pilot-mcp completions zsh > ~/.zfunc/_xhs-pilot-mcp
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            headless: self.headed.then_some(false),
            browser_bin: self.browser_bin.clone(),
            cookies: self.cookies.clone(),
            images_dir: self.images_dir.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries the protocol; logs go to stderr.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = resolve_config(cli.overrides());

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            tracing::info!("xhs-pilot MCP server (stdio)");
            tracing::info!("Cookies: {}", config.cookies_path.display());
            let service = Arc::new(PilotService::launch(config).await?);
            let transport = StdioTransport::new(ProtocolHandler::new(Arc::clone(&service)));
            let result = transport.run().await;
            if let Err(e) = service.shutdown().await {
                tracing::warn!("Browser shutdown failed: {e}");
            }
            result?;
        }

        #[cfg(feature = "sse")]
        Commands::ServeHttp { addr, token } => {
            use xhs_pilot_mcp::config::resolve_token;
            use xhs_pilot_mcp::transport::SseTransport;

            let token = resolve_token(token);
            tracing::info!("xhs-pilot MCP server (http)");
            if token.is_some() {
                tracing::info!("Auth: bearer token required");
            }

            let service = Arc::new(PilotService::launch(config).await?);
            let transport = SseTransport::new(ProtocolHandler::new(Arc::clone(&service)), token);
            let result = transport
                .run(&addr, async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!("Failed to listen for ctrl-c: {e}");
                    }
                    tracing::info!("Ctrl-C received, shutting down");
                })
                .await;
            if let Err(e) = service.shutdown().await {
                tracing::warn!("Browser shutdown failed: {e}");
            }
            result?;
        }

        Commands::Info => {
            let init = xhs_pilot_mcp::types::InitializeResult::default_result();
            let tools = ToolRegistry::list_tools();
            let info = serde_json::json!({
                "server": init.server_info,
                "protocol_version": init.protocol_version,
                "capabilities": init.capabilities,
                "tools": tools.iter().map(|t| &t.name).collect::<Vec<_>>(),
                "tool_count": tools.len(),
                "settings": {
                    "headless": config.headless,
                    "browser_bin": config.browser_bin,
                    "cookies_path": config.cookies_path,
                    "images_dir": config.images_dir,
                },
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "xhs-pilot-mcp", &mut std::io::stdout());
        }
    }

    Ok(())
}

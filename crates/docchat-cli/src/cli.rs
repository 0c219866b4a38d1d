use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use clap_complete::Shell;
use docchat_client::{ClientConfig, ReplyFormat, SocketFraming, TransportKind};

/// Socket message encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FramingArg {
    /// Raw query text out, raw reply text back
    Text,
    /// JSON frames correlated by request id
    Json,
}

/// CLI arguments for docchat
#[derive(Parser, Debug)]
#[command(name = "docchat")]
#[command(about = "Terminal client for the documentation chat assistant")]
#[command(version)]
pub struct Cli {
    /// Chat backend base URL (http(s):// or ws(s)://)
    #[arg(long, env = "DOCCHAT_ENDPOINT", value_name = "URL")]
    pub endpoint: Option<String>,

    /// Transport to use: http or socket (inferred from the endpoint scheme when absent)
    #[arg(long, env = "DOCCHAT_TRANSPORT", value_parser = parse_transport)]
    pub transport: Option<TransportKind>,

    /// Socket framing
    #[arg(long, value_enum, default_value_t = FramingArg::Json)]
    pub framing: FramingArg,

    /// Directory holding the chat history (defaults to ~/.docchat)
    #[arg(long, env = "DOCCHAT_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Local database name
    #[arg(long, value_name = "NAME")]
    pub database: Option<String>,

    /// Delay before reconnecting a dropped socket, in milliseconds
    #[arg(long, value_name = "MS")]
    pub reconnect_delay_ms: Option<u64>,

    /// How long to wait for a socket reply, in seconds
    #[arg(long, value_name = "SECS", conflicts_with = "no_socket_timeout")]
    pub socket_timeout_secs: Option<u64>,

    /// Wait for socket replies forever
    #[arg(long)]
    pub no_socket_timeout: bool,

    /// Replies are markdown rather than HTML
    #[arg(long)]
    pub markdown: bool,

    /// Show debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Generate shell completions
    #[arg(long, value_enum)]
    pub generate: Option<Shell>,
}

fn parse_transport(s: &str) -> Result<TransportKind, String> {
    TransportKind::from_str(s).ok_or_else(|| format!("unknown transport '{}', expected http or socket", s))
}

impl Cli {
    /// Client configuration described by the arguments
    pub fn client_config(&self) -> Result<ClientConfig> {
        let Some(endpoint) = self.endpoint.as_deref().map(str::trim).filter(|e| !e.is_empty()) else {
            bail!("No chat endpoint given: pass --endpoint or set DOCCHAT_ENDPOINT");
        };

        let mut config = ClientConfig::new(endpoint).with_framing(match self.framing {
            FramingArg::Text => SocketFraming::Text,
            FramingArg::Json => SocketFraming::Json,
        });

        if let Some(transport) = self.transport {
            config = config.with_transport(transport);
        }
        if let Some(ms) = self.reconnect_delay_ms {
            config = config.with_reconnect_delay(Duration::from_millis(ms));
        }
        if self.no_socket_timeout {
            config = config.with_socket_reply_timeout(None);
        } else if let Some(secs) = self.socket_timeout_secs {
            config = config.with_socket_reply_timeout(Some(Duration::from_secs(secs)));
        }
        if let Some(name) = &self.database {
            config = config.with_database_name(name.clone());
        }
        if self.markdown {
            config = config.with_reply_format(ReplyFormat::Markdown);
        }

        config.validate().context("Invalid client configuration")?;
        Ok(config)
    }

    /// Where the history files live
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }

        let home_dir = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .context("Failed to get home directory")?;
        Ok(PathBuf::from(home_dir).join(".docchat"))
    }
}

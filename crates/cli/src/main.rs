use async_trait::async_trait;
use clap::{Parser, Subcommand};
use smsbot::adapter::{BotLogic, SmsAdapter, TurnContext};
use smsbot::config::{self, Config};
use std::path::PathBuf;
use std::sync::Arc;

const DEFAULT_REPLY: &str = "I am all down for a conversation!";
const GREETING: &str = "I want to chat with you!";

#[derive(Parser)]
#[command(name = "smsbot")]
#[command(about = "SMS bot for the seven / sms77 gateway", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Run the webhook server. Every inbound SMS is answered with the reply text.
    Serve {
        /// Config file path (default: SMSBOT_CONFIG_PATH or ~/.smsbot/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// HTTP port (default from config or 3000)
        #[arg(long, short)]
        port: Option<u16>,

        /// Text sent back for every inbound message.
        #[arg(long, default_value = DEFAULT_REPLY)]
        reply: String,

        /// Phone number to greet at startup (e.g. +491701234567).
        #[arg(long, value_name = "PHONE")]
        greet: Option<String>,
    },

    /// Send one SMS from the configured number and print the gateway message ids.
    Send {
        /// Config file path (default: SMSBOT_CONFIG_PATH or ~/.smsbot/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Recipient phone number.
        #[arg(long, value_name = "PHONE")]
        to: String,

        /// Message text.
        #[arg(long)]
        text: String,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("smsbot {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Serve {
            config,
            port,
            reply,
            greet,
        }) => {
            if let Err(e) = run_serve(config, port, reply, greet).await {
                log::error!("serve failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Send { config, to, text }) => {
            if let Err(e) = run_send(config, &to, &text).await {
                log::error!("send failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

/// Answers every inbound message with a fixed text.
struct ReplyBot {
    reply: String,
}

#[async_trait]
impl BotLogic for ReplyBot {
    async fn on_turn(&self, ctx: &mut TurnContext<'_>) -> anyhow::Result<()> {
        let activity = ctx.activity();
        log::info!(
            "message from {}: {}",
            activity.conversation_id().unwrap_or("?"),
            activity.text.as_deref().unwrap_or("")
        );
        ctx.send_text(self.reply.clone()).await?;
        Ok(())
    }
}

fn build_adapter(config: &Config) -> anyhow::Result<Arc<SmsAdapter>> {
    let provider = config::resolve_provider(config);
    let options = config::resolve_adapter_options(config, &provider);
    let adapter = SmsAdapter::new(provider, options)?;
    log::info!("{} ready", adapter.name());
    Ok(Arc::new(adapter))
}

async fn run_serve(
    config_path: Option<PathBuf>,
    port: Option<u16>,
    reply: String,
    greet: Option<String>,
) -> anyhow::Result<()> {
    let (mut config, _path) = config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    let adapter = build_adapter(&config)?;

    if let Some(phone) = greet {
        let mut bot = adapter.spawn();
        bot.start_conversation_with_user(&phone);
        if let Err(e) = bot.say(GREETING).await {
            log::error!("greeting {} failed: {}", phone, e);
        }
    }

    log::info!(
        "starting webhook server on {}:{}",
        config.gateway.bind,
        config.gateway.port
    );
    smsbot::server::run_server(&config, adapter, Arc::new(ReplyBot { reply })).await
}

async fn run_send(config_path: Option<PathBuf>, to: &str, text: &str) -> anyhow::Result<()> {
    let (config, _path) = config::load_config(config_path)?;
    let adapter = build_adapter(&config)?;
    let mut bot = adapter.spawn();
    bot.start_conversation_with_user(to);
    for r in bot.say(text).await? {
        println!("{}", r.id);
    }
    Ok(())
}

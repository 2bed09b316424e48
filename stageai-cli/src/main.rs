mod render;
mod repl;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use stageai_appcore::controller::PlaygroundController;
use stageai_core::config::ClientConfig;
use stageai_core::types::OperationKind;
use stageai_engine::events::StateChange;
use stageai_runtime::config_store::ConfigStore;
use stageai_runtime::defaults::{ENV_BASE_URL, ENV_CONFIG_PATH, default_config_path};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use crate::repl::{Command, HELP, parse_line};

#[derive(Debug, Parser)]
#[command(
    name = "stageai",
    about = "StageAI Playground: text, image and chat against a StageAI backend"
)]
struct Args {
    /// Backend base URL (overrides the config file).
    #[arg(long, env = ENV_BASE_URL)]
    base_url: Option<String>,

    /// Path to the JSON client config.
    #[arg(long, env = ENV_CONFIG_PATH)]
    config: Option<PathBuf>,

    /// Write the effective config (including --base-url) back to the config file.
    #[arg(long)]
    save_config: bool,
}

/// Flag > env (folded into the flag by clap) > config file > defaults.
fn resolve_config(args: &Args) -> anyhow::Result<ClientConfig> {
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let store = ConfigStore::at_path(config_path);
    let mut cfg = store.load_or_default()?;
    if let Some(base_url) = &args.base_url {
        cfg.base_url = base_url.clone();
    }

    if args.save_config {
        store.save(&cfg)?;
        log::info!("saved config to {}", store.path().display());
    }
    Ok(cfg)
}

fn init_logging() {
    // Library crates log through `log`; the subscriber's log bridge picks those up.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn print_changes(ctl: PlaygroundController, mut rx: broadcast::Receiver<StateChange>) {
    loop {
        let change = match rx.recv().await {
            Ok(c) => c,
            Err(broadcast::error::RecvError::Lagged(n)) => {
                log::debug!("display lagged by {n} events");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        let view = ctl.view().await;
        let line = match change {
            StateChange::Auth => render::render_auth(&view.auth, view.login_form_visible),
            StateChange::Probe => render::render_backend(&view.backend_message),
            StateChange::Submitted { kind, .. } | StateChange::Settled { kind, .. } => match kind {
                OperationKind::Text => render::render_text(&view.text),
                OperationKind::Image => render::render_image(&view.image),
                OperationKind::Chat if view.chat.pending => continue,
                OperationKind::Chat => render::render_last_exchange(&view.chat),
            },
            StateChange::Discarded { .. } => continue,
        };
        println!("{line}");
    }
}

fn dispatch(ctl: &PlaygroundController, cmd: Command) {
    let ctl = ctl.clone();
    tokio::spawn(async move {
        let res = match cmd {
            Command::Login { username, password } => {
                ctl.login(&username, &password).await;
                Ok(0)
            }
            Command::Logout => {
                ctl.logout().await;
                Ok(0)
            }
            Command::Text(prompt) => ctl.submit_text(&prompt).await,
            Command::Image(prompt) => ctl.submit_image(&prompt).await,
            Command::Chat(message) => ctl.send_chat(&message).await,
            Command::Help | Command::Status | Command::ToggleLoginForm | Command::Quit => Ok(0),
        };
        if let Err(e) = res {
            println!("{e}");
        }
    });
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();

    let cfg = resolve_config(&args)?;
    log::info!("using backend {}", cfg.base_url);

    let ctl = PlaygroundController::from_config(&cfg)?;

    println!("StageAI Playground ({}) - type `help`", ctl.base_url());
    tokio::spawn(print_changes(ctl.clone(), ctl.subscribe()));
    tokio::spawn({
        let ctl = ctl.clone();
        async move { ctl.mount().await }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("read stdin")? {
        let cmd = match parse_line(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(msg) => {
                println!("{msg}");
                continue;
            }
        };

        match cmd {
            Command::Quit => break,
            Command::Help => println!("{HELP}"),
            Command::Status => println!("{}", render::render_view(&ctl.view().await)),
            Command::ToggleLoginForm => {
                let open = ctl.toggle_login_form().await;
                let view = ctl.view().await;
                if open && view.auth.status.is_logged_in() {
                    println!("déjà connecté");
                } else {
                    println!("{}", render::render_auth(&view.auth, view.login_form_visible));
                }
            }
            other => dispatch(&ctl, other),
        }
    }

    Ok(())
}

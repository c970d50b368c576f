use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

use peercall_client::loopback::{LoopbackRelay, ScriptedMediaEngine, ScriptedMediaOptions};
use peercall_client::{
    CallEvent, ControllerConfig, NegotiationController, OfferCollisionPolicy, StaticAuthenticator,
};
use peercall_core::{SessionState, decode};

#[derive(Parser)]
#[command(name = "peercall")]
#[command(about = "Drive call negotiation over an in-process relay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a call between two controllers over a loopback relay.
    Simulate {
        #[arg(long, default_value = "alice")]
        caller: String,

        #[arg(long, default_value = "bob")]
        callee: String,

        /// Delay before the caller's media engine reports ready.
        #[arg(long, default_value_t = 50)]
        ready_delay_ms: u64,

        #[arg(long, default_value_t = 10_000)]
        readiness_timeout_ms: u64,

        /// The caller's media engine never becomes ready.
        #[arg(long)]
        never_ready: bool,

        /// Keep the offer of the lower user id when both sides call at once.
        #[arg(long)]
        lowest_id_keeps_offer: bool,

        #[arg(long, default_value_t = 1_000)]
        duration_ms: u64,

        /// Text message the caller sends once the call is placed.
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Print a wire payload as a decoded signaling message.
    Decode { payload: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Commands::Simulate {
            caller,
            callee,
            ready_delay_ms,
            readiness_timeout_ms,
            never_ready,
            lowest_id_keeps_offer,
            duration_ms,
            message,
        } => {
            let mut config = ControllerConfig::default()
                .with_readiness_timeout(Duration::from_millis(readiness_timeout_ms));
            if lowest_id_keeps_offer {
                config = config.with_offer_collision(OfferCollisionPolicy::LowestIdKeepsOffer);
            }
            let caller_media = ScriptedMediaOptions {
                ready_delay: Duration::from_millis(ready_delay_ms),
                never_ready,
                ..Default::default()
            };

            simulate(
                &caller,
                &callee,
                config,
                caller_media,
                Duration::from_millis(duration_ms),
                message,
            )
            .await?;
        }

        Commands::Decode { payload } => {
            let message = decode(&payload).context("Payload is not a signaling message")?;
            println!("{} {:?}", "type:".cyan(), message.message_type);
            println!("{} {}", "target:".cyan(), message.target_id);
            match message.ice_candidate() {
                Ok(candidate) => {
                    println!("{} {}", "candidate:".cyan(), candidate.candidate);
                    println!("{} {}", "m-line:".cyan(), candidate.sdp_m_line_index);
                    println!("{} {}", "mid:".cyan(), candidate.sdp_mid);
                }
                Err(_) => println!("{} {}", "data:".cyan(), message.data),
            }
        }
    }

    Ok(())
}

async fn simulate(
    caller: &str,
    callee: &str,
    config: ControllerConfig,
    caller_media: ScriptedMediaOptions,
    duration: Duration,
    message: Option<String>,
) -> Result<()> {
    anyhow::ensure!(caller != callee, "caller and callee must differ");
    println!("{}", format!("📞 {} calls {} over loopback", caller, callee).green().bold());

    let relay = LoopbackRelay::new();
    let mut caller_ctl = build_controller(
        &relay,
        caller,
        config.clone(),
        ScriptedMediaEngine::with_options(caller, caller_media),
    )?;
    let mut callee_ctl = build_controller(
        &relay,
        callee,
        config,
        ScriptedMediaEngine::new(callee),
    )?;

    let caller_printer = spawn_printer(caller.to_owned(), caller_ctl.subscribe());
    let callee_printer = spawn_printer(callee.to_owned(), callee_ctl.subscribe());

    caller_ctl.connect().context("Caller failed to connect")?;
    callee_ctl.connect().context("Callee failed to connect")?;

    let caller_handle = caller_ctl.handle();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let caller_loop = tokio::spawn(caller_ctl.run(shutdown_rx.clone()));
    let callee_loop = tokio::spawn(callee_ctl.run(shutdown_rx));

    caller_handle.start_call(callee);
    if let Some(text) = message {
        caller_handle.send_text(callee, text);
    }
    drop(caller_handle);

    tokio::time::sleep(duration).await;
    shutdown_tx.send(true).context("Negotiation loops already stopped")?;
    caller_loop.await.context("Caller loop panicked")?;
    callee_loop.await.context("Callee loop panicked")?;

    let caller_state = caller_printer.await.context("Printer task panicked")?;
    let callee_state = callee_printer.await.context("Printer task panicked")?;

    println!("{}", "✨ Simulation finished".green().bold());
    println!("   {:<10} last negotiated state: {}", caller, caller_state);
    println!("   {:<10} last negotiated state: {}", callee, callee_state);
    Ok(())
}

fn build_controller(
    relay: &LoopbackRelay,
    user_id: &str,
    config: ControllerConfig,
    media: ScriptedMediaEngine,
) -> Result<NegotiationController> {
    let controller = NegotiationController::new(Arc::new(relay.channel(user_id)), Arc::new(media), config)
        .with_context(|| format!("Failed to create controller for {}", user_id))?
        .with_authenticator(Arc::new(StaticAuthenticator::new(user_id, user_id, "loopback")));
    Ok(controller)
}

/// Prints every event until the controller is gone. Returns the last state
/// reached before teardown.
fn spawn_printer(label: String, mut events: broadcast::Receiver<CallEvent>) -> JoinHandle<SessionState> {
    tokio::spawn(async move {
        let mut reached = SessionState::Idle;
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let CallEvent::StateChanged { to, .. } = &event {
                        if !matches!(to, SessionState::Closing | SessionState::Idle) {
                            reached = *to;
                        }
                    }
                    println!("{} {}", format!("[{}]", label).bold(), describe(&event));
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    println!("{} {}", format!("[{}]", label).bold(), format!("missed {} events", n).yellow());
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        reached
    })
}

fn describe(event: &CallEvent) -> ColoredString {
    match event {
        CallEvent::StateChanged { from, to, peer_id, .. } => {
            let peer = peer_id.as_ref().map(|p| p.to_string()).unwrap_or_default();
            format!("{} -> {} {}", from, to, peer).cyan()
        }
        CallEvent::PeerJoined(peer) => format!("peer joined: {} ({})", peer.user_name, peer.user_id).normal(),
        CallEvent::PeerStatusChanged(peer) => format!("peer {} is {:?}", peer.user_id, peer.status).normal(),
        CallEvent::PeerWentOffline(peer_id) => format!("peer {} went offline", peer_id).yellow(),
        CallEvent::PeerListCleared => "peer list cleared".yellow(),
        CallEvent::ConnectionChanged { connected: true, .. } => "relay connected".green(),
        CallEvent::ConnectionChanged { connected: false, error } => {
            format!("relay disconnected {}", error.as_deref().unwrap_or("")).yellow()
        }
        CallEvent::TextMessage { sender_id, text } => format!("💬 {}: {}", sender_id, text).magenta(),
        CallEvent::Warning(message) => format!("warning: {}", message).yellow(),
        CallEvent::Error(error) => format!("error: {}", error).red().bold(),
    }
}

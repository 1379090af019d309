//! Duel Sync Peer
//!
//! Runs one side of a replicated duel from a deck file. Line commands on
//! stdin drive the local player; digests of both players are printed so two
//! peers can confirm they agree.

use std::io::BufRead;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use duel_sync::duel::card_info::CardDatabase;
use duel_sync::network::session::Role;
use duel_sync::{
    CardId, DeckList, DuelAction, DuelSession, LocalInput, MemoryCardDatabase, PileAction,
    PileTarget, SessionConfig, DEFAULT_PORT, VERSION,
};

#[derive(Parser, Debug)]
#[command(name = "duel-sync")]
#[command(about = "Play one side of a replicated card duel", long_about = None)]
struct Args {
    /// Listen for the opponent
    #[arg(long)]
    host: bool,

    /// Connect to a listening opponent
    #[arg(long, value_name = "ADDR")]
    connect: Option<IpAddr>,

    /// Run without an opponent
    #[arg(long)]
    solo: bool,

    /// Deck file (#main / #extra / !side sections)
    #[arg(short, long)]
    deck: PathBuf,

    /// Card database (JSON list of card records)
    #[arg(short, long)]
    cards: Option<PathBuf>,

    /// TCP port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Fixed handshake seed
    #[arg(short, long)]
    seed: Option<String>,
}

/// One line typed on stdin.
#[derive(Debug, Clone, PartialEq)]
enum Line {
    Input(LocalInput),
    Digest,
    Hand,
    Quit,
}

fn parse_line(line: &str) -> Result<Line, String> {
    let mut words = line.split_whitespace();
    let word = words.next().ok_or("empty line")?;
    let arg = words.next();

    let parsed = match word {
        "digest" => Line::Digest,
        "hand" if arg.is_none() => Line::Hand,
        "quit" | "exit" => Line::Quit,
        "spread" | "collapse" => {
            let action = if word == "spread" { PileAction::Spread } else { PileAction::Collapse };
            let pile: PileTarget = arg.ok_or("missing pile")?.parse()?;
            Line::Input(LocalInput::Pile { action, pile })
        }
        other => {
            let action: DuelAction = other.parse()?;
            let target = match (action.requires_target(), arg) {
                (true, Some(id)) => Some(CardId::from(id)),
                (true, None) => return Err(format!("{} needs a card id", action)),
                (false, _) => None,
            };
            Line::Input(LocalInput::Key { action, target })
        }
    };
    Ok(parsed)
}

fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn print_digests(session: &DuelSession) {
    info!(
        tick = session.ticks(),
        local = %hex::encode(session.local_digest()),
        mirror = %hex::encode(session.mirror_digest()),
        "Digests"
    );
}

fn print_hand(session: &DuelSession) {
    for card in session.local().hand().cards() {
        let info = card.info();
        info!(id = %card.id(), code = %info.code, name = %info.name, kind = ?info.kind, "Hand");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;

    info!("Duel Sync v{}", VERSION);

    let deck = DeckList::from_file(&args.deck)
        .with_context(|| format!("reading deck {}", args.deck.display()))?;
    let cards: Arc<dyn CardDatabase> = match &args.cards {
        Some(path) => Arc::new(
            MemoryCardDatabase::from_file(path)
                .with_context(|| format!("reading card database {}", path.display()))?,
        ),
        None => {
            warn!("No card database given; every card is of unknown kind");
            Arc::new(MemoryCardDatabase::new())
        }
    };

    let mut config = SessionConfig {
        port: args.port,
        seed: args.seed.clone(),
        ..Default::default()
    };

    let mut session = match (args.host, args.connect, args.solo) {
        (true, None, false) => {
            config.role = Role::Host;
            DuelSession::establish(config, deck, cards).await?
        }
        (false, Some(addr), false) => {
            config.role = Role::Guest;
            config.addr = addr;
            DuelSession::establish(config, deck, cards).await?
        }
        (false, None, true) => DuelSession::solo(config, deck, cards),
        _ => bail!("exactly one of --host, --connect or --solo must be given"),
    };

    print_digests(&session);

    let mut lines = spawn_stdin_reader();
    let mut interval = tokio::time::interval(session.config().tick_interval());
    let mut last = tokio::time::Instant::now();

    loop {
        interval.tick().await;
        let now = tokio::time::Instant::now();
        let dt = (now - last).as_secs_f32();
        last = now;

        let mut inputs = Vec::new();
        while let Ok(line) = lines.try_recv() {
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(&line) {
                Ok(Line::Input(input)) => inputs.push(input),
                Ok(Line::Digest) => print_digests(&session),
                Ok(Line::Hand) => print_hand(&session),
                Ok(Line::Quit) => {
                    info!("Leaving duel");
                    return Ok(());
                }
                Err(e) => warn!("{}", e),
            }
        }

        match session.tick(dt, &inputs) {
            Ok(summary) if summary.applied > 0 || summary.replayed => print_digests(&session),
            Ok(_) => {}
            Err(e) => {
                error!("Duel ended: {}", e);
                return Err(e.into());
            }
        }
    }
}

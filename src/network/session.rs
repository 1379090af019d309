//! Duel Session
//!
//! Owns everything one peer needs to run a replicated duel: the RNG
//! context, the card database, the local player, the mirrored opponent and
//! the transport to the peer.
//!
//! Startup blocks until seeds and decks are exchanged. After that every
//! tick replays at most one remote command against the mirror, applies
//! local input and advances animations.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::core::hash::StateHash;
use crate::core::rng::RngContext;
use crate::core::seat::Seat;
use crate::core::vec2::Vec2;
use crate::duel::action::{DuelAction, PileAction, PileTarget};
use crate::duel::card::CardId;
use crate::duel::card_info::CardDatabase;
use crate::duel::deck_list::DeckList;
use crate::duel::player::{ActionOutcome, DuelError, Player};
use crate::network::protocol::{CommandType, DuelMessage, ProtocolError};
use crate::network::transport::{Transport, TransportError, DEFAULT_MAX_FRAME_LEN};
use crate::{CARD_ID_LEN, DEFAULT_PORT, SEED_LEN, TICK_RATE};

/// Which side of the connection this peer is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Listens and accepts exactly one peer.
    Host,
    /// Connects to a host, retrying until accepted.
    Guest,
}

/// Configuration for a duel session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Connection role.
    pub role: Role,
    /// Bind address for a host, peer address for a guest.
    pub addr: IpAddr,
    /// TCP port.
    pub port: u16,
    /// Simulation ticks per second.
    pub tick_rate: u32,
    /// Length of generated card ids.
    pub card_id_len: usize,
    /// Length of generated handshake seeds.
    pub seed_len: usize,
    /// Largest accepted frame.
    pub max_frame_len: usize,
    /// Delay between connection attempts.
    pub connect_retry: Duration,
    /// Fixed handshake seed instead of a random one.
    pub seed: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            role: Role::Host,
            addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            tick_rate: TICK_RATE,
            card_id_len: CARD_ID_LEN,
            seed_len: SEED_LEN,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            connect_retry: Duration::from_secs(1),
            seed: None,
        }
    }
}

impl SessionConfig {
    /// Socket address to bind or connect to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.addr, self.port)
    }

    /// Wall-clock length of one tick.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate.max(1) as f64)
    }
}

/// Session errors. Every one of them ends the duel.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Peer sent something other than the expected handshake step.
    #[error("received {received} while waiting for {expected}")]
    UnexpectedCommand {
        /// Command type the handshake was waiting for
        expected: CommandType,
        /// Command type that arrived
        received: CommandType,
    },

    /// Handshake data arrived during play.
    #[error("received {0} after the handshake")]
    LateHandshake(CommandType),

    /// Transport failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Encoding failure.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Replicated state diverged or a fatal zone operation ran.
    #[error("duel error: {0}")]
    Duel(#[from] DuelError),
}

/// One unit of local input.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalInput {
    /// Key action, with a target card where the action needs one.
    Key {
        /// Action
        action: DuelAction,
        /// Target card id
        target: Option<CardId>,
    },
    /// Spread/collapse a named pile.
    Pile {
        /// Spread or collapse
        action: PileAction,
        /// Pile
        pile: PileTarget,
    },
    /// Spread/collapse whichever pile the pointer is aligned with.
    Scroll {
        /// Spread or collapse
        action: PileAction,
        /// Pointer on the local board
        pointer: Vec2,
    },
}

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// A remote command was replayed on the mirror.
    pub replayed: bool,
    /// Local inputs applied (and transmitted).
    pub applied: usize,
    /// Local inputs rejected as no-ops.
    pub ignored: usize,
}

/// One peer's view of a duel.
pub struct DuelSession {
    config: SessionConfig,
    cards: Arc<dyn CardDatabase>,
    rng: RngContext,
    local: Player,
    mirror: Player,
    transport: Option<Transport>,
    ticks: u64,
}

impl DuelSession {
    /// Connect to the peer according to the configured role, then run the
    /// handshake.
    pub async fn establish(
        config: SessionConfig,
        deck: DeckList,
        cards: Arc<dyn CardDatabase>,
    ) -> Result<Self, SessionError> {
        let addr = config.socket_addr();
        let transport = match config.role {
            Role::Host => Transport::listen(addr, config.max_frame_len).await?,
            Role::Guest => {
                Transport::connect(addr, config.connect_retry, config.max_frame_len).await?
            }
        };
        Self::handshake(config, transport, deck, cards).await
    }

    /// Exchange seeds and decks over an open transport.
    ///
    /// Blocks until the peer's seed, main deck and fusion deck have arrived
    /// in that order. Anything else arriving first is fatal.
    pub async fn handshake(
        config: SessionConfig,
        mut transport: Transport,
        deck: DeckList,
        cards: Arc<dyn CardDatabase>,
    ) -> Result<Self, SessionError> {
        let mut rng = RngContext::new();

        // Seeds
        let seed = match &config.seed {
            Some(seed) => seed.clone(),
            None => rng.handshake_seed(config.seed_len),
        };
        rng.reseed(Seat::One, &seed);
        info!(peer = %transport.peer(), %seed, "Sending RNG seed");
        transport.send(&DuelMessage::RngSeed(seed))?;

        let remote_seed = match transport.next().await? {
            DuelMessage::RngSeed(seed) => seed,
            other => return Err(unexpected(CommandType::RngSeed, &other)),
        };
        info!(peer = %transport.peer(), seed = %remote_seed, "Received RNG seed");
        rng.reseed(Seat::Two, &remote_seed);

        // Decks
        transport.send(&DuelMessage::MainDeck(deck.main.clone()))?;
        transport.send(&DuelMessage::FusionDeck(deck.fusion.clone()))?;

        let main = match transport.next().await? {
            DuelMessage::MainDeck(codes) => codes,
            other => return Err(unexpected(CommandType::MainDeckData, &other)),
        };
        let fusion = match transport.next().await? {
            DuelMessage::FusionDeck(codes) => codes,
            other => return Err(unexpected(CommandType::FusionDeckData, &other)),
        };
        info!(
            peer = %transport.peer(),
            main = main.len(),
            fusion = fusion.len(),
            "Received opponent deck"
        );
        let remote_deck = DeckList::new(main, fusion);

        let local = Player::new(
            Seat::One,
            &deck,
            cards.as_ref(),
            rng.stream(Seat::One),
            config.card_id_len,
        );
        let mirror = Player::new(
            Seat::Two,
            &remote_deck,
            cards.as_ref(),
            rng.stream(Seat::Two),
            config.card_id_len,
        );

        Ok(Self {
            config,
            cards,
            rng,
            local,
            mirror,
            transport: Some(transport),
            ticks: 0,
        })
    }

    /// Run without a peer. The mirror is built from the local deck and
    /// nothing is transmitted.
    pub fn solo(config: SessionConfig, deck: DeckList, cards: Arc<dyn CardDatabase>) -> Self {
        let mut rng = RngContext::new();
        if let Some(seed) = &config.seed {
            rng.reseed(Seat::One, seed);
        }

        let local = Player::new(Seat::One, &deck, cards.as_ref(), rng.stream(Seat::One), config.card_id_len);
        let mirror = Player::new(Seat::Two, &deck, cards.as_ref(), rng.stream(Seat::Two), config.card_id_len);
        info!(main = deck.main.len(), fusion = deck.fusion.len(), "Solo session started");

        Self {
            config,
            cards,
            rng,
            local,
            mirror,
            transport: None,
            ticks: 0,
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Card database shared by both players.
    pub fn cards(&self) -> &dyn CardDatabase {
        self.cards.as_ref()
    }

    /// The local player.
    pub fn local(&self) -> &Player {
        &self.local
    }

    /// The mirrored opponent.
    pub fn mirror(&self) -> &Player {
        &self.mirror
    }

    /// Seed applied to a seat's stream.
    pub fn seed(&self, seat: Seat) -> Option<&str> {
        self.rng.seed(seat)
    }

    /// Is there no peer?
    pub fn is_solo(&self) -> bool {
        self.transport.is_none()
    }

    /// Ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Digest of the local player.
    pub fn local_digest(&self) -> StateHash {
        self.local.digest()
    }

    /// Digest of the mirrored opponent.
    pub fn mirror_digest(&self) -> StateHash {
        self.mirror.digest()
    }

    /// Is either player still animating?
    pub fn animating(&self) -> bool {
        self.local.animating() || self.mirror.animating()
    }

    /// Verify zone membership on both players.
    pub fn check_invariants(&self) -> Result<(), DuelError> {
        self.local.check_invariants()?;
        self.mirror.check_invariants()
    }

    // -------------------------------------------------------------------------
    // Tick
    // -------------------------------------------------------------------------

    /// Advance one simulation frame.
    ///
    /// Replays at most one remote command, then applies local inputs in
    /// order, then advances both players' animations.
    pub fn tick(&mut self, dt: f32, inputs: &[LocalInput]) -> Result<TickSummary, SessionError> {
        let mut summary = TickSummary::default();

        if let Some(transport) = &mut self.transport {
            if let Some(message) = transport.try_next()? {
                Self::replay(&mut self.mirror, &mut self.rng, message, dt).map_err(|e| {
                    error!(tick = self.ticks, "Remote replay failed: {}", e);
                    e
                })?;
                summary.replayed = true;
            }
        }

        for input in inputs {
            if self.apply_local(input, dt)?.is_applied() {
                summary.applied += 1;
            } else {
                summary.ignored += 1;
            }
        }

        self.local.update(dt);
        self.mirror.update(dt);
        self.ticks += 1;
        Ok(summary)
    }

    fn replay(
        mirror: &mut Player,
        rng: &mut RngContext,
        message: DuelMessage,
        dt: f32,
    ) -> Result<(), SessionError> {
        match message {
            DuelMessage::Key { action, target } => {
                if let Some(id) = &target {
                    mirror.finish_turn(id);
                }
                let outcome = mirror.perform(action, target.as_ref(), rng.stream(Seat::Two), dt)?;
                if !outcome.is_applied() {
                    debug!(%action, "Remote action was a no-op on the mirror");
                }
            }
            DuelMessage::Mouse { action, pile } => {
                mirror.pile_action(action, pile);
            }
            other => return Err(SessionError::LateHandshake(other.kind())),
        }
        Ok(())
    }

    fn apply_local(&mut self, input: &LocalInput, dt: f32) -> Result<ActionOutcome, SessionError> {
        let (outcome, message) = match input {
            LocalInput::Key { action, target } => {
                if let Some(id) = target {
                    if self.local.find(id).is_none() {
                        debug!(%action, %id, "Local target not found");
                        return Ok(ActionOutcome::Ignored("unknown card"));
                    }
                }
                let outcome = self.local.perform(*action, target.as_ref(), self.rng.stream(Seat::One), dt)?;
                let message = DuelMessage::Key {
                    action: *action,
                    target: target.clone().filter(|_| action.requires_target()),
                };
                (outcome, message)
            }
            LocalInput::Pile { action, pile } => {
                let outcome = self.local.pile_action(*action, *pile);
                (outcome, DuelMessage::Mouse { action: *action, pile: *pile })
            }
            LocalInput::Scroll { action, pointer } => match self.local.pile_at(*pointer) {
                Some(pile) => {
                    let outcome = self.local.pile_action(*action, pile);
                    (outcome, DuelMessage::Mouse { action: *action, pile })
                }
                None => return Ok(ActionOutcome::Ignored("pointer not aligned with a pile")),
            },
        };

        if outcome.is_applied() {
            if let Some(transport) = &self.transport {
                transport.send(&message)?;
            }
        }
        Ok(outcome)
    }
}

fn unexpected(expected: CommandType, received: &DuelMessage) -> SessionError {
    let received = received.kind();
    error!(%expected, %received, "Unexpected command during handshake");
    SessionError::UnexpectedCommand { expected, received }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::layout::SeatLayout;
    use crate::duel::card_info::{CardKind, MemoryCardDatabase};
    use crate::duel::card::{Location, Stance};
    use crate::network::transport::DEFAULT_MAX_FRAME_LEN;
    use tokio::net::TcpListener;

    const DT: f32 = 1.0 / 60.0;

    fn db() -> Arc<dyn CardDatabase> {
        Arc::new(
            MemoryCardDatabase::new()
                .with("1001", "Vanguard Knight", CardKind::Monster, false)
                .with("1002", "Ember Drake", CardKind::Monster, false)
                .with("1003", "Iron Wall", CardKind::Monster, false)
                .with("2001", "Quick Draw", CardKind::Spell, false)
                .with("3001", "Pitfall", CardKind::Trap, false)
                .with("4001", "Twin Drake", CardKind::Monster, true),
        )
    }

    fn config(seed: &str) -> SessionConfig {
        SessionConfig {
            seed: Some(seed.to_string()),
            ..Default::default()
        }
    }

    fn deck(main: &[&str]) -> DeckList {
        DeckList::new(
            main.iter().map(|c| c.to_string()).collect(),
            vec!["4001".to_string()],
        )
    }

    fn host_deck() -> DeckList {
        deck(&["1001", "2001", "1002", "3001", "1003", "2001", "1001", "1002"])
    }

    async fn pair(host: DeckList, guest: DeckList) -> (DuelSession, DuelSession) {
        let (a, b) = tokio::io::duplex(64 * 1024);
        let ta = Transport::from_stream(a, "guest", DEFAULT_MAX_FRAME_LEN);
        let tb = Transport::from_stream(b, "host", DEFAULT_MAX_FRAME_LEN);
        let (host, guest) = tokio::join!(
            DuelSession::handshake(config("abc12345"), ta, host, db()),
            DuelSession::handshake(config("XY9Z"), tb, guest, db()),
        );
        (host.unwrap(), guest.unwrap())
    }

    /// Tick both peers until commands are delivered and animations settle.
    async fn settle(a: &mut DuelSession, b: &mut DuelSession) {
        for _ in 0..600 {
            a.tick(DT, &[]).unwrap();
            b.tick(DT, &[]).unwrap();
            tokio::task::yield_now().await;
        }
        assert!(!a.animating());
        assert!(!b.animating());
    }

    fn key(action: DuelAction, target: Option<&CardId>) -> LocalInput {
        LocalInput::Key {
            action,
            target: target.cloned(),
        }
    }

    fn assert_converged(a: &DuelSession, b: &DuelSession) {
        assert_eq!(hex::encode(a.local_digest()), hex::encode(b.mirror_digest()));
        assert_eq!(hex::encode(b.local_digest()), hex::encode(a.mirror_digest()));
        a.check_invariants().unwrap();
        b.check_invariants().unwrap();
    }

    #[test]
    fn test_session_config_default() {
        let config = SessionConfig::default();
        assert_eq!(config.port, 6969);
        assert_eq!(config.tick_rate, 60);
        assert_eq!(config.card_id_len, 15);
        assert_eq!(config.seed_len, 8);
        assert_eq!(config.role, Role::Host);
        assert!(config.seed.is_none());
    }

    #[tokio::test]
    async fn test_handshake_mirrors_decks() {
        let (host, guest) = pair(host_deck(), deck(&["1001", "1002", "1003"])).await;

        assert_eq!(host.seed(Seat::Two), Some("XY9Z"));
        assert_eq!(guest.seed(Seat::One), Some("XY9Z"));
        assert_eq!(guest.seed(Seat::Two), Some("abc12345"));

        let mirrored: Vec<(&str, &str)> = host
            .mirror()
            .main_deck()
            .cards()
            .iter()
            .map(|c| (c.code(), c.id().as_str()))
            .collect();
        let local_order: Vec<(&str, &str)> = guest
            .local()
            .main_deck()
            .cards()
            .iter()
            .map(|c| (c.code(), c.id().as_str()))
            .collect();
        assert_eq!(mirrored.len(), 3);
        assert_eq!(mirrored, local_order);

        let mut codes: Vec<&str> = mirrored.iter().map(|(code, _)| *code).collect();
        codes.sort_unstable();
        assert_eq!(codes, vec!["1001", "1002", "1003"]);

        assert_converged(&host, &guest);
    }

    #[tokio::test]
    async fn test_unexpected_handshake_command_is_fatal() {
        let (a, b) = tokio::io::duplex(4096);
        let ta = Transport::from_stream(a, "peer", DEFAULT_MAX_FRAME_LEN);
        let tb = Transport::from_stream(b, "host", DEFAULT_MAX_FRAME_LEN);

        tb.send(&DuelMessage::MainDeck(vec!["1001".into()])).unwrap();
        let result = DuelSession::handshake(config("abc12345"), ta, host_deck(), db()).await;
        assert!(matches!(
            result,
            Err(SessionError::UnexpectedCommand {
                expected: CommandType::RngSeed,
                received: CommandType::MainDeckData,
            })
        ));
    }

    #[tokio::test]
    async fn test_actions_replay_on_mirror() {
        let (mut host, mut guest) = pair(host_deck(), host_deck()).await;

        // Draw until a monster is in hand
        let monster = loop {
            let summary = host.tick(DT, &[key(DuelAction::Draw, None)]).unwrap();
            assert_eq!(summary.applied, 1);
            settle(&mut host, &mut guest).await;
            if let Some(card) = host.local().hand().cards().iter().find(|c| c.is_monster()) {
                break card.id().clone();
            }
        };
        assert_converged(&host, &guest);

        let summary = host
            .tick(DT, &[key(DuelAction::NormalSummon, Some(&monster))])
            .unwrap();
        assert_eq!(summary.applied, 1);
        settle(&mut host, &mut guest).await;

        let on_mirror = guest.mirror().field().find(&monster).unwrap();
        assert_eq!(on_mirror.location(), Location::Field);
        assert!(on_mirror.is_face_up());
        assert_converged(&host, &guest);

        // Guest acts too
        guest.tick(DT, &[key(DuelAction::Mill, None)]).unwrap();
        guest
            .tick(DT, &[LocalInput::Pile { action: PileAction::Spread, pile: PileTarget::MainDeck }])
            .unwrap();
        settle(&mut host, &mut guest).await;

        assert_eq!(host.mirror().graveyard().len(), 1);
        assert!(host.mirror().main_deck().is_spread());
        assert_converged(&host, &guest);
    }

    async fn summon_first_monster(host: &mut DuelSession, guest: &mut DuelSession) -> CardId {
        let monster = loop {
            host.tick(DT, &[key(DuelAction::Draw, None)]).unwrap();
            settle(host, guest).await;
            if let Some(card) = host.local().hand().cards().iter().find(|c| c.is_monster()) {
                break card.id().clone();
            }
        };
        host.tick(DT, &[key(DuelAction::NormalSummon, Some(&monster))]).unwrap();
        settle(host, guest).await;
        monster
    }

    #[tokio::test]
    async fn test_repeated_stance_change_mid_turn_is_not_sent() {
        let (mut host, mut guest) = pair(host_deck(), host_deck()).await;
        let monster = summon_first_monster(&mut host, &mut guest).await;

        let summary = host.tick(DT, &[key(DuelAction::ChangeStance, Some(&monster))]).unwrap();
        assert_eq!(summary.applied, 1);
        for _ in 0..3 {
            host.tick(DT, &[]).unwrap();
        }
        let summary = host.tick(DT, &[key(DuelAction::ChangeStance, Some(&monster))]).unwrap();
        assert_eq!(summary.ignored, 1);
        settle(&mut host, &mut guest).await;

        assert_eq!(host.local().field().find(&monster).unwrap().stance(), Stance::Defense);
        assert_eq!(guest.mirror().field().find(&monster).unwrap().stance(), Stance::Defense);
        assert_converged(&host, &guest);
    }

    #[tokio::test]
    async fn test_mirror_commits_turn_before_replaying_the_next() {
        let (mut host, mut guest) = pair(host_deck(), host_deck()).await;
        let monster = summon_first_monster(&mut host, &mut guest).await;

        // The host finishes its first turn before the guest has replayed it
        host.tick(DT, &[key(DuelAction::ChangeStance, Some(&monster))]).unwrap();
        for _ in 0..60 {
            host.tick(DT, &[]).unwrap();
        }
        let summary = host.tick(DT, &[key(DuelAction::ChangeStance, Some(&monster))]).unwrap();
        assert_eq!(summary.applied, 1);
        settle(&mut host, &mut guest).await;

        assert_eq!(guest.mirror().field().find(&monster).unwrap().stance(), Stance::Attack);
        assert_converged(&host, &guest);
    }

    #[tokio::test]
    async fn test_ignored_actions_are_not_sent() {
        let (mut host, mut guest) = pair(host_deck(), host_deck()).await;

        let summary = host
            .tick(
                DT,
                &[
                    key(DuelAction::Flip, Some(&CardId::from("nosuchcard00000"))),
                    LocalInput::Pile { action: PileAction::Collapse, pile: PileTarget::Graveyard },
                    key(DuelAction::Activate, None),
                ],
            )
            .unwrap();
        assert_eq!(summary.applied, 0);
        assert_eq!(summary.ignored, 3);

        settle(&mut host, &mut guest).await;
        assert_converged(&host, &guest);
    }

    #[tokio::test]
    async fn test_scroll_resolves_against_local_board() {
        let (mut host, mut guest) = pair(host_deck(), host_deck()).await;
        let deck = SeatLayout::for_seat(Seat::One).main_deck;

        let summary = host
            .tick(DT, &[LocalInput::Scroll { action: PileAction::Spread, pointer: Vec2::new(0.0, deck.y + 10.0) }])
            .unwrap();
        assert_eq!(summary.applied, 1);
        settle(&mut host, &mut guest).await;

        assert!(host.local().main_deck().is_spread());
        assert!(guest.mirror().main_deck().is_spread());
    }

    #[tokio::test]
    async fn test_late_handshake_command_is_fatal() {
        let (a, b) = tokio::io::duplex(4096);
        let ta = Transport::from_stream(a, "guest", DEFAULT_MAX_FRAME_LEN);
        let tb = Transport::from_stream(b, "host", DEFAULT_MAX_FRAME_LEN);
        let (host, guest) = tokio::join!(
            DuelSession::handshake(config("abc12345"), ta, host_deck(), db()),
            DuelSession::handshake(config("XY9Z"), tb, host_deck(), db()),
        );
        let mut host = host.unwrap();
        let guest = guest.unwrap();

        guest
            .transport
            .as_ref()
            .unwrap()
            .send(&DuelMessage::RngSeed("again".into()))
            .unwrap();

        let mut result = Ok(TickSummary::default());
        for _ in 0..100 {
            result = host.tick(DT, &[]);
            if result.is_err() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(matches!(result, Err(SessionError::LateHandshake(CommandType::RngSeed))));
    }

    #[tokio::test]
    async fn test_lost_peer_is_fatal() {
        let (mut host, guest) = pair(host_deck(), host_deck()).await;
        drop(guest);

        let mut result = Ok(TickSummary::default());
        for _ in 0..100 {
            result = host.tick(DT, &[]);
            if result.is_err() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(matches!(
            result,
            Err(SessionError::Transport(TransportError::ConnectionLost))
        ));
    }

    #[tokio::test]
    async fn test_establish_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let host_config = SessionConfig {
            addr: "127.0.0.1".parse().unwrap(),
            port,
            ..config("host0001")
        };
        let guest_config = SessionConfig {
            role: Role::Guest,
            addr: "127.0.0.1".parse().unwrap(),
            port,
            connect_retry: Duration::from_millis(10),
            ..config("guest001")
        };

        let (host, guest) = tokio::join!(
            DuelSession::establish(host_config, host_deck(), db()),
            DuelSession::establish(guest_config, deck(&["1001", "1002", "1003"]), db()),
        );
        let (host, guest) = (host.unwrap(), guest.unwrap());
        assert!(!host.is_solo());
        assert_eq!(host.mirror().main_deck().len(), 3);
        assert_converged(&host, &guest);
    }

    #[test]
    fn test_solo_session() {
        let mut solo = DuelSession::solo(config("solo0001"), host_deck(), db());
        assert!(solo.is_solo());
        assert_eq!(solo.mirror().main_deck().len(), 8);

        let summary = solo.tick(DT, &[key(DuelAction::Draw, None)]).unwrap();
        assert_eq!(summary.applied, 1);
        assert!(!summary.replayed);
        assert_eq!(solo.local().hand().len(), 1);
        assert_eq!(solo.ticks(), 1);
    }
}

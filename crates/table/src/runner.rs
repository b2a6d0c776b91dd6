use super::bank::Bank;
use super::bank::BankError;
use super::command::Command;
use super::command::Summary;
use super::social::SocialHub;
use rand::rngs::StdRng;
use rvb_core::Chips;
use rvb_core::ID;
use rvb_core::PlayerId;
use rvb_core::Table;
use rvb_gameplay::Config;
use rvb_gameplay::Effect;
use rvb_gameplay::HandRecord;
use rvb_gameplay::Input;
use rvb_gameplay::Machine;
use rvb_gameplay::protocol::ErrorCode;
use rvb_gameplay::protocol::ServerMessage;
use rvb_gameplay::protocol::SocialOut;
use rvb_gameplay::view;
use rvb_gameplay::view::Snapshot;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;
use tokio::sync::watch;

/// How many times a failed settlement is retried before the table halts.
const SETTLE_RETRIES: usize = 3;
/// Pause between settlement retries.
const SETTLE_BACKOFF: Duration = Duration::from_millis(250);

/// Address of a live table: its command queue plus a lobby summary that the
/// run-loop refreshes after every input.
#[derive(Debug, Clone)]
pub struct Handle {
    pub id: ID<Table>,
    pub tx: UnboundedSender<Command>,
    pub summary: watch::Receiver<Summary>,
}

/// The per-table actor. Owns the [`Machine`] outright; everything reaches it
/// through the command queue, so the god state is single-threaded by
/// construction. Only settlement awaits anything slow, which serializes the
/// table behind its own ledger write: chips must be durable before the next
/// hand deals.
pub struct Runner {
    machine: Machine,
    rx: UnboundedReceiver<Command>,
    tx: UnboundedSender<Command>,
    tick_hz: u64,
    bank: Arc<dyn Bank>,
    outboxes: HashMap<PlayerId, UnboundedSender<ServerMessage>>,
    views: HashMap<PlayerId, Snapshot>,
    roster: HashMap<PlayerId, String>,
    social: SocialHub,
    summary: watch::Sender<Summary>,
}

impl Runner {
    /// Create the table and spawn its loop. The handle is the only way in.
    /// `tick_hz` paces the social-channel flush.
    pub fn spawn(
        id: ID<Table>,
        config: Config,
        bank: Arc<dyn Bank>,
        rng: StdRng,
        tick_hz: u64,
    ) -> Handle {
        let (tx, rx) = unbounded_channel();
        let machine = Machine::new(id, config, rng);
        let (summary_tx, summary_rx) = watch::channel(Self::summarize(&machine));
        let runner = Self {
            machine,
            rx,
            tx: tx.clone(),
            tick_hz,
            bank,
            outboxes: HashMap::new(),
            views: HashMap::new(),
            roster: HashMap::new(),
            social: SocialHub::default(),
            summary: summary_tx,
        };
        tokio::spawn(runner.run());
        Handle {
            id,
            tx,
            summary: summary_rx,
        }
    }

    async fn run(mut self) {
        let id = self.machine.id();
        log::info!("[table {}] loop started", id);
        let tick = Duration::from_millis(1000 / self.tick_hz.max(1));
        let mut flush = tokio::time::interval(tick);
        flush.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                command = self.rx.recv() => match command {
                    None | Some(Command::Shutdown) => break,
                    Some(command) => self.handle(command).await,
                },
                _ = flush.tick() => self.flush_social(),
            }
        }
        log::info!("[table {}] loop stopped", id);
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Join {
                player,
                name,
                outbox,
            } => {
                log::debug!("[table {}] {} ({}) joins", self.machine.id(), name, player);
                self.roster.insert(player, name);
                self.outboxes.insert(player, outbox);
                self.send_snapshot(player);
            }
            Command::Disconnect { player } => {
                self.outboxes.remove(&player);
                self.views.remove(&player);
            }
            Command::Snapshot { player } => self.send_snapshot(player),
            Command::Social { player, gesture } => {
                let seat = self
                    .machine
                    .seats()
                    .iter()
                    .flatten()
                    .find(|s| s.player() == player)
                    .map(|s| s.index());
                if let Some(seat) = seat {
                    self.social.push(SocialOut { seat, gesture });
                }
            }
            Command::Sit {
                player,
                seat,
                buy_in,
            } => {
                let name = self.name_of(player);
                self.step(Input::Sit {
                    player,
                    name,
                    seat,
                    buy_in,
                })
                .await
            }
            Command::Ready { player } => self.step(Input::Ready { player }).await,
            Command::Act { player, action } => self.step(Input::Act { player, action }).await,
            Command::Leave { player } => self.step(Input::Leave { player }).await,
            Command::Timer { kind, token } => self.step(Input::Timer { kind, token }).await,
            Command::Resume => {
                let effects = self.machine.resume();
                for effect in effects {
                    self.carry_out(effect).await;
                }
                self.fan_out();
            }
            Command::Shutdown => unreachable!("handled by the loop"),
        }
        let _ = self.summary.send(Self::summarize(&self.machine));
    }

    /// Run one input through the machine, carry out its effects, then
    /// re-project and fan out views.
    async fn step(&mut self, input: Input) {
        let effects = self.machine.apply(input);
        for effect in effects {
            self.carry_out(effect).await;
        }
        self.fan_out();
    }

    async fn carry_out(&mut self, effect: Effect) {
        match effect {
            Effect::Arm {
                kind,
                token,
                delay_ms,
            } => {
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    let _ = tx.send(Command::Timer { kind, token });
                });
            }
            Effect::Acted {
                player,
                label,
                amount,
                pot,
                ..
            } => {
                self.broadcast(ServerMessage::PlayerAction {
                    steam_id: player,
                    action: label.to_string(),
                    amount,
                    new_pot: pot,
                });
            }
            Effect::Result { winners, pots } => {
                self.broadcast(ServerMessage::HandResult { winners, pots });
            }
            Effect::Reject {
                player,
                code,
                message,
            } => {
                self.unicast(player, ServerMessage::error(code, message));
            }
            Effect::Settle { deltas, record } => self.settle(deltas, record).await,
        }
    }

    /// Persist the hand. Retries a few times; a table that cannot settle
    /// halts (no new hands, button frozen) until the bank recovers.
    async fn settle(&mut self, deltas: Vec<(PlayerId, Chips)>, record: HandRecord) {
        let id = self.machine.id();
        for attempt in 1..=SETTLE_RETRIES {
            match self.bank.settle(&deltas, &record).await {
                Ok(()) => {
                    log::info!(
                        "[table {}] hand #{} settled ({} deltas)",
                        id,
                        record.hand_no,
                        deltas.len()
                    );
                    return;
                }
                Err(BankError::Insufficient(player)) => {
                    log::error!("[table {}] settlement refused for {}", id, player);
                    break;
                }
                Err(BankError::Unavailable(reason)) => {
                    log::warn!(
                        "[table {}] settlement attempt {}/{} failed: {}",
                        id,
                        attempt,
                        SETTLE_RETRIES,
                        reason
                    );
                    tokio::time::sleep(SETTLE_BACKOFF).await;
                }
            }
        }
        log::error!("[table {}] hand #{} could not settle, halting", id, record.hand_no);
        self.machine.halt();
        self.broadcast(ServerMessage::error(
            ErrorCode::InsufficientChips,
            "chip ledger unavailable, table paused",
        ));
    }

    // ------------------------------------------------------------------
    // fan-out
    // ------------------------------------------------------------------

    /// Re-project a personal view for every connected recipient and send
    /// whatever changed since their last delivery.
    fn fan_out(&mut self) {
        let players = self.outboxes.keys().copied().collect::<Vec<PlayerId>>();
        for player in players {
            let fresh = view::personal(&self.machine, player);
            match self.views.get(&player).map(|last| last.sequence_id) {
                None => {
                    self.unicast(player, ServerMessage::GameSnapshot(fresh.clone()));
                    self.views.insert(player, fresh);
                }
                Some(seen) if seen < fresh.sequence_id => {
                    let last = self.views.get(&player).expect("view recorded");
                    let patch = view::delta(last, &fresh);
                    self.unicast(player, ServerMessage::StatePatch(patch));
                    self.views.insert(player, fresh);
                }
                Some(_) => {}
            }
        }
    }

    fn send_snapshot(&mut self, player: PlayerId) {
        let fresh = view::personal(&self.machine, player);
        self.unicast(player, ServerMessage::GameSnapshot(fresh.clone()));
        self.views.insert(player, fresh);
    }

    fn flush_social(&mut self) {
        if self.social.is_empty() {
            return;
        }
        let events = self.social.drain();
        self.broadcast(ServerMessage::SocialBatch { events });
    }

    fn unicast(&self, player: PlayerId, message: ServerMessage) {
        if let Some(outbox) = self.outboxes.get(&player) {
            if outbox.send(message).is_err() {
                log::warn!("[table {}] outbox gone for {}", self.machine.id(), player);
            }
        }
    }
    fn broadcast(&self, message: ServerMessage) {
        for (player, outbox) in self.outboxes.iter() {
            if outbox.send(message.clone()).is_err() {
                log::warn!("[table {}] outbox gone for {}", self.machine.id(), player);
            }
        }
    }

    fn name_of(&self, player: PlayerId) -> String {
        self.roster
            .get(&player)
            .cloned()
            .unwrap_or_else(|| player.to_string())
    }

    fn summarize(machine: &Machine) -> Summary {
        Summary {
            table_id: machine.id(),
            seats: machine.config().seats,
            occupied: machine.occupied(),
            phase: machine.phase(),
            small_blind: machine.config().small_blind,
            big_blind: machine.config().big_blind,
        }
    }
}

//! Authoritative fixed-tick host for networked matches
//!
//! Remote seats never touch the simulation. Connection handlers hold an
//! `IntentSender` and push intents into a bounded lock-free channel; the
//! authority drains it at the start of each tick, which serializes every
//! write. Snapshots go out at the broadcast interval.

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{BROADCAST_INTERVAL, MAX_SUBSTEPS, SIM_DT};
use crate::settings::MatchSettings;
use crate::sim::events::GameEvent;
use crate::sim::snapshot::Snapshot;
use crate::sim::state::{GameState, Seat};
use crate::sim::tick::{Intent, IntentKind};
use crate::tuning::Tuning;

/// Default intent queue capacity
pub const DEFAULT_INTENT_CAPACITY: usize = 1024;

/// Largest wall-clock gap one `advance` call will try to catch up on
const MAX_FRAME_TIME: f32 = 0.25;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed client message: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("failed to encode server message: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("intent queue full")]
    QueueFull,
    #[error("authority has shut down")]
    Disconnected,
    #[error("no paddle for seat {0}")]
    UnknownSeat(Seat),
}

/// Client → server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Intent { intent: IntentKind },
    Ping { nonce: u32 },
}

/// Server → client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome { seat: Seat, tick_rate: f32 },
    Snapshot { tick: u64, snapshot: Snapshot },
    Events { tick: u64, events: Vec<GameEvent> },
    Pong { nonce: u32 },
}

pub fn decode_client_message(text: &str) -> Result<ClientMessage, WireError> {
    serde_json::from_str(text).map_err(WireError::Decode)
}

pub fn encode_server_message(message: &ServerMessage) -> Result<String, WireError> {
    serde_json::to_string(message).map_err(WireError::Encode)
}

/// Clonable per-seat handle for connection handlers
#[derive(Debug, Clone)]
pub struct IntentSender {
    seat: Seat,
    sender: Sender<Intent>,
}

impl IntentSender {
    pub fn seat(&self) -> Seat {
        self.seat
    }

    /// Queue an intent for the next tick (non-blocking)
    pub fn try_submit(&self, kind: IntentKind) -> Result<(), WireError> {
        self.sender
            .try_send(Intent { seat: self.seat, kind })
            .map_err(|e| match e {
                TrySendError::Full(_) => WireError::QueueFull,
                TrySendError::Disconnected(_) => WireError::Disconnected,
            })
    }

    /// Decode and handle one text frame; returns a direct reply if any
    pub fn handle_text(&self, text: &str) -> Result<Option<ServerMessage>, WireError> {
        let message = decode_client_message(text).inspect_err(|e| {
            log::warn!("Seat {} sent a malformed message: {}", self.seat, e);
        })?;
        match message {
            ClientMessage::Intent { intent } => {
                self.try_submit(intent)?;
                Ok(None)
            }
            ClientMessage::Ping { nonce } => Ok(Some(ServerMessage::Pong { nonce })),
        }
    }
}

/// Sole owner of the simulation in a networked match
pub struct Authority {
    state: GameState,
    sender: Sender<Intent>,
    receiver: Receiver<Intent>,
    accumulator: f32,
    tick: u64,
    broadcast_every: u64,
}

impl Authority {
    pub fn new(settings: &MatchSettings, tuning: Tuning) -> Self {
        Self::with_capacity(settings, tuning, DEFAULT_INTENT_CAPACITY)
    }

    pub fn with_capacity(settings: &MatchSettings, tuning: Tuning, capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        let broadcast_every = ((BROADCAST_INTERVAL / SIM_DT).round() as u64).max(1);
        log::info!(
            "Authority started: {} seats, tick {:.0} Hz, broadcast every {} ticks",
            settings.seats,
            1.0 / SIM_DT,
            broadcast_every
        );
        Self {
            state: GameState::new(settings, tuning),
            sender,
            receiver,
            accumulator: 0.0,
            tick: 0,
            broadcast_every,
        }
    }

    /// Hand out an intent handle for a seated player
    pub fn connect(&self, seat: Seat) -> Result<IntentSender, WireError> {
        if self.state.paddle_for_seat(seat).is_none() {
            return Err(WireError::UnknownSeat(seat));
        }
        log::info!("Seat {} connected", seat);
        Ok(IntentSender {
            seat,
            sender: self.sender.clone(),
        })
    }

    pub fn welcome(&self, seat: Seat) -> ServerMessage {
        ServerMessage::Welcome {
            seat,
            tick_rate: 1.0 / SIM_DT,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn pending_intents(&self) -> usize {
        self.receiver.len()
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.state.set_paused(paused);
    }

    pub fn is_over(&self) -> bool {
        self.state.is_over()
    }

    /// Run as many fixed ticks as `elapsed` covers and collect outbound messages
    pub fn advance(&mut self, elapsed: f32) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        if self.state.is_over() {
            return out;
        }

        self.accumulator += elapsed.clamp(0.0, MAX_FRAME_TIME);
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let intents: Vec<Intent> = self.receiver.try_iter().collect();
            let events = self.state.step(&intents, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
            self.tick += 1;

            let ended = self.state.is_over();
            if !events.is_empty() {
                out.push(ServerMessage::Events {
                    tick: self.tick,
                    events,
                });
            }
            if ended || self.tick % self.broadcast_every == 0 {
                out.push(ServerMessage::Snapshot {
                    tick: self.tick,
                    snapshot: self.state.snapshot(),
                });
            }
            if ended {
                log::info!("Authority stopping at tick {}", self.tick);
                self.accumulator = 0.0;
                return out;
            }
        }

        if self.accumulator >= SIM_DT {
            log::warn!(
                "Authority fell behind by {:.3}s, dropping backlog",
                self.accumulator
            );
            self.accumulator = 0.0;
        }
        out
    }
}

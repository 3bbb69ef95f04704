use std::collections::HashMap;

use doodleguess_shared::{encode_stroke, ChannelKind, ChatEvent, Stroke};
use log::{debug, info, trace, warn};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::auth::Participant;
use crate::game::{Game, Outbound, Recipient, Score};

/// Outbound text frames for one socket.
pub type Peer = mpsc::UnboundedSender<String>;

pub enum RoomCommand {
    Join {
        connection: Uuid,
        channel: ChannelKind,
        participant: Participant,
        peer: Peer,
    },
    Leave {
        connection: Uuid,
        channel: ChannelKind,
    },
    Chat {
        connection: Uuid,
        event: ChatEvent,
    },
    Stroke {
        connection: Uuid,
        stroke: Stroke,
    },
    Scoreboard {
        reply: oneshot::Sender<Vec<Score>>,
    },
    IsIdle {
        reply: oneshot::Sender<bool>,
    },
}

/// Cloneable address of a running room task.
#[derive(Clone)]
pub struct RoomHandle {
    tx: mpsc::UnboundedSender<RoomCommand>,
}

impl RoomHandle {
    pub fn spawn(name: String, game: Game) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(Room::new(name, game).run(rx));
        Self { tx }
    }

    pub fn send(&self, command: RoomCommand) -> bool {
        self.tx.send(command).is_ok()
    }

    pub async fn scoreboard(&self) -> Vec<Score> {
        let (reply, response) = oneshot::channel();
        if !self.send(RoomCommand::Scoreboard { reply }) {
            return Vec::new();
        }
        response.await.unwrap_or_default()
    }

    pub async fn is_idle(&self) -> bool {
        let (reply, response) = oneshot::channel();
        if !self.send(RoomCommand::IsIdle { reply }) {
            return true;
        }
        response.await.unwrap_or(true)
    }
}

/// Owns everything about one room; commands are applied one at a time.
pub struct Room {
    name: String,
    game: Game,
    chat_peers: HashMap<Uuid, Peer>,
    draw_peers: HashMap<Uuid, Peer>,
}

impl Room {
    pub fn new(name: String, game: Game) -> Self {
        Self {
            name,
            game,
            chat_peers: HashMap::new(),
            draw_peers: HashMap::new(),
        }
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<RoomCommand>) {
        while let Some(command) = rx.recv().await {
            self.handle(command);
        }
        debug!("room {} stopped", self.name);
    }

    pub fn is_idle(&self) -> bool {
        self.chat_peers.is_empty() && self.draw_peers.is_empty()
    }

    pub fn handle(&mut self, command: RoomCommand) {
        match command {
            RoomCommand::Join {
                connection,
                channel: ChannelKind::Chat,
                participant,
                peer,
            } => {
                self.chat_peers.insert(connection, peer);
                info!(
                    "room={} {} joined chat conn={connection} peers={}",
                    self.name,
                    participant.username,
                    self.chat_peers.len()
                );
                let outbound = self.game.join(connection, participant.username);
                self.deliver(outbound);
            }
            RoomCommand::Join {
                connection,
                channel: ChannelKind::Draw,
                participant,
                peer,
            } => {
                self.draw_peers.insert(connection, peer);
                info!(
                    "room={} {} joined draw conn={connection} peers={}",
                    self.name,
                    participant.username,
                    self.draw_peers.len()
                );
            }
            RoomCommand::Leave {
                connection,
                channel: ChannelKind::Chat,
            } => {
                self.chat_peers.remove(&connection);
                let outbound = self.game.leave(connection);
                self.deliver(outbound);
            }
            RoomCommand::Leave {
                connection,
                channel: ChannelKind::Draw,
            } => {
                self.draw_peers.remove(&connection);
            }
            RoomCommand::Chat { connection, event } => {
                if !self.game.is_playing(connection) {
                    warn!("room={} chat from unknown conn={connection}", self.name);
                    return;
                }
                let outbound = self.game.chat(connection, event);
                if !outbound.is_empty() {
                    debug!(
                        "room={} phase={:?} {:?}",
                        self.name,
                        self.game.phase(),
                        self.game.session()
                    );
                    trace!("room={} word={:?}", self.name, self.game.word());
                }
                self.deliver(outbound);
            }
            RoomCommand::Stroke { connection, stroke } => self.relay_stroke(connection, &stroke),
            RoomCommand::Scoreboard { reply } => {
                let _ = reply.send(self.game.scoreboard());
            }
            RoomCommand::IsIdle { reply } => {
                let _ = reply.send(self.is_idle());
            }
        }
    }

    fn relay_stroke(&mut self, sender: Uuid, stroke: &Stroke) {
        if !self.draw_peers.contains_key(&sender) {
            warn!("room={} stroke from unknown conn={sender}", self.name);
            return;
        }
        if let Err(error) = stroke.validate() {
            warn!("room={} dropping stroke: {error}", self.name);
            return;
        }
        trace!("room={} stroke from {sender}", self.name);
        let payload = encode_stroke(stroke);
        send_where(&mut self.draw_peers, &payload, |id| id != sender);
    }

    fn deliver(&mut self, outbound: Vec<Outbound>) {
        for Outbound { to, event } in outbound {
            let payload = event.encode();
            debug!("room={} {} -> {to:?}", self.name, event.kind());
            match to {
                Recipient::One(target) => send_where(&mut self.chat_peers, &payload, |id| id == target),
                Recipient::AllExcept(skip) => {
                    send_where(&mut self.chat_peers, &payload, |id| id != skip)
                }
                Recipient::All => send_where(&mut self.chat_peers, &payload, |_| true),
            }
        }
    }
}

fn send_where(peers: &mut HashMap<Uuid, Peer>, payload: &str, include: impl Fn(Uuid) -> bool) {
    let mut stale = Vec::new();
    for (id, tx) in peers.iter() {
        if include(*id) && tx.send(payload.to_string()).is_err() {
            stale.push(*id);
        }
    }
    for id in stale {
        peers.remove(&id);
    }
}

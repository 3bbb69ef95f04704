use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use doodleguess_shared::ChatEvent;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use serde::Serialize;
use uuid::Uuid;

use crate::words::WordList;

pub const LEAKED_WORD_NOTICE: &str = "Your message contains the word and was not sent.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    AwaitingWord,
    RoundActive,
    RoundAdvancing,
}

/// The authoritative round state of one room.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub drawer: Option<Uuid>,
    pub word_visible_to: HashSet<Uuid>,
    pub round_active: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recipient {
    One(Uuid),
    AllExcept(Uuid),
    All,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outbound {
    pub to: Recipient,
    pub event: ChatEvent,
}

impl Outbound {
    fn new(to: Recipient, event: ChatEvent) -> Self {
        Self { to, event }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Score {
    pub username: String,
    pub points: u32,
}

/// Turn and word state machine for one room. Every transition returns the
/// chat events the room must fan out, in order.
pub struct Game {
    words: Arc<WordList>,
    rng: StdRng,
    phase: Phase,
    players: BTreeMap<Uuid, String>,
    scores: HashMap<String, u32>,
    drawer: Option<Uuid>,
    word: Option<String>,
}

impl Game {
    pub fn new(words: Arc<WordList>, rng: StdRng) -> Self {
        Self {
            words,
            rng,
            phase: Phase::AwaitingWord,
            players: BTreeMap::new(),
            scores: HashMap::new(),
            drawer: None,
            word: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn word(&self) -> Option<&str> {
        self.word.as_deref()
    }

    pub fn session(&self) -> Session {
        let round_active = self.phase == Phase::RoundActive;
        Session {
            drawer: self.drawer,
            word_visible_to: self
                .drawer
                .filter(|_| round_active)
                .into_iter()
                .collect(),
            round_active,
        }
    }

    pub fn is_playing(&self, connection: Uuid) -> bool {
        self.players.contains_key(&connection)
    }

    pub fn join(&mut self, connection: Uuid, username: String) -> Vec<Outbound> {
        self.scores.entry(username.clone()).or_insert(0);
        self.players.insert(connection, username);
        match self.phase {
            Phase::AwaitingWord => self.start_round(connection),
            _ => vec![
                Outbound::new(Recipient::One(connection), ChatEvent::CleanWordToGuess),
                Outbound::new(Recipient::One(connection), ChatEvent::CleanCanvas),
            ],
        }
    }

    pub fn leave(&mut self, connection: Uuid) -> Vec<Outbound> {
        if self.players.remove(&connection).is_none() {
            return Vec::new();
        }
        if self.drawer != Some(connection) {
            return Vec::new();
        }
        let next = self.players.keys().copied().choose(&mut self.rng);
        match next {
            Some(next) => {
                info!("drawer {connection} left, handing the round to {next}");
                self.start_round(next)
            }
            None => {
                debug!("last player left, awaiting a word");
                self.phase = Phase::AwaitingWord;
                self.drawer = None;
                self.word = None;
                Vec::new()
            }
        }
    }

    pub fn chat(&mut self, connection: Uuid, event: ChatEvent) -> Vec<Outbound> {
        let Some(username) = self.players.get(&connection).cloned() else {
            return Vec::new();
        };
        let is_drawer = self.phase == Phase::RoundActive && self.drawer == Some(connection);

        match event {
            ChatEvent::Message(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Vec::new();
                }
                if is_drawer {
                    if self.leaks_word(text) {
                        return vec![Outbound::new(
                            Recipient::One(connection),
                            ChatEvent::Message(LEAKED_WORD_NOTICE.to_string()),
                        )];
                    }
                } else if self.is_correct_guess(text) {
                    return self.correct_guess(connection, username);
                }
                vec![Outbound::new(
                    Recipient::All,
                    ChatEvent::Message(format!("{username}: {text}")),
                )]
            }
            ChatEvent::CleanCanvas if is_drawer => {
                vec![Outbound::new(Recipient::All, ChatEvent::CleanCanvas)]
            }
            ChatEvent::NextWord if is_drawer => {
                debug!("{username} skipped their word");
                self.start_round(connection)
            }
            other => {
                debug!("ignoring {} from {username}", other.kind());
                Vec::new()
            }
        }
    }

    pub fn scoreboard(&self) -> Vec<Score> {
        let mut scores: Vec<Score> = self
            .scores
            .iter()
            .map(|(username, points)| Score {
                username: username.clone(),
                points: *points,
            })
            .collect();
        scores.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then_with(|| a.username.cmp(&b.username))
        });
        scores
    }

    fn is_correct_guess(&self, text: &str) -> bool {
        self.phase == Phase::RoundActive
            && self
                .word
                .as_deref()
                .is_some_and(|word| word.to_lowercase() == text.to_lowercase())
    }

    fn leaks_word(&self, text: &str) -> bool {
        self.word
            .as_deref()
            .is_some_and(|word| text.to_lowercase().contains(&word.to_lowercase()))
    }

    fn correct_guess(&mut self, winner: Uuid, username: String) -> Vec<Outbound> {
        *self.scores.entry(username.clone()).or_insert(0) += 1;
        info!("{username} guessed {:?}", self.word);
        self.phase = Phase::RoundAdvancing;

        let mut outbound = vec![
            Outbound::new(Recipient::One(winner), ChatEvent::YouGuessedIt(true)),
            Outbound::new(
                Recipient::AllExcept(winner),
                ChatEvent::Message(format!("{username} guessed the word!")),
            ),
        ];
        outbound.extend(self.start_round(winner));
        outbound
    }

    fn start_round(&mut self, drawer: Uuid) -> Vec<Outbound> {
        let word = self
            .words
            .pick(&mut self.rng, self.word.as_deref())
            .to_string();
        debug!("round starts: drawer={drawer}");
        self.phase = Phase::RoundActive;
        self.drawer = Some(drawer);
        self.word = Some(word.clone());

        vec![
            Outbound::new(Recipient::All, ChatEvent::CleanCanvas),
            Outbound::new(Recipient::One(drawer), ChatEvent::WordToGuess(word)),
            Outbound::new(Recipient::AllExcept(drawer), ChatEvent::CleanWordToGuess),
        ]
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::geometry::GeometryError;

/// Closed set of chat-channel discriminants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MsgType {
    WordToGuess,
    Message,
    YouGuessedIt,
    CleanCanvas,
    CleanWordToGuess,
    NextWord,
}

impl MsgType {
    pub const ALL: [MsgType; 6] = [
        MsgType::WordToGuess,
        MsgType::Message,
        MsgType::YouGuessedIt,
        MsgType::CleanCanvas,
        MsgType::CleanWordToGuess,
        MsgType::NextWord,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MsgType::WordToGuess => "WORD_TO_GUESS",
            MsgType::Message => "MESSAGE",
            MsgType::YouGuessedIt => "YOU_GUESSED_IT",
            MsgType::CleanCanvas => "CLEAN_CANVAS",
            MsgType::CleanWordToGuess => "CLEAN_WORD_TO_GUESS",
            MsgType::NextWord => "NEXT_WORD",
        }
    }

    fn expected_payload(self) -> &'static str {
        match self {
            MsgType::WordToGuess | MsgType::Message => "a string",
            MsgType::YouGuessedIt => "a boolean",
            MsgType::CleanCanvas | MsgType::CleanWordToGuess | MsgType::NextWord => {
                "an empty string"
            }
        }
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MsgType {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MsgType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| EnvelopeError::UnknownType(s.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("unknown msgType `{0}`")]
    UnknownType(String),
    #[error("{kind} expects {expected} as msgContent")]
    PayloadMismatch {
        kind: MsgType,
        expected: &'static str,
    },
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// The raw chat-channel record, before its tag is checked.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatEnvelope {
    pub msg_type: Option<String>,
    pub msg_content: Option<Value>,
}

/// A validated chat-channel event. The payload shape is fixed by the variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatEvent {
    WordToGuess(String),
    Message(String),
    YouGuessedIt(bool),
    CleanCanvas,
    CleanWordToGuess,
    NextWord,
}

impl ChatEvent {
    pub fn kind(&self) -> MsgType {
        match self {
            ChatEvent::WordToGuess(_) => MsgType::WordToGuess,
            ChatEvent::Message(_) => MsgType::Message,
            ChatEvent::YouGuessedIt(_) => MsgType::YouGuessedIt,
            ChatEvent::CleanCanvas => MsgType::CleanCanvas,
            ChatEvent::CleanWordToGuess => MsgType::CleanWordToGuess,
            ChatEvent::NextWord => MsgType::NextWord,
        }
    }

    pub fn decode(text: &str) -> Result<Self, EnvelopeError> {
        let envelope: ChatEnvelope = serde_json::from_str(text)?;
        Self::try_from(envelope)
    }

    pub fn encode(&self) -> String {
        serde_json::to_string(&ChatEnvelope::from(self)).unwrap_or_else(|error| {
            log::error!("failed to encode {}: {error}", self.kind());
            String::new()
        })
    }
}

impl TryFrom<ChatEnvelope> for ChatEvent {
    type Error = EnvelopeError;

    fn try_from(envelope: ChatEnvelope) -> Result<Self, Self::Error> {
        let kind: MsgType = envelope
            .msg_type
            .ok_or(EnvelopeError::MissingField("msgType"))?
            .parse()?;
        let content = match envelope.msg_content {
            None | Some(Value::Null) => return Err(EnvelopeError::MissingField("msgContent")),
            Some(content) => content,
        };
        let mismatch = || EnvelopeError::PayloadMismatch {
            kind,
            expected: kind.expected_payload(),
        };

        match (kind, content) {
            (MsgType::WordToGuess, Value::String(word)) => Ok(ChatEvent::WordToGuess(word)),
            (MsgType::Message, Value::String(text)) => Ok(ChatEvent::Message(text)),
            (MsgType::YouGuessedIt, Value::Bool(outcome)) => Ok(ChatEvent::YouGuessedIt(outcome)),
            (MsgType::CleanCanvas, Value::String(s)) if s.is_empty() => Ok(ChatEvent::CleanCanvas),
            (MsgType::CleanWordToGuess, Value::String(s)) if s.is_empty() => {
                Ok(ChatEvent::CleanWordToGuess)
            }
            (MsgType::NextWord, Value::String(s)) if s.is_empty() => Ok(ChatEvent::NextWord),
            _ => Err(mismatch()),
        }
    }
}

impl From<&ChatEvent> for ChatEnvelope {
    fn from(event: &ChatEvent) -> Self {
        let content = match event {
            ChatEvent::WordToGuess(text) | ChatEvent::Message(text) => Value::from(text.as_str()),
            ChatEvent::YouGuessedIt(outcome) => Value::Bool(*outcome),
            ChatEvent::CleanCanvas | ChatEvent::CleanWordToGuess | ChatEvent::NextWord => {
                Value::from("")
            }
        };
        ChatEnvelope {
            msg_type: Some(event.kind().as_str().to_string()),
            msg_content: Some(content),
        }
    }
}

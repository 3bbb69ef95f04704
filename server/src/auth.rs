use std::collections::HashMap;

use thiserror::Error;

use crate::config::ConfigError;

/// Identity bound to a connection after a successful handshake.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Participant {
    pub username: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("empty token")]
    EmptyToken,
    #[error("unknown token")]
    UnknownToken,
    #[error("no token received before the handshake timeout")]
    Timeout,
    #[error("first frame was not a text frame")]
    NotText,
    #[error("connection closed before the handshake")]
    Closed,
}

pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Participant, AuthError>;
}

/// Tokens issued out of band by the login service.
#[derive(Debug, Default)]
pub struct TokenRegistry {
    tokens: HashMap<String, String>,
}

impl TokenRegistry {
    /// Parses `token username` lines.
    pub fn parse(lines: &[String]) -> Result<Self, ConfigError> {
        let mut registry = Self::default();
        for (index, line) in lines.iter().enumerate() {
            let (token, username) = line
                .split_once(char::is_whitespace)
                .map(|(token, username)| (token, username.trim()))
                .filter(|(_, username)| !username.is_empty())
                .ok_or(ConfigError::MalformedToken { line: index + 1 })?;
            registry.insert(token, username);
        }
        Ok(registry)
    }

    pub fn insert(&mut self, token: impl Into<String>, username: impl Into<String>) {
        self.tokens.insert(token.into(), username.into());
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl TokenVerifier for TokenRegistry {
    fn verify(&self, token: &str) -> Result<Participant, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::EmptyToken);
        }
        self.tokens
            .get(token)
            .map(|username| Participant {
                username: username.clone(),
            })
            .ok_or(AuthError::UnknownToken)
    }
}

use log::{debug, warn};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadyState {
    Connecting,
    Open,
    Closing,
    Closed,
}

impl ReadyState {
    /// Maps the numeric `WebSocket.readyState`.
    pub fn from_code(code: u16) -> Self {
        match code {
            0 => ReadyState::Connecting,
            1 => ReadyState::Open,
            2 => ReadyState::Closing,
            _ => ReadyState::Closed,
        }
    }
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("send failed: {0}")]
    Send(String),
}

/// One duplex text channel to the server.
pub trait Channel {
    fn ready_state(&self) -> ReadyState;
    fn send_text(&self, text: &str) -> Result<(), ChannelError>;
    fn close(&self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    Dropped,
}

/// Sends only on an open channel. Otherwise the frame is dropped and
/// never queued.
pub fn send_if_open<C: Channel + ?Sized>(channel: &C, text: &str) -> SendOutcome {
    let state = channel.ready_state();
    if state != ReadyState::Open {
        debug!("dropping frame, channel is {state:?}");
        return SendOutcome::Dropped;
    }
    match channel.send_text(text) {
        Ok(()) => SendOutcome::Sent,
        Err(error) => {
            warn!("{error}");
            SendOutcome::Dropped
        }
    }
}

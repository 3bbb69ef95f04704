use doodleguess_shared::ChannelKind;
use log::{debug, info};

use crate::channel::{send_if_open, Channel, SendOutcome};

/// A channel plus whether the token has gone out as its first frame.
/// Nothing else is sent until it has.
pub struct Link<C> {
    kind: ChannelKind,
    channel: C,
    token_sent: bool,
}

impl<C: Channel> Link<C> {
    pub fn new(kind: ChannelKind, channel: C) -> Self {
        Self {
            kind,
            channel,
            token_sent: false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token_sent
    }

    pub fn authenticate(&mut self, token: &str) -> SendOutcome {
        if self.token_sent {
            return SendOutcome::Dropped;
        }
        let outcome = send_if_open(&self.channel, token);
        if outcome == SendOutcome::Sent {
            info!("{} channel: token sent", self.kind);
            self.token_sent = true;
        }
        outcome
    }

    pub fn send(&self, text: &str) -> SendOutcome {
        if !self.token_sent {
            debug!("{} channel: not authenticated yet, dropping frame", self.kind);
            return SendOutcome::Dropped;
        }
        send_if_open(&self.channel, text)
    }

    pub fn close(&self) {
        self.channel.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::testing::FakeChannel;
    use crate::channel::ReadyState;
    use pretty_assertions::assert_eq;

    #[test_log::test]
    fn token_is_the_first_frame() {
        let channel = FakeChannel::new(ReadyState::Open);
        let mut link = Link::new(ChannelKind::Chat, channel.clone());

        assert_eq!(link.send("early"), SendOutcome::Dropped);
        assert_eq!(link.authenticate("tok"), SendOutcome::Sent);
        assert_eq!(link.authenticate("tok"), SendOutcome::Dropped);
        assert_eq!(link.send("later"), SendOutcome::Sent);

        assert_eq!(channel.sent(), vec!["tok", "later"]);
    }

    #[test_log::test]
    fn authentication_waits_for_an_open_channel() {
        let channel = FakeChannel::new(ReadyState::Connecting);
        let mut link = Link::new(ChannelKind::Draw, channel.clone());

        assert_eq!(link.authenticate("tok"), SendOutcome::Dropped);
        assert!(!link.is_authenticated());

        channel.state.set(ReadyState::Open);
        assert_eq!(link.authenticate("tok"), SendOutcome::Sent);
        assert!(link.is_authenticated());
    }
}

use std::time::Duration;

use doodleguess_shared::ChannelKind;

/// What ended a channel. `code` is `None` for transport errors that carry
/// no close frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Disconnect {
    pub channel: ChannelKind,
    pub code: Option<u16>,
    pub reason: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recovery {
    ReturnToLogin,
    RetryAfter(Duration),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconnectPolicy {
    /// Every close or error sends the user back to the login page.
    ReturnToLogin,
    /// Bounded exponential backoff, then back to the login page.
    Backoff {
        base: Duration,
        max_delay: Duration,
        max_retries: u32,
    },
}

impl ReconnectPolicy {
    /// The close code never changes the outcome, only `attempt` does.
    pub fn recover(&self, attempt: u32) -> Recovery {
        match *self {
            ReconnectPolicy::ReturnToLogin => Recovery::ReturnToLogin,
            ReconnectPolicy::Backoff {
                base,
                max_delay,
                max_retries,
            } => {
                if attempt >= max_retries {
                    return Recovery::ReturnToLogin;
                }
                let factor = 2u32.saturating_pow(attempt);
                let delay = base.saturating_mul(factor).min(max_delay);
                Recovery::RetryAfter(delay)
            }
        }
    }
}

use doodleguess_shared::{
    decode_stroke, encode_stroke, ChannelKind, ChatEvent, EnvelopeError, Extent, Point,
};
use log::{debug, info, warn};

use crate::channel::{Channel, SendOutcome};
use crate::config::ClientConfig;
use crate::drawing::DrawingEngine;
use crate::game::{Effect, GameView};
use crate::handshake::Link;
use crate::reconnect::{Disconnect, Recovery};
use crate::surface::Surface;
use crate::token::TokenStore;

/// Everything one connected client owns: both channels, the drawing
/// surface and the mirrored round state. Dropped on disconnect.
pub struct ClientSession<S, C, T> {
    config: ClientConfig,
    tokens: T,
    draw: Link<C>,
    chat: Link<C>,
    engine: DrawingEngine<S>,
    game: GameView,
    attempt: u32,
}

impl<S: Surface, C: Channel, T: TokenStore> ClientSession<S, C, T> {
    /// `attempt` counts reconnects made since the last successful session.
    pub fn new(config: ClientConfig, surface: S, draw: C, chat: C, tokens: T, attempt: u32) -> Self {
        Self {
            config,
            tokens,
            draw: Link::new(ChannelKind::Draw, draw),
            chat: Link::new(ChannelKind::Chat, chat),
            engine: DrawingEngine::new(surface),
            game: GameView::default(),
            attempt,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn game(&self) -> &GameView {
        &self.game
    }

    pub fn surface(&self) -> &S {
        self.engine.surface()
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn is_connected(&self) -> bool {
        self.draw.is_authenticated() && self.chat.is_authenticated()
    }

    fn link_mut(&mut self, kind: ChannelKind) -> &mut Link<C> {
        match kind {
            ChannelKind::Draw => &mut self.draw,
            ChannelKind::Chat => &mut self.chat,
        }
    }

    /// Sends the stored token as the channel's first frame. Without a token
    /// there is nothing to authenticate with.
    pub fn on_open(&mut self, kind: ChannelKind) -> Option<Recovery> {
        let Some(token) = self.tokens.load() else {
            warn!("{kind} channel open but no token stored");
            return Some(Recovery::ReturnToLogin);
        };
        self.link_mut(kind).authenticate(&token);
        if self.is_connected() {
            self.attempt = 0;
        }
        None
    }

    /// Decodes and applies one inbound frame. Malformed frames are logged
    /// and dropped.
    pub fn on_text(&mut self, kind: ChannelKind, text: &str) -> Vec<Effect> {
        match kind {
            ChannelKind::Draw => {
                let applied = decode_stroke(text).and_then(|stroke| {
                    self.engine
                        .apply_remote(&stroke)
                        .map_err(EnvelopeError::from)
                });
                if let Err(error) = applied {
                    warn!("dropping draw frame: {error}");
                }
                Vec::new()
            }
            ChannelKind::Chat => match ChatEvent::decode(text) {
                Ok(event) => {
                    debug!("chat event {}", event.kind());
                    let effects = self.game.apply(event);
                    if effects.contains(&Effect::ClearCanvas) {
                        self.engine.clear();
                    }
                    effects
                }
                Err(error) => {
                    warn!("dropping chat frame: {error}");
                    Vec::new()
                }
            },
        }
    }

    /// Any close or error ends this session. The token is dropped whenever
    /// the user is sent back to log in.
    pub fn on_disconnect(&mut self, disconnect: Disconnect) -> Recovery {
        info!(
            "{} channel closed code={:?} reason={:?}",
            disconnect.channel, disconnect.code, disconnect.reason
        );
        let recovery = self.config.reconnect.recover(self.attempt);
        if recovery == Recovery::ReturnToLogin {
            self.tokens.clear();
        }
        recovery
    }

    pub fn pointer_down(&mut self, at: Point) {
        self.engine.pointer_down(at);
    }

    /// Renders locally first, then sends if the draw channel is ready.
    pub fn pointer_move(&mut self, at: Point) -> Option<SendOutcome> {
        let stroke = self.engine.pointer_move(at)?;
        Some(self.draw.send(&encode_stroke(&stroke)))
    }

    pub fn pointer_up(&mut self) {
        self.engine.pointer_up();
    }

    pub fn pointer_leave(&mut self) {
        self.engine.pointer_leave();
    }

    pub fn submit_chat(&mut self, text: &str) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SendOutcome::Dropped;
        }
        self.chat
            .send(&ChatEvent::Message(text.to_string()).encode())
    }

    /// Asks the room to clear every canvas. Only the drawer may.
    pub fn request_clear(&mut self) -> SendOutcome {
        if !self.game.is_drawer() {
            return SendOutcome::Dropped;
        }
        self.chat.send(&ChatEvent::CleanCanvas.encode())
    }

    pub fn request_next_word(&mut self) -> SendOutcome {
        if !self.game.is_drawer() {
            return SendOutcome::Dropped;
        }
        self.chat.send(&ChatEvent::NextWord.encode())
    }

    pub fn resize(&mut self, extent: Extent) {
        self.engine.resize(extent);
    }

    pub fn shutdown(self) {
        self.draw.close();
        self.chat.close();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::channel::testing::FakeChannel;
    use crate::channel::ReadyState;
    use crate::game::Phase;
    use crate::reconnect::ReconnectPolicy;
    use crate::token::MemoryTokenStore;
    use doodleguess_shared::{Raster, Stroke};
    use pretty_assertions::assert_eq;

    type TestSession = ClientSession<Raster, FakeChannel, MemoryTokenStore>;

    struct Harness {
        session: TestSession,
        draw: FakeChannel,
        chat: FakeChannel,
    }

    fn harness(token: Option<&str>, config: ClientConfig) -> Harness {
        let draw = FakeChannel::new(ReadyState::Open);
        let chat = FakeChannel::new(ReadyState::Open);
        let tokens = token.map(MemoryTokenStore::with_token).unwrap_or_default();
        let session = ClientSession::new(
            config,
            Raster::new(400, 240),
            draw.clone(),
            chat.clone(),
            tokens,
            0,
        );
        Harness {
            session,
            draw,
            chat,
        }
    }

    fn connected() -> Harness {
        let mut h = harness(Some("tok"), ClientConfig::default());
        assert_eq!(h.session.on_open(ChannelKind::Draw), None);
        assert_eq!(h.session.on_open(ChannelKind::Chat), None);
        h
    }

    fn disconnect(code: Option<u16>) -> Disconnect {
        Disconnect {
            channel: ChannelKind::Chat,
            code,
            reason: String::new(),
        }
    }

    #[test_log::test]
    fn token_goes_out_first_on_each_channel() {
        let mut h = harness(Some("tok"), ClientConfig::default());
        h.session.pointer_down(Point::new(1.0, 1.0));
        assert_eq!(
            h.session.pointer_move(Point::new(2.0, 2.0)),
            Some(SendOutcome::Dropped)
        );
        assert_eq!(h.session.submit_chat("hi"), SendOutcome::Dropped);

        h.session.on_open(ChannelKind::Draw);
        h.session.on_open(ChannelKind::Chat);
        assert!(h.session.is_connected());
        h.session.submit_chat("hi");

        assert_eq!(h.draw.sent(), vec!["tok"]);
        assert_eq!(
            h.chat.sent(),
            vec![
                "tok".to_string(),
                r#"{"msgType":"MESSAGE","msgContent":"hi"}"#.to_string()
            ]
        );
    }

    #[test_log::test]
    fn missing_token_goes_back_to_login() {
        let mut h = harness(None, ClientConfig::default());
        assert_eq!(
            h.session.on_open(ChannelKind::Chat),
            Some(Recovery::ReturnToLogin)
        );
        assert!(h.chat.sent().is_empty());
    }

    #[test_log::test]
    fn strokes_render_locally_and_send_when_open() {
        let mut h = connected();
        h.session.pointer_down(Point::new(10.0, 10.0));
        assert_eq!(
            h.session.pointer_move(Point::new(30.0, 10.0)),
            Some(SendOutcome::Sent)
        );
        assert!(h.session.surface().ink_at(20, 10));

        let sent = h.draw.sent();
        let stroke = decode_stroke(&sent[1]).unwrap();
        assert_eq!(stroke.source_extent, Extent::new(400.0, 240.0));
    }

    #[test_log::test]
    fn strokes_are_dropped_when_the_channel_is_not_ready() {
        let mut h = connected();
        h.draw.state.set(ReadyState::Closing);
        h.session.pointer_down(Point::new(10.0, 10.0));
        assert_eq!(
            h.session.pointer_move(Point::new(30.0, 10.0)),
            Some(SendOutcome::Dropped)
        );
        // Still drawn locally.
        assert!(h.session.surface().ink_at(20, 10));
        assert_eq!(h.draw.sent(), vec!["tok"]);
    }

    #[test_log::test]
    fn remote_strokes_are_scaled_to_this_canvas() {
        let mut h = connected();
        let frame = encode_stroke(&Stroke::new(
            Point::new(100.0, 100.0),
            Point::new(110.0, 110.0),
            Extent::new(800.0, 480.0),
        ));
        assert_eq!(h.session.on_text(ChannelKind::Draw, &frame), vec![]);
        assert!(h.session.surface().ink_at(52, 52));
        assert!(!h.session.surface().ink_at(100, 100));
    }

    #[test_log::test]
    fn malformed_frames_leave_state_untouched() {
        let mut h = connected();
        h.session
            .on_text(ChannelKind::Chat, r#"{"msgType":"WORD_TO_GUESS","msgContent":"cat"}"#);

        for frame in [
            "garbage",
            r#"{"msgType":"BOOM","msgContent":""}"#,
            r#"{"msgType":"YOU_GUESSED_IT","msgContent":"yes"}"#,
        ] {
            assert_eq!(h.session.on_text(ChannelKind::Chat, frame), vec![]);
        }
        assert_eq!(
            h.session.on_text(
                ChannelKind::Draw,
                r#"{"from":{"x":1,"y":1},"to":{"x":2,"y":2},"size":{"x":0,"y":0}}"#
            ),
            vec![]
        );

        assert_eq!(h.session.game().word(), "cat");
        assert_eq!(h.session.game().phase(), Phase::RoundActive);
        assert!(h.session.surface().is_blank());
    }

    #[test_log::test]
    fn correct_guess_clears_the_canvas() {
        let mut h = connected();
        h.session
            .on_text(ChannelKind::Chat, r#"{"msgType":"CLEAN_WORD_TO_GUESS","msgContent":""}"#);
        h.session.pointer_down(Point::new(10.0, 10.0));
        h.session.pointer_move(Point::new(30.0, 10.0));
        h.session.pointer_up();

        let effects = h
            .session
            .on_text(ChannelKind::Chat, r#"{"msgType":"YOU_GUESSED_IT","msgContent":true}"#);

        assert!(effects.contains(&Effect::ClearCanvas));
        assert!(h.session.surface().is_blank());
        assert_eq!(h.session.game().phase(), Phase::RoundAdvancing);
    }

    #[test_log::test]
    fn only_the_drawer_can_clear_or_skip() {
        let mut h = connected();
        h.session
            .on_text(ChannelKind::Chat, r#"{"msgType":"CLEAN_WORD_TO_GUESS","msgContent":""}"#);
        assert_eq!(h.session.request_clear(), SendOutcome::Dropped);
        assert_eq!(h.session.request_next_word(), SendOutcome::Dropped);

        h.session
            .on_text(ChannelKind::Chat, r#"{"msgType":"WORD_TO_GUESS","msgContent":"cat"}"#);
        assert_eq!(h.session.request_clear(), SendOutcome::Sent);
        assert_eq!(h.session.request_next_word(), SendOutcome::Sent);
        assert_eq!(
            h.chat.sent()[1..].to_vec(),
            vec![
                r#"{"msgType":"CLEAN_CANVAS","msgContent":""}"#.to_string(),
                r#"{"msgType":"NEXT_WORD","msgContent":""}"#.to_string(),
            ]
        );
    }

    #[test_log::test]
    fn clean_and_abnormal_closes_recover_the_same_way() {
        for code in [Some(1000), Some(1006), None] {
            let mut h = connected();
            assert_eq!(
                h.session.on_disconnect(disconnect(code)),
                Recovery::ReturnToLogin
            );
            assert_eq!(h.session.tokens.load(), None);
        }
    }

    #[test_log::test]
    fn backoff_keeps_the_token_until_it_gives_up() {
        let config = ClientConfig {
            reconnect: ReconnectPolicy::Backoff {
                base: Duration::from_millis(100),
                max_delay: Duration::from_secs(1),
                max_retries: 1,
            },
            ..ClientConfig::default()
        };
        let mut h = harness(Some("tok"), config.clone());
        assert_eq!(
            h.session.on_disconnect(disconnect(Some(1006))),
            Recovery::RetryAfter(Duration::from_millis(100))
        );
        assert_eq!(h.session.tokens.load().as_deref(), Some("tok"));

        let mut retried = ClientSession::new(
            config,
            Raster::new(4, 4),
            FakeChannel::new(ReadyState::Open),
            FakeChannel::new(ReadyState::Open),
            MemoryTokenStore::with_token("tok"),
            1,
        );
        assert_eq!(
            retried.on_disconnect(disconnect(Some(1006))),
            Recovery::ReturnToLogin
        );
        assert_eq!(retried.tokens.load(), None);
    }

    #[test_log::test]
    fn a_successful_handshake_resets_the_retry_count() {
        let mut session = ClientSession::new(
            ClientConfig::default(),
            Raster::new(4, 4),
            FakeChannel::new(ReadyState::Open),
            FakeChannel::new(ReadyState::Open),
            MemoryTokenStore::with_token("tok"),
            3,
        );
        session.on_open(ChannelKind::Draw);
        assert_eq!(session.attempt(), 3);
        session.on_open(ChannelKind::Chat);
        assert_eq!(session.attempt(), 0);
    }

    #[test_log::test]
    fn shutdown_closes_both_channels() {
        let h = connected();
        let (draw, chat) = (h.draw.clone(), h.chat.clone());
        h.session.shutdown();
        assert!(draw.closed.get());
        assert!(chat.closed.get());
    }

    #[test_log::test]
    fn resize_keeps_existing_ink() {
        let mut h = connected();
        h.session.pointer_down(Point::new(0.0, 120.0));
        h.session.pointer_move(Point::new(399.0, 120.0));
        h.session.resize(Extent::new(200.0, 120.0));
        assert_eq!(h.session.surface().extent(), Extent::new(200.0, 120.0));
        assert!(h.session.surface().ink_at(100, 60));
    }
}

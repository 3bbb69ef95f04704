use doodleguess_shared::ChatEvent;
use log::debug;

pub const GUESSED_NOTICE: &str = "You guessed it!";
const TRANSCRIPT_LIMIT: usize = 500;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    AwaitingWord,
    RoundActive,
    RoundAdvancing,
}

/// Side effects the app layer applies after a chat event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    ClearCanvas,
    ShowNotice(String),
}

/// This client's read-only mirror of the room's round state.
#[derive(Debug)]
pub struct GameView {
    phase: Phase,
    word: String,
    transcript: Vec<String>,
    notice: Option<String>,
}

impl Default for GameView {
    fn default() -> Self {
        Self {
            phase: Phase::AwaitingWord,
            word: String::new(),
            transcript: Vec::new(),
            notice: None,
        }
    }
}

impl GameView {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Empty unless the server sent this client the word.
    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn is_drawer(&self) -> bool {
        self.phase == Phase::RoundActive && !self.word.is_empty()
    }

    pub fn apply(&mut self, event: ChatEvent) -> Vec<Effect> {
        match event {
            ChatEvent::WordToGuess(word) => {
                self.word = word;
                self.enter(Phase::RoundActive);
                Vec::new()
            }
            ChatEvent::CleanWordToGuess => {
                self.word.clear();
                self.enter(Phase::RoundActive);
                Vec::new()
            }
            ChatEvent::Message(text) => {
                if self.transcript.len() == TRANSCRIPT_LIMIT {
                    self.transcript.remove(0);
                }
                self.transcript.push(text);
                Vec::new()
            }
            ChatEvent::YouGuessedIt(true) => {
                self.enter(Phase::RoundAdvancing);
                self.notice = Some(GUESSED_NOTICE.to_string());
                vec![
                    Effect::ShowNotice(GUESSED_NOTICE.to_string()),
                    Effect::ClearCanvas,
                ]
            }
            ChatEvent::YouGuessedIt(false) => Vec::new(),
            ChatEvent::CleanCanvas | ChatEvent::NextWord => vec![Effect::ClearCanvas],
        }
    }

    /// A new round drops the previous round's notice.
    fn enter(&mut self, phase: Phase) {
        if phase == Phase::RoundActive {
            self.notice = None;
        }
        if self.phase != phase {
            debug!("{:?} -> {phase:?}", self.phase);
            self.phase = phase;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn active_guesser() -> GameView {
        let mut view = GameView::default();
        view.apply(ChatEvent::CleanWordToGuess);
        view
    }

    #[test_log::test]
    fn starts_awaiting_a_word() {
        let view = GameView::default();
        assert_eq!(view.phase(), Phase::AwaitingWord);
        assert_eq!(view.word(), "");
        assert!(!view.is_drawer());
    }

    #[test_log::test]
    fn word_to_guess_makes_this_client_the_drawer() {
        let mut view = GameView::default();
        assert_eq!(view.apply(ChatEvent::WordToGuess("cat".into())), vec![]);
        assert_eq!(view.word(), "cat");
        assert_eq!(view.phase(), Phase::RoundActive);
        assert!(view.is_drawer());
    }

    #[test_log::test]
    fn guessers_never_see_a_word() {
        let mut view = active_guesser();
        view.apply(ChatEvent::Message("alice: is it big?".into()));
        assert_eq!(view.word(), "");
        assert_eq!(view.phase(), Phase::RoundActive);
        assert!(!view.is_drawer());
    }

    #[test_log::test]
    fn conceal_clears_the_displayed_word() {
        let mut view = GameView::default();
        view.apply(ChatEvent::WordToGuess("cat".into()));
        view.apply(ChatEvent::CleanWordToGuess);
        assert_eq!(view.word(), "");
        assert!(!view.is_drawer());
    }

    #[test_log::test]
    fn correct_guess_advances_and_clears_once() {
        let mut view = active_guesser();
        let effects = view.apply(ChatEvent::YouGuessedIt(true));

        assert_eq!(view.phase(), Phase::RoundAdvancing);
        assert_eq!(
            effects
                .iter()
                .filter(|effect| **effect == Effect::ClearCanvas)
                .count(),
            1
        );
        assert_eq!(view.notice(), Some(GUESSED_NOTICE));
    }

    #[test_log::test]
    fn the_next_round_clears_the_notice() {
        let mut view = active_guesser();
        view.apply(ChatEvent::YouGuessedIt(true));
        view.apply(ChatEvent::WordToGuess("owl".into()));
        assert_eq!(view.notice(), None);

        let mut view = active_guesser();
        view.apply(ChatEvent::YouGuessedIt(true));
        view.apply(ChatEvent::CleanWordToGuess);
        assert_eq!(view.phase(), Phase::RoundActive);
        assert_eq!(view.notice(), None);
    }

    #[test_log::test]
    fn failed_guess_changes_nothing() {
        let mut view = active_guesser();
        assert_eq!(view.apply(ChatEvent::YouGuessedIt(false)), vec![]);
        assert_eq!(view.phase(), Phase::RoundActive);
        assert_eq!(view.notice(), None);
    }

    #[test_log::test]
    fn clear_events_only_clear() {
        let mut view = GameView::default();
        view.apply(ChatEvent::WordToGuess("cat".into()));
        assert_eq!(view.apply(ChatEvent::CleanCanvas), vec![Effect::ClearCanvas]);
        assert_eq!(view.apply(ChatEvent::NextWord), vec![Effect::ClearCanvas]);
        assert_eq!(view.word(), "cat");
        assert_eq!(view.phase(), Phase::RoundActive);
    }

    #[test_log::test]
    fn messages_append_in_arrival_order() {
        let mut view = GameView::default();
        for text in ["a: one", "b: two", "a: three"] {
            view.apply(ChatEvent::Message(text.into()));
        }
        assert_eq!(view.transcript(), ["a: one", "b: two", "a: three"]);
        assert_eq!(view.phase(), Phase::AwaitingWord);
    }

    #[test]
    fn transcript_is_bounded() {
        let mut view = GameView::default();
        for i in 0..(TRANSCRIPT_LIMIT + 5) {
            view.apply(ChatEvent::Message(i.to_string()));
        }
        assert_eq!(view.transcript().len(), TRANSCRIPT_LIMIT);
        assert_eq!(view.transcript()[0], "5");
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::RwLock;

use crate::game::{Game, Score};
use crate::room::{RoomCommand, RoomHandle};
use crate::words::WordList;

pub const DEFAULT_ROOM: &str = "main";
const MAX_ROOM_NAME_LEN: usize = 64;

/// Maps a `?room=` value onto a room name, falling back to the default room.
pub fn normalize_room_name(value: Option<&str>) -> Option<String> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Some(DEFAULT_ROOM.to_string());
    }
    if value.len() > MAX_ROOM_NAME_LEN {
        return None;
    }
    Some(value.to_string())
}

#[derive(Clone)]
pub struct Rooms {
    rooms: Arc<RwLock<HashMap<String, RoomHandle>>>,
    words: Arc<WordList>,
}

impl Rooms {
    pub fn new(words: Arc<WordList>) -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            words,
        }
    }

    /// Delivers `join` to the named room, starting the room if needed.
    ///
    /// The command is queued while the registry lock is held, so a concurrent
    /// idle check for the same room always observes it.
    pub async fn join(&self, name: &str, join: RoomCommand) -> RoomHandle {
        let mut rooms = self.rooms.write().await;
        let handle = rooms
            .entry(name.to_string())
            .or_insert_with(|| {
                info!("starting room {name}");
                RoomHandle::spawn(
                    name.to_string(),
                    Game::new(self.words.clone(), StdRng::from_entropy()),
                )
            })
            .clone();
        handle.send(join);
        handle
    }

    pub async fn remove_if_idle(&self, name: &str) -> bool {
        let mut rooms = self.rooms.write().await;
        let Some(handle) = rooms.get(name) else {
            return false;
        };
        if !handle.is_idle().await {
            return false;
        }
        rooms.remove(name);
        info!("closed idle room {name}");
        true
    }

    pub async fn scoreboard(&self, name: &str) -> Vec<Score> {
        let handle = self.rooms.read().await.get(name).cloned();
        match handle {
            Some(handle) => handle.scoreboard().await,
            None => Vec::new(),
        }
    }

    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Participant;
    use doodleguess_shared::ChannelKind;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    fn rooms() -> Rooms {
        Rooms::new(Arc::new(WordList::new(vec!["cat".into()]).unwrap()))
    }

    fn join_command(connection: Uuid, username: &str) -> (RoomCommand, mpsc::UnboundedReceiver<String>) {
        let (peer, rx) = mpsc::unbounded_channel();
        let command = RoomCommand::Join {
            connection,
            channel: ChannelKind::Chat,
            participant: Participant {
                username: username.into(),
            },
            peer,
        };
        (command, rx)
    }

    #[test]
    fn room_names_default_and_are_bounded() {
        assert_eq!(normalize_room_name(None).as_deref(), Some("main"));
        assert_eq!(normalize_room_name(Some("  ")).as_deref(), Some("main"));
        assert_eq!(normalize_room_name(Some(" den ")).as_deref(), Some("den"));
        assert_eq!(normalize_room_name(Some(&"x".repeat(65))), None);
    }

    #[test_log::test(tokio::test)]
    async fn rooms_live_while_someone_is_connected() {
        let rooms = rooms();
        let alice = Uuid::new_v4();
        let (command, _rx) = join_command(alice, "alice");
        let handle = rooms.join("den", command).await;

        assert!(!rooms.remove_if_idle("den").await);
        assert_eq!(rooms.len().await, 1);
        assert_eq!(rooms.scoreboard("den").await.len(), 1);

        handle.send(RoomCommand::Leave {
            connection: alice,
            channel: ChannelKind::Chat,
        });
        assert!(rooms.remove_if_idle("den").await);
        assert_eq!(rooms.len().await, 0);
        assert_eq!(rooms.scoreboard("den").await, vec![]);
    }

    #[test_log::test(tokio::test)]
    async fn rooms_are_isolated() {
        let rooms = rooms();
        let (first, mut first_rx) = join_command(Uuid::new_v4(), "alice");
        let (second, mut second_rx) = join_command(Uuid::new_v4(), "bob");
        rooms.join("a", first).await;
        rooms.join("b", second).await;

        assert_eq!(rooms.len().await, 2);
        // Both joiners start their own round as drawer.
        for rx in [&mut first_rx, &mut second_rx] {
            rx.recv().await.unwrap();
            let frame = rx.recv().await.unwrap();
            assert_eq!(
                doodleguess_shared::ChatEvent::decode(&frame).unwrap(),
                doodleguess_shared::ChatEvent::WordToGuess("cat".into())
            );
        }
    }
}

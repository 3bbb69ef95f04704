use std::sync::Arc;
use std::time::Duration;

use crate::auth::TokenVerifier;
use crate::rooms::Rooms;

#[derive(Clone)]
pub struct AppState {
    pub rooms: Rooms,
    pub tokens: Arc<dyn TokenVerifier>,
    pub handshake_timeout: Duration,
}

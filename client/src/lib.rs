mod app;
mod canvas;
pub mod channel;
pub mod config;
mod dom;
pub mod drawing;
pub mod game;
pub mod handshake;
mod logger;
mod net;
pub mod reconnect;
pub mod session;
pub mod surface;
pub mod token;
mod ws;

pub use app::run;

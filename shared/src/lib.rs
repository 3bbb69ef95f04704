pub mod chat;
pub mod geometry;
pub mod raster;

pub use chat::{ChatEnvelope, ChatEvent, EnvelopeError, MsgType};
pub use geometry::{Extent, GeometryError, Point, Segment, Stroke};
pub use raster::Raster;

/// The two independent websocket channels a client keeps open.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Draw,
    Chat,
}

impl ChannelKind {
    /// Path segment appended to `/{app_name}/`.
    pub fn resource(self) -> &'static str {
        match self {
            ChannelKind::Draw => "draw",
            ChannelKind::Chat => "chat",
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.resource())
    }
}

/// Decodes one draw-channel frame into a validated stroke.
pub fn decode_stroke(text: &str) -> Result<Stroke, EnvelopeError> {
    let stroke: Stroke = serde_json::from_str(text)?;
    stroke.validate()?;
    Ok(stroke)
}

pub fn encode_stroke(stroke: &Stroke) -> String {
    serde_json::to_string(stroke).unwrap_or_else(|error| {
        log::error!("failed to encode stroke: {error}");
        String::new()
    })
}

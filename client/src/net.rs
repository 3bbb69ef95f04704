use doodleguess_shared::ChannelKind;
use wasm_bindgen::JsValue;
use web_sys::Window;

/// Builds the channel URL from the page location. The page's query string is
/// forwarded so `?room=` selects the same room on both channels.
pub fn websocket_url(window: &Window, app_name: &str, kind: ChannelKind) -> Result<String, JsValue> {
    let location = window.location();
    let protocol = location.protocol()?;
    let host = location.host()?;
    let search = location.search()?;
    Ok(channel_url(&protocol, &host, app_name, kind, &search))
}

pub fn channel_url(
    protocol: &str,
    host: &str,
    app_name: &str,
    kind: ChannelKind,
    search: &str,
) -> String {
    let scheme = if protocol == "https:" { "wss" } else { "ws" };
    let app_name = app_name.trim_matches('/');
    format!("{scheme}://{host}/{app_name}/{}{search}", kind.resource())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builds_one_url_per_channel() {
        assert_eq!(
            channel_url("http:", "localhost:8080", "doodleguess", ChannelKind::Draw, ""),
            "ws://localhost:8080/doodleguess/draw"
        );
        assert_eq!(
            channel_url(
                "https:",
                "example.org",
                "/doodleguess/",
                ChannelKind::Chat,
                "?room=den"
            ),
            "wss://example.org/doodleguess/chat?room=den"
        );
    }
}

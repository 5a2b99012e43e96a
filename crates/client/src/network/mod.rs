// WebSocket connection lifecycle and outbound command encoding
//
// Reconnect policy: every channel closure schedules exactly one retry after
// a fixed delay, indefinitely - no backoff growth, no retry cap. This is the
// deliberate best-effort liveness policy, not an oversight; the UI shows the
// disconnected status while the loop keeps dialing. Transport errors are
// logged only; closure alone drives the retry.

use protocol::{Command, encode_command};
use wasm_bindgen::JsValue;
use web_sys::{BinaryType, WebSocket};

/// Fixed delay between a channel closure and the single reconnect attempt
/// it schedules.
pub const RECONNECT_DELAY_MS: i32 = 3000;
/// Local development servers listen here when the page host gives no port.
pub const DEV_FALLBACK_PORT: u16 = 8080;
const WS_OPEN: u16 = 1;

/// Derive the endpoint from page context when no explicit URL is
/// configured: scheme follows page security, localhost hosts are pinned to
/// the dev port, and the game path is fixed.
pub fn derive_url(secure_page: bool, host: Option<&str>) -> String {
    let scheme = if secure_page { "wss" } else { "ws" };
    let raw = host.unwrap_or("");
    let host = if raw.is_empty() || raw.contains("localhost") || raw.contains("127.0.0.1") {
        if raw.ends_with(&format!(":{DEV_FALLBACK_PORT}")) {
            raw.to_string()
        } else {
            let hostname = raw
                .split(':')
                .next()
                .filter(|h| !h.is_empty())
                .unwrap_or("localhost");
            format!("{hostname}:{DEV_FALLBACK_PORT}")
        }
    } else {
        raw.to_string()
    };
    format!("{scheme}://{host}/game")
}

/// Resolve the endpoint: an explicit ws(s) URL wins, anything else falls
/// back to derivation from the page location.
fn resolve_url(configured: Option<&str>) -> String {
    if let Some(url) = configured {
        if url.starts_with("ws://") || url.starts_with("wss://") {
            return url.to_string();
        }
    }
    let location = web_sys::window().map(|w| w.location());
    let secure = location
        .as_ref()
        .and_then(|l| l.protocol().ok())
        .map(|p| p == "https:")
        .unwrap_or(false);
    let host = location.as_ref().and_then(|l| l.host().ok());
    derive_url(secure, host.as_deref())
}

pub struct Connection {
    ws: WebSocket,
    url: String,
}

impl Connection {
    pub fn new(configured: Option<&str>) -> Result<Self, JsValue> {
        let url = resolve_url(configured);
        log::info!("Initializing uplink to {url}");
        let ws = WebSocket::new(&url)?;
        ws.set_binary_type(BinaryType::Arraybuffer);
        Ok(Self { ws, url })
    }

    pub fn websocket(&self) -> &WebSocket {
        &self.ws
    }

    pub fn is_open(&self) -> bool {
        self.ws.ready_state() == WS_OPEN
    }

    /// Tear down the old socket and dial the same endpoint again. The caller
    /// re-attaches its event handlers to the returned socket.
    pub fn reconnect(&mut self) -> Result<WebSocket, JsValue> {
        self.ws.set_onopen(None);
        self.ws.set_onmessage(None);
        self.ws.set_onerror(None);
        self.ws.set_onclose(None);
        let _ = self.ws.close();

        log::info!("Reconnecting to {}", self.url);
        let ws = WebSocket::new(&self.url)?;
        ws.set_binary_type(BinaryType::Arraybuffer);
        self.ws = ws;
        Ok(self.ws.clone())
    }

    /// Encode and send one command. Dropped silently (not queued) when the
    /// channel is not open.
    pub fn send(&self, command: &Command) {
        if !self.is_open() {
            return;
        }
        match encode_command(command) {
            Ok(bytes) => {
                if let Err(e) = self.ws.send_with_u8_array(&bytes) {
                    log::error!("Failed to send {}: {e:?}", command.wire_type());
                }
            }
            Err(e) => log::error!("Failed to encode {}: {e}", command.wire_type()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconnect_delay_is_fixed() {
        // The policy is one shot per closure at a flat delay; anything that
        // grows or caps it is a behavior change.
        assert_eq!(RECONNECT_DELAY_MS, 3000);
    }

    #[test]
    fn derives_local_dev_fallback() {
        assert_eq!(derive_url(false, None), "ws://localhost:8080/game");
        assert_eq!(derive_url(false, Some("")), "ws://localhost:8080/game");
        assert_eq!(
            derive_url(false, Some("localhost:3000")),
            "ws://localhost:8080/game"
        );
        assert_eq!(
            derive_url(false, Some("127.0.0.1:8080")),
            "ws://127.0.0.1:8080/game"
        );
    }

    #[test]
    fn derives_secure_production_url() {
        assert_eq!(
            derive_url(true, Some("play.example.net")),
            "wss://play.example.net/game"
        );
        assert_eq!(
            derive_url(false, Some("play.example.net:9000")),
            "ws://play.example.net:9000/game"
        );
    }
}

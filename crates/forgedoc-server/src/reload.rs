//! Live reload over WebSocket.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Messages sent to connected clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReloadMessage {
    /// Connection established
    Connected,

    /// Content was rebuilt
    Rebuilt {
        /// Files written by the rebuild
        files: usize,
        duration_ms: u64,
    },

    /// A rebuild failed; the previous output is still being served
    BuildFailed { message: String },

    /// Full page reload
    Reload,
}

/// Broadcasts [`ReloadMessage`]s to every connected client.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    sender: broadcast::Sender<ReloadMessage>,
}

impl ReloadHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    /// Send a message to all connected clients.
    pub fn send(&self, msg: ReloadMessage) {
        // No receivers is fine.
        let _ = self.sender.send(msg);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Client script that reloads the page after each rebuild.
///
/// The socket URL is derived from the page's own host, so the script works
/// on any port.
pub fn reload_client_script(path: &str) -> String {
    format!(
        r#"
(function() {{
  'use strict';

  const proto = location.protocol === 'https:' ? 'wss:' : 'ws:';
  let attempts = 0;

  function connect() {{
    const ws = new WebSocket(proto + '//' + location.host + '{path}');

    ws.onopen = function() {{
      attempts = 0;
    }};

    ws.onmessage = function(event) {{
      const msg = JSON.parse(event.data);
      switch (msg.type) {{
        case 'rebuilt':
        case 'reload':
          location.reload();
          break;
        case 'build_failed':
          console.error('[forgedoc] Build failed:', msg.message);
          break;
      }}
    }};

    ws.onclose = function() {{
      if (attempts < 10) {{
        attempts++;
        setTimeout(connect, 1000 * attempts);
      }}
    }};
  }}

  connect();
}})();
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hub_broadcasts_messages() {
        let hub = ReloadHub::new();
        let mut rx = hub.subscribe();

        hub.send(ReloadMessage::Reload);

        assert_eq!(rx.try_recv().unwrap(), ReloadMessage::Reload);
        assert_eq!(hub.subscriber_count(), 1);
    }

    #[test]
    fn send_without_subscribers_is_ignored() {
        ReloadHub::new().send(ReloadMessage::Connected);
    }

    #[test]
    fn serializes_messages() {
        let json = serde_json::to_string(&ReloadMessage::Rebuilt {
            files: 3,
            duration_ms: 12,
        })
        .unwrap();

        assert_eq!(json, r#"{"type":"rebuilt","files":3,"duration_ms":12}"#);
    }

    #[test]
    fn script_uses_socket_path() {
        assert!(reload_client_script("/__reload").contains("location.host + '/__reload'"));
    }
}

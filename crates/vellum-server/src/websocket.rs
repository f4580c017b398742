//! WebSocket-based live reload.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Messages sent to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReloadMessage {
    /// Full page reload after a successful rebuild
    Reload,

    /// A rebuild failed; the message is shown in the browser console
    BuildFailed {
        /// Error text
        error: String,
    },

    /// Connection established
    Connected,
}

/// Hub for broadcasting reload messages to all connected clients.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    sender: broadcast::Sender<ReloadMessage>,
}

impl ReloadHub {
    /// Create a new hub.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    /// Send a message to all connected clients.
    pub fn send(&self, msg: ReloadMessage) {
        // Ignore send errors (no receivers)
        let _ = self.sender.send(msg);
    }

    /// Subscribe to reload messages.
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate the client-side live reload script.
pub fn reload_client_script(ws_path: &str) -> String {
    format!(
        r#"
(function() {{
  'use strict';

  const proto = location.protocol === 'https:' ? 'wss:' : 'ws:';
  const ws = new WebSocket(proto + '//' + location.host + '{}');
  let reconnectAttempts = 0;
  const maxReconnectAttempts = 10;

  ws.onopen = function() {{
    console.log('[vellum] Connected');
    reconnectAttempts = 0;
  }};

  ws.onmessage = function(event) {{
    const msg = JSON.parse(event.data);

    switch (msg.type) {{
      case 'reload':
        location.reload();
        break;

      case 'build_failed':
        console.error('[vellum] Build failed:', msg.error);
        break;

      case 'connected':
        console.log('[vellum] Server acknowledged connection');
        break;
    }}
  }};

  ws.onclose = function() {{
    console.log('[vellum] Disconnected');
    if (reconnectAttempts < maxReconnectAttempts) {{
      reconnectAttempts++;
      setTimeout(function() {{
        console.log('[vellum] Reconnecting...');
        location.reload();
      }}, 1000 * reconnectAttempts);
    }}
  }};

  ws.onerror = function(e) {{
    console.error('[vellum] WebSocket error:', e);
  }};
}})();
"#,
        ws_path
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

        match rx.try_recv() {
            Ok(ReloadMessage::Reload) => {}
            _ => panic!("Expected Reload message"),
        }
    }

    #[test]
    fn serializes_messages() {
        let msg = ReloadMessage::BuildFailed {
            error: "missing frontmatter".to_string(),
        };

        let json = serde_json::to_string(&msg).unwrap();

        assert!(json.contains("build_failed"));
        assert!(json.contains("missing frontmatter"));
    }

    #[test]
    fn client_script_targets_the_ws_endpoint() {
        let script = reload_client_script("/__livereload");

        assert!(script.contains("'/__livereload'"));
        assert!(script.contains("location.reload"));
    }
}

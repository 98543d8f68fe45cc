//! 实时推送能力。
//!
//! `TelemetryHub` 把采集事件扇出给当前连接的查看端会话。会话集合由
//! 独立的分发任务独占持有；采集上下文通过有界命令通道 `try_send`
//! 移交广播；分发端未就绪或队列满时丢弃该条并告警，绝不阻塞采集，
//! 也绝不无限排队。
//!
//! 会话清理有两条路径：连接端显式 disconnect，或广播时发现对端通道
//! 已断。两条路径都幂等，先到先清。

use domain::TelemetryEvent;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

/// 会话保活间隔；一个间隔内没有任何应用层消息即视对端可疑。
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// 保活帧。
pub const PING_FRAME: &str = r#"{"type":"ping"}"#;

/// 命令通道容量（连接、断开、广播共用）。
const COMMAND_BUFFER: usize = 256;

/// 会话标识。
pub type SessionId = Uuid;

/// 发往单个会话的序列化帧通道。
pub type SessionSender = mpsc::UnboundedSender<String>;

enum HubCommand {
    Connect {
        session: SessionId,
        sender: SessionSender,
    },
    Disconnect {
        session: SessionId,
    },
    Broadcast {
        frame: String,
    },
}

/// 遥测事件扇出中心。
#[derive(Clone)]
pub struct TelemetryHub {
    commands: mpsc::Sender<HubCommand>,
    session_count: Arc<AtomicUsize>,
}

impl TelemetryHub {
    /// 启动分发任务并返回可克隆的句柄。
    pub fn spawn() -> Self {
        let (commands, rx) = mpsc::channel(COMMAND_BUFFER);
        let session_count = Arc::new(AtomicUsize::new(0));
        tokio::spawn(dispatch(rx, session_count.clone()));
        Self {
            commands,
            session_count,
        }
    }

    /// 注册会话。返回 false 表示分发端不可用，调用方应直接关闭连接。
    pub fn connect(&self, session: SessionId, sender: SessionSender) -> bool {
        self.commands
            .try_send(HubCommand::Connect { session, sender })
            .is_ok()
    }

    /// 注销会话。幂等：重复注销或注销未知会话没有副作用。
    pub fn disconnect(&self, session: SessionId) {
        let _ = self.commands.try_send(HubCommand::Disconnect { session });
    }

    /// 广播一条遥测事件：序列化一次，投递给每个在册会话。
    ///
    /// 返回 false 表示本条被丢弃（分发端未就绪或队列满）。
    pub fn broadcast(&self, event: &TelemetryEvent) -> bool {
        let frame = match serde_json::to_string(event) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(target: "meterd.realtime", error = %err, "event_serialize_failed");
                return false;
            }
        };
        match self.commands.try_send(HubCommand::Broadcast { frame }) {
            Ok(()) => true,
            Err(err) => {
                warn!(target: "meterd.realtime", error = %err, "broadcast_dropped");
                false
            }
        }
    }

    /// 当前在册会话数。
    pub fn session_count(&self) -> usize {
        self.session_count.load(Ordering::Relaxed)
    }
}

/// 分发循环：独占会话表，顺序消费命令。
async fn dispatch(mut rx: mpsc::Receiver<HubCommand>, session_count: Arc<AtomicUsize>) {
    let mut sessions: HashMap<SessionId, SessionSender> = HashMap::new();
    while let Some(command) = rx.recv().await {
        match command {
            HubCommand::Connect { session, sender } => {
                sessions.insert(session, sender);
                session_count.store(sessions.len(), Ordering::Relaxed);
                debug!(target: "meterd.realtime", session = %session, total = sessions.len(), "session_connected");
            }
            HubCommand::Disconnect { session } => {
                if sessions.remove(&session).is_some() {
                    session_count.store(sessions.len(), Ordering::Relaxed);
                    debug!(target: "meterd.realtime", session = %session, total = sessions.len(), "session_disconnected");
                }
            }
            HubCommand::Broadcast { frame } => {
                if sessions.is_empty() {
                    continue;
                }
                let mut dead: Vec<SessionId> = Vec::new();
                for (session, sender) in &sessions {
                    if sender.send(frame.clone()).is_err() {
                        dead.push(*session);
                    }
                }
                // 单个会话投递失败只摘除该会话，不影响其余会话
                for session in dead {
                    sessions.remove(&session);
                    debug!(target: "meterd.realtime", session = %session, "session_removed_on_send_failure");
                }
                session_count.store(sessions.len(), Ordering::Relaxed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{RawPayload, Snapshot, TelemetryEvent};
    use tokio::time::timeout;

    fn sample_event() -> TelemetryEvent {
        TelemetryEvent::telemetry(
            1_700_000_000_000,
            "th/site001/pg46/001".to_string(),
            RawPayload::from_text(r#"{"v": 220}"#),
            Snapshot::default(),
            Vec::new(),
        )
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn broadcast_to_zero_sessions_is_noop() {
        let hub = TelemetryHub::spawn();
        assert!(hub.broadcast(&sample_event()));
        settle().await;
        assert_eq!(hub.session_count(), 0);
    }

    #[tokio::test]
    async fn connected_session_receives_frame() {
        let hub = TelemetryHub::spawn();
        let (tx, mut rx) = mpsc::unbounded_channel();
        assert!(hub.connect(Uuid::new_v4(), tx));
        settle().await;
        assert_eq!(hub.session_count(), 1);

        assert!(hub.broadcast(&sample_event()));
        let frame = timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("frame in time")
            .expect("frame");
        let json: serde_json::Value = serde_json::from_str(&frame).expect("json frame");
        assert_eq!(json["type"], "telemetry");
        assert_eq!(json["key"], "th/site001/pg46/001");
        assert_eq!(json["channel_count"], 0);
    }

    #[tokio::test]
    async fn dead_session_removed_others_unaffected() {
        let hub = TelemetryHub::spawn();
        let (dead_tx, dead_rx) = mpsc::unbounded_channel();
        let (live_tx, mut live_rx) = mpsc::unbounded_channel();
        hub.connect(Uuid::new_v4(), dead_tx);
        hub.connect(Uuid::new_v4(), live_tx);
        settle().await;
        assert_eq!(hub.session_count(), 2);

        drop(dead_rx);
        hub.broadcast(&sample_event());
        let frame = timeout(Duration::from_secs(1), live_rx.recv())
            .await
            .expect("frame in time")
            .expect("frame");
        assert!(frame.contains("\"telemetry\""));
        settle().await;
        assert_eq!(hub.session_count(), 1);
    }

    #[tokio::test]
    async fn disconnect_is_idempotent() {
        let hub = TelemetryHub::spawn();
        let session = Uuid::new_v4();
        let (tx, _rx) = mpsc::unbounded_channel();
        hub.connect(session, tx);
        settle().await;
        assert_eq!(hub.session_count(), 1);

        hub.disconnect(session);
        hub.disconnect(session);
        settle().await;
        assert_eq!(hub.session_count(), 0);
    }
}

//! 实时遥测 WebSocket handler
//!
//! - GET /ws/telemetry
//!
//! 会话循环只向对端发送：遥测帧来自 hub 的每会话通道，外加固定间隔的
//! 保活 ping。任一发送失败即结束会话。注销只在循环退出处执行一次；
//! hub 侧经广播失败摘除是另一条幂等路径。

use crate::AppState;
use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use meterd_realtime::{KEEPALIVE_INTERVAL, PING_FRAME, SessionId, TelemetryHub};
use meterd_telemetry::{record_session_closed, record_session_opened};
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub async fn ws_telemetry(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| session_loop(socket, state.hub.clone()))
}

async fn session_loop(mut socket: WebSocket, hub: TelemetryHub) {
    let session = SessionId::new_v4();
    let (tx, mut rx) = mpsc::unbounded_channel();
    if !hub.connect(session, tx) {
        warn!(target: "meterd.realtime", session = %session, "hub_unavailable_session_closed");
        return;
    }
    record_session_opened();
    debug!(target: "meterd.realtime", session = %session, "ws_session_started");

    let first_tick = tokio::time::Instant::now() + KEEPALIVE_INTERVAL;
    let mut keepalive = tokio::time::interval_at(first_tick, KEEPALIVE_INTERVAL);

    loop {
        tokio::select! {
            maybe_frame = rx.recv() => match maybe_frame {
                Some(frame) => {
                    if socket.send(Message::Text(frame)).await.is_err() {
                        break;
                    }
                }
                // hub 侧已把会话摘除（广播失败路径）
                None => break,
            },
            _ = keepalive.tick() => {
                if socket.send(Message::Text(PING_FRAME.to_string())).await.is_err() {
                    break;
                }
            }
        }
    }

    hub.disconnect(session);
    record_session_closed();
    debug!(target: "meterd.realtime", session = %session, "ws_session_ended");
}

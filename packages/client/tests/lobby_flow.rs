//! Integration tests for the lobby client against an in-process WebSocket server.

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode, header::COOKIE},
    response::IntoResponse,
    routing::get,
};
use futures_util::{SinkExt, StreamExt};
use quizlobby_client::{
    channel::{ChannelStatus, Feature, TransportManager},
    config::ClientConfig,
    domain::{LobbyStatus, NotificationKind, ReconnectPolicy, Settings},
    error::ClientError,
    infrastructure::{
        session_provider::HttpSessionProvider,
        transport::{DefaultConnector, TransportKind},
    },
    usecase::{LobbySession, LobbyView, NotificationFeed, Phase, SessionBootstrapper},
};
use quizlobby_shared::time::FixedClock;
use serde_json::{Value, json};
use tokio::sync::{Mutex, watch};

const HOST_COOKIE: &str = "session=host";

/// Behaviour knobs and recorded traffic of the test server.
#[derive(Default)]
struct ServerState {
    /// Close the first lobby connection right after answering `create_lobby`
    drop_after_create: bool,
    lobby_connections: AtomicUsize,
    snapshot: Mutex<Option<Value>>,
    received: Mutex<Vec<Value>>,
}

/// Helper struct to manage the in-process server lifecycle
struct TestServer {
    base_url: String,
    state: Arc<ServerState>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn start(state: ServerState) -> Self {
        let state = Arc::new(state);
        let app = Router::new()
            .route("/api/auth/get-session", get(get_session))
            .route("/realtime/lobby", get(lobby_handler))
            .route("/realtime/notifications", get(notification_handler))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TestServer {
            base_url: format!("http://{}", addr),
            state,
            handle,
        }
    }

    fn config(&self, cookie: Option<&str>) -> ClientConfig {
        let mut config = ClientConfig::new(self.base_url.clone(), "d1");
        config.cookie = cookie.map(str::to_string);
        config.transports = vec![TransportKind::WebSocket];
        config.connect_timeout = Duration::from_secs(2);
        config.reconnect = ReconnectPolicy {
            max_attempts: 3,
            delay: Duration::from_millis(20),
        };
        config
    }

    async fn received_events(&self) -> Vec<String> {
        self.state
            .received
            .lock()
            .await
            .iter()
            .filter_map(|frame| frame["event"].as_str().map(str::to_string))
            .collect()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn has_host_cookie(headers: &HeaderMap) -> bool {
    headers
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == HOST_COOKIE)
}

async fn get_session(headers: HeaderMap) -> Json<Value> {
    if has_host_cookie(&headers) {
        Json(json!({
            "user": { "id": "host", "name": "Host", "image": null, "emailVerified": true }
        }))
    } else {
        Json(Value::Null)
    }
}

async fn lobby_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<Arc<ServerState>>,
) -> Result<impl IntoResponse, StatusCode> {
    if !has_host_cookie(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let connection = state.lobby_connections.fetch_add(1, Ordering::SeqCst);
    Ok(ws.on_upgrade(move |socket| lobby_socket(socket, state, connection)))
}

fn frame(event: &str, data: Value) -> Message {
    Message::Text(json!({ "event": event, "data": data }).to_string().into())
}

async fn lobby_socket(socket: WebSocket, state: Arc<ServerState>, connection: usize) {
    let (mut sender, mut receiver) = socket.split();

    // Resend the lobby to a reconnecting client, a little late so the stale
    // window is observable.
    if connection > 0 {
        tokio::time::sleep(Duration::from_millis(300)).await;
    }
    let resend = state.snapshot.lock().await.clone();
    if let Some(snapshot) = resend {
        let _ = sender.send(frame("lobby_update", snapshot)).await;
    }

    while let Some(Ok(message)) = receiver.next().await {
        let Message::Text(text) = message else {
            continue;
        };
        let Ok(incoming) = serde_json::from_str::<Value>(text.as_str()) else {
            continue;
        };
        state.received.lock().await.push(incoming.clone());

        match incoming["event"].as_str() {
            Some("create_lobby") => {
                let snapshot = json!({
                    "code": "AB12",
                    "players": [{ "userId": "host", "username": "Host", "isHost": true }],
                    "status": "waiting",
                    "deckId": incoming["data"]["deckId"],
                    "settings": incoming["data"]["settings"]
                });
                *state.snapshot.lock().await = Some(snapshot.clone());
                let _ = sender.send(frame("lobby_created", json!({ "code": "AB12" }))).await;
                let _ = sender.send(frame("lobby_update", snapshot)).await;
                if state.drop_after_create && connection == 0 {
                    let _ = sender.send(Message::Close(None)).await;
                    return;
                }
            }
            Some("start_game") => {
                let mut guard = state.snapshot.lock().await;
                if let Some(snapshot) = guard.as_mut() {
                    snapshot["status"] = json!("starting");
                    let _ = sender.send(frame("lobby_update", snapshot.clone())).await;
                }
            }
            _ => {
                let _ = sender
                    .send(frame("error", json!({ "message": "unsupported command" })))
                    .await;
            }
        }
    }
}

async fn notification_handler(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(|socket| async move {
        let (mut sender, mut receiver) = socket.split();
        let _ = sender
            .send(frame("notification", json!({ "text": "Welcome" })))
            .await;
        let _ = sender
            .send(frame("notification", json!({ "type": "error" })))
            .await;
        let _ = sender
            .send(frame(
                "notification",
                json!({ "text": "Deck saved", "type": "success", "time": 5000 }),
            ))
            .await;
        while let Some(Ok(_)) = receiver.next().await {}
    })
}

async fn wait_for_view<F>(rx: &mut watch::Receiver<LobbyView>, condition: F) -> LobbyView
where
    F: FnMut(&LobbyView) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(condition))
        .await
        .expect("Timed out waiting for lobby view")
        .expect("Lobby view sender dropped")
        .clone()
}

async fn open_session(server: &TestServer, manager: &mut TransportManager) -> LobbySession {
    let config = server.config(Some(HOST_COOKIE));
    let provider = HttpSessionProvider::new(&server.base_url, config.cookie.clone());
    let bootstrapper = SessionBootstrapper::new(Arc::new(provider));
    let identity = bootstrapper.identity().await.unwrap().clone();

    let channel = manager
        .open(Feature::Lobby, config.lobby_channel())
        .await
        .unwrap();
    LobbySession::new(channel, identity, config.policy)
}

#[tokio::test]
async fn test_host_creates_and_starts_lobby() {
    // テスト項目: ホストがロビーを作成し、ゲームを開始できる
    // given (前提条件):
    let server = TestServer::start(ServerState::default()).await;
    let mut manager = TransportManager::new(Arc::new(DefaultConnector::new()));
    let session = open_session(&server, &mut manager).await;
    let mut rx = session.subscribe();
    wait_for_view(&mut rx, |view| view.connected).await;

    // when (操作):
    session.create_lobby("d1", Settings::default()).unwrap();
    let view = wait_for_view(&mut rx, |view| {
        view.lobby.as_ref().is_some_and(|lobby| !lobby.players.is_empty())
    })
    .await;

    // then (期待する結果):
    let lobby = view.lobby.unwrap();
    assert_eq!(lobby.code.as_str(), "AB12");
    assert_eq!(lobby.deck_id.as_str(), "d1");
    assert_eq!(lobby.settings, Settings::default());
    assert!(lobby.players[0].is_host);
    assert_eq!(view.phase, Phase::Lobby);

    // when (操作): ゲーム開始
    session.start_game().unwrap();
    let view = wait_for_view(&mut rx, |view| view.phase == Phase::Game).await;

    // then (期待する結果):
    assert_eq!(view.lobby.unwrap().status, LobbyStatus::Starting);
    assert_eq!(
        server.received_events().await,
        vec!["create_lobby".to_string(), "start_game".to_string()]
    );
}

#[tokio::test]
async fn test_second_create_is_not_transmitted() {
    // テスト項目: 連続した create_lobby はサーバーに1回しか届かない
    // given (前提条件):
    let server = TestServer::start(ServerState::default()).await;
    let mut manager = TransportManager::new(Arc::new(DefaultConnector::new()));
    let session = open_session(&server, &mut manager).await;
    let mut rx = session.subscribe();
    wait_for_view(&mut rx, |view| view.connected).await;

    // when (操作):
    let first = session.create_lobby("d1", Settings::default());
    let second = session.create_lobby("d1", Settings::default());
    wait_for_view(&mut rx, |view| view.lobby.is_some()).await;
    let third = session.create_lobby("d1", Settings::default());

    // then (期待する結果):
    assert!(first.is_ok());
    assert!(matches!(second, Err(ClientError::CommandRejected(_))));
    assert!(matches!(third, Err(ClientError::CommandRejected(_))));
    assert_eq!(server.received_events().await, vec!["create_lobby".to_string()]);
}

#[tokio::test]
async fn test_open_twice_reuses_live_channel() {
    // テスト項目: 同じ機能のチャネルを再度 open すると同じチャネルが返り、接続は増えない
    // given (前提条件):
    let server = TestServer::start(ServerState::default()).await;
    let config = server.config(Some(HOST_COOKIE));
    let mut manager = TransportManager::new(Arc::new(DefaultConnector::new()));
    let first = manager
        .open(Feature::Lobby, config.lobby_channel())
        .await
        .unwrap();

    // when (操作):
    let second = manager
        .open(Feature::Lobby, config.lobby_channel())
        .await
        .unwrap();

    // then (期待する結果):
    assert!(first.same_channel(&second));
    assert_eq!(server.state.lobby_connections.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_reconnect_waits_for_fresh_snapshot() {
    // テスト項目: 切断後に自動再接続し、サーバーから再送されたスナップショットでロビーが復元される
    // given (前提条件):
    let server = TestServer::start(ServerState {
        drop_after_create: true,
        ..ServerState::default()
    })
    .await;
    let mut manager = TransportManager::new(Arc::new(DefaultConnector::new()));
    let session = open_session(&server, &mut manager).await;
    let mut rx = session.subscribe();
    wait_for_view(&mut rx, |view| view.connected).await;

    // when (操作):
    session.create_lobby("d1", Settings::default()).unwrap();
    let stale = wait_for_view(&mut rx, |view| view.awaiting_snapshot).await;
    let rejected = session.start_game();
    let resynced = wait_for_view(&mut rx, |view| view.connected && !view.awaiting_snapshot).await;

    // then (期待する結果):
    assert_eq!(stale.lobby.unwrap().code.as_str(), "AB12");
    assert!(matches!(rejected, Err(ClientError::CommandRejected(_))));
    assert_eq!(resynced.lobby.unwrap().code.as_str(), "AB12");
    assert_eq!(resynced.error, None);
    assert_eq!(server.state.lobby_connections.load(Ordering::SeqCst), 2);
    assert!(session.start_game().is_ok());
}

#[tokio::test]
async fn test_signed_out_user_is_rejected() {
    // テスト項目: サインインしていない場合、ブートストラップが Unauthenticated を返す
    // given (前提条件):
    let server = TestServer::start(ServerState::default()).await;
    let provider = HttpSessionProvider::new(&server.base_url, None);
    let bootstrapper = SessionBootstrapper::new(Arc::new(provider));

    // when (操作):
    let result = bootstrapper.identity().await;

    // then (期待する結果):
    assert!(matches!(result, Err(ClientError::Unauthenticated)));
}

#[tokio::test]
async fn test_unauthorized_channel_gives_up() {
    // テスト項目: クッキーなしの接続は拒否され、再接続ポリシーを使い切ると ConnectionError になる
    // given (前提条件):
    let server = TestServer::start(ServerState::default()).await;
    let config = server.config(None);
    let mut manager = TransportManager::new(Arc::new(DefaultConnector::new()));

    // when (操作):
    let result = manager.open(Feature::Lobby, config.lobby_channel()).await;

    // then (期待する結果):
    assert!(matches!(result, Err(ClientError::ConnectionError(_))));
    assert!(manager.get(Feature::Lobby).is_none());
    assert_eq!(server.state.lobby_connections.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_notification_feed_drops_malformed() {
    // テスト項目: 通知チャネルで不正な通知は破棄され、正しい通知だけがトーストになる
    // given (前提条件):
    let server = TestServer::start(ServerState::default()).await;
    let config = server.config(Some(HOST_COOKIE));
    let mut manager = TransportManager::new(Arc::new(DefaultConnector::new()));
    let channel = manager
        .open(Feature::Notifications, config.notification_channel())
        .await
        .unwrap();

    // when (操作):
    let (_feed, mut toasts) = NotificationFeed::new(channel, Arc::new(FixedClock::new(1_000)));
    let first = tokio::time::timeout(Duration::from_secs(5), toasts.recv())
        .await
        .unwrap()
        .unwrap();
    let second = tokio::time::timeout(Duration::from_secs(5), toasts.recv())
        .await
        .unwrap()
        .unwrap();

    // then (期待する結果):
    assert_eq!(first.text, "Welcome");
    assert_eq!(first.kind, NotificationKind::Info);
    assert_eq!(first.expires_at, 4_000);
    assert_eq!(second.text, "Deck saved");
    assert_eq!(second.kind, NotificationKind::Success);
    assert_eq!(second.expires_at, 6_000);
}

#[tokio::test]
async fn test_close_stops_channel() {
    // テスト項目: セッションを閉じるとチャネルが Closed になり、以降のコマンドは送信されない
    // given (前提条件):
    let server = TestServer::start(ServerState::default()).await;
    let mut manager = TransportManager::new(Arc::new(DefaultConnector::new()));
    let session = open_session(&server, &mut manager).await;
    let mut rx = session.subscribe();
    wait_for_view(&mut rx, |view| view.connected).await;

    // when (操作):
    session.close();
    session.close();

    // then (期待する結果):
    assert_eq!(session.channel().status(), ChannelStatus::Closed);
    assert!(manager.get(Feature::Lobby).is_none());
    assert!(session.create_lobby("d1", Settings::default()).is_err());
    assert!(server.received_events().await.is_empty());
}

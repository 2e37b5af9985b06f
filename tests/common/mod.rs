//! Shared mock servers and fixtures for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response as HttpResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::SinkExt;
use tokio::net::TcpListener;

use ledger_client::config::{ClientConfig, OrdererConfig, PeerConfig};
use ledger_client::identity::{CryptoSuite, EcdsaSuite, Identity, PrivateKey};
use ledger_client::protocol::codec;
use ledger_client::protocol::messages::{
    Block, BlockHeader, BlockMetadata, BroadcastResponse, DeliverResponse, Endorsement, Envelope,
    Header, HeaderType, Payload, ProposalResponse, Response, SignedProposal, Status,
    TxValidationCode,
};
use ledger_client::LedgerClient;

pub const CLIENT_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const PEER_KEY: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

pub fn client_identity() -> Identity {
    Identity::from_private_key(
        "Org1MSP",
        PrivateKey::from_hex(CLIENT_KEY).unwrap(),
        &EcdsaSuite::new(),
    )
    .unwrap()
}

pub fn peer_identity() -> Identity {
    Identity::from_private_key(
        "Org2MSP",
        PrivateKey::from_hex(PEER_KEY).unwrap(),
        &EcdsaSuite::new(),
    )
    .unwrap()
}

/// Bind an ephemeral loopback port and serve `app` on it.
async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// A loopback address with nothing listening on it.
pub async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// How a mock endorser answers.
#[derive(Debug, Clone)]
pub struct PeerBehavior {
    pub status: i32,
    pub payload: Vec<u8>,
    pub delay: Duration,
    pub http_status: Option<u16>,
    pub sign: bool,
}

impl PeerBehavior {
    pub fn endorse(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            payload: payload.into(),
            delay: Duration::ZERO,
            http_status: None,
            sign: true,
        }
    }

    pub fn reject(status: i32) -> Self {
        Self {
            status,
            payload: Vec::new(),
            ..Self::endorse(Vec::new())
        }
    }

    pub fn http_error(code: u16) -> Self {
        Self {
            http_status: Some(code),
            ..Self::endorse(Vec::new())
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn unsigned(mut self) -> Self {
        self.sign = false;
        self
    }
}

pub struct MockPeer {
    pub addr: SocketAddr,
    pub calls: Arc<AtomicUsize>,
}

struct PeerState {
    behavior: PeerBehavior,
    identity: Identity,
    calls: Arc<AtomicUsize>,
}

async fn process_proposal(
    State(state): State<Arc<PeerState>>,
    Json(_proposal): Json<SignedProposal>,
) -> Result<Json<ProposalResponse>, StatusCode> {
    state.calls.fetch_add(1, Ordering::SeqCst);
    let behavior = &state.behavior;
    if !behavior.delay.is_zero() {
        tokio::time::sleep(behavior.delay).await;
    }
    if let Some(code) = behavior.http_status {
        return Err(StatusCode::from_u16(code).unwrap());
    }

    let endorsement = if behavior.status < 400 && behavior.sign {
        let endorser = state.identity.creator_bytes().unwrap();
        let signed = ProposalResponse::signed_bytes(&behavior.payload, &endorser);
        let signature = state.identity.sign(&EcdsaSuite::new(), &signed).unwrap();
        Some(Endorsement { endorser, signature })
    } else {
        None
    };

    Ok(Json(ProposalResponse {
        response: Response {
            status: behavior.status,
            message: if behavior.status < 400 { String::new() } else { "chaincode error".into() },
            payload: behavior.payload.clone(),
        },
        payload: behavior.payload.clone(),
        endorsement,
    }))
}

/// Start a mock endorsing peer on a loopback port.
pub async fn start_mock_peer(behavior: PeerBehavior) -> MockPeer {
    let calls = Arc::new(AtomicUsize::new(0));
    let state = Arc::new(PeerState {
        behavior,
        identity: peer_identity(),
        calls: Arc::clone(&calls),
    });
    let app = Router::new()
        .route("/v1/proposals", post(process_proposal))
        .with_state(state);
    MockPeer {
        addr: serve(app).await,
        calls,
    }
}

pub struct MockOrderer {
    pub addr: SocketAddr,
    pub received: Arc<Mutex<Vec<Envelope>>>,
}

struct OrdererState {
    status: Status,
    received: Arc<Mutex<Vec<Envelope>>>,
}

async fn broadcast(
    State(state): State<Arc<OrdererState>>,
    Json(envelope): Json<Envelope>,
) -> Json<BroadcastResponse> {
    state.received.lock().unwrap().push(envelope);
    Json(BroadcastResponse {
        status: state.status,
        info: if state.status.is_success() { String::new() } else { "policy violation".into() },
    })
}

/// Start a mock orderer answering every broadcast with `status`.
pub async fn start_mock_orderer(status: Status) -> MockOrderer {
    let received = Arc::new(Mutex::new(Vec::new()));
    let state = Arc::new(OrdererState {
        status,
        received: Arc::clone(&received),
    });
    let app = Router::new()
        .route("/v1/broadcast", post(broadcast))
        .with_state(state);
    MockOrderer {
        addr: serve(app).await,
        received,
    }
}

/// How the mock event source ends a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliverEnd {
    /// Keep the socket open until the client goes away.
    HoldOpen,
    /// Drop the socket without a status frame.
    Abort,
    /// Nothing extra; the frames decide.
    AfterFrames,
}

pub struct MockDeliver {
    pub addr: SocketAddr,
    pub seeks: Arc<Mutex<Vec<Envelope>>>,
    pub disconnects: Arc<AtomicUsize>,
}

struct DeliverState {
    frames: Vec<DeliverResponse>,
    end: DeliverEnd,
    seeks: Arc<Mutex<Vec<Envelope>>>,
    disconnects: Arc<AtomicUsize>,
}

async fn deliver(ws: WebSocketUpgrade, State(state): State<Arc<DeliverState>>) -> HttpResponse {
    ws.on_upgrade(move |socket| stream_blocks(socket, state))
}

async fn stream_blocks(mut socket: WebSocket, state: Arc<DeliverState>) {
    let seek = match socket.recv().await {
        Some(Ok(Message::Text(text))) => serde_json::from_str::<Envelope>(text.as_str()).ok(),
        _ => None,
    };
    let Some(seek) = seek else {
        return;
    };
    state.seeks.lock().unwrap().push(seek);

    for frame in &state.frames {
        let text = serde_json::to_string(frame).unwrap();
        if socket.send(Message::Text(text.into())).await.is_err() {
            state.disconnects.fetch_add(1, Ordering::SeqCst);
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    match state.end {
        DeliverEnd::HoldOpen => {
            while let Some(Ok(_)) = socket.recv().await {}
            state.disconnects.fetch_add(1, Ordering::SeqCst);
        }
        DeliverEnd::Abort => drop(socket),
        DeliverEnd::AfterFrames => {
            let _ = socket.close().await;
        }
    }
}

/// Start a mock event source that replays `frames` to every subscriber.
pub async fn start_mock_deliver(frames: Vec<DeliverResponse>, end: DeliverEnd) -> MockDeliver {
    let seeks = Arc::new(Mutex::new(Vec::new()));
    let disconnects = Arc::new(AtomicUsize::new(0));
    let state = Arc::new(DeliverState {
        frames,
        end,
        seeks: Arc::clone(&seeks),
        disconnects: Arc::clone(&disconnects),
    });
    let app = Router::new()
        .route("/v1/deliver", get(deliver))
        .with_state(state);
    MockDeliver {
        addr: serve(app).await,
        seeks,
        disconnects,
    }
}

/// Config naming `peers` (name, endorsement address, optional event address)
/// and an optional orderer.
pub fn client_config(
    peers: &[(&str, SocketAddr, Option<SocketAddr>)],
    orderer: Option<SocketAddr>,
    min_endorsements: usize,
) -> ClientConfig {
    let mut config = ClientConfig::default();
    config.identity.msp_id = "Org1MSP".into();
    config.channel.channel_id = "mychannel".into();
    config.channel.chaincode_name = "mycc".into();
    config.channel.chaincode_version = "1.0".into();
    config.endorsement.min_endorsements = min_endorsements;
    config.timeouts.connect_secs = 1;
    config.timeouts.request_secs = 1;
    config.peers = peers
        .iter()
        .map(|(name, addr, events)| PeerConfig {
            name: name.to_string(),
            address: format!("http://{}", addr),
            event_address: events.map(|e| format!("ws://{}", e)),
            tls_ca_path: None,
        })
        .collect();
    config.orderers = orderer
        .map(|addr| OrdererConfig {
            name: "orderer0".into(),
            address: format!("http://{}", addr),
            tls_ca_path: None,
        })
        .into_iter()
        .collect();
    config
}

pub fn ledger_client(config: ClientConfig) -> LedgerClient {
    let suite: Arc<dyn CryptoSuite> = Arc::new(EcdsaSuite::new());
    LedgerClient::new(config, client_identity(), suite).unwrap()
}

/// A full block whose envelopes carry `tx_ids`, all marked valid.
pub fn block_with_txs(number: u64, tx_ids: &[&str]) -> Block {
    let data = tx_ids
        .iter()
        .map(|tx_id| {
            let payload = Payload {
                header: Header {
                    header_type: HeaderType::EndorserTransaction,
                    channel_id: "mychannel".into(),
                    tx_id: tx_id.to_string(),
                    timestamp_ms: 0,
                    creator: vec![],
                    nonce: vec![],
                },
                data: vec![],
            };
            let envelope = Envelope {
                payload: codec::encode("payload", &payload).unwrap(),
                signature: vec![],
            };
            codec::encode("envelope", &envelope).unwrap()
        })
        .collect();
    Block {
        header: BlockHeader { number, previous_hash: vec![], data_hash: vec![] },
        data,
        metadata: BlockMetadata {
            tx_validation_codes: tx_ids.iter().map(|_| TxValidationCode::Valid).collect(),
        },
    }
}

//! Failure injection tests for endorsement fan-out.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use ledger_client::config::TimeoutConfig;
use ledger_client::endorsement::EndorsementCollector;
use ledger_client::error::{EndorsementFailure, Error};
use ledger_client::identity::EcdsaSuite;
use ledger_client::peer::PeerClient;
use ledger_client::proposal::{build_proposal, sign_proposal, ChainCode};
use ledger_client::protocol::messages::Status;

mod common;
use common::*;

/// One of the ways a peer can misbehave, chosen at random.
async fn random_peer() -> (std::net::SocketAddr, bool) {
    match rand::thread_rng().gen_range(0..5) {
        0 => (start_mock_peer(PeerBehavior::endorse("ok")).await.addr, true),
        1 => (start_mock_peer(PeerBehavior::http_error(500)).await.addr, false),
        2 => (start_mock_peer(PeerBehavior::reject(500)).await.addr, false),
        3 => {
            let slow = PeerBehavior::endorse("ok").delayed(Duration::from_secs(3));
            (start_mock_peer(slow).await.addr, false)
        }
        _ => (dead_address().await, false),
    }
}

#[tokio::test]
async fn test_collector_returns_one_entry_per_peer() {
    let timeouts = TimeoutConfig { connect_secs: 1, request_secs: 1 };
    let identity = client_identity();

    for round in 0..5 {
        let n = rand::thread_rng().gen_range(1..=6);
        let mut peers = Vec::with_capacity(n);
        for i in 0..n {
            let (addr, _) = random_peer().await;
            let config = ledger_client::config::PeerConfig {
                name: format!("peer{}-{}", round, i),
                address: format!("http://{}", addr),
                event_address: None,
                tls_ca_path: None,
            };
            peers.push(PeerClient::from_config(&config, &timeouts).unwrap());
        }

        let chaincode = ChainCode::new("mychannel", "mycc").with_args(["get", "k"]);
        let unsigned = build_proposal(&identity, &chaincode).unwrap();
        let signed = sign_proposal(&unsigned, &identity, &EcdsaSuite::new()).unwrap();

        let started = std::time::Instant::now();
        let set = EndorsementCollector::new()
            .collect(Arc::new(signed), &peers)
            .await
            .unwrap();

        assert_eq!(set.len(), n, "round {}", round);
        let expected: Vec<_> = peers.iter().map(|p| p.name()).collect();
        assert_eq!(set.peers(), expected);
        // Bounded by the per-call deadline, not by the slowest peer.
        assert!(started.elapsed() < Duration::from_millis(2500));
    }
}

#[tokio::test]
async fn test_invoke_outcome_accounts_for_every_peer() {
    for _ in 0..3 {
        let n = rand::thread_rng().gen_range(2..=5);
        let min = rand::thread_rng().gen_range(1..=n);
        let orderer = start_mock_orderer(Status::Success).await;

        let mut addrs = Vec::with_capacity(n);
        let mut healthy = 0;
        for _ in 0..n {
            let (addr, ok) = random_peer().await;
            healthy += usize::from(ok);
            addrs.push(addr);
        }
        let names: Vec<String> = (0..n).map(|i| format!("peer{}", i)).collect();
        let peers: Vec<_> = names
            .iter()
            .zip(&addrs)
            .map(|(name, addr)| (name.as_str(), *addr, None))
            .collect();

        let client = ledger_client(client_config(&peers, Some(orderer.addr), min));
        let chaincode = client.chaincode(["put", "k", "v"]);

        match client.invoke(&chaincode, None, None).await {
            Ok(response) => {
                assert!(healthy >= min);
                assert_eq!(response.endorsed_by.len(), healthy);
                assert_eq!(response.endorsed_by.len() + response.failures.len(), n);
                assert_eq!(orderer.received.lock().unwrap().len(), 1);
            }
            Err(Error::InsufficientEndorsements { required, received, failures }) => {
                assert!(healthy < min);
                assert_eq!(required, min);
                assert_eq!(received, healthy);
                assert_eq!(received + failures.len(), n);
                assert!(orderer.received.lock().unwrap().is_empty());
            }
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_slow_peer_does_not_block_quorum() {
    let fast = start_mock_peer(PeerBehavior::endorse("ok")).await;
    let slow = start_mock_peer(PeerBehavior::endorse("ok").delayed(Duration::from_secs(10))).await;
    let orderer = start_mock_orderer(Status::Success).await;

    let client = ledger_client(client_config(
        &[("fast", fast.addr, None), ("slow", slow.addr, None)],
        Some(orderer.addr),
        1,
    ));
    let chaincode = client.chaincode(["put", "k", "v"]);

    let started = std::time::Instant::now();
    let response = client.invoke(&chaincode, None, None).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(response.endorsed_by, vec!["fast"]);
    assert!(matches!(
        &response.failures[0].cause,
        EndorsementFailure::Transport(e) if e.is_timeout()
    ));
    assert_eq!(slow.calls.load(Ordering::SeqCst), 1);
}

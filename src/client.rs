//! Client facade over the transaction lifecycle.
//!
//! # Responsibilities
//! - Own the peer, orderer and event connections built from configuration
//! - Run the invoke flow: propose → endorse → assemble → submit
//! - Answer queries, including ledger system queries
//! - Open block subscriptions
//!
//! # Design Decisions
//! - Built from injected configuration; callers may hold several clients
//! - Connection names are unique; registering one twice is an error
//! - Submission returns once the orderer answers; finality is observed via `listen`

use std::path::Path;
use std::sync::Arc;

use crate::config::{validate_config, ClientConfig, ConfigError};
use crate::discovery::{EndorserResolver, StaticResolver};
use crate::endorsement::{EndorsementCollector, EndorsementSet, TransactionAssembler};
use crate::error::{EndorsementFailure, Error, PeerFailure, Result};
use crate::events::{CancelToken, EventListener, EventStream, SubscribeRequest};
use crate::identity::{suite_for, CryptoSuite, Identity};
use crate::observability::metrics::Metrics;
use crate::orderer::{OrdererClient, SubmitStatus};
use crate::peer::PeerClient;
use crate::proposal::{build_proposal, sign_proposal, ChainCode, QSCC};
use crate::protocol::codec;
use crate::protocol::messages::{Block, BlockchainInfo, ProcessedTransaction, Response};

/// Result of a successful invoke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeResponse {
    pub tx_id: String,
    /// Peers whose endorsements went to the orderer.
    pub endorsed_by: Vec<String>,
    /// Peers that did not contribute, with causes.
    pub failures: Vec<PeerFailure>,
}

/// One peer's answer to a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResponse {
    pub peer: String,
    pub tx_id: String,
    pub result: std::result::Result<Response, EndorsementFailure>,
}

impl QueryResponse {
    /// Response payload, if the peer answered successfully.
    pub fn payload(&self) -> Option<&[u8]> {
        self.result.as_ref().ok().map(|r| r.payload.as_slice())
    }
}

/// Ledger queries answered by the query system chaincode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemQuery {
    ChainInfo,
    BlockByNumber(u64),
    TransactionById(String),
}

impl SystemQuery {
    fn args(&self, channel_id: &str) -> Vec<String> {
        match self {
            SystemQuery::ChainInfo => vec!["GetChainInfo".into(), channel_id.into()],
            SystemQuery::BlockByNumber(n) => {
                vec!["GetBlockByNumber".into(), channel_id.into(), n.to_string()]
            }
            SystemQuery::TransactionById(id) => {
                vec!["GetTransactionByID".into(), channel_id.into(), id.clone()]
            }
        }
    }
}

/// Decoded answer to a [`SystemQuery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemQueryResult {
    ChainInfo(BlockchainInfo),
    Block(Block),
    Transaction(ProcessedTransaction),
}

/// Entry point for applications.
pub struct LedgerClient {
    config: Arc<ClientConfig>,
    identity: Arc<Identity>,
    crypto: Arc<dyn CryptoSuite>,
    peers: Vec<PeerClient>,
    orderers: Vec<OrdererClient>,
    listeners: Vec<EventListener>,
    resolver: Arc<dyn EndorserResolver>,
    collector: EndorsementCollector,
    assembler: TransactionAssembler,
    metrics: Metrics,
}

impl std::fmt::Debug for LedgerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerClient")
            .field("msp_id", &self.identity.msp_id())
            .field("channel", &self.config.channel.channel_id)
            .field("peers", &self.peers.iter().map(PeerClient::name).collect::<Vec<_>>())
            .field("orderers", &self.orderers.iter().map(OrdererClient::name).collect::<Vec<_>>())
            .finish()
    }
}

impl LedgerClient {
    /// Load the identity named by the configuration, then build the client.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let crypto: Arc<dyn CryptoSuite> = Arc::from(suite_for(&config.identity.crypto.family)?);
        let identity = Identity::from_msp_dir(
            config.identity.msp_id.clone(),
            Path::new(&config.identity.msp_config_path),
            crypto.as_ref(),
        )?;
        Self::new(config, identity, crypto)
    }

    /// Build a client with HTTP/WebSocket connections for every configured
    /// peer and orderer.
    pub fn new(config: ClientConfig, identity: Identity, crypto: Arc<dyn CryptoSuite>) -> Result<Self> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let identity = identity.into_shared();
        let resolver = Arc::new(StaticResolver::from_config(&config)?);
        let metrics = Metrics::from_config(&config.observability);
        let assembler = TransactionAssembler::new(
            config.endorsement.min_endorsements,
            config.endorsement.verify_signatures,
            Arc::clone(&crypto),
        )
        .with_metrics(metrics);

        let mut client = Self {
            config: Arc::new(config.clone()),
            identity,
            crypto,
            peers: Vec::new(),
            orderers: Vec::new(),
            listeners: Vec::new(),
            resolver,
            collector: EndorsementCollector::new().with_metrics(metrics),
            assembler,
            metrics,
        };

        for peer in &config.peers {
            let peer_client = PeerClient::from_config(peer, &config.timeouts)?.with_metrics(metrics);
            client = client.with_peer(peer_client)?;
            if peer.event_address.is_some() {
                let listener = EventListener::from_peer_config(
                    peer,
                    &config.timeouts,
                    &config.events,
                    Arc::clone(&client.identity),
                    Arc::clone(&client.crypto),
                )?
                .with_metrics(metrics);
                client = client.with_event_listener(listener)?;
            }
        }
        for orderer in &config.orderers {
            let orderer_client = OrdererClient::from_config(orderer, &config.timeouts)?.with_metrics(metrics);
            client = client.with_orderer(orderer_client)?;
        }

        tracing::info!(
            msp_id = %client.identity.msp_id(),
            channel = %client.config.channel.channel_id,
            peers = client.peers.len(),
            orderers = client.orderers.len(),
            "Ledger client initialized"
        );
        Ok(client)
    }

    /// Register a peer connection.
    pub fn with_peer(mut self, peer: PeerClient) -> Result<Self> {
        if self.peer(peer.name()).is_some() {
            return Err(Error::validation(format!("peer '{}' registered twice", peer.name())));
        }
        self.peers.push(peer);
        Ok(self)
    }

    /// Register an orderer connection. The first one is the default.
    pub fn with_orderer(mut self, orderer: OrdererClient) -> Result<Self> {
        if self.orderers.iter().any(|o| o.name() == orderer.name()) {
            return Err(Error::validation(format!(
                "orderer '{}' registered twice",
                orderer.name()
            )));
        }
        self.orderers.push(orderer);
        Ok(self)
    }

    /// Register an event source.
    pub fn with_event_listener(mut self, listener: EventListener) -> Result<Self> {
        if self.listener(listener.source()).is_some() {
            return Err(Error::validation(format!(
                "event source '{}' registered twice",
                listener.source()
            )));
        }
        self.listeners.push(listener);
        Ok(self)
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn EndorserResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Metrics switch shared by this client's peers, orderers and listeners.
    pub fn metrics(&self) -> Metrics {
        self.metrics
    }

    pub fn peer(&self, name: &str) -> Option<&PeerClient> {
        self.peers.iter().find(|p| p.name() == name)
    }

    pub fn listener(&self, name: &str) -> Option<&EventListener> {
        self.listeners.iter().find(|l| l.source() == name)
    }

    /// Descriptor for the configured chaincode with `args`.
    pub fn chaincode<I, A>(&self, args: I) -> ChainCode
    where
        I: IntoIterator<Item = A>,
        A: AsRef<[u8]>,
    {
        ChainCode::from_channel_config(&self.config.channel).with_args(args)
    }

    /// Endorse, assemble and submit. `targets` of `None` asks the resolver;
    /// `orderer` of `None` picks the first registered orderer.
    pub async fn invoke(
        &self,
        chaincode: &ChainCode,
        targets: Option<&[&str]>,
        orderer: Option<&str>,
    ) -> Result<InvokeResponse> {
        let orderer = self.orderer(orderer)?;
        let targets = self.targets(&chaincode.channel_id, targets).await?;

        let unsigned = build_proposal(&self.identity, chaincode)?;
        let signed = sign_proposal(&unsigned, &self.identity, self.crypto.as_ref())?;
        tracing::info!(
            tx_id = %unsigned.tx_id,
            chaincode = %chaincode.name,
            targets = targets.len(),
            "Invoking chaincode"
        );

        let set = self.collector.collect(Arc::new(signed), &targets).await?;
        let assembled = self.assembler.assemble(set, &unsigned.proposal, &self.identity)?;

        match orderer.submit(assembled.envelope).await? {
            SubmitStatus::Accepted => {
                tracing::info!(tx_id = %assembled.tx_id, orderer = %orderer.name(), "Transaction submitted");
                Ok(InvokeResponse {
                    tx_id: assembled.tx_id,
                    endorsed_by: assembled.endorsed_by,
                    failures: assembled.failures,
                })
            }
            SubmitStatus::Rejected { status, info } => {
                tracing::warn!(tx_id = %assembled.tx_id, ?status, info = %info, "Orderer rejected transaction");
                Err(Error::SubmissionRejected {
                    tx_id: assembled.tx_id,
                    status,
                    info,
                })
            }
        }
    }

    /// Evaluate on every target and return each peer's answer, dial order.
    pub async fn query(&self, chaincode: &ChainCode, targets: Option<&[&str]>) -> Result<Vec<QueryResponse>> {
        let targets = self.targets(&chaincode.channel_id, targets).await?;
        let unsigned = build_proposal(&self.identity, chaincode)?;
        let signed = sign_proposal(&unsigned, &self.identity, self.crypto.as_ref())?;
        tracing::debug!(tx_id = %unsigned.tx_id, chaincode = %chaincode.name, "Querying chaincode");

        let set = self.collector.collect(Arc::new(signed), &targets).await?;
        Ok(query_responses(set, unsigned.tx_id.as_str()))
    }

    /// Run a ledger query on one peer and decode the answer.
    pub async fn query_system(&self, peer: &str, query: SystemQuery) -> Result<SystemQueryResult> {
        let channel_id = self.config.channel.channel_id.clone();
        let chaincode = ChainCode::new(channel_id.clone(), QSCC).with_args(query.args(&channel_id));

        let mut responses = self.query(&chaincode, Some(&[peer][..])).await?;
        let response = responses
            .pop()
            .ok_or_else(|| Error::validation("no response from query target"))?;
        let payload = match response.result {
            Ok(r) => r.payload,
            Err(cause) => {
                return Err(Error::QueryFailed {
                    peer: response.peer,
                    cause,
                })
            }
        };

        Ok(match query {
            SystemQuery::ChainInfo => SystemQueryResult::ChainInfo(codec::decode("chain info", &payload)?),
            SystemQuery::BlockByNumber(_) => SystemQueryResult::Block(codec::decode("block", &payload)?),
            SystemQuery::TransactionById(_) => {
                SystemQueryResult::Transaction(codec::decode("processed transaction", &payload)?)
            }
        })
    }

    /// Current ledger height reported by `peer`.
    pub async fn block_height(&self, peer: &str) -> Result<u64> {
        match self.query_system(peer, SystemQuery::ChainInfo).await? {
            SystemQueryResult::ChainInfo(info) => Ok(info.height),
            _ => Err(Error::validation("unexpected system query result")),
        }
    }

    pub async fn block_by_number(&self, peer: &str, number: u64) -> Result<Block> {
        match self.query_system(peer, SystemQuery::BlockByNumber(number)).await? {
            SystemQueryResult::Block(block) => Ok(block),
            _ => Err(Error::validation("unexpected system query result")),
        }
    }

    /// Subscribe to block events. `peer` of `None` uses `events.peer`, then
    /// the first peer with an event address.
    pub async fn listen(
        &self,
        peer: Option<&str>,
        request: SubscribeRequest,
        cancel: CancelToken,
    ) -> Result<EventStream> {
        let name = peer.or(self.config.events.peer.as_deref());
        let listener = match name {
            Some(name) => self
                .listener(name)
                .ok_or_else(|| Error::validation(format!("no event source for peer '{}'", name)))?,
            None => self
                .listeners
                .first()
                .ok_or_else(|| Error::validation("no event source configured"))?,
        };
        listener.subscribe(request, cancel).await
    }

    fn orderer(&self, name: Option<&str>) -> Result<&OrdererClient> {
        match name {
            Some(name) => self
                .orderers
                .iter()
                .find(|o| o.name() == name)
                .ok_or_else(|| Error::validation(format!("unknown orderer '{}'", name))),
            None => self
                .orderers
                .first()
                .ok_or_else(|| Error::validation("no orderer configured")),
        }
    }

    async fn targets(&self, channel_id: &str, names: Option<&[&str]>) -> Result<Vec<PeerClient>> {
        match names {
            Some(names) => names
                .iter()
                .map(|name| {
                    self.peer(name)
                        .cloned()
                        .ok_or_else(|| Error::validation(format!("unknown peer '{}'", name)))
                })
                .collect(),
            None => {
                let resolved = self.resolver.endorsers(channel_id).await?;
                resolved
                    .iter()
                    .map(|config| match self.peer(&config.name) {
                        Some(peer) => Ok(peer.clone()),
                        None => PeerClient::from_config(config, &self.config.timeouts)
                            .map(|peer| peer.with_metrics(self.metrics))
                            .map_err(Error::from),
                    })
                    .collect()
            }
        }
    }
}

fn query_responses(set: EndorsementSet, tx_id: &str) -> Vec<QueryResponse> {
    set.into_iter()
        .map(|entry| {
            let result = match entry.outcome {
                Ok(resp) if resp.response.is_success() => Ok(resp.response),
                Ok(resp) => Err(EndorsementFailure::Rejected {
                    status: resp.response.status,
                    message: resp.response.message,
                }),
                Err(e) => Err(e),
            };
            QueryResponse {
                peer: entry.peer,
                tx_id: tx_id.to_string(),
                result,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OrdererConfig, PeerConfig};
    use crate::identity::{EcdsaSuite, PrivateKey};

    const TEST_PRIVATE_KEY: &str =
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn config() -> ClientConfig {
        let mut config = ClientConfig::default();
        config.identity.msp_id = "Org1MSP".into();
        config.channel.channel_id = "mychannel".into();
        config.channel.chaincode_name = "mycc".into();
        config.channel.chaincode_version = "1.0".into();
        config.peers = vec![PeerConfig {
            name: "peer0".into(),
            address: "http://127.0.0.1:7051".into(),
            event_address: Some("ws://127.0.0.1:7053".into()),
            tls_ca_path: None,
        }];
        config.orderers = vec![OrdererConfig {
            name: "orderer0".into(),
            address: "http://127.0.0.1:7050".into(),
            tls_ca_path: None,
        }];
        config
    }

    fn client(config: ClientConfig) -> Result<LedgerClient> {
        let suite = Arc::new(EcdsaSuite::new());
        let identity = Identity::from_private_key(
            "Org1MSP",
            PrivateKey::from_hex(TEST_PRIVATE_KEY).unwrap(),
            suite.as_ref(),
        )
        .unwrap();
        LedgerClient::new(config, identity, suite)
    }

    #[test]
    fn test_builds_connections_from_config() {
        let client = client(config()).unwrap();
        assert!(client.peer("peer0").is_some());
        assert!(client.listener("peer0").is_some());
        assert_eq!(client.orderer(None).unwrap().name(), "orderer0");

        let cc = client.chaincode(["invoke", "a", "b"]);
        assert_eq!(cc.channel_id, "mychannel");
        assert_eq!(cc.version, "1.0");
        assert_eq!(cc.args.len(), 3);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = config();
        config.peers.push(config.peers[0].clone());
        let err = client(config).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Validation(_))));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let client = client(config()).unwrap();
        let again = PeerClient::from_config(&config().peers[0], &Default::default()).unwrap();
        assert!(matches!(client.with_peer(again), Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_unknown_names() {
        let client = client(config()).unwrap();
        let cc = client.chaincode(["query", "a"]);
        assert!(matches!(
            client.invoke(&cc, Some(&["ghost"][..]), None).await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            client.invoke(&cc, None, Some("ghost")).await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            client.listen(Some("ghost"), SubscribeRequest::new("mychannel"), CancelToken::new()).await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_zero_targets_no_network() {
        let client = client(config()).unwrap();
        let cc = client.chaincode(["query", "a"]);
        let none: &[&str] = &[];
        let err = client.query(&cc, Some(none)).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(client.peer("peer0").unwrap().in_flight(), 0);
    }

    #[test]
    fn test_metrics_switch_is_per_client() {
        let mut quiet = config();
        quiet.observability.metrics_enabled = false;

        let silent = client(quiet).unwrap();
        let loud = client(config()).unwrap();
        assert!(!silent.metrics().is_enabled());
        assert!(loud.metrics().is_enabled());
    }

    #[test]
    fn test_system_query_args() {
        assert_eq!(SystemQuery::ChainInfo.args("ch"), vec!["GetChainInfo", "ch"]);
        assert_eq!(
            SystemQuery::BlockByNumber(7).args("ch"),
            vec!["GetBlockByNumber", "ch", "7"]
        );
        assert_eq!(
            SystemQuery::TransactionById("abc".into()).args("ch"),
            vec!["GetTransactionByID", "ch", "abc"]
        );
    }
}

//! Chaincode call descriptor.

use crate::config::ChannelConfig;
use crate::protocol::messages::{ChaincodeInvocation, ChaincodeType};

/// Name of the ledger query system chaincode.
pub const QSCC: &str = "qscc";

/// What to invoke, where. Value object, built per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainCode {
    pub channel_id: String,
    pub name: String,
    pub version: String,
    pub chaincode_type: ChaincodeType,
    pub args: Vec<Vec<u8>>,
}

impl ChainCode {
    pub fn new(channel_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            name: name.into(),
            version: String::new(),
            chaincode_type: ChaincodeType::Golang,
            args: Vec::new(),
        }
    }

    /// Descriptor for the configured default chaincode.
    pub fn from_channel_config(config: &ChannelConfig) -> Self {
        Self {
            channel_id: config.channel_id.clone(),
            name: config.chaincode_name.clone(),
            version: config.chaincode_version.clone(),
            chaincode_type: config.chaincode_type.parse().unwrap_or_default(),
            args: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_type(mut self, chaincode_type: ChaincodeType) -> Self {
        self.chaincode_type = chaincode_type;
        self
    }

    /// Replace the argument list; the first argument is the function name.
    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: AsRef<[u8]>,
    {
        self.args = args.into_iter().map(|a| a.as_ref().to_vec()).collect();
        self
    }

    pub(crate) fn invocation(&self) -> ChaincodeInvocation {
        ChaincodeInvocation {
            chaincode_type: self.chaincode_type,
            name: self.name.clone(),
            version: self.version.clone(),
            args: self.args.clone(),
        }
    }
}

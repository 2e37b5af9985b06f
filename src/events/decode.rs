//! Block decoding and filtering.

use async_trait::async_trait;

use crate::protocol::codec::{self, CodecError};
use crate::protocol::messages::{
    Block, Envelope, FilteredBlock, FilteredTransaction, Payload, TxValidationCode,
};

/// Shape of the events a subscription delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventMode {
    #[default]
    Full,
    /// Only (transaction id, validation code) pairs.
    Filtered,
}

impl EventMode {
    pub fn as_str(self) -> &'static str {
        match self {
            EventMode::Full => "full",
            EventMode::Filtered => "filtered",
        }
    }
}

/// Block as received from the source, before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawBlock {
    Full(Block),
    Filtered(FilteredBlock),
}

impl RawBlock {
    pub fn number(&self) -> u64 {
        match self {
            RawBlock::Full(b) => b.number(),
            RawBlock::Filtered(f) => f.number,
        }
    }
}

/// A full block with its transactions summarized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBlock {
    pub channel_id: String,
    pub block: Block,
    pub transactions: Vec<FilteredTransaction>,
}

/// One delivered event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockEvent {
    Full(DecodedBlock),
    Filtered(FilteredBlock),
}

impl BlockEvent {
    pub fn number(&self) -> u64 {
        match self {
            BlockEvent::Full(d) => d.block.number(),
            BlockEvent::Filtered(f) => f.number,
        }
    }

    /// Transaction ids and validation codes, in block order.
    pub fn transactions(&self) -> &[FilteredTransaction] {
        match self {
            BlockEvent::Full(d) => &d.transactions,
            BlockEvent::Filtered(f) => &f.transactions,
        }
    }

    /// Strip a full block down to its filtered form.
    pub fn into_filtered(self) -> FilteredBlock {
        match self {
            BlockEvent::Full(d) => FilteredBlock {
                channel_id: d.channel_id,
                number: d.block.number(),
                transactions: d.transactions,
            },
            BlockEvent::Filtered(f) => f,
        }
    }
}

/// Turns raw blocks into events. May be slow; callers run it concurrently.
#[async_trait]
pub trait BlockDecoder: Send + Sync {
    async fn decode(&self, raw: RawBlock) -> Result<BlockEvent, CodecError>;
}

/// Decodes envelope headers to recover transaction ids.
#[derive(Debug, Clone, Default)]
pub struct EnvelopeDecoder;

impl EnvelopeDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous decode of a full block.
    pub fn decode_block(block: Block) -> Result<DecodedBlock, CodecError> {
        let codes = &block.metadata.tx_validation_codes;
        let mut channel_id = String::new();
        let mut transactions = Vec::with_capacity(block.data.len());

        for (index, bytes) in block.data.iter().enumerate() {
            let envelope: Envelope = codec::decode("block envelope", bytes)?;
            let payload: Payload = codec::decode("envelope payload", &envelope.payload)?;
            if channel_id.is_empty() {
                channel_id = payload.header.channel_id.clone();
            }
            transactions.push(FilteredTransaction {
                tx_id: payload.header.tx_id,
                // Missing metadata means the committer never validated it.
                validation_code: codes
                    .get(index)
                    .copied()
                    .unwrap_or(TxValidationCode::InvalidOtherReason),
            });
        }

        Ok(DecodedBlock {
            channel_id,
            block,
            transactions,
        })
    }
}

#[async_trait]
impl BlockDecoder for EnvelopeDecoder {
    async fn decode(&self, raw: RawBlock) -> Result<BlockEvent, CodecError> {
        match raw {
            RawBlock::Full(block) => Self::decode_block(block).map(BlockEvent::Full),
            RawBlock::Filtered(filtered) => Ok(BlockEvent::Filtered(filtered)),
        }
    }
}

//! The canonical header encoding.

use crate::{CodecError, HeaderSchema, RawBlockHeader};
use alloy_primitives::{B256, Bytes, keccak256};
use alloy_rlp::Decodable;

/// A block header in the form stored by the bridge contract.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalHeader {
    /// The block hash reported by the source chain. It is not recomputed from `encoded`.
    pub block_hash: B256,
    /// The RLP list of the normalized header fields.
    pub encoded: Bytes,
}

impl CanonicalHeader {
    /// Encodes a [`RawBlockHeader`] into its canonical form.
    pub fn encode(raw: &RawBlockHeader) -> Result<Self, CodecError> {
        let (_, fields) = header_fields(raw)?;
        Ok(Self { block_hash: raw.hash, encoded: alloy_rlp::encode(&fields).into() })
    }

    /// Decodes `encoded` back into the normalized field list.
    pub fn fields(&self) -> Result<Vec<Bytes>, CodecError> {
        let mut buf = self.encoded.as_ref();
        let fields = Vec::<Bytes>::decode(&mut buf)?;
        if !buf.is_empty() {
            return Err(alloy_rlp::Error::UnexpectedLength.into());
        }
        Ok(fields)
    }

    /// Returns the [`HeaderSchema`] implied by the number of encoded fields.
    pub fn schema(&self) -> Result<HeaderSchema, CodecError> {
        match self.fields()?.len() {
            15 => Ok(HeaderSchema::Legacy),
            16 => Ok(HeaderSchema::London),
            attributes => Err(CodecError::EncodingMismatch { attributes }),
        }
    }

    /// Returns the keccak256 hash of the canonical encoding.
    pub fn content_hash(&self) -> B256 {
        keccak256(&self.encoded)
    }

    /// Returns `true` if the canonical encoding hashes to the source chain's block hash.
    ///
    /// This only holds for headers whose consensus encoding has exactly the fields of one of the
    /// two schemas; later forks append fields the canonical list does not carry.
    pub fn hash_matches(&self) -> bool {
        self.content_hash() == self.block_hash
    }
}

/// Builds the normalized canonical field list of a [`RawBlockHeader`].
///
/// Field order: parent hash, ommers hash, miner, state root, transactions root, receipts root,
/// logs bloom, difficulty, number, gas limit, gas used, timestamp, extra data, mix hash, nonce and,
/// for [`HeaderSchema::London`], the base fee.
pub fn header_fields(raw: &RawBlockHeader) -> Result<(HeaderSchema, Vec<Bytes>), CodecError> {
    let schema = raw.schema()?;
    let header = &raw.header;

    let mut fields = Vec::with_capacity(schema.field_count());
    fields.push(Bytes::copy_from_slice(header.parent_hash.as_slice()));
    fields.push(Bytes::copy_from_slice(header.ommers_hash.as_slice()));
    fields.push(Bytes::copy_from_slice(header.beneficiary.as_slice()));
    fields.push(Bytes::copy_from_slice(header.state_root.as_slice()));
    fields.push(Bytes::copy_from_slice(header.transactions_root.as_slice()));
    fields.push(Bytes::copy_from_slice(header.receipts_root.as_slice()));
    fields.push(Bytes::copy_from_slice(header.logs_bloom.as_slice()));
    fields.push(minimal_be(B256::from(header.difficulty).as_slice()));
    fields.push(minimal_be(&header.number.to_be_bytes()));
    fields.push(minimal_be(&header.gas_limit.to_be_bytes()));
    fields.push(minimal_be(&header.gas_used.to_be_bytes()));
    fields.push(minimal_be(&header.timestamp.to_be_bytes()));
    fields.push(header.extra_data.clone());
    fields.push(Bytes::copy_from_slice(header.mix_hash.as_slice()));
    fields.push(Bytes::copy_from_slice(header.nonce.as_slice()));

    if schema == HeaderSchema::London {
        let base_fee = header
            .base_fee_per_gas
            .ok_or(CodecError::MissingBaseFee { number: header.number })?;
        fields.push(minimal_be(&base_fee.to_be_bytes()));
    }

    Ok((schema, fields.into_iter().map(normalize_field).collect()))
}

/// Replaces a field serialized as `0x00` or `0x0000` with the empty byte string.
pub fn normalize_field(field: Bytes) -> Bytes {
    match field.as_ref() {
        [0] | [0, 0] => Bytes::new(),
        _ => field,
    }
}

/// Serializes a big-endian integer without leading zero bytes. Zero is kept as a single `0x00`
/// byte and left to [`normalize_field`].
fn minimal_be(bytes: &[u8]) -> Bytes {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len().saturating_sub(1));
    Bytes::copy_from_slice(&bytes[start..])
}

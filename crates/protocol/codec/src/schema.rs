//! Header layout selection.

use crate::CodecError;
use derive_more::Display;

/// The canonical field list used to encode a header.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderSchema {
    /// The 15 field header used before the base fee was introduced.
    #[display("legacy")]
    Legacy,
    /// The 16 field header with the base fee appended.
    #[display("london")]
    London,
}

impl HeaderSchema {
    /// The number of attributes in a JSON-RPC block record without a base fee.
    pub const LEGACY_ATTRIBUTE_COUNT: usize = 20;

    /// Selects the schema from the attribute count of a fetched block record.
    pub fn from_attribute_count(attributes: usize) -> Result<Self, CodecError> {
        if attributes < Self::LEGACY_ATTRIBUTE_COUNT {
            return Err(CodecError::EncodingMismatch { attributes });
        }
        if attributes == Self::LEGACY_ATTRIBUTE_COUNT { Ok(Self::Legacy) } else { Ok(Self::London) }
    }

    /// Returns the number of fields in the canonical list.
    pub const fn field_count(self) -> usize {
        match self {
            Self::Legacy => 15,
            Self::London => 16,
        }
    }
}

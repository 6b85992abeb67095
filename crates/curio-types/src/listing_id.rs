use crate::error::TypesError;
use std::fmt;
use std::str::FromStr;

/// 32-byte listing identity: the blake3 digest of the listed
/// content or domain name.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ListingId([u8; 32]);

impl ListingId {
    pub const LEN: usize = 32;

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hash arbitrary content into a listing identity.
    pub fn hash(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Identity of a domain-name listing.
    pub fn from_domain(domain: &str) -> Self {
        Self::hash(domain.as_bytes())
    }

    /// Create from a byte slice
    pub fn from_slice(slice: &[u8]) -> Result<Self, TypesError> {
        if slice.len() != Self::LEN {
            return Err(TypesError::InvalidListingIdLength(slice.len()));
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListingId(0x{})", hex::encode(self.0))
    }
}

impl FromStr for ListingId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped)?;
        Self::from_slice(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        let a = ListingId::from_domain("example.net");
        let b = ListingId::from_domain("example.net");
        let c = ListingId::from_domain("other.net");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_from_slice() {
        let id = ListingId::hash(b"content");
        let round = ListingId::from_slice(id.as_bytes()).unwrap();
        assert_eq!(id, round);

        assert!(ListingId::from_slice(&[0u8; 31]).is_err());
    }

    #[test]
    fn test_hex_roundtrip() {
        let id = ListingId::from_domain("claimthis.net");
        let parsed: ListingId = format!("0x{}", id.to_hex()).parse().unwrap();
        assert_eq!(parsed, id);
    }
}

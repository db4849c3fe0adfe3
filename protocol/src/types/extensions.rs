//! Extension bags.
//!
//! Nearly every operation ends in an `extensions` field that no released
//! protocol version has ever filled ([`Extensions`]). A few carry real
//! optional fields, declared with `extension_bag!`.

use serde::{Deserialize, Serialize};

use super::object_id::AccountId;
use crate::codec::{CodecError, Decode, Encode, Reader};

/// `future_extensions`: always the empty set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Extensions;

impl Encode for Extensions {
    fn encode(&self, out: &mut Vec<u8>) {
        out.push(0);
    }
}

impl Decode for Extensions {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        if reader.read_varint()? == 0 {
            return Ok(Extensions);
        }
        // No tag is known, so the first element's tag is the one to report.
        let offset = reader.offset();
        let tag = reader.read_varint()?;
        Err(CodecError::UnknownTag {
            offset,
            tag,
            type_name: "future_extensions",
        })
    }
}

impl Serialize for Extensions {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;
        serializer.serialize_seq(Some(0))?.end()
    }
}

impl<'de> Deserialize<'de> for Extensions {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<serde::de::IgnoredAny>::deserialize(deserializer)?;
        if !items.is_empty() {
            return Err(serde::de::Error::custom("unsupported extensions present"));
        }
        Ok(Extensions)
    }
}

extension_bag! {
    /// Extensions of `call_order_update`.
    pub struct CallOrderExtensions {
        /// Collateral ratio (1/1000) the position should be sold down to when
        /// margin called, instead of selling all of it.
        0 => target_collateral_ratio: u16,
    }
}

extension_bag! {
    /// Extensions of `asset_options`.
    pub struct AssetOptionsExtensions {
        /// Share of market fees paid to referrers, 1/100 of a percent.
        0 => reward_percent: u16,
        /// Registrars whose referrals may share market fees.
        1 => whitelist_market_fee_sharing: Vec<AccountId>,
        /// Fee charged to the taker side, 1/100 of a percent.
        2 => taker_fee_percent: u16,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_extensions() {
        assert_eq!(Extensions.to_bytes(), vec![0]);
        assert_eq!(serde_json::to_string(&Extensions).unwrap(), "[]");
        assert_eq!(Extensions::from_bytes(&[0]).unwrap(), Extensions);
        assert!(Extensions::from_bytes(&[1, 0]).is_err());
        assert!(serde_json::from_str::<Extensions>("[1]").is_err());
    }

    #[test]
    fn test_unknown_extension_reports_its_tag() {
        let err = Extensions::from_bytes(&[1, 3, 0]).unwrap_err();
        assert_eq!(
            err,
            CodecError::UnknownTag {
                offset: 1,
                tag: 3,
                type_name: "future_extensions",
            }
        );
    }

    #[test]
    fn test_empty_bag_is_empty_set() {
        let bag = CallOrderExtensions::default();
        assert!(bag.is_empty());
        assert_eq!(bag.to_bytes(), vec![0]);
        assert_eq!(serde_json::to_string(&bag).unwrap(), "[]");
    }

    #[test]
    fn test_target_collateral_ratio_is_tagged() {
        let bag = CallOrderExtensions {
            target_collateral_ratio: Some(1750),
        };
        // One element, tag 0, u16 little endian.
        assert_eq!(bag.to_bytes(), vec![1, 0, 0xd6, 0x06]);
        assert_eq!(CallOrderExtensions::from_bytes(&bag.to_bytes()).unwrap(), bag);
        assert_eq!(
            serde_json::to_string(&bag).unwrap(),
            r#"{"target_collateral_ratio":1750}"#
        );
    }

    #[test]
    fn test_bag_uses_index_order_not_insertion_order() {
        let bag = AssetOptionsExtensions {
            reward_percent: None,
            whitelist_market_fee_sharing: Some(vec![AccountId(9)]),
            taker_fee_percent: Some(10),
        };
        assert_eq!(bag.to_bytes(), vec![2, 1, 1, 9, 2, 10, 0]);
        assert_eq!(AssetOptionsExtensions::from_bytes(&bag.to_bytes()).unwrap(), bag);
    }

    #[test]
    fn test_unknown_extension_tag_is_rejected() {
        let err = CallOrderExtensions::from_bytes(&[1, 5, 0, 0]).unwrap_err();
        assert!(matches!(err, CodecError::UnknownTag { tag: 5, offset: 1, .. }));
    }

    #[test]
    fn test_bag_json_accepts_array_or_object() {
        let a: AssetOptionsExtensions = serde_json::from_str("[]").unwrap();
        assert!(a.is_empty());
        let b: AssetOptionsExtensions =
            serde_json::from_str(r#"{"taker_fee_percent": 25}"#).unwrap();
        assert_eq!(b.taker_fee_percent, Some(25));
        assert!(serde_json::from_str::<AssetOptionsExtensions>(r#"{"bogus": 1}"#).is_err());
    }
}

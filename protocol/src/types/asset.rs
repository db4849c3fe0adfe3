//! Asset and market-pegged asset options.

use super::amount::Price;
use super::extensions::{AssetOptionsExtensions, Extensions};
use super::object_id::{AccountId, AssetId};

/// Bits of `issuer_permissions` and `flags`.
pub mod asset_flags {
    pub const CHARGE_MARKET_FEE: u16 = 0x01;
    pub const WHITE_LIST: u16 = 0x02;
    pub const OVERRIDE_AUTHORITY: u16 = 0x04;
    pub const TRANSFER_RESTRICTED: u16 = 0x08;
    pub const DISABLE_FORCE_SETTLE: u16 = 0x10;
    pub const GLOBAL_SETTLE: u16 = 0x20;
    pub const DISABLE_CONFIDENTIAL: u16 = 0x40;
    pub const WITNESS_FED_ASSET: u16 = 0x80;
    pub const COMMITTEE_FED_ASSET: u16 = 0x100;
}

graphene_object! {
    /// Options every asset has.
    pub struct AssetOptions {
        #[serde(with = "crate::types::int_or_string")]
        pub max_supply: i64,
        pub market_fee_percent: u16,
        #[serde(with = "crate::types::int_or_string")]
        pub max_market_fee: i64,
        pub issuer_permissions: u16,
        pub flags: u16,
        pub core_exchange_rate: Price,
        pub whitelist_authorities: Vec<AccountId>,
        pub blacklist_authorities: Vec<AccountId>,
        pub whitelist_markets: Vec<AssetId>,
        pub blacklist_markets: Vec<AssetId>,
        pub description: String,
        #[serde(default)]
        pub extensions: AssetOptionsExtensions,
    }
}

impl AssetOptions {
    /// Sets are sorted on chain. Call before encoding options built by hand.
    pub fn normalize(&mut self) {
        for set in [&mut self.whitelist_authorities, &mut self.blacklist_authorities] {
            set.sort();
            set.dedup();
        }
        for set in [&mut self.whitelist_markets, &mut self.blacklist_markets] {
            set.sort();
            set.dedup();
        }
    }

    /// Checks that `flags` only uses bits the issuer is permitted to use and
    /// that the market fee is a valid percentage.
    pub fn validate(&self) -> Result<(), String> {
        if self.market_fee_percent > crate::config::HUNDRED_PERCENT {
            return Err(format!(
                "market_fee_percent {} exceeds 100%",
                self.market_fee_percent
            ));
        }
        if self.max_supply <= 0 {
            return Err("max_supply must be positive".to_string());
        }
        // Feed-source bits are not permissions, so they don't need to be granted.
        let feed_bits = asset_flags::WITNESS_FED_ASSET | asset_flags::COMMITTEE_FED_ASSET;
        let ungranted = self.flags & !self.issuer_permissions & !feed_bits;
        if ungranted != 0 {
            return Err(format!("flags {ungranted:#x} set without the matching permission"));
        }
        Ok(())
    }
}

graphene_object! {
    /// Options of a market-pegged asset.
    pub struct BitAssetOptions {
        pub feed_lifetime_sec: u32,
        pub minimum_feeds: u8,
        pub force_settlement_delay_sec: u32,
        pub force_settlement_offset_percent: u16,
        pub maximum_force_settlement_volume: u16,
        pub short_backing_asset: AssetId,
        #[serde(default)]
        pub extensions: Extensions,
    }
}

impl Default for BitAssetOptions {
    /// The reference wallet's defaults for a new smartcoin.
    fn default() -> Self {
        Self {
            feed_lifetime_sec: 86_400,
            minimum_feeds: 7,
            force_settlement_delay_sec: 86_400,
            force_settlement_offset_percent: 100,
            maximum_force_settlement_volume: 50,
            short_backing_asset: AssetId::CORE,
            extensions: Extensions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Decode, Encode};
    use crate::types::AssetAmount;

    fn options() -> AssetOptions {
        AssetOptions {
            max_supply: 1_000_000_000,
            market_fee_percent: 0,
            max_market_fee: 0,
            issuer_permissions: asset_flags::CHARGE_MARKET_FEE | asset_flags::WHITE_LIST,
            flags: asset_flags::CHARGE_MARKET_FEE,
            core_exchange_rate: Price::new(
                AssetAmount::new(1, AssetId(0)),
                AssetAmount::new(1, AssetId(1)),
            ),
            whitelist_authorities: vec![AccountId(9), AccountId(2), AccountId(9)],
            blacklist_authorities: vec![],
            whitelist_markets: vec![],
            blacklist_markets: vec![],
            description: "test asset".to_string(),
            extensions: AssetOptionsExtensions::default(),
        }
    }

    #[test]
    fn test_roundtrip() {
        let mut o = options();
        o.normalize();
        assert_eq!(o.whitelist_authorities, vec![AccountId(2), AccountId(9)]);
        assert_eq!(AssetOptions::from_bytes(&o.to_bytes()).unwrap(), o);
    }

    #[test]
    fn test_validate_flags_against_permissions() {
        let mut o = options();
        assert!(o.validate().is_ok());
        o.flags |= asset_flags::OVERRIDE_AUTHORITY;
        assert!(o.validate().is_err());
        o.flags = asset_flags::WITNESS_FED_ASSET;
        assert!(o.validate().is_ok());
        o.market_fee_percent = 10_001;
        assert!(o.validate().is_err());
    }

    #[test]
    fn test_bitasset_defaults_roundtrip() {
        let b = BitAssetOptions::default();
        let bytes = b.to_bytes();
        // u32 + u8 + u32 + u16 + u16 + varint asset + empty extensions
        assert_eq!(bytes.len(), 4 + 1 + 4 + 2 + 2 + 1 + 1);
        assert_eq!(BitAssetOptions::from_bytes(&bytes).unwrap(), b);
    }

    #[test]
    fn test_json_accepts_string_supply() {
        let mut json = serde_json::to_value(options()).unwrap();
        json["max_supply"] = serde_json::json!("1000000000");
        let back: AssetOptions = serde_json::from_value(json).unwrap();
        assert_eq!(back.max_supply, 1_000_000_000);
    }
}

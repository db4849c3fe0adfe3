//! Amounts, prices and price feeds.

use super::object_id::AssetId;

graphene_object! {
    /// An amount of one asset, in the asset's smallest unit.
    ///
    /// Also doubles as every operation's `fee` field, where it starts life
    /// as a zero placeholder and is overwritten by the fee assembler.
    pub struct AssetAmount {
        #[serde(with = "crate::types::int_or_string")]
        pub amount: i64,
        pub asset_id: AssetId,
    }
}

impl AssetAmount {
    pub const fn new(amount: i64, asset_id: AssetId) -> Self {
        Self { amount, asset_id }
    }

    /// Zero of the core asset: the fee placeholder.
    pub const fn zero() -> Self {
        Self::new(0, AssetId::CORE)
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }
}

impl Default for AssetAmount {
    fn default() -> Self {
        Self::zero()
    }
}

graphene_object! {
    /// `base / quote`. Used as a market price and, reinterpreted, as the
    /// core exchange rate a fee pool converts at.
    pub struct Price {
        pub base: AssetAmount,
        pub quote: AssetAmount,
    }
}

impl Price {
    pub const fn new(base: AssetAmount, quote: AssetAmount) -> Self {
        Self { base, quote }
    }

    /// The same price seen from the other side of the market.
    pub fn invert(&self) -> Self {
        Self::new(self.quote.clone(), self.base.clone())
    }
}

graphene_object! {
    /// What a feed producer publishes for a market-pegged asset.
    pub struct PriceFeed {
        pub settlement_price: Price,
        /// Fixed point, 1/1000 (1750 = 175%).
        pub maintenance_collateral_ratio: u16,
        /// Fixed point, 1/1000.
        pub maximum_short_squeeze_ratio: u16,
        pub core_exchange_rate: Price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Decode, Encode};

    #[test]
    fn test_asset_amount_encoding() {
        let a = AssetAmount::new(100_000, AssetId(0));
        assert_eq!(hex::encode(a.to_bytes()), "a08601000000000000");
        assert_eq!(AssetAmount::from_bytes(&a.to_bytes()).unwrap(), a);
    }

    #[test]
    fn test_negative_amounts_roundtrip() {
        let a = AssetAmount::new(-1, AssetId(121));
        assert_eq!(AssetAmount::from_bytes(&a.to_bytes()).unwrap(), a);
    }

    #[test]
    fn test_asset_amount_json() {
        let a: AssetAmount =
            serde_json::from_str(r#"{"amount": "2500", "asset_id": "1.3.121"}"#).unwrap();
        assert_eq!(a, AssetAmount::new(2500, AssetId(121)));
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            r#"{"amount":2500,"asset_id":"1.3.121"}"#
        );
        assert!(serde_json::from_str::<AssetAmount>(r#"{"amount": 1, "asset_id": "1.2.0"}"#).is_err());
    }

    #[test]
    fn test_price_feed_field_order() {
        let cer = Price::new(AssetAmount::new(1, AssetId(1)), AssetAmount::new(2, AssetId(0)));
        let feed = PriceFeed {
            settlement_price: cer.invert(),
            maintenance_collateral_ratio: 1750,
            maximum_short_squeeze_ratio: 1100,
            core_exchange_rate: cer.clone(),
        };
        let bytes = feed.to_bytes();
        // Two prices of 18 bytes each plus two u16 ratios.
        assert_eq!(bytes.len(), 18 * 2 + 4);
        assert_eq!(&bytes[18..20], &1750u16.to_le_bytes());
        assert_eq!(PriceFeed::from_bytes(&bytes).unwrap(), feed);
    }
}

//! Serde adapters for the node's JSON quirks.

/// 64-bit integers that the node may print either as JSON numbers or, when
/// they exceed 2^53, as strings. We always write numbers and accept both.
pub mod int_or_string {
    use std::fmt::Display;
    use std::str::FromStr;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T: Serialize, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
        value.serialize(serializer)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr + Deserialize<'de>,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw<T> {
            Number(T),
            Text(String),
        }
        match Raw::<T>::deserialize(deserializer)? {
            Raw::Number(n) => Ok(n),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Holder {
        #[serde(with = "super::int_or_string")]
        value: i64,
        #[serde(with = "super::int_or_string")]
        big: u64,
    }

    #[test]
    fn test_numbers_and_strings_are_accepted() {
        let a: Holder = serde_json::from_str(r#"{"value": -5, "big": "18446744073709551615"}"#).unwrap();
        assert_eq!(a, Holder { value: -5, big: u64::MAX });
        let b: Holder = serde_json::from_str(r#"{"value": "100000", "big": 1}"#).unwrap();
        assert_eq!(b.value, 100_000);
        assert!(serde_json::from_str::<Holder>(r#"{"value": "ten", "big": 1}"#).is_err());
    }

    #[test]
    fn test_written_as_numbers() {
        let json = serde_json::to_string(&Holder { value: 7, big: 8 }).unwrap();
        assert_eq!(json, r#"{"value":7,"big":8}"#);
    }
}

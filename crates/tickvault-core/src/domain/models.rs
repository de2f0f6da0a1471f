use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// ISO-style three-letter currency code, uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        validate_currency_code(input).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(value: CurrencyCode) -> Self {
        value.0
    }
}

/// Company reference record as cached in `fundamentals/{symbol}/profile.json`.
///
/// Only the fields the index builders need are modelled; everything else in
/// the payload is ignored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub exchange_short_name: Option<String>,
    #[serde(default)]
    pub mkt_cap: Option<f64>,
}

impl Profile {
    /// Profiles are served as a JSON array; the first element is the record.
    pub fn from_payload(bytes: &[u8]) -> Result<Option<Self>, serde_json::Error> {
        let mut profiles: Vec<Profile> = serde_json::from_slice(bytes)?;
        if profiles.is_empty() {
            return Ok(None);
        }
        Ok(Some(profiles.swap_remove(0)))
    }

    /// Market cap usable for ranking: present and finite.
    pub fn ranking_market_cap(&self) -> Option<f64> {
        self.mkt_cap.filter(|value| value.is_finite())
    }
}

/// Index constituent record; only the ticker is consumed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConstituentEntry {
    pub symbol: String,
}

/// Currency catalog served by the FX provider's `/symbols` endpoint.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct FxCatalog {
    #[serde(default)]
    pub symbols: BTreeMap<String, serde_json::Value>,
}

impl FxCatalog {
    /// Valid currency codes in ascending order; malformed codes are dropped.
    pub fn currencies(&self) -> Vec<CurrencyCode> {
        self.symbols
            .keys()
            .filter_map(|code| CurrencyCode::parse(code).ok())
            .collect()
    }
}

pub fn validate_currency_code(input: &str) -> Result<String, ValidationError> {
    let normalized = input.trim().to_ascii_uppercase();
    let is_valid = normalized.len() == 3 && normalized.chars().all(|ch| ch.is_ascii_alphabetic());

    if !is_valid {
        return Err(ValidationError::InvalidCurrency {
            value: input.to_owned(),
        });
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_currency() {
        assert_eq!(
            validate_currency_code("usd").expect("must normalize"),
            "USD"
        );
        assert!(matches!(
            validate_currency_code("USDT"),
            Err(ValidationError::InvalidCurrency { .. })
        ));
    }

    #[test]
    fn profile_payload_takes_first_record_and_ignores_extra_fields() {
        let payload = br#"[{"symbol":"AAPL","companyName":"Apple Inc.",
            "exchange":"NASDAQ Global Select","exchangeShortName":"NASDAQ",
            "mktCap":2.5e12,"beta":1.2}]"#;
        let profile = Profile::from_payload(payload)
            .expect("valid json")
            .expect("one profile");

        assert_eq!(profile.company_name.as_deref(), Some("Apple Inc."));
        assert_eq!(profile.exchange_short_name.as_deref(), Some("NASDAQ"));
        assert_eq!(profile.ranking_market_cap(), Some(2.5e12));
    }

    #[test]
    fn empty_profile_payload_has_no_profile() {
        assert_eq!(Profile::from_payload(b"[]").expect("valid json"), None);
    }

    #[test]
    fn fx_catalog_lists_valid_currencies_sorted() {
        let catalog: FxCatalog = serde_json::from_str(
            r#"{"success":true,"symbols":{"USD":{"code":"USD"},"EUR":{"code":"EUR"},"XBTC":{}}}"#,
        )
        .expect("valid json");

        let codes: Vec<String> = catalog.currencies().into_iter().map(String::from).collect();
        assert_eq!(codes, vec!["EUR", "USD"]);
    }
}

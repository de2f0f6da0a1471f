use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::domain::{CurrencyCode, Symbol};
use crate::ValidationError;

/// Relative storage path identifying one cacheable unit of remote data.
///
/// The key doubles as the on-disk location below the cache root, so it is
/// validated to stay inside that root: no absolute paths, no `.`/`..` or
/// empty segments, no backslashes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceKey(String);

impl ResourceKey {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        if input.is_empty() {
            return Err(ValidationError::EmptyResourceKey);
        }

        let invalid = input.starts_with('/')
            || input.contains('\\')
            || input
                .split('/')
                .any(|segment| segment.is_empty() || segment == "." || segment == "..");
        if invalid {
            return Err(ValidationError::InvalidResourceKey {
                value: input.to_owned(),
            });
        }

        Ok(Self(input.to_owned()))
    }

    /// `fundamentals/{symbol}/{file_name}`
    pub fn fundamentals(symbol: &Symbol, file_name: &str) -> Self {
        Self(format!("fundamentals/{}/{}", symbol.path_segment(), file_name))
    }

    /// `info/{file_name}`
    pub fn info(file_name: &str) -> Result<Self, ValidationError> {
        Self::parse(&format!("info/{file_name}"))
    }

    /// `info/{file_name}` for file names known at compile time.
    pub(crate) fn info_static(file_name: &'static str) -> Self {
        debug_assert!(Self::info(file_name).is_ok(), "invalid static key {file_name}");
        Self(format!("info/{file_name}"))
    }

    /// `fxratefiles/symbols.json`
    pub fn fx_catalog() -> Self {
        Self(String::from("fxratefiles/symbols.json"))
    }

    /// `fxratefiles/{currency}_{year}.json`
    pub fn fx_chunk(currency: &CurrencyCode, year: i32) -> Self {
        Self(format!("fxratefiles/{}_{year}.json", currency.as_str()))
    }

    /// `info/exchanges/{exchange_code}`
    pub fn exchange_index(exchange_code: &str) -> Result<Self, ValidationError> {
        Self::parse(&format!("info/exchanges/{exchange_code}"))
    }

    /// `info/symbols/symbols.csv`
    pub fn search_index() -> Self {
        Self(String::from("info/symbols/symbols.csv"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path segments, in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl Display for ResourceKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for ResourceKey {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ResourceKey> for String {
    fn from(value: ResourceKey) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fundamentals_key_uses_encoded_symbol_directory() {
        let symbol = Symbol::parse("^GSPC").expect("valid");
        let key = ResourceKey::fundamentals(&symbol, "profile.json");
        assert_eq!(key.as_str(), "fundamentals/%5EGSPC/profile.json");
    }

    #[test]
    fn fundamentals_key_keeps_ampersand_and_equals_in_directory() {
        let symbol = Symbol::parse("M&M.NS").expect("valid");
        let key = ResourceKey::fundamentals(&symbol, "profile.json");
        assert_eq!(key.as_str(), "fundamentals/M&M.NS/profile.json");

        let pair = Symbol::parse("EURUSD=X").expect("valid");
        let key = ResourceKey::fundamentals(&pair, "ratios.json");
        assert_eq!(key.as_str(), "fundamentals/EURUSD=X/ratios.json");
    }

    #[test]
    fn fx_chunk_key_includes_currency_and_year() {
        let eur = CurrencyCode::parse("EUR").expect("valid");
        assert_eq!(ResourceKey::fx_chunk(&eur, 2004).as_str(), "fxratefiles/EUR_2004.json");
    }

    #[test]
    fn rejects_keys_escaping_the_root() {
        for value in ["/etc/passwd", "info/../secret", "info//x", "./info", "info\\x"] {
            let err = ResourceKey::parse(value).expect_err(value);
            assert!(matches!(err, ValidationError::InvalidResourceKey { .. }));
        }
        assert_eq!(ResourceKey::parse(""), Err(ValidationError::EmptyResourceKey));
    }

    #[test]
    fn info_key_keeps_special_characters_in_file_name() {
        let key = ResourceKey::info("s&p500_price.json").expect("valid");
        assert_eq!(key.as_str(), "info/s&p500_price.json");
    }
}

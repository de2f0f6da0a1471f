//! Static exchange catalog used to group index files by region and market.

use serde::Serialize;

use MarketType::{Developed, Developing};
use Region::{Americas, AsiaPacific, Europe, MiddleEastAfrica, UnitedStates};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    UnitedStates,
    Europe,
    AsiaPacific,
    Americas,
    MiddleEastAfrica,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketType {
    Developed,
    Developing,
}

/// One exchange short code as reported in `exchangeShortName`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Exchange {
    pub code: &'static str,
    pub region: Region,
    pub market: MarketType,
}

const fn exchange(code: &'static str, region: Region, market: MarketType) -> Exchange {
    Exchange {
        code,
        region,
        market,
    }
}

/// Catalog order is the order symbols are read back by the search index.
pub const EXCHANGES: &[Exchange] = &[
    exchange("NYSE", UnitedStates, Developed),
    exchange("NASDAQ", UnitedStates, Developed),
    exchange("AMEX", UnitedStates, Developed),
    exchange("OTC", UnitedStates, Developed),
    exchange("TSX", Americas, Developed),
    exchange("LSE", Europe, Developed),
    exchange("XETRA", Europe, Developed),
    exchange("EURONEXT", Europe, Developed),
    exchange("SIX", Europe, Developed),
    exchange("MIL", Europe, Developed),
    exchange("MCE", Europe, Developed),
    exchange("STO", Europe, Developed),
    exchange("OSL", Europe, Developed),
    exchange("CPH", Europe, Developed),
    exchange("HEL", Europe, Developed),
    exchange("VIE", Europe, Developed),
    exchange("BRU", Europe, Developed),
    exchange("ASX", AsiaPacific, Developed),
    exchange("NZE", AsiaPacific, Developed),
    exchange("JPX", AsiaPacific, Developed),
    exchange("HKSE", AsiaPacific, Developed),
    exchange("SES", AsiaPacific, Developed),
    exchange("TLV", MiddleEastAfrica, Developed),
    exchange("NSE", AsiaPacific, Developing),
    exchange("BSE", AsiaPacific, Developing),
    exchange("SHH", AsiaPacific, Developing),
    exchange("SHZ", AsiaPacific, Developing),
    exchange("KSC", AsiaPacific, Developing),
    exchange("KOE", AsiaPacific, Developing),
    exchange("TAI", AsiaPacific, Developing),
    exchange("TWO", AsiaPacific, Developing),
    exchange("SAO", Americas, Developing),
    exchange("MEX", Americas, Developing),
    exchange("JNB", MiddleEastAfrica, Developing),
    exchange("SET", AsiaPacific, Developing),
    exchange("JKT", AsiaPacific, Developing),
    exchange("KLS", AsiaPacific, Developing),
    exchange("IST", Europe, Developing),
    exchange("WSE", Europe, Developing),
    exchange("BUD", Europe, Developing),
    exchange("PRA", Europe, Developing),
    exchange("ATH", Europe, Developing),
];

pub fn by_region(region: Region) -> impl Iterator<Item = &'static Exchange> {
    EXCHANGES.iter().filter(move |exchange| exchange.region == region)
}

pub fn by_market(market: MarketType) -> impl Iterator<Item = &'static Exchange> {
    EXCHANGES.iter().filter(move |exchange| exchange.market == market)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn us_region_is_the_four_domestic_venues() {
        let codes: Vec<&str> = by_region(UnitedStates).map(|e| e.code).collect();
        assert_eq!(codes, vec!["NYSE", "NASDAQ", "AMEX", "OTC"]);
    }

    #[test]
    fn developed_markets_include_us_and_exclude_developing() {
        let developed: Vec<&str> = by_market(Developed).map(|e| e.code).collect();
        assert!(developed.contains(&"NASDAQ"));
        assert!(developed.contains(&"LSE"));
        assert!(!developed.contains(&"NSE"));
        assert!(by_market(Developing).any(|e| e.code == "NSE"));
    }

    #[test]
    fn codes_are_unique() {
        let mut codes: Vec<&str> = EXCHANGES.iter().map(|e| e.code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), EXCHANGES.len());
    }
}

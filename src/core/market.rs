//! Static reference data for the market overview and the free fallback provider.

pub struct MarketCategory {
    pub name: &'static str,
    pub etfs: &'static [&'static str],
    pub description: &'static str,
    pub characteristics: &'static [&'static str],
}

pub const MARKET_CATEGORIES: &[MarketCategory] = &[
    MarketCategory {
        name: "Large Cap Equity",
        etfs: &["SPY", "VOO", "VTI"],
        description: "Track large-cap U.S. stocks, typically S&P 500 or total market",
        characteristics: &[
            "Low expense ratios",
            "High liquidity",
            "Broad diversification",
        ],
    },
    MarketCategory {
        name: "Technology",
        etfs: &["QQQ", "XLK", "ARKK"],
        description: "Focus on technology companies and innovation",
        characteristics: &[
            "Higher volatility",
            "Growth-oriented",
            "Innovation exposure",
        ],
    },
    MarketCategory {
        name: "International Developed",
        etfs: &["VEA", "IEFA", "EFA"],
        description: "Exposure to developed markets outside the U.S.",
        characteristics: &[
            "Geographic diversification",
            "Currency exposure",
            "Different market cycles",
        ],
    },
    MarketCategory {
        name: "Fixed Income",
        etfs: &["AGG", "BND", "TLT"],
        description: "Bond funds for income and portfolio stability",
        characteristics: &[
            "Lower volatility",
            "Income generation",
            "Interest rate sensitivity",
        ],
    },
    MarketCategory {
        name: "Emerging Markets",
        etfs: &["VWO", "EEM", "IEMG"],
        description: "Exposure to developing country markets",
        characteristics: &[
            "Higher risk/return",
            "Growth potential",
            "Currency volatility",
        ],
    },
    MarketCategory {
        name: "Sector Specific",
        etfs: &["XLF", "XLE", "XLV"],
        description: "Concentrated exposure to specific industry sectors",
        characteristics: &[
            "Sector concentration",
            "Targeted exposure",
            "Higher volatility",
        ],
    },
];

/// Grouping shown under the popular ETF grid.
pub const TOP_ETF_CATEGORIES: &[(&str, &[&str])] = &[
    ("Large Cap Equity", &["SPY", "VOO", "VTI"]),
    ("Technology", &["QQQ", "XLK", "ARKK"]),
    ("International", &["VEA", "VWO", "IEFA"]),
    ("Fixed Income", &["AGG", "BND", "TLT"]),
    ("Sector Specific", &["XLF", "XLE", "XLV"]),
];

/// Illustrative one-year category returns, in percent.
pub const CATEGORY_PERFORMANCE: &[(&str, f64)] = &[
    ("Large Cap Equity", 12.5),
    ("Technology", 18.3),
    ("International", 8.7),
    ("Fixed Income", 3.2),
    ("Emerging Markets", 15.1),
    ("Sector Specific", 11.8),
];

pub const MARKET_INSIGHTS: &[&str] = &[
    "Technology ETFs have shown strong performance with higher volatility",
    "Large-cap equity ETFs provide stable, diversified exposure to U.S. markets",
    "International ETFs offer geographic diversification beyond U.S. markets",
    "Fixed income ETFs can provide portfolio stability and income generation",
    "Emerging market ETFs offer growth potential with higher risk",
];

pub const RISK_DISCLAIMER: &str = "Past performance does not guarantee future results. ETF investments carry market risks including potential loss of principal.";

pub const INVESTMENT_DISCLAIMER: &str = "This analysis is for informational purposes only. Consider consulting with a financial advisor before making investment decisions.";

pub struct KnownEtf {
    pub symbol: &'static str,
    pub name: &'static str,
    pub issuer: &'static str,
    pub category: &'static str,
}

pub const KNOWN_ETFS: &[KnownEtf] = &[
    KnownEtf {
        symbol: "VTI",
        name: "Vanguard Total Stock Market ETF",
        issuer: "Vanguard",
        category: "Large Cap Equity",
    },
    KnownEtf {
        symbol: "VOO",
        name: "Vanguard S&P 500 ETF",
        issuer: "Vanguard",
        category: "Large Cap Equity",
    },
    KnownEtf {
        symbol: "SPY",
        name: "SPDR S&P 500 ETF Trust",
        issuer: "State Street",
        category: "Large Cap Equity",
    },
    KnownEtf {
        symbol: "QQQ",
        name: "Invesco QQQ Trust",
        issuer: "Invesco",
        category: "Technology",
    },
    KnownEtf {
        symbol: "ARKK",
        name: "ARK Innovation ETF",
        issuer: "ARK Invest",
        category: "Thematic",
    },
];

pub fn find_known_etf(symbol: &str) -> Option<&'static KnownEtf> {
    KNOWN_ETFS
        .iter()
        .find(|etf| etf.symbol.eq_ignore_ascii_case(symbol))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_known_etf_is_case_insensitive() {
        let etf = find_known_etf("qqq").expect("QQQ should be known");
        assert_eq!(etf.issuer, "Invesco");
        assert!(find_known_etf("XYZ").is_none());
    }

    #[test]
    fn test_every_market_category_lists_three_etfs() {
        assert_eq!(MARKET_CATEGORIES.len(), 6);
        for category in MARKET_CATEGORIES {
            assert_eq!(category.etfs.len(), 3, "{}", category.name);
            assert_eq!(category.characteristics.len(), 3, "{}", category.name);
        }
    }
}

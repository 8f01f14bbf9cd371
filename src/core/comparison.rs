//! Comparison calculations across normalized ETF records.
//!
//! Everything here is a pure function of its inputs. Weights are percentages
//! and a missing weight counts as zero.
use crate::core::etf::{EtfRecord, Holding};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlappingHolding {
    pub ticker: String,
    pub company_name: String,
    pub sector: String,
    pub weight_etf1: f64,
    pub weight_etf2: f64,
    pub weight_difference: f64,
}

fn ticker_key(holding: &Holding) -> Option<String> {
    let ticker = holding.ticker.trim();
    (!ticker.is_empty()).then(|| ticker.to_uppercase())
}

/// First holding per upper-cased ticker, preserving list order.
fn index_by_ticker(holdings: &[Holding]) -> HashMap<String, &Holding> {
    let mut index = HashMap::new();
    for holding in holdings {
        if let Some(key) = ticker_key(holding) {
            index.entry(key).or_insert(holding);
        }
    }
    index
}

fn ticker_set(holdings: &[Holding]) -> HashSet<String> {
    holdings.iter().filter_map(ticker_key).collect()
}

pub fn find_overlapping_holdings(
    holdings1: &[Holding],
    holdings2: &[Holding],
) -> Vec<OverlappingHolding> {
    if holdings1.is_empty() || holdings2.is_empty() {
        return Vec::new();
    }

    let index1 = index_by_ticker(holdings1);
    let index2 = index_by_ticker(holdings2);

    let mut overlaps: Vec<OverlappingHolding> = index1
        .iter()
        .filter_map(|(ticker, h1)| index2.get(ticker).map(|h2| (ticker, *h1, *h2)))
        .map(|(ticker, h1, h2)| {
            let weight_etf1 = h1.weight.unwrap_or(0.0);
            let weight_etf2 = h2.weight.unwrap_or(0.0);
            OverlappingHolding {
                ticker: ticker.clone(),
                company_name: h1
                    .company_name
                    .clone()
                    .or_else(|| h2.company_name.clone())
                    .unwrap_or_else(|| "N/A".to_string()),
                sector: h1
                    .sector
                    .clone()
                    .or_else(|| h2.sector.clone())
                    .unwrap_or_else(|| "N/A".to_string()),
                weight_etf1,
                weight_etf2,
                weight_difference: (weight_etf1 - weight_etf2).abs(),
            }
        })
        .collect();

    overlaps.sort_by(|a, b| {
        b.weight_difference
            .total_cmp(&a.weight_difference)
            .then_with(|| a.ticker.cmp(&b.ticker))
    });
    overlaps
}

/// Shared tickers as a share of all distinct tickers, in percent.
pub fn calculate_portfolio_overlap(holdings1: &[Holding], holdings2: &[Holding]) -> f64 {
    if holdings1.is_empty() || holdings2.is_empty() {
        return 0.0;
    }

    let tickers1 = ticker_set(holdings1);
    let tickers2 = ticker_set(holdings2);
    let union = tickers1.union(&tickers2).count();
    if union == 0 {
        return 0.0;
    }
    let shared = tickers1.intersection(&tickers2).count();
    round_to(shared as f64 / union as f64 * 100.0, 2)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorDelta {
    pub etf1_weight: f64,
    pub etf2_weight: f64,
    pub difference: f64,
    pub relative_difference: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorComparison {
    pub sectors: BTreeMap<String, SectorDelta>,
    pub similarity_score: f64,
    pub total_sectors: usize,
    pub common_sectors: usize,
}

pub fn compare_sector_allocations(
    sector1: &BTreeMap<String, f64>,
    sector2: &BTreeMap<String, f64>,
) -> Option<SectorComparison> {
    if sector1.is_empty() && sector2.is_empty() {
        return None;
    }

    let all_sectors: BTreeSet<&String> = sector1.keys().chain(sector2.keys()).collect();
    let mut sectors = BTreeMap::new();
    let mut total_difference = 0.0;

    for sector in &all_sectors {
        let weight1 = sector1.get(*sector).copied().unwrap_or(0.0);
        let weight2 = sector2.get(*sector).copied().unwrap_or(0.0);
        let difference = (weight1 - weight2).abs();
        total_difference += difference;

        let larger = weight1.max(weight2);
        let relative_difference = if larger > 0.0 {
            difference / larger.max(1.0) * 100.0
        } else {
            0.0
        };

        sectors.insert(
            (*sector).clone(),
            SectorDelta {
                etf1_weight: weight1,
                etf2_weight: weight2,
                difference,
                relative_difference,
            },
        );
    }

    let similarity_score = (100.0 - total_difference / all_sectors.len() as f64).max(0.0);

    Some(SectorComparison {
        sectors,
        similarity_score: round_to(similarity_score, 2),
        total_sectors: all_sectors.len(),
        common_sectors: sector1.keys().filter(|k| sector2.contains_key(*k)).count(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseComparison {
    pub etf1_expense_ratio: Option<f64>,
    pub etf2_expense_ratio: Option<f64>,
    pub difference: Option<f64>,
    pub cheaper_etf: Option<String>,
    pub savings_basis_points: Option<f64>,
}

pub fn compare_expense_ratios(etf1: &EtfRecord, etf2: &EtfRecord) -> ExpenseComparison {
    let (Some(expense1), Some(expense2)) = (etf1.expense_ratio, etf2.expense_ratio) else {
        return ExpenseComparison {
            etf1_expense_ratio: etf1.expense_ratio,
            etf2_expense_ratio: etf2.expense_ratio,
            difference: None,
            cheaper_etf: None,
            savings_basis_points: None,
        };
    };

    let difference = (expense1 - expense2).abs();
    let cheaper = if expense1 < expense2 { etf1 } else { etf2 };

    ExpenseComparison {
        etf1_expense_ratio: Some(expense1),
        etf2_expense_ratio: Some(expense2),
        difference: Some(round_to(difference, 4)),
        cheaper_etf: Some(cheaper.symbol.clone()),
        savings_basis_points: Some(round_to(difference * 100.0, 2)),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AumComparison {
    pub etf1_aum: Option<String>,
    pub etf2_aum: Option<String>,
    pub etf1_aum_numeric: Option<f64>,
    pub etf2_aum_numeric: Option<f64>,
    pub larger_etf: Option<String>,
    pub size_ratio: Option<f64>,
}

pub fn compare_aum(etf1: &EtfRecord, etf2: &EtfRecord) -> AumComparison {
    let aum1 = etf1.aum.as_ref().and_then(|a| a.numeric());
    let aum2 = etf2.aum.as_ref().and_then(|a| a.numeric());

    let mut comparison = AumComparison {
        etf1_aum: etf1.aum.as_ref().map(ToString::to_string),
        etf2_aum: etf2.aum.as_ref().map(ToString::to_string),
        etf1_aum_numeric: aum1,
        etf2_aum_numeric: aum2,
        larger_etf: None,
        size_ratio: None,
    };

    if let (Some(a1), Some(a2)) = (aum1, aum2) {
        let larger = if a1 > a2 { etf1 } else { etf2 };
        comparison.larger_etf = Some(larger.symbol.clone());
        let smaller = a1.min(a2);
        if smaller > 0.0 {
            comparison.size_ratio = Some(round_to(a1.max(a2) / smaller, 2));
        }
    }
    comparison
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSummary {
    pub etf1_symbol: String,
    pub etf2_symbol: String,
    pub portfolio_overlap: f64,
    pub sector_comparison: Option<SectorComparison>,
    pub expense_ratio_comparison: ExpenseComparison,
    pub aum_comparison: AumComparison,
    pub overlapping_holdings: Vec<OverlappingHolding>,
}

pub fn generate_comparison_summary(etf1: &EtfRecord, etf2: &EtfRecord) -> ComparisonSummary {
    ComparisonSummary {
        etf1_symbol: etf1.symbol.clone(),
        etf2_symbol: etf2.symbol.clone(),
        portfolio_overlap: calculate_portfolio_overlap(&etf1.holdings, &etf2.holdings),
        sector_comparison: compare_sector_allocations(
            &etf1.sector_allocation,
            &etf2.sector_allocation,
        ),
        expense_ratio_comparison: compare_expense_ratios(etf1, etf2),
        aum_comparison: compare_aum(etf1, etf2),
        overlapping_holdings: find_overlapping_holdings(&etf1.holdings, &etf2.holdings),
    }
}

pub fn investment_considerations(
    summary: &ComparisonSummary,
    etf1: &EtfRecord,
    etf2: &EtfRecord,
) -> Vec<String> {
    let mut considerations = Vec::new();

    if let Some(cheaper) = &summary.expense_ratio_comparison.cheaper_etf {
        considerations.push(format!(
            "{cheaper} has a lower expense ratio, potentially saving on long-term costs"
        ));
    }
    if let Some(larger) = &summary.aum_comparison.larger_etf {
        considerations.push(format!(
            "{larger} has larger assets under management, typically indicating higher liquidity"
        ));
    }

    if summary.portfolio_overlap > 70.0 {
        considerations.push(
            "High portfolio overlap suggests similar investment exposure - consider diversification benefits"
                .to_string(),
        );
    } else if summary.portfolio_overlap < 30.0 {
        considerations.push(
            "Low portfolio overlap suggests good diversification potential when combined"
                .to_string(),
        );
    }

    if let (Some(vol1), Some(vol2)) = (etf1.performance.volatility, etf2.performance.volatility) {
        if (vol1 - vol2).abs() > 5.0 {
            let lower = if vol1 < vol2 { etf1 } else { etf2 };
            considerations.push(format!(
                "{} shows lower volatility, potentially suitable for risk-averse investors",
                lower.symbol
            ));
        }
    }

    if considerations.is_empty() {
        considerations.push(
            "Detailed comparison requires more complete data for comprehensive analysis"
                .to_string(),
        );
    }
    considerations
}

/// A ticker held by more than one of the compared ETFs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharedHolding {
    pub ticker: String,
    pub company_name: Option<String>,
    /// One entry per compared ETF, in input order. `None` when not held.
    pub weights: Vec<Option<f64>>,
}

impl SharedHolding {
    pub fn held_by(&self) -> usize {
        self.weights.iter().filter(|w| w.is_some()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiComparison {
    pub symbols: Vec<String>,
    /// `overlap_matrix[i][j]` is the portfolio overlap of ETF `i` and ETF `j`.
    pub overlap_matrix: Vec<Vec<f64>>,
    pub shared_holdings: Vec<SharedHolding>,
}

pub fn compare_many(records: &[EtfRecord]) -> MultiComparison {
    let overlap_matrix = records
        .iter()
        .map(|a| {
            records
                .iter()
                .map(|b| {
                    if std::ptr::eq(a, b) {
                        if a.holdings.is_empty() { 0.0 } else { 100.0 }
                    } else {
                        calculate_portfolio_overlap(&a.holdings, &b.holdings)
                    }
                })
                .collect()
        })
        .collect();

    let indexes: Vec<_> = records.iter().map(|r| index_by_ticker(&r.holdings)).collect();
    let all_tickers: BTreeSet<&String> = indexes.iter().flat_map(|idx| idx.keys()).collect();

    let mut shared_holdings: Vec<SharedHolding> = all_tickers
        .into_iter()
        .map(|ticker| SharedHolding {
            ticker: ticker.clone(),
            company_name: indexes
                .iter()
                .find_map(|idx| idx.get(ticker).and_then(|h| h.company_name.clone())),
            weights: indexes
                .iter()
                .map(|idx| idx.get(ticker).map(|h| h.weight.unwrap_or(0.0)))
                .collect(),
        })
        .filter(|shared| shared.held_by() > 1)
        .collect();

    shared_holdings.sort_by(|a, b| {
        b.held_by()
            .cmp(&a.held_by())
            .then_with(|| a.ticker.cmp(&b.ticker))
    });

    MultiComparison {
        symbols: records.iter().map(|r| r.symbol.clone()).collect(),
        overlap_matrix,
        shared_holdings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::etf::{Aum, DataSource};

    fn holding(ticker: &str, name: Option<&str>, weight: Option<f64>) -> Holding {
        Holding {
            ticker: ticker.to_string(),
            company_name: name.map(str::to_string),
            sector: None,
            weight,
            market_value: None,
        }
    }

    fn record(symbol: &str) -> EtfRecord {
        EtfRecord::new(symbol, symbol, DataSource::Limited)
    }

    #[test]
    fn test_overlapping_holdings_sorted_by_difference() {
        let h1 = vec![
            holding("AAPL", Some("Apple"), Some(7.0)),
            holding("msft", Some("Microsoft"), Some(6.0)),
            holding("XOM", None, Some(1.0)),
        ];
        let h2 = vec![
            holding("MSFT", None, Some(2.0)),
            holding("AAPL", None, Some(6.5)),
            holding("NVDA", None, Some(5.0)),
        ];

        let overlaps = find_overlapping_holdings(&h1, &h2);
        assert_eq!(overlaps.len(), 2);
        assert_eq!(overlaps[0].ticker, "MSFT");
        assert_eq!(overlaps[0].company_name, "Microsoft");
        assert_eq!(overlaps[0].weight_difference, 4.0);
        assert_eq!(overlaps[1].ticker, "AAPL");
        assert_eq!(overlaps[1].weight_difference, 0.5);
        assert_eq!(overlaps[1].sector, "N/A");
    }

    #[test]
    fn test_equal_weight_differences_order_by_ticker() {
        let h1 = vec![
            holding("VZ", None, Some(3.0)),
            holding("GOOG", None, Some(4.0)),
            holding("AMZN", None, Some(2.0)),
            holding("JPM", None, Some(1.5)),
        ];
        let h2 = vec![
            holding("JPM", None, Some(1.5)),
            holding("AMZN", None, Some(3.0)),
            holding("VZ", None, Some(2.0)),
            holding("GOOG", None, Some(3.0)),
        ];

        let tickers: Vec<String> = find_overlapping_holdings(&h1, &h2)
            .into_iter()
            .map(|o| o.ticker)
            .collect();
        assert_eq!(tickers, vec!["AMZN", "GOOG", "VZ", "JPM"]);
    }

    #[test]
    fn test_overlapping_holdings_uses_first_match_and_zero_for_missing_weight() {
        let h1 = vec![holding("SPY", None, None), holding("SPY", None, Some(9.0))];
        let h2 = vec![holding("spy", Some("SPDR"), Some(3.0))];

        let overlaps = find_overlapping_holdings(&h1, &h2);
        assert_eq!(overlaps.len(), 1);
        assert_eq!(overlaps[0].weight_etf1, 0.0);
        assert_eq!(overlaps[0].weight_etf2, 3.0);
        assert_eq!(overlaps[0].company_name, "SPDR");
    }

    #[test]
    fn test_overlap_empty_inputs() {
        let h = vec![holding("AAPL", None, Some(1.0))];
        assert!(find_overlapping_holdings(&[], &h).is_empty());
        assert!(find_overlapping_holdings(&h, &[]).is_empty());
        assert_eq!(calculate_portfolio_overlap(&[], &h), 0.0);
    }

    #[test]
    fn test_portfolio_overlap_percentage() {
        let h1 = vec![
            holding("A", None, None),
            holding("B", None, None),
            holding("C", None, None),
        ];
        let h2 = vec![holding("b", None, None), holding("C", None, None)];
        // 2 shared out of 3 distinct
        assert_eq!(calculate_portfolio_overlap(&h1, &h2), 66.67);
    }

    #[test]
    fn test_sector_comparison() {
        let s1 = BTreeMap::from([
            ("Technology".to_string(), 40.0),
            ("Health Care".to_string(), 10.0),
        ]);
        let s2 = BTreeMap::from([
            ("Technology".to_string(), 30.0),
            ("Energy".to_string(), 5.0),
        ]);

        let comparison = compare_sector_allocations(&s1, &s2).unwrap();
        assert_eq!(comparison.total_sectors, 3);
        assert_eq!(comparison.common_sectors, 1);
        // total diff 10 + 10 + 5 = 25 over 3 sectors
        assert_eq!(comparison.similarity_score, 91.67);

        let tech = &comparison.sectors["Technology"];
        assert_eq!(tech.difference, 10.0);
        assert_eq!(tech.relative_difference, 25.0);
        let energy = &comparison.sectors["Energy"];
        assert_eq!(energy.etf1_weight, 0.0);
        assert_eq!(energy.relative_difference, 100.0);
    }

    #[test]
    fn test_sector_comparison_small_weights_and_empty() {
        let s1 = BTreeMap::from([("Cash".to_string(), 0.5)]);
        let s2 = BTreeMap::from([("Cash".to_string(), 0.0)]);
        let comparison = compare_sector_allocations(&s1, &s2).unwrap();
        // divisor floors at 1
        assert_eq!(comparison.sectors["Cash"].relative_difference, 50.0);

        assert!(compare_sector_allocations(&BTreeMap::new(), &BTreeMap::new()).is_none());
    }

    #[test]
    fn test_similarity_score_floors_at_zero() {
        let s1 = BTreeMap::from([("A".to_string(), 500.0)]);
        let s2 = BTreeMap::new();
        let comparison = compare_sector_allocations(&s1, &s2).unwrap();
        assert_eq!(comparison.similarity_score, 0.0);
    }

    #[test]
    fn test_expense_ratio_comparison() {
        let mut vti = record("VTI");
        vti.expense_ratio = Some(0.03);
        let mut arkk = record("ARKK");
        arkk.expense_ratio = Some(0.75);

        let comparison = compare_expense_ratios(&vti, &arkk);
        assert_eq!(comparison.cheaper_etf.as_deref(), Some("VTI"));
        assert_eq!(comparison.difference, Some(0.72));
        assert_eq!(comparison.savings_basis_points, Some(72.0));

        arkk.expense_ratio = None;
        let comparison = compare_expense_ratios(&vti, &arkk);
        assert!(comparison.cheaper_etf.is_none());
        assert!(comparison.difference.is_none());
        assert_eq!(comparison.etf1_expense_ratio, Some(0.03));
    }

    #[test]
    fn test_expense_ratio_tie_picks_second() {
        let mut a = record("AAA");
        a.expense_ratio = Some(0.1);
        let mut b = record("BBB");
        b.expense_ratio = Some(0.1);
        assert_eq!(
            compare_expense_ratios(&a, &b).cheaper_etf.as_deref(),
            Some("BBB")
        );
    }

    #[test]
    fn test_aum_comparison() {
        let mut spy = record("SPY");
        spy.aum = Some(Aum::Label("$500B".to_string()));
        let mut arkk = record("ARKK");
        arkk.aum = Some(Aum::Amount(6_250_000_000.0));

        let comparison = compare_aum(&spy, &arkk);
        assert_eq!(comparison.larger_etf.as_deref(), Some("SPY"));
        assert_eq!(comparison.size_ratio, Some(80.0));
        assert_eq!(comparison.etf1_aum.as_deref(), Some("$500B"));

        arkk.aum = Some(Aum::Label("N/A".to_string()));
        let comparison = compare_aum(&spy, &arkk);
        assert!(comparison.larger_etf.is_none());
        assert!(comparison.size_ratio.is_none());
    }

    #[test]
    fn test_aum_zero_has_no_ratio() {
        let mut a = record("AAA");
        a.aum = Some(Aum::Amount(0.0));
        let mut b = record("BBB");
        b.aum = Some(Aum::Amount(10.0));
        let comparison = compare_aum(&a, &b);
        assert_eq!(comparison.larger_etf.as_deref(), Some("BBB"));
        assert!(comparison.size_ratio.is_none());
    }

    #[test]
    fn test_considerations() {
        let mut vti = record("VTI");
        vti.expense_ratio = Some(0.03);
        vti.performance.volatility = Some(15.0);
        vti.holdings = vec![holding("AAPL", None, Some(6.0))];
        let mut voo = record("VOO");
        voo.expense_ratio = Some(0.04);
        voo.performance.volatility = Some(25.0);
        voo.holdings = vec![holding("AAPL", None, Some(7.0))];

        let summary = generate_comparison_summary(&vti, &voo);
        assert_eq!(summary.portfolio_overlap, 100.0);

        let considerations = investment_considerations(&summary, &vti, &voo);
        assert_eq!(considerations.len(), 3);
        assert!(considerations[0].starts_with("VTI has a lower expense ratio"));
        assert!(considerations[1].starts_with("High portfolio overlap"));
        assert!(considerations[2].starts_with("VTI shows lower volatility"));
    }

    #[test]
    fn test_considerations_fallback_line() {
        let a = record("AAA");
        let b = record("BBB");
        let mut summary = generate_comparison_summary(&a, &b);
        // sits between the overlap thresholds
        summary.portfolio_overlap = 50.0;
        let considerations = investment_considerations(&summary, &a, &b);
        assert_eq!(considerations.len(), 1);
        assert!(considerations[0].starts_with("Detailed comparison requires"));
    }

    #[test]
    fn test_compare_many() {
        let mut a = record("AAA");
        a.holdings = vec![
            holding("AAPL", Some("Apple"), Some(5.0)),
            holding("MSFT", None, Some(4.0)),
        ];
        let mut b = record("BBB");
        b.holdings = vec![holding("AAPL", None, Some(3.0)), holding("XOM", None, None)];
        let mut c = record("CCC");
        c.holdings = vec![
            holding("MSFT", None, Some(1.0)),
            holding("AAPL", None, Some(2.0)),
        ];

        let multi = compare_many(&[a, b, c]);
        assert_eq!(multi.symbols, vec!["AAA", "BBB", "CCC"]);
        assert_eq!(multi.overlap_matrix[0][0], 100.0);
        assert_eq!(multi.overlap_matrix[0][1], 33.33);
        assert_eq!(multi.overlap_matrix[0][2], 100.0);
        assert_eq!(multi.overlap_matrix[1][0], multi.overlap_matrix[0][1]);

        assert_eq!(multi.shared_holdings.len(), 2);
        let aapl = &multi.shared_holdings[0];
        assert_eq!(aapl.ticker, "AAPL");
        assert_eq!(aapl.company_name.as_deref(), Some("Apple"));
        assert_eq!(aapl.weights, vec![Some(5.0), Some(3.0), Some(2.0)]);
        let msft = &multi.shared_holdings[1];
        assert_eq!(msft.weights, vec![Some(4.0), None, Some(1.0)]);
    }
}

use std::collections::HashMap;
use tracing::debug;

use crate::models::{
    catalog::PriceList,
    student::{PurchaseLine, Purchases},
};

/// Lines and grand total computed from one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Purchase {
    pub lines: Purchases,
    pub total: u64,
}

impl Purchase {
    /// An empty purchase must never be stored.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Walks `prices` in catalog order and emits a line for every item whose
/// submitted quantity parses to a positive integer. Unparsable, zero or
/// negative quantities skip that item only. Submitted items that are not in
/// `prices` are ignored.
pub fn calculate_purchase(prices: &PriceList, quantities: &HashMap<String, String>) -> Purchase {
    let mut purchase = Purchase::default();

    for (item, &unit_price) in prices {
        let Some(quantity) = quantities.get(item).and_then(|raw| parse_quantity(raw)) else {
            continue;
        };

        let Some(line_total) = quantity.checked_mul(unit_price) else {
            debug!("Skipping '{}': line total overflows", item);
            continue;
        };
        let Some(total) = purchase.total.checked_add(line_total) else {
            debug!("Skipping '{}': purchase total overflows", item);
            continue;
        };

        purchase.lines.insert(
            item.clone(),
            PurchaseLine {
                quantity,
                unit_price,
                total: line_total,
            },
        );
        purchase.total = total;
    }

    purchase
}

/// Surrounding whitespace is tolerated, as is a leading sign.
fn parse_quantity(raw: &str) -> Option<u64> {
    match raw.trim().parse::<i64>() {
        Ok(quantity) if quantity > 0 => Some(quantity as u64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::{price_list, Catalog, CatalogSubset};

    fn quantities(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_single_item() {
        let prices = price_list(&[("Shirt", 75_000)]);
        let purchase = calculate_purchase(&prices, &quantities(&[("Shirt", "2")]));

        assert_eq!(purchase.total, 150_000);
        assert_eq!(
            purchase.lines.get("Shirt"),
            Some(&PurchaseLine {
                quantity: 2,
                unit_price: 75_000,
                total: 150_000
            })
        );
    }

    #[test]
    fn test_malformed_quantities_are_skipped_individually() {
        let prices = price_list(&[("A", 10), ("B", 20), ("C", 30), ("D", 40), ("E", 50)]);
        let purchase = calculate_purchase(
            &prices,
            &quantities(&[("A", "abc"), ("B", "3"), ("C", "0"), ("D", "-2"), ("E", " 1 ")]),
        );

        let items: Vec<&str> = purchase.lines.keys().map(|s| s.as_str()).collect();
        assert_eq!(items, vec!["B", "E"]);
        assert_eq!(purchase.total, 3 * 20 + 50);
    }

    #[test]
    fn test_items_outside_subset_are_ignored() {
        let catalog = Catalog::default();
        let form = quantities(&[("Jilbab Putih", "1"), ("Dasi Hitam", "1")]);

        let male = calculate_purchase(catalog.subset(CatalogSubset::Male), &form);
        assert_eq!(male.lines.len(), 1);
        assert!(male.lines.contains_key("Dasi Hitam"));
        assert_eq!(male.total, 20_000);

        let all = calculate_purchase(catalog.subset(CatalogSubset::All), &form);
        assert_eq!(all.lines.len(), 2);
        assert_eq!(all.total, 40_000);
    }

    #[test]
    fn test_lines_follow_catalog_order() {
        let prices = price_list(&[("Z", 1), ("A", 1), ("M", 1)]);
        let purchase = calculate_purchase(&prices, &quantities(&[("M", "1"), ("A", "1"), ("Z", "1")]));

        let items: Vec<&str> = purchase.lines.keys().map(|s| s.as_str()).collect();
        assert_eq!(items, vec!["Z", "A", "M"]);
    }

    #[test]
    fn test_no_selection_is_empty() {
        let prices = price_list(&[("A", 10)]);
        let purchase = calculate_purchase(&prices, &HashMap::new());

        assert!(purchase.is_empty());
        assert_eq!(purchase.total, 0);
    }

    #[test]
    fn test_total_is_sum_of_lines() {
        let catalog = Catalog::default();
        let form: HashMap<String, String> = catalog
            .all()
            .keys()
            .enumerate()
            .map(|(i, item)| (item.clone(), (i % 4).to_string()))
            .collect();

        let purchase = calculate_purchase(catalog.all(), &form);
        let sum: u64 = purchase.lines.values().map(|l| l.total).sum();
        assert_eq!(purchase.total, sum);
        assert!(purchase.lines.values().all(|l| l.quantity > 0));
        assert!(purchase
            .lines
            .values()
            .all(|l| l.total == l.quantity * l.unit_price));
    }

    #[test]
    fn test_overflowing_line_is_skipped() {
        let prices = price_list(&[("Gold", u64::MAX / 2), ("Cap", 10)]);
        let purchase = calculate_purchase(&prices, &quantities(&[("Gold", "3"), ("Cap", "1")]));

        assert!(!purchase.lines.contains_key("Gold"));
        assert_eq!(purchase.total, 10);
    }
}

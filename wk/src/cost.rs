//! Currency amount helpers
//!
//! Costs are free-text strings produced by the model ("Approx. ₹4,500",
//! "₹5,000 - ₹10,000"). These helpers pull whole-rupee amounts out of them so
//! a generated total can be checked against the requested budget band. The
//! check is advisory: the budget is enforced by prompting, never computed.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

static AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:₹|Rs\.?|INR)?\s*(\d[\d,]*)(?:\.\d+)?\s*(k|K)?").expect("amount regex is valid"));

/// Inclusive budget band in whole rupees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetRange {
    pub min: u64,
    pub max: u64,
}

impl BudgetRange {
    /// Parse a budget string
    ///
    /// Two amounts form a band; a single amount is an upper bound unless the
    /// text marks it open-ended ("₹20,000+", "above ₹20,000").
    pub fn parse(budget: &str) -> Option<Self> {
        debug!(%budget, "BudgetRange::parse: called");
        let amounts = amounts(budget);
        match amounts.as_slice() {
            [] => None,
            [single] => {
                let lower = budget.to_lowercase();
                if budget.contains('+') || lower.contains("above") || lower.contains("over") {
                    Some(Self {
                        min: *single,
                        max: u64::MAX,
                    })
                } else {
                    Some(Self { min: 0, max: *single })
                }
            }
            [first, .., last] => Some(Self {
                min: *first.min(last),
                max: *first.max(last),
            }),
        }
    }

    pub fn contains(&self, amount: u64) -> bool {
        amount >= self.min && amount <= self.max
    }
}

/// All amounts mentioned in a cost string, in order
pub fn amounts(text: &str) -> Vec<u64> {
    AMOUNT
        .captures_iter(text)
        .filter_map(|caps| {
            let digits: String = caps.get(1)?.as_str().chars().filter(|c| c.is_ascii_digit()).collect();
            let value: u64 = digits.parse().ok()?;
            // amounts too large for u64 are dropped
            if caps.get(2).is_some() { value.checked_mul(1000) } else { Some(value) }
        })
        .collect()
}

/// The amount a total-cost string commits to (the largest mentioned)
pub fn total_amount(total: &str) -> Option<u64> {
    amounts(total).into_iter().max()
}

/// Whether a total-cost string falls inside a budget string
///
/// `None` when either side has no recognizable amount.
pub fn within_budget(total: &str, budget: &str) -> Option<bool> {
    let range = BudgetRange::parse(budget)?;
    let amount = total_amount(total)?;
    Some(range.contains(amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amounts() {
        assert_eq!(amounts("Approx. ₹4,500"), vec![4500]);
        assert_eq!(amounts("₹5,000 - ₹10,000"), vec![5000, 10000]);
        assert_eq!(amounts("Rs. 1200 per person"), vec![1200]);
        assert_eq!(amounts("₹15k"), vec![15000]);
        assert!(amounts("Free").is_empty());
    }

    #[test]
    fn test_amounts_drops_overflowing_values() {
        assert!(amounts("Approx. ₹99999999999999999k").is_empty());
        assert!(amounts("₹999999999999999999999").is_empty());
        assert_eq!(amounts("₹99999999999999999k or ₹4,000"), vec![4000]);
        assert_eq!(within_budget("Approx. ₹99999999999999999k", "₹5,000 - ₹10,000"), None);
    }

    #[test]
    fn test_budget_range() {
        assert_eq!(
            BudgetRange::parse("₹5,000 - ₹10,000"),
            Some(BudgetRange { min: 5000, max: 10000 })
        );
        assert_eq!(BudgetRange::parse("Under ₹3,000"), Some(BudgetRange { min: 0, max: 3000 }));
        assert_eq!(
            BudgetRange::parse("₹20,000+"),
            Some(BudgetRange {
                min: 20000,
                max: u64::MAX
            })
        );
        assert_eq!(BudgetRange::parse("flexible"), None);
    }

    #[test]
    fn test_within_budget() {
        assert_eq!(within_budget("Approx. ₹7,500", "₹5,000 - ₹10,000"), Some(true));
        assert_eq!(within_budget("Approx. ₹12,000", "₹5,000 - ₹10,000"), Some(false));
        assert_eq!(within_budget("₹6,000 - ₹11,000", "₹5,000 - ₹10,000"), Some(false));
        assert_eq!(within_budget("Free", "₹5,000 - ₹10,000"), None);
    }
}

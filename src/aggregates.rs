// 📊 Derived Aggregates - Filtering, totals and chart series
// Everything here is recomputed from the current snapshot on every render.

use crate::expenses::{Category, Expense};

// ============================================================================
// QUERY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    /// "all" (or empty) means no restriction
    pub fn parse(value: &str) -> Option<CategoryFilter> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            return Some(CategoryFilter::All);
        }
        Category::parse(value).map(CategoryFilter::Only)
    }

    pub fn matches(&self, expense: &Expense) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(cat) => expense.category == cat.as_str(),
        }
    }

    /// Cycle All → Food → ... → Other → All
    pub fn next(&self) -> CategoryFilter {
        match self {
            CategoryFilter::All => CategoryFilter::Only(Category::ALL[0]),
            CategoryFilter::Only(Category::Other) => CategoryFilter::All,
            CategoryFilter::Only(cat) => CategoryFilter::Only(cat.next()),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CategoryFilter::All => "All Categories",
            CategoryFilter::Only(cat) => cat.as_str(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseQuery {
    pub category: CategoryFilter,
    pub search: String,
}

impl ExpenseQuery {
    pub fn new(category: CategoryFilter, search: impl Into<String>) -> Self {
        ExpenseQuery {
            category,
            search: search.into(),
        }
    }

    /// Category predicate AND case-insensitive description substring
    pub fn matches(&self, expense: &Expense) -> bool {
        self.category.matches(expense)
            && expense
                .description
                .to_lowercase()
                .contains(&self.search.to_lowercase())
    }

    pub fn is_active(&self) -> bool {
        self.category != CategoryFilter::All || !self.search.is_empty()
    }
}

// ============================================================================
// AGGREGATES
// ============================================================================

/// Matching subset, original order preserved
pub fn filter<'a>(expenses: &'a [Expense], query: &ExpenseQuery) -> Vec<&'a Expense> {
    expenses.iter().filter(|e| query.matches(e)).collect()
}

pub fn total(expenses: &[&Expense]) -> f64 {
    expenses.iter().map(|e| e.amount).sum()
}

/// total / count, or 0 for an empty set
pub fn average(expenses: &[&Expense]) -> f64 {
    if expenses.is_empty() {
        0.0
    } else {
        total(expenses) / expenses.len() as f64
    }
}

pub fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}

fn sum_by_category<'a>(expenses: impl Iterator<Item = &'a Expense>) -> Vec<(String, f64)> {
    let mut sums: Vec<(String, f64)> = Vec::new();
    for expense in expenses {
        match sums.iter_mut().find(|(cat, _)| *cat == expense.category) {
            Some((_, sum)) => *sum += expense.amount,
            None => sums.push((expense.category.clone(), expense.amount)),
        }
    }
    sums
}

/// Per-category totals over the FULL list, in first-seen order.
/// Deliberately ignores the active filter/search.
pub fn category_totals(expenses: &[Expense]) -> Vec<(String, f64)> {
    sum_by_category(expenses.iter())
}

/// Percentage of the unfiltered grand total (0 when nothing is spent)
pub fn category_share(category_total: f64, grand_total: f64) -> f64 {
    if grand_total > 0.0 {
        category_total / grand_total * 100.0
    } else {
        0.0
    }
}

/// Chart data: category totals over the filtered set
pub fn chart_series(filtered: &[&Expense]) -> Vec<(String, f64)> {
    sum_by_category(filtered.iter().copied())
}

// ============================================================================
// SUMMARY
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total: f64,
    pub count: usize,
    pub average: f64,
    pub overall_count: usize,
    pub overall_total: f64,
    pub by_category: Vec<(String, f64)>,
    pub chart: Vec<(String, f64)>,
}

impl Summary {
    pub fn compute(expenses: &[Expense], query: &ExpenseQuery) -> Self {
        let filtered = filter(expenses, query);
        let by_category = category_totals(expenses);
        Summary {
            total: total(&filtered),
            count: filtered.len(),
            average: average(&filtered),
            overall_count: expenses.len(),
            overall_total: by_category.iter().map(|(_, sum)| sum).sum(),
            by_category,
            chart: chart_series(&filtered),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn expense(id: i64, description: &str, amount: f64, category: &str) -> Expense {
        Expense {
            id,
            description: description.to_string(),
            amount,
            category: category.to_string(),
            notes: None,
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            created_at: None,
        }
    }

    fn sample() -> Vec<Expense> {
        vec![
            expense(1, "Morning Coffee", 4.5, "Food"),
            expense(2, "Bus ticket", 2.25, "Transport"),
            expense(3, "Lunch", 12.0, "Food"),
            expense(4, "Cinema", 9.75, "Entertainment"),
            expense(5, "coffee beans", 15.0, "Shopping"),
        ]
    }

    #[test]
    fn test_filter_is_subset_and_ordered() {
        let list = sample();
        let query = ExpenseQuery::new(CategoryFilter::All, "COFFEE");
        let filtered = filter(&list, &query);

        let ids: Vec<i64> = filtered.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 5]);
        assert!(filtered.iter().all(|e| list.iter().any(|l| l.id == e.id)));
        assert_eq!(total(&filtered), 19.5);
    }

    #[test]
    fn test_both_predicates_apply() {
        let list = sample();
        let query = ExpenseQuery::new(CategoryFilter::Only(Category::Food), "coffee");
        let filtered = filter(&list, &query);

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, 1);
    }

    #[test]
    fn test_average_of_empty_is_zero() {
        let list = sample();
        let query = ExpenseQuery::new(CategoryFilter::Only(Category::Health), "");
        let filtered = filter(&list, &query);

        assert_eq!(average(&filtered), 0.0);
        assert_eq!(format_amount(average(&filtered)), "0.00");
    }

    #[test]
    fn test_average_two_decimals() {
        let list = sample();
        let filtered = filter(&list, &ExpenseQuery::default());
        // 43.5 / 5
        assert_eq!(format_amount(average(&filtered)), "8.70");
    }

    #[test]
    fn test_category_totals_ignore_filter() {
        let list = sample();
        let query = ExpenseQuery::new(CategoryFilter::Only(Category::Transport), "");
        let summary = Summary::compute(&list, &query);

        assert_eq!(summary.count, 1);
        assert_eq!(summary.by_category.len(), 4);
        assert_eq!(summary.by_category[0], ("Food".to_string(), 16.5));

        let grand: f64 = list.iter().map(|e| e.amount).sum();
        let by_cat: f64 = summary.by_category.iter().map(|(_, s)| s).sum();
        assert!((grand - by_cat).abs() < 1e-9);
        assert_eq!(summary.overall_total, by_cat);
    }

    #[test]
    fn test_chart_follows_filter() {
        let list = sample();
        let query = ExpenseQuery::new(CategoryFilter::All, "coffee");
        let summary = Summary::compute(&list, &query);

        assert_eq!(
            summary.chart,
            vec![("Food".to_string(), 4.5), ("Shopping".to_string(), 15.0)]
        );
    }

    #[test]
    fn test_category_share_handles_zero() {
        assert_eq!(category_share(5.0, 0.0), 0.0);
        assert_eq!(category_share(5.0, 20.0), 25.0);
    }

    #[test]
    fn test_category_filter_parse_and_cycle() {
        assert_eq!(CategoryFilter::parse("all"), Some(CategoryFilter::All));
        assert_eq!(CategoryFilter::parse("health"), Some(CategoryFilter::Only(Category::Health)));
        assert_eq!(CategoryFilter::parse("Rent"), None);

        let mut filter = CategoryFilter::All;
        for _ in 0..Category::ALL.len() + 1 {
            filter = filter.next();
        }
        assert_eq!(filter, CategoryFilter::All);
    }

    #[test]
    fn test_unknown_category_still_totalled() {
        let mut list = sample();
        list.push(expense(6, "Gift", 20.0, "Gifts"));
        let totals = category_totals(&list);

        assert_eq!(totals.last(), Some(&("Gifts".to_string(), 20.0)));
    }
}

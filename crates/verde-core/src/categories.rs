//! Category registry
//!
//! The fixed set of spending and income categories. Loaded once as static
//! data; every lookup returns the registry's canonical entry.

use serde::Serialize;

use crate::models::TransactionType;

/// Which transaction types a category applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Income,
    Expense,
    All,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::All => "all",
        }
    }

    /// Whether a transaction of the given type may use this category
    pub fn accepts(&self, kind: TransactionType) -> bool {
        match self {
            Self::All => true,
            Self::Income => kind == TransactionType::Income,
            Self::Expense => kind == TransactionType::Expense,
        }
    }
}

impl std::fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named grouping for transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Category {
    pub name: &'static str,
    /// Icon identifier used by the presentation layer
    pub icon: &'static str,
    #[serde(rename = "type")]
    pub kind: CategoryKind,
}

const fn category(name: &'static str, icon: &'static str, kind: CategoryKind) -> Category {
    Category { name, icon, kind }
}

/// All known categories, in display order
pub static CATEGORIES: &[Category] = &[
    category("Groceries", "shopping-cart", CategoryKind::Expense),
    category("Transportation", "car", CategoryKind::Expense),
    category("Housing", "home", CategoryKind::Expense),
    category("Food", "utensils", CategoryKind::Expense),
    category("Utilities", "bolt", CategoryKind::Expense),
    category("Entertainment", "ticket", CategoryKind::Expense),
    category("Shopping", "shopping-bag", CategoryKind::Expense),
    category("Travel", "plane", CategoryKind::Expense),
    category("Personal Care", "heart", CategoryKind::Expense),
    category("Education", "book", CategoryKind::Expense),
    category("Investment", "trending-up", CategoryKind::Expense),
    category("Salary", "landmark", CategoryKind::Income),
    category("Freelance", "piggy-bank", CategoryKind::Income),
    category("Other", "more-horizontal", CategoryKind::All),
];

/// Category names offered to the model when suggesting a category.
///
/// Kept separate from `CATEGORIES`: "Freelance" is never offered, and any
/// answer still has to resolve through the registry.
pub const SUGGESTION_LABELS: &[&str] = &[
    "Groceries",
    "Transportation",
    "Salary",
    "Utilities",
    "Entertainment",
    "Shopping",
    "Housing",
    "Food",
    "Travel",
    "Personal Care",
    "Education",
    "Investment",
    "Other",
];

/// Look up a category by its exact name
pub fn find(name: &str) -> Option<Category> {
    CATEGORIES.iter().find(|c| c.name == name).copied()
}

/// Look up a category ignoring case and surrounding whitespace
pub fn find_loose(name: &str) -> Option<Category> {
    let name = name.trim();
    CATEGORIES
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name))
        .copied()
}

/// Categories selectable for a transaction of the given type
pub fn for_type(kind: TransactionType) -> Vec<Category> {
    CATEGORIES
        .iter()
        .filter(|c| c.kind.accepts(kind))
        .copied()
        .collect()
}

/// Categories that can carry a budget
pub fn expense_categories() -> Vec<Category> {
    CATEGORIES
        .iter()
        .filter(|c| c.kind == CategoryKind::Expense)
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<_> = CATEGORIES.iter().map(|c| c.name).collect();
        assert_eq!(names.len(), CATEGORIES.len());
    }

    #[test]
    fn test_find_exact() {
        let food = find("Food").unwrap();
        assert_eq!(food.kind, CategoryKind::Expense);
        assert!(find("food").is_none());
        assert!(find("Dining").is_none());
    }

    #[test]
    fn test_find_loose() {
        assert_eq!(find_loose("  personal care ").unwrap().name, "Personal Care");
        assert!(find_loose("Crypto").is_none());
    }

    #[test]
    fn test_for_type_includes_all_kind() {
        let income = for_type(TransactionType::Income);
        let names: Vec<_> = income.iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Salary", "Freelance", "Other"]);

        let expense = for_type(TransactionType::Expense);
        assert!(expense.iter().any(|c| c.name == "Other"));
        assert!(!expense.iter().any(|c| c.name == "Salary"));
    }

    #[test]
    fn test_expense_categories_exclude_other() {
        let expense = expense_categories();
        assert_eq!(expense.len(), 11);
        assert!(!expense.iter().any(|c| c.name == "Other"));
    }

    #[test]
    fn test_suggestion_labels_resolve() {
        for label in SUGGESTION_LABELS {
            assert!(find(label).is_some(), "{} missing from registry", label);
        }
    }

    #[test]
    fn test_category_serialization() {
        let json = serde_json::to_value(find("Salary").unwrap()).unwrap();
        assert_eq!(json["type"], "income");
        assert_eq!(json["name"], "Salary");
    }
}

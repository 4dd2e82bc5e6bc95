//! Form validation
//!
//! Drafts hold user input before it becomes a transaction or budget. Only
//! validated drafts are dispatched; the reducer itself never validates.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::categories::{self, Category, CategoryKind};
use crate::error::{Error, Result};
use crate::models::{Budget, Transaction, TransactionType};
use crate::state::AppState;

const MIN_DESCRIPTION_LEN: usize = 2;
const MAX_DESCRIPTION_LEN: usize = 100;
const MIN_SALARY: f64 = 1000.0;

/// Unvalidated transaction input
#[derive(Debug, Clone)]
pub struct TransactionDraft {
    pub kind: TransactionType,
    pub amount: f64,
    pub date: NaiveDate,
    pub description: String,
    pub category_name: String,
}

impl TransactionDraft {
    /// Check the draft and turn it into a transaction with a fresh id
    pub fn validate(&self, today: NaiveDate) -> Result<Transaction> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(Error::Validation("Amount must be positive".into()));
        }

        let description = self.description.trim();
        let len = description.chars().count();
        if len < MIN_DESCRIPTION_LEN {
            return Err(Error::Validation(format!(
                "Description must be at least {} characters",
                MIN_DESCRIPTION_LEN
            )));
        }
        if len > MAX_DESCRIPTION_LEN {
            return Err(Error::Validation(format!(
                "Description must be at most {} characters",
                MAX_DESCRIPTION_LEN
            )));
        }

        let category = categories::find(&self.category_name).ok_or_else(|| {
            Error::Validation(format!("Unknown category: {}", self.category_name))
        })?;
        if !category.kind.accepts(self.kind) {
            return Err(Error::Validation(format!(
                "Category {} cannot be used for {} transactions",
                category.name, self.kind
            )));
        }

        let earliest = NaiveDate::from_ymd_opt(1900, 1, 1)
            .ok_or_else(|| Error::Validation("Invalid minimum date".into()))?;
        if self.date < earliest || self.date > today {
            return Err(Error::Validation(format!(
                "Date must be between {} and {}",
                earliest, today
            )));
        }

        Ok(Transaction {
            id: Uuid::new_v4().to_string(),
            kind: self.kind,
            amount: self.amount,
            date: self.date,
            description: description.to_string(),
            category,
        })
    }
}

/// Unvalidated budget input
#[derive(Debug, Clone)]
pub struct BudgetDraft {
    pub category_name: String,
    pub amount: f64,
}

impl BudgetDraft {
    pub fn validate(&self) -> Result<Budget> {
        let category = categories::find(&self.category_name).ok_or_else(|| {
            Error::Validation(format!("Unknown category: {}", self.category_name))
        })?;
        if category.kind != CategoryKind::Expense {
            return Err(Error::Validation(format!(
                "Budgets can only be set for expense categories, not {}",
                category.name
            )));
        }
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(Error::Validation("Budget amount must be positive".into()));
        }

        Ok(Budget {
            id: Uuid::new_v4().to_string(),
            category_name: category.name.to_string(),
            amount: self.amount,
        })
    }
}

/// Check an annual salary before estimating taxes for it
pub fn validate_salary(salary: f64) -> Result<f64> {
    if !salary.is_finite() || salary <= 0.0 {
        return Err(Error::Validation("Salary must be positive".into()));
    }
    if salary < MIN_SALARY {
        return Err(Error::Validation(format!(
            "Salary seems too low, must be at least {}",
            MIN_SALARY
        )));
    }
    Ok(salary)
}

/// Expense categories that do not have a budget yet
pub fn available_budget_categories(state: &AppState) -> Vec<Category> {
    categories::expense_categories()
        .into_iter()
        .filter(|c| state.budget_for(c.name).is_none())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 15).unwrap()
    }

    fn draft() -> TransactionDraft {
        TransactionDraft {
            kind: TransactionType::Expense,
            amount: 50.0,
            date: today(),
            description: "  Dinner  ".into(),
            category_name: "Food".into(),
        }
    }

    #[test]
    fn test_valid_transaction() {
        let tx = draft().validate(today()).unwrap();
        assert_eq!(tx.description, "Dinner");
        assert_eq!(tx.category.name, "Food");
        assert!(!tx.id.is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = draft().validate(today()).unwrap();
        let b = draft().validate(today()).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_rejects_non_positive_amount() {
        let mut d = draft();
        d.amount = 0.0;
        assert!(matches!(d.validate(today()), Err(Error::Validation(_))));
        d.amount = f64::NAN;
        assert!(d.validate(today()).is_err());
    }

    #[test]
    fn test_description_length() {
        let mut d = draft();
        d.description = " x ".into();
        assert!(d.validate(today()).is_err());
        d.description = "y".repeat(101);
        assert!(d.validate(today()).is_err());
        d.description = "y".repeat(100);
        assert!(d.validate(today()).is_ok());
    }

    #[test]
    fn test_category_must_match_type() {
        let mut d = draft();
        d.category_name = "Salary".into();
        assert!(d.validate(today()).is_err());

        d.category_name = "Other".into();
        assert!(d.validate(today()).is_ok());

        d.kind = TransactionType::Income;
        d.category_name = "Freelance".into();
        assert!(d.validate(today()).is_ok());

        d.category_name = "Crypto".into();
        assert!(d.validate(today()).is_err());
    }

    #[test]
    fn test_date_range() {
        let mut d = draft();
        d.date = NaiveDate::from_ymd_opt(2024, 7, 16).unwrap();
        assert!(d.validate(today()).is_err());
        d.date = NaiveDate::from_ymd_opt(1899, 12, 31).unwrap();
        assert!(d.validate(today()).is_err());
        d.date = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap();
        assert!(d.validate(today()).is_ok());
    }

    #[test]
    fn test_budget_draft() {
        let ok = BudgetDraft {
            category_name: "Travel".into(),
            amount: 900.0,
        };
        assert_eq!(ok.validate().unwrap().category_name, "Travel");

        let other = BudgetDraft {
            category_name: "Other".into(),
            amount: 100.0,
        };
        assert!(other.validate().is_err());

        let negative = BudgetDraft {
            category_name: "Food".into(),
            amount: -5.0,
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_validate_salary() {
        assert_eq!(validate_salary(60000.0).unwrap(), 60000.0);
        assert!(validate_salary(999.0).is_err());
        assert!(validate_salary(-1.0).is_err());
        assert!(validate_salary(f64::INFINITY).is_err());
    }

    #[test]
    fn test_available_budget_categories() {
        let available = available_budget_categories(&AppState::demo());
        assert_eq!(available.len(), 9);
        assert!(!available.iter().any(|c| c.name == "Groceries"));
        assert!(!available.iter().any(|c| c.name == "Entertainment"));
    }
}

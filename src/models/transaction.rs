//! Transaction model
//!
//! Transactions are owned by the wider application; the engine reads them for
//! performance analysis and rewrites their category name during renames and
//! merges.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{HouseholdId, TransactionId};
use super::money::Money;

/// Whether money left or entered the household
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    #[default]
    Expense,
    Income,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expense => write!(f, "expense"),
            Self::Income => write!(f, "income"),
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "expense" | "out" => Ok(Self::Expense),
            "income" | "in" => Ok(Self::Income),
            other => Err(format!("Unknown transaction type: {}", other)),
        }
    }
}

/// A financial transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub household_id: HouseholdId,

    /// Name of the category this transaction is attributed to
    pub category_name: String,

    /// Always non-negative; direction comes from `transaction_type`
    pub amount: Money,

    #[serde(rename = "type", default)]
    pub transaction_type: TransactionType,

    pub date: NaiveDate,

    #[serde(default)]
    pub description: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Create an expense
    pub fn expense(
        household_id: HouseholdId,
        category_name: impl Into<String>,
        amount: Money,
        date: NaiveDate,
    ) -> Self {
        Self::new(household_id, category_name, amount, TransactionType::Expense, date)
    }

    /// Create an income transaction
    pub fn income(
        household_id: HouseholdId,
        category_name: impl Into<String>,
        amount: Money,
        date: NaiveDate,
    ) -> Self {
        Self::new(household_id, category_name, amount, TransactionType::Income, date)
    }

    pub fn new(
        household_id: HouseholdId,
        category_name: impl Into<String>,
        amount: Money,
        transaction_type: TransactionType,
        date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::new(),
            household_id,
            category_name: category_name.into(),
            amount,
            transaction_type,
            date,
            description: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_expense(&self) -> bool {
        self.transaction_type == TransactionType::Expense
    }

    pub fn is_income(&self) -> bool {
        self.transaction_type == TransactionType::Income
    }

    /// Reattribute to another category
    pub fn set_category(&mut self, name: impl Into<String>) {
        self.category_name = name.into();
        self.updated_at = Utc::now();
    }

    /// Validate the transaction
    pub fn validate(&self) -> Result<(), TransactionValidationError> {
        if self.category_name.trim().is_empty() {
            return Err(TransactionValidationError::MissingCategory);
        }
        if self.amount.is_negative() {
            return Err(TransactionValidationError::NegativeAmount);
        }
        Ok(())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.date, self.transaction_type, self.amount, self.category_name
        )
    }
}

/// Validation errors for transactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionValidationError {
    MissingCategory,
    NegativeAmount,
}

impl fmt::Display for TransactionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCategory => write!(f, "Transaction must have a category"),
            Self::NegativeAmount => {
                write!(f, "Amount cannot be negative; use the transaction type instead")
            }
        }
    }
}

impl std::error::Error for TransactionValidationError {}

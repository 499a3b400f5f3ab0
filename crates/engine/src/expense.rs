//! The module contains `Expense`, a cost line item attached to one vehicle.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::MoneyCents;

/// Opaque expense identifier assigned by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseId(String);

impl ExpenseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExpenseId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A repair, fee or any other cost paid for a vehicle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub description: String,
    pub amount: MoneyCents,
    pub date: DateTime<Utc>,
}

/// A validated expense that has not been stored yet.
#[derive(Clone, Debug, PartialEq)]
pub struct NewExpense {
    pub description: String,
    pub amount: MoneyCents,
    pub date: DateTime<Utc>,
}

/// Partial update: `None` leaves the field untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExpensePatch {
    pub description: Option<String>,
    pub amount: Option<MoneyCents>,
    pub date: Option<DateTime<Utc>>,
}

impl ExpensePatch {
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.amount.is_none() && self.date.is_none()
    }
}

impl Expense {
    pub fn from_new(id: ExpenseId, new: NewExpense) -> Self {
        Self {
            id,
            description: new.description,
            amount: new.amount,
            date: new.date,
        }
    }

    pub fn apply_patch(&mut self, patch: &ExpensePatch) {
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
    }
}

/// Sum of all expense amounts.
pub fn total(expenses: &[Expense]) -> MoneyCents {
    expenses.iter().map(|expense| expense.amount).sum()
}

/// Sorts expenses newest first. Expenses with the same date keep their order.
pub fn sort_newest_first(expenses: &mut [Expense]) {
    expenses.sort_by(|a, b| b.date.cmp(&a.date));
}

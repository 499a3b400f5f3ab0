//! The module contains `Vehicle` struct and its sale lifecycle.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    EngineError, MoneyCents, ResultEngine,
    expense::{self, Expense},
};

/// Opaque vehicle identifier assigned by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(String);

impl VehicleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VehicleId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Where a vehicle is in its lifecycle.
///
/// The only transition is `InInventory -> Sold`. Price and date exist only in
/// the `Sold` variant, so a sold vehicle always carries both.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaleState {
    #[default]
    InInventory,
    Sold {
        price: MoneyCents,
        date: DateTime<Utc>,
    },
}

/// A car bought for resale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub miles: u32,
    pub purchase_price: MoneyCents,
    /// Internal inventory valuation. Falls back to the purchase price.
    pub book_value: MoneyCents,
    pub color: Option<String>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
    pub invoice_url: Option<String>,
    pub sale: SaleState,
    pub created_at: DateTime<Utc>,
    /// Hydrated separately from the vehicle record.
    #[serde(default)]
    pub expenses: Vec<Expense>,
}

/// A validated vehicle that has not been stored yet.
#[derive(Clone, Debug, PartialEq)]
pub struct NewVehicle {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub miles: u32,
    pub purchase_price: MoneyCents,
    pub book_value: MoneyCents,
    pub color: Option<String>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
    pub invoice_url: Option<String>,
}

/// Partial update of a vehicle.
///
/// `None` leaves a field untouched. For the optional text fields
/// `Some(None)` clears the stored value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VehiclePatch {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub miles: Option<u32>,
    pub purchase_price: Option<MoneyCents>,
    pub book_value: Option<MoneyCents>,
    pub color: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub image_url: Option<Option<String>>,
    pub invoice_url: Option<Option<String>>,
}

impl VehiclePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Vehicle {
    /// Build an in-inventory vehicle from validated input.
    pub fn from_new(id: VehicleId, new: NewVehicle, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            make: new.make,
            model: new.model,
            year: new.year,
            miles: new.miles,
            purchase_price: new.purchase_price,
            book_value: new.book_value,
            color: new.color,
            notes: new.notes,
            image_url: new.image_url,
            invoice_url: new.invoice_url,
            sale: SaleState::InInventory,
            created_at,
            expenses: Vec::new(),
        }
    }

    pub fn is_sold(&self) -> bool {
        matches!(self.sale, SaleState::Sold { .. })
    }

    pub fn sale_price(&self) -> Option<MoneyCents> {
        match self.sale {
            SaleState::Sold { price, .. } => Some(price),
            SaleState::InInventory => None,
        }
    }

    pub fn sale_date(&self) -> Option<DateTime<Utc>> {
        match self.sale {
            SaleState::Sold { date, .. } => Some(date),
            SaleState::InInventory => None,
        }
    }

    /// `"2018 Honda Civic"`.
    pub fn title(&self) -> String {
        format!("{} {} {}", self.year, self.make, self.model)
    }

    pub fn total_expenses(&self) -> MoneyCents {
        expense::total(&self.expenses)
    }

    /// Purchase price plus every expense.
    pub fn total_cost(&self) -> MoneyCents {
        self.purchase_price + self.total_expenses()
    }

    /// Realised profit, only for sold vehicles.
    pub fn profit(&self) -> Option<MoneyCents> {
        self.sale_price().map(|price| price - self.total_cost())
    }

    /// Profit preview shown while entering a sale price.
    ///
    /// Matches the sale dialog: expenses are not subtracted.
    pub fn projected_profit(&self, sale_price: MoneyCents) -> MoneyCents {
        sale_price - self.purchase_price
    }

    /// Expenses sorted by date, newest first.
    pub fn expenses_newest_first(&self) -> Vec<&Expense> {
        let mut out: Vec<&Expense> = self.expenses.iter().collect();
        out.sort_by(|a, b| b.date.cmp(&a.date));
        out
    }

    /// Check that the vehicle can move to `Sold` at `price`.
    pub fn check_sellable(&self, price: MoneyCents) -> ResultEngine<()> {
        if !price.is_positive() {
            return Err(EngineError::InvalidAmount(
                "selling price must be greater than zero".to_string(),
            ));
        }
        if self.is_sold() {
            return Err(EngineError::AlreadySold(self.id.to_string()));
        }
        Ok(())
    }

    /// Apply the `InInventory -> Sold` transition.
    pub fn sell(&mut self, price: MoneyCents, date: DateTime<Utc>) -> ResultEngine<()> {
        self.check_sellable(price)?;
        self.sale = SaleState::Sold { price, date };
        Ok(())
    }

    pub fn apply_patch(&mut self, patch: &VehiclePatch) {
        if let Some(make) = &patch.make {
            self.make = make.clone();
        }
        if let Some(model) = &patch.model {
            self.model = model.clone();
        }
        if let Some(year) = patch.year {
            self.year = year;
        }
        if let Some(miles) = patch.miles {
            self.miles = miles;
        }
        if let Some(price) = patch.purchase_price {
            self.purchase_price = price;
        }
        if let Some(book_value) = patch.book_value {
            self.book_value = book_value;
        }
        if let Some(color) = &patch.color {
            self.color = color.clone();
        }
        if let Some(notes) = &patch.notes {
            self.notes = notes.clone();
        }
        if let Some(image_url) = &patch.image_url {
            self.image_url = image_url.clone();
        }
        if let Some(invoice_url) = &patch.invoice_url {
            self.invoice_url = invoice_url.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::ExpenseId;

    fn civic() -> Vehicle {
        let created = Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap();
        let mut vehicle = Vehicle::from_new(
            VehicleId::new("v1"),
            NewVehicle {
                make: "Honda".to_string(),
                model: "Civic".to_string(),
                year: 2018,
                miles: 64_000,
                purchase_price: MoneyCents::from_dollars(10_000),
                book_value: MoneyCents::from_dollars(10_000),
                color: None,
                notes: None,
                image_url: None,
                invoice_url: None,
            },
            created,
        );
        vehicle.expenses = vec![
            Expense {
                id: ExpenseId::new("e1"),
                description: "Tires".to_string(),
                amount: MoneyCents::from_dollars(400),
                date: Utc.with_ymd_and_hms(2024, 1, 12, 0, 0, 0).unwrap(),
            },
            Expense {
                id: ExpenseId::new("e2"),
                description: "Detailing".to_string(),
                amount: MoneyCents::from_dollars(100),
                date: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
            },
        ];
        vehicle
    }

    #[test]
    fn sell_moves_to_sold_once() {
        let mut vehicle = civic();
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

        vehicle.sell(MoneyCents::from_dollars(12_000), at).unwrap();
        assert!(vehicle.is_sold());
        assert_eq!(vehicle.sale_price(), Some(MoneyCents::from_dollars(12_000)));
        assert_eq!(vehicle.sale_date(), Some(at));
        assert_eq!(vehicle.profit(), Some(MoneyCents::from_dollars(1_500)));

        let err = vehicle.sell(MoneyCents::from_dollars(13_000), at).unwrap_err();
        assert_eq!(err, EngineError::AlreadySold("v1".to_string()));
        assert_eq!(vehicle.sale_price(), Some(MoneyCents::from_dollars(12_000)));
    }

    #[test]
    fn sell_rejects_non_positive_price() {
        let mut vehicle = civic();
        let at = Utc::now();
        assert!(matches!(
            vehicle.sell(MoneyCents::ZERO, at),
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(matches!(
            vehicle.sell(MoneyCents::new(-100), at),
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(!vehicle.is_sold());
    }

    #[test]
    fn cost_and_projection() {
        let vehicle = civic();
        assert_eq!(vehicle.total_expenses(), MoneyCents::from_dollars(500));
        assert_eq!(vehicle.total_cost(), MoneyCents::from_dollars(10_500));
        assert_eq!(vehicle.profit(), None);
        assert_eq!(
            vehicle.projected_profit(MoneyCents::from_dollars(9_000)),
            MoneyCents::from_dollars(-1_000)
        );
        assert_eq!(vehicle.title(), "2018 Honda Civic");
    }

    #[test]
    fn expenses_are_presented_newest_first() {
        let vehicle = civic();
        let ids: Vec<&str> = vehicle
            .expenses_newest_first()
            .iter()
            .map(|expense| expense.id.as_str())
            .collect();
        assert_eq!(ids, vec!["e2", "e1"]);
    }

    #[test]
    fn patch_clears_optional_fields() {
        let mut vehicle = civic();
        vehicle.notes = Some("clean title".to_string());
        vehicle.apply_patch(&VehiclePatch {
            miles: Some(65_000),
            notes: Some(None),
            color: Some(Some("Blue".to_string())),
            ..Default::default()
        });
        assert_eq!(vehicle.miles, 65_000);
        assert_eq!(vehicle.notes, None);
        assert_eq!(vehicle.color.as_deref(), Some("Blue"));
        assert_eq!(vehicle.make, "Honda");
    }
}

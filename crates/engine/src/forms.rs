//! Validation of raw form input.
//!
//! Forms carry the text exactly as typed. `validate` collects an error for
//! every bad field (instead of stopping at the first one) and only returns a
//! typed value when the whole form is valid, so no gateway call is ever made
//! with malformed input.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{ExpensePatch, MoneyCents, NewExpense, NewVehicle, VehiclePatch};

/// Earliest model year accepted by the vehicle form.
pub const MIN_YEAR: i32 = 1900;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Make,
    Model,
    Year,
    Miles,
    PurchasePrice,
    BookValue,
    Description,
    Amount,
    Date,
    SellingPrice,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Self::Make => "make",
            Self::Model => "model",
            Self::Year => "year",
            Self::Miles => "miles",
            Self::PurchasePrice => "purchase price",
            Self::BookValue => "book value",
            Self::Description => "description",
            Self::Amount => "amount",
            Self::Date => "date",
            Self::SellingPrice => "selling price",
        }
    }
}

/// Inline errors for a rejected form, in field order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldErrors(Vec<(Field, String)>);

impl FieldErrors {
    pub fn push(&mut self, field: Field, message: impl Into<String>) {
        self.0.push((field, message.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Message for `field`, if it was rejected.
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, message)| message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (_, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            f.write_str(message)?;
            first = false;
        }
        Ok(())
    }
}

/// Raw input of the add-vehicle form.
#[derive(Clone, Debug, Default)]
pub struct VehicleForm {
    pub make: String,
    pub model: String,
    pub year: String,
    pub miles: String,
    pub purchase_price: String,
    pub book_value: String,
    pub color: String,
    pub notes: String,
    pub image_url: String,
    pub invoice_url: String,
}

/// Raw input of the edit-vehicle form. `None` means "not edited".
#[derive(Clone, Debug, Default)]
pub struct VehicleEditForm {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<String>,
    pub miles: Option<String>,
    pub purchase_price: Option<String>,
    pub book_value: Option<String>,
    pub color: Option<String>,
    pub notes: Option<String>,
}

/// Raw input of the expense form.
#[derive(Clone, Debug, Default)]
pub struct ExpenseForm {
    pub description: String,
    pub amount: String,
    /// `YYYY-MM-DD` or RFC 3339. Blank means now.
    pub date: String,
}

/// Raw input of the edit-expense form. `None` means "not edited".
#[derive(Clone, Debug, Default)]
pub struct ExpenseEditForm {
    pub description: Option<String>,
    pub amount: Option<String>,
    pub date: Option<String>,
}

fn required_text(value: &str, field: Field, message: &str, errors: &mut FieldErrors) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(field, message);
    }
    trimmed.to_string()
}

fn optional_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn year(value: &str, current_year: i32, errors: &mut FieldErrors) -> i32 {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(Field::Year, "Year is required");
        return 0;
    }
    match trimmed.parse::<i32>() {
        Ok(year) if (MIN_YEAR..=current_year + 1).contains(&year) => year,
        _ => {
            errors.push(Field::Year, "Please enter a valid year");
            0
        }
    }
}

fn miles(value: &str, errors: &mut FieldErrors) -> u32 {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(Field::Miles, "Mileage is required");
        return 0;
    }
    match trimmed.replace('_', "").parse::<u32>() {
        Ok(miles) => miles,
        Err(_) => {
            errors.push(Field::Miles, "Please enter a valid mileage");
            0
        }
    }
}

/// Positive amount, e.g. purchase price or expense amount.
fn positive_amount(
    value: &str,
    field: Field,
    missing: &str,
    invalid: &str,
    errors: &mut FieldErrors,
) -> MoneyCents {
    if value.trim().is_empty() {
        errors.push(field, missing);
        return MoneyCents::ZERO;
    }
    match value.parse::<MoneyCents>() {
        Ok(amount) if amount.is_positive() => amount,
        _ => {
            errors.push(field, invalid);
            MoneyCents::ZERO
        }
    }
}

fn book_value(value: &str, errors: &mut FieldErrors) -> Option<MoneyCents> {
    if value.trim().is_empty() {
        return None;
    }
    match value.parse::<MoneyCents>() {
        Ok(amount) if !amount.is_negative() => Some(amount),
        _ => {
            errors.push(Field::BookValue, "Please enter a valid inventory value");
            None
        }
    }
}

/// Accepts `YYYY-MM-DD` (midnight UTC) or a full RFC 3339 timestamp.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl VehicleForm {
    /// Validate against the current calendar year.
    pub fn validate(&self) -> Result<NewVehicle, FieldErrors> {
        self.validate_at(Utc::now().year())
    }

    /// Validate with an explicit `current_year` (years up to next year are
    /// accepted).
    pub fn validate_at(&self, current_year: i32) -> Result<NewVehicle, FieldErrors> {
        let mut errors = FieldErrors::default();

        let make = required_text(&self.make, Field::Make, "Make is required", &mut errors);
        let model = required_text(&self.model, Field::Model, "Model is required", &mut errors);
        let year = year(&self.year, current_year, &mut errors);
        let miles = miles(&self.miles, &mut errors);
        let purchase_price = positive_amount(
            &self.purchase_price,
            Field::PurchasePrice,
            "Purchase price is required",
            "Please enter a valid purchase price",
            &mut errors,
        );
        let book_value = book_value(&self.book_value, &mut errors);

        errors.into_result(|| NewVehicle {
            make,
            model,
            year,
            miles,
            purchase_price,
            book_value: book_value.unwrap_or(purchase_price),
            color: optional_text(&self.color),
            notes: optional_text(&self.notes),
            image_url: optional_text(&self.image_url),
            invoice_url: optional_text(&self.invoice_url),
        })
    }
}

impl VehicleEditForm {
    pub fn validate(&self) -> Result<VehiclePatch, FieldErrors> {
        self.validate_at(Utc::now().year())
    }

    /// Only edited fields are checked. A blank optional text clears it.
    pub fn validate_at(&self, current_year: i32) -> Result<VehiclePatch, FieldErrors> {
        let mut errors = FieldErrors::default();

        let make = self
            .make
            .as_deref()
            .map(|v| required_text(v, Field::Make, "Make is required", &mut errors));
        let model = self
            .model
            .as_deref()
            .map(|v| required_text(v, Field::Model, "Model is required", &mut errors));
        let year = self
            .year
            .as_deref()
            .map(|v| year(v, current_year, &mut errors));
        let miles = self.miles.as_deref().map(|v| miles(v, &mut errors));
        let purchase_price = self.purchase_price.as_deref().map(|v| {
            positive_amount(
                v,
                Field::PurchasePrice,
                "Purchase price is required",
                "Please enter a valid purchase price",
                &mut errors,
            )
        });
        // A blank book value on edit resets it to the purchase price when one
        // was given; otherwise the field is left alone.
        let book_value = self
            .book_value
            .as_deref()
            .and_then(|v| book_value(v, &mut errors).or(purchase_price));

        errors.into_result(|| VehiclePatch {
            make,
            model,
            year,
            miles,
            purchase_price,
            book_value,
            color: self.color.as_deref().map(optional_text),
            notes: self.notes.as_deref().map(optional_text),
            image_url: None,
            invoice_url: None,
        })
    }
}

impl ExpenseForm {
    pub fn validate(&self) -> Result<NewExpense, FieldErrors> {
        self.validate_at(Utc::now())
    }

    /// Validate; a blank date becomes `now`.
    pub fn validate_at(&self, now: DateTime<Utc>) -> Result<NewExpense, FieldErrors> {
        let mut errors = FieldErrors::default();

        let description = required_text(
            &self.description,
            Field::Description,
            "Description is required",
            &mut errors,
        );
        let amount = positive_amount(
            &self.amount,
            Field::Amount,
            "Amount is required",
            "Please enter a valid amount",
            &mut errors,
        );
        let date = if self.date.trim().is_empty() {
            now
        } else {
            parse_date(&self.date).unwrap_or_else(|| {
                errors.push(Field::Date, "Please enter a valid date");
                now
            })
        };

        errors.into_result(|| NewExpense {
            description,
            amount,
            date,
        })
    }
}

impl ExpenseEditForm {
    pub fn validate(&self) -> Result<ExpensePatch, FieldErrors> {
        let mut errors = FieldErrors::default();

        let description = self.description.as_deref().map(|v| {
            required_text(v, Field::Description, "Description is required", &mut errors)
        });
        let amount = self.amount.as_deref().map(|v| {
            positive_amount(
                v,
                Field::Amount,
                "Amount is required",
                "Please enter a valid amount",
                &mut errors,
            )
        });
        let date = self.date.as_deref().and_then(|v| {
            let parsed = parse_date(v);
            if parsed.is_none() {
                errors.push(Field::Date, "Please enter a valid date");
            }
            parsed
        });

        errors.into_result(|| ExpensePatch {
            description,
            amount,
            date,
        })
    }
}

/// Validate the selling price typed in the sale dialog.
pub fn parse_sale_price(value: &str) -> Result<MoneyCents, FieldErrors> {
    match value.parse::<MoneyCents>() {
        Ok(price) if price.is_positive() => Ok(price),
        _ => {
            let mut errors = FieldErrors::default();
            errors.push(Field::SellingPrice, "Please enter a valid selling price");
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn valid_form() -> VehicleForm {
        VehicleForm {
            make: " Toyota ".to_string(),
            model: "Corolla".to_string(),
            year: "2019".to_string(),
            miles: "42000".to_string(),
            purchase_price: "9500".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn vehicle_form_defaults_book_value_to_purchase_price() {
        let vehicle = valid_form().validate_at(2024).unwrap();
        assert_eq!(vehicle.make, "Toyota");
        assert_eq!(vehicle.purchase_price, MoneyCents::from_dollars(9_500));
        assert_eq!(vehicle.book_value, MoneyCents::from_dollars(9_500));
        assert_eq!(vehicle.notes, None);
    }

    #[test]
    fn vehicle_form_keeps_explicit_book_value() {
        let form = VehicleForm {
            book_value: "0".to_string(),
            notes: "needs brakes".to_string(),
            ..valid_form()
        };
        let vehicle = form.validate_at(2024).unwrap();
        assert_eq!(vehicle.book_value, MoneyCents::ZERO);
        assert_eq!(vehicle.notes.as_deref(), Some("needs brakes"));
    }

    #[test]
    fn vehicle_form_collects_every_error() {
        let form = VehicleForm {
            make: "  ".to_string(),
            year: "1899".to_string(),
            miles: "-5".to_string(),
            purchase_price: "0".to_string(),
            book_value: "-1".to_string(),
            ..Default::default()
        };
        let errors = form.validate_at(2024).unwrap_err();
        assert_eq!(errors.len(), 6);
        assert_eq!(errors.get(Field::Make), Some("Make is required"));
        assert_eq!(errors.get(Field::Model), Some("Model is required"));
        assert_eq!(errors.get(Field::Year), Some("Please enter a valid year"));
        assert_eq!(errors.get(Field::Miles), Some("Please enter a valid mileage"));
        assert_eq!(
            errors.get(Field::PurchasePrice),
            Some("Please enter a valid purchase price")
        );
        assert_eq!(
            errors.get(Field::BookValue),
            Some("Please enter a valid inventory value")
        );
    }

    #[test]
    fn year_accepts_next_model_year_only() {
        let next = VehicleForm {
            year: "2025".to_string(),
            ..valid_form()
        };
        assert!(next.validate_at(2024).is_ok());

        let too_far = VehicleForm {
            year: "2026".to_string(),
            ..valid_form()
        };
        assert!(too_far.validate_at(2024).is_err());
    }

    #[test]
    fn edit_form_checks_only_edited_fields() {
        let form = VehicleEditForm {
            miles: Some("50000".to_string()),
            notes: Some(String::new()),
            ..Default::default()
        };
        let patch = form.validate_at(2024).unwrap();
        assert_eq!(patch.miles, Some(50_000));
        assert_eq!(patch.notes, Some(None));
        assert_eq!(patch.make, None);

        let bad = VehicleEditForm {
            make: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(
            bad.validate_at(2024).unwrap_err().get(Field::Make),
            Some("Make is required")
        );
    }

    #[test]
    fn expense_form_defaults_date_to_now() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 10, 30, 0).unwrap();
        let expense = ExpenseForm {
            description: "Oil change".to_string(),
            amount: "49.99".to_string(),
            date: String::new(),
        }
        .validate_at(now)
        .unwrap();
        assert_eq!(expense.amount.cents(), 4_999);
        assert_eq!(expense.date, now);

        let dated = ExpenseForm {
            description: "Smog".to_string(),
            amount: "30".to_string(),
            date: "2024-05-20".to_string(),
        }
        .validate_at(now)
        .unwrap();
        assert_eq!(dated.date, Utc.with_ymd_and_hms(2024, 5, 20, 0, 0, 0).unwrap());
    }

    #[test]
    fn expense_form_rejects_non_positive_amount() {
        let errors = ExpenseForm {
            description: String::new(),
            amount: "0".to_string(),
            date: "yesterday".to_string(),
        }
        .validate()
        .unwrap_err();
        assert_eq!(errors.get(Field::Description), Some("Description is required"));
        assert_eq!(errors.get(Field::Amount), Some("Please enter a valid amount"));
        assert_eq!(errors.get(Field::Date), Some("Please enter a valid date"));
    }

    #[test]
    fn amounts_above_one_billion_are_rejected() {
        let form = VehicleForm {
            purchase_price: "90000000000000000".to_string(),
            book_value: "1000000000.01".to_string(),
            ..valid_form()
        };
        let errors = form.validate_at(2024).unwrap_err();
        assert_eq!(
            errors.get(Field::PurchasePrice),
            Some("Please enter a valid purchase price")
        );
        assert_eq!(
            errors.get(Field::BookValue),
            Some("Please enter a valid inventory value")
        );

        let at_limit = VehicleForm {
            purchase_price: "1000000000".to_string(),
            ..valid_form()
        };
        assert_eq!(
            at_limit.validate_at(2024).unwrap().purchase_price,
            MoneyCents::MAX_AMOUNT
        );
        assert!(parse_sale_price("1000000000.01").is_err());
    }

    #[test]
    fn sale_price_must_be_positive() {
        assert_eq!(parse_sale_price("12000").unwrap(), MoneyCents::from_dollars(12_000));
        for bad in ["0", "-500", "", "abc"] {
            let errors = parse_sale_price(bad).unwrap_err();
            assert_eq!(
                errors.get(Field::SellingPrice),
                Some("Please enter a valid selling price")
            );
        }
    }
}

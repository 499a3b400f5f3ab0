//! Conversion between backend rows and the domain model.
//!
//! Incoming rows are loosely typed: any column may be missing or `null`.
//! Required columns that are absent turn into [`EngineError::InvalidRecord`];
//! optional ones get their defaults here, at the boundary.

use api_types::{
    car::{CarInsert, CarRow, CarSold, CarUpdate},
    expense::{ExpenseInsert, ExpenseRow, ExpenseUpdate},
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use engine::{
    EngineError, Expense, ExpenseId, ExpensePatch, MoneyCents, NewExpense, NewVehicle,
    ResultEngine, SaleState, Vehicle, VehicleId, VehiclePatch,
};

fn missing(table: &str, id: &str, column: &str) -> EngineError {
    EngineError::InvalidRecord(format!("{table} {id}: missing {column}"))
}

fn money(table: &str, id: &str, column: &str, value: f64) -> ResultEngine<MoneyCents> {
    MoneyCents::from_major_f64(value)
        .map_err(|_| EngineError::InvalidRecord(format!("{table} {id}: invalid {column}")))
}

/// Parse the timestamp shapes the backend emits: RFC 3339, Postgres text
/// output (`2024-01-02 10:00:00.123+00`), naive timestamps and plain dates,
/// the last two taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(parsed.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn timestamp(table: &str, id: &str, column: &str, value: Option<&str>) -> ResultEngine<DateTime<Utc>> {
    let value = value.ok_or_else(|| missing(table, id, column))?;
    parse_timestamp(value)
        .ok_or_else(|| EngineError::InvalidRecord(format!("{table} {id}: invalid {column}")))
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

/// Map a `cars` row. Expenses are left empty.
pub fn vehicle(row: CarRow) -> ResultEngine<Vehicle> {
    const T: &str = "car";
    let id = row
        .id
        .ok_or_else(|| EngineError::InvalidRecord("car row without id".to_string()))?;

    let make = row.make.ok_or_else(|| missing(T, &id, "make"))?;
    let model = row.model.ok_or_else(|| missing(T, &id, "model"))?;
    let year = row
        .year
        .and_then(|year| i32::try_from(year).ok())
        .ok_or_else(|| missing(T, &id, "year"))?;
    let miles = match row.mileage {
        Some(miles) if miles.is_finite() && miles >= 0.0 && miles <= f64::from(u32::MAX) => {
            miles.round() as u32
        }
        Some(_) => return Err(EngineError::InvalidRecord(format!("car {id}: invalid mileage"))),
        None => 0,
    };
    let purchase_price = money(
        T,
        &id,
        "purchase_price",
        row.purchase_price
            .ok_or_else(|| missing(T, &id, "purchase_price"))?,
    )?;
    let book_value = match row.book_value {
        Some(value) if value != 0.0 => money(T, &id, "book_value", value)?,
        _ => purchase_price,
    };

    let sale = if row.sold.unwrap_or(false) {
        let price = row
            .sale_price
            .ok_or_else(|| missing(T, &id, "sale_price on a sold car"))?;
        SaleState::Sold {
            price: money(T, &id, "sale_price", price)?,
            date: timestamp(T, &id, "sale_date", row.sale_date.as_deref())?,
        }
    } else {
        SaleState::InInventory
    };
    let created_at = timestamp(T, &id, "created_at", row.created_at.as_deref())?;

    Ok(Vehicle {
        id: VehicleId::new(id),
        make,
        model,
        year,
        miles,
        purchase_price,
        book_value,
        color: blank_to_none(row.color),
        notes: blank_to_none(row.notes),
        image_url: blank_to_none(row.image_url),
        invoice_url: blank_to_none(row.invoice_url),
        sale,
        created_at,
        expenses: Vec::new(),
    })
}

/// Map an `expenses` row.
pub fn expense(row: ExpenseRow) -> ResultEngine<Expense> {
    const T: &str = "expense";
    let id = row
        .id
        .ok_or_else(|| EngineError::InvalidRecord("expense row without id".to_string()))?;
    let description = row.description.ok_or_else(|| missing(T, &id, "description"))?;
    let amount = money(
        T,
        &id,
        "amount",
        row.amount.ok_or_else(|| missing(T, &id, "amount"))?,
    )?;
    let date = timestamp(T, &id, "expense_date", row.expense_date.as_deref())?;

    Ok(Expense {
        id: ExpenseId::new(id),
        description,
        amount,
        date,
    })
}

pub fn car_insert(user_id: &str, new: &NewVehicle) -> CarInsert {
    CarInsert {
        user_id: user_id.to_string(),
        make: new.make.clone(),
        model: new.model.clone(),
        year: i64::from(new.year),
        mileage: i64::from(new.miles),
        purchase_price: new.purchase_price.to_major_f64(),
        book_value: new.book_value.to_major_f64(),
        color: new.color.clone(),
        notes: new.notes.clone(),
        image_url: new.image_url.clone(),
        invoice_url: new.invoice_url.clone(),
        sold: false,
    }
}

pub fn car_update(patch: &VehiclePatch) -> CarUpdate {
    CarUpdate {
        make: patch.make.clone(),
        model: patch.model.clone(),
        year: patch.year.map(i64::from),
        mileage: patch.miles.map(i64::from),
        purchase_price: patch.purchase_price.map(MoneyCents::to_major_f64),
        book_value: patch.book_value.map(MoneyCents::to_major_f64),
        color: patch.color.clone(),
        notes: patch.notes.clone(),
        image_url: patch.image_url.clone(),
        invoice_url: patch.invoice_url.clone(),
    }
}

pub fn car_sold(price: MoneyCents, date: DateTime<Utc>) -> CarSold {
    CarSold {
        sold: true,
        sale_price: price.to_major_f64(),
        sale_date: format_timestamp(date),
    }
}

pub fn expense_insert(user_id: &str, vehicle_id: &VehicleId, new: &NewExpense) -> ExpenseInsert {
    ExpenseInsert {
        car_id: vehicle_id.to_string(),
        user_id: user_id.to_string(),
        description: new.description.clone(),
        amount: new.amount.to_major_f64(),
        expense_date: format_timestamp(new.date),
    }
}

pub fn expense_update(patch: &ExpensePatch) -> ExpenseUpdate {
    ExpenseUpdate {
        description: patch.description.clone(),
        amount: patch.amount.map(MoneyCents::to_major_f64),
        expense_date: patch.date.map(format_timestamp),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn row() -> CarRow {
        CarRow {
            id: Some("c1".to_string()),
            user_id: Some("u1".to_string()),
            make: Some("Honda".to_string()),
            model: Some("Civic".to_string()),
            year: Some(2018),
            mileage: Some(61_000.0),
            purchase_price: Some(10_000.0),
            created_at: Some("2024-05-01T08:00:00.123456+00:00".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn book_value_falls_back_to_purchase_price() {
        let vehicle = vehicle(row()).unwrap();
        assert_eq!(vehicle.book_value, MoneyCents::from_dollars(10_000));

        let zero = vehicle_with(|row| row.book_value = Some(0.0));
        assert_eq!(zero.book_value, MoneyCents::from_dollars(10_000));

        let set = vehicle_with(|row| row.book_value = Some(11_250.5));
        assert_eq!(set.book_value, MoneyCents::new(1_125_050));
    }

    fn vehicle_with(edit: impl FnOnce(&mut CarRow)) -> Vehicle {
        let mut row = row();
        edit(&mut row);
        vehicle(row).unwrap()
    }

    #[test]
    fn sold_rows_need_price_and_date() {
        let mut sold = row();
        sold.sold = Some(true);
        sold.sale_price = Some(12_000.0);
        assert!(matches!(
            vehicle(sold.clone()),
            Err(EngineError::InvalidRecord(_))
        ));

        sold.sale_date = Some("2024-06-01T10:00:00Z".to_string());
        let vehicle = vehicle(sold).unwrap();
        assert_eq!(vehicle.sale_price(), Some(MoneyCents::from_dollars(12_000)));
        assert_eq!(
            vehicle.sale_date(),
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn unsold_rows_ignore_stray_sale_columns() {
        let vehicle = vehicle_with(|row| {
            row.sold = Some(false);
            row.sale_price = Some(1.0);
        });
        assert!(!vehicle.is_sold());
    }

    #[test]
    fn rows_missing_required_columns_are_rejected() {
        let mut no_make = row();
        no_make.make = None;
        assert!(vehicle(no_make).is_err());

        let mut no_created = row();
        no_created.created_at = None;
        assert!(vehicle(no_created).is_err());

        let mut no_id = row();
        no_id.id = None;
        assert!(vehicle(no_id).is_err());
    }

    #[test]
    fn blank_optional_text_becomes_none() {
        let vehicle = vehicle_with(|row| {
            row.notes = Some("  ".to_string());
            row.color = Some("Red".to_string());
        });
        assert!(vehicle.notes.is_none());
        assert_eq!(vehicle.color.as_deref(), Some("Red"));
    }

    #[test]
    fn expense_dates_accept_several_shapes() {
        for value in [
            "2024-03-05",
            "2024-03-05T00:00:00Z",
            "2024-03-05 00:00:00+00",
            "2024-03-05T00:00:00",
        ] {
            let expense = expense(ExpenseRow {
                id: Some("e1".to_string()),
                description: Some("Tyres".to_string()),
                amount: Some(320.4),
                expense_date: Some(value.to_string()),
                ..Default::default()
            })
            .unwrap();
            assert_eq!(
                expense.date,
                Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap(),
                "{value}"
            );
            assert_eq!(expense.amount, MoneyCents::new(32_040));
        }
    }

    #[test]
    fn patches_translate_to_sparse_updates() {
        let update = car_update(&VehiclePatch {
            miles: Some(70_000),
            notes: Some(None),
            ..Default::default()
        });
        assert_eq!(update.mileage, Some(70_000));
        assert_eq!(update.notes, Some(None));
        assert!(update.make.is_none());

        let sold = car_sold(
            MoneyCents::new(725_050),
            Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap(),
        );
        assert_eq!(sold.sale_price, 7250.5);
        assert_eq!(sold.sale_date, "2024-06-01T10:00:00.000Z");
    }
}

//! CSV export of the inventory.

use std::io::Write;

use chrono::SecondsFormat;
use csv::{QuoteStyle, WriterBuilder};
use serde::Serialize;

use crate::{EngineError, ResultEngine, Vehicle};

/// Suggested file name for exports.
pub const DEFAULT_FILE_NAME: &str = "car_inventory.csv";

#[derive(Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "ID")]
    id: &'a str,
    #[serde(rename = "Make")]
    make: &'a str,
    #[serde(rename = "Model")]
    model: &'a str,
    #[serde(rename = "Year")]
    year: i32,
    #[serde(rename = "Miles")]
    miles: u32,
    #[serde(rename = "Purchase Price")]
    purchase_price: String,
    #[serde(rename = "Selling Price")]
    selling_price: String,
    #[serde(rename = "Sold")]
    sold: &'static str,
    #[serde(rename = "Sold Date")]
    sold_date: String,
    #[serde(rename = "Notes")]
    notes: &'a str,
    #[serde(rename = "Created At")]
    created_at: String,
}

impl<'a> From<&'a Vehicle> for ExportRow<'a> {
    fn from(vehicle: &'a Vehicle) -> Self {
        Self {
            id: vehicle.id.as_str(),
            make: &vehicle.make,
            model: &vehicle.model,
            year: vehicle.year,
            miles: vehicle.miles,
            purchase_price: vehicle.purchase_price.to_major_string(),
            selling_price: vehicle
                .sale_price()
                .map(|price| price.to_major_string())
                .unwrap_or_default(),
            sold: if vehicle.is_sold() { "Yes" } else { "No" },
            sold_date: vehicle
                .sale_date()
                .map(|date| date.to_rfc3339_opts(SecondsFormat::Millis, true))
                .unwrap_or_default(),
            notes: vehicle.notes.as_deref().unwrap_or(""),
            created_at: vehicle
                .created_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Write one header row and one row per vehicle, in the given order.
///
/// The header is written bare. Every field of a data row is quoted, so notes
/// always come out quoted whatever they contain.
pub fn write_csv<'a, W, I>(mut writer: W, vehicles: I) -> ResultEngine<()>
where
    W: Write,
    I: IntoIterator<Item = &'a Vehicle>,
{
    writeln!(writer, "{}", HEADER.join(","))
        .map_err(|err| EngineError::Export(format!("failed to write export: {err}")))?;

    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Always)
        .from_writer(writer);
    let mut rows = 0usize;
    for vehicle in vehicles {
        writer
            .serialize(ExportRow::from(vehicle))
            .map_err(|err| EngineError::Export(format!("failed to write export row: {err}")))?;
        rows += 1;
    }
    writer
        .flush()
        .map_err(|err| EngineError::Export(format!("failed to finalize export: {err}")))?;
    tracing::debug!("exported {rows} vehicles");
    Ok(())
}

/// Render the export in memory.
pub fn to_csv_string<'a, I>(vehicles: I) -> ResultEngine<String>
where
    I: IntoIterator<Item = &'a Vehicle>,
{
    let mut buf = Vec::new();
    write_csv(&mut buf, vehicles)?;
    String::from_utf8(buf)
        .map_err(|err| EngineError::Export(format!("export is not valid utf-8: {err}")))
}

pub const HEADER: [&str; 11] = [
    "ID",
    "Make",
    "Model",
    "Year",
    "Miles",
    "Purchase Price",
    "Selling Price",
    "Sold",
    "Sold Date",
    "Notes",
    "Created At",
];

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::{MoneyCents, NewVehicle, VehicleId};

    fn vehicle(id: &str, notes: Option<&str>) -> Vehicle {
        Vehicle::from_new(
            VehicleId::new(id),
            NewVehicle {
                make: "Mazda".to_string(),
                model: "3".to_string(),
                year: 2017,
                miles: 70_500,
                purchase_price: MoneyCents::new(750_050),
                book_value: MoneyCents::new(750_050),
                color: None,
                notes: notes.map(str::to_string),
                image_url: None,
                invoice_url: None,
            },
            Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap(),
        )
    }

    #[test]
    fn empty_export_has_only_the_header() {
        let out = to_csv_string(&Vec::<Vehicle>::new()).unwrap();
        assert_eq!(
            out,
            "ID,Make,Model,Year,Miles,Purchase Price,Selling Price,Sold,Sold Date,Notes,Created At\n"
        );
    }

    #[test]
    fn rows_cover_sold_and_unsold_vehicles() {
        let unsold = vehicle("a", None);
        let mut sold = vehicle("b", Some("said \"mint\", it wasn't"));
        sold.sell(
            MoneyCents::from_dollars(9_000),
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        )
        .unwrap();

        let out = to_csv_string([&unsold, &sold]).unwrap();
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], HEADER.join(","));
        assert_eq!(
            lines[1],
            r#""a","Mazda","3","2017","70500","7500.50","","No","","","2024-02-03T04:05:06.000Z""#
        );
        assert_eq!(
            lines[2],
            r#""b","Mazda","3","2017","70500","7500.50","9000.00","Yes","2024-03-01T12:00:00.000Z","said ""mint"", it wasn't","2024-02-03T04:05:06.000Z""#
        );
    }

    #[test]
    fn notes_are_quoted_even_when_plain() {
        let plain = vehicle("c", Some("clean title"));
        let numeric = vehicle("d", Some("123"));

        let out = to_csv_string([&plain, &numeric]).unwrap();
        let lines: Vec<&str> = out.lines().collect();

        assert!(lines[1].contains(r#","clean title","#));
        assert!(lines[2].contains(r#","123","#));

        let mut reader = csv::Reader::from_reader(out.as_bytes());
        let notes: Vec<String> = reader
            .records()
            .map(|record| record.unwrap()[9].to_string())
            .collect();
        assert_eq!(notes, ["clean title", "123"]);
    }
}

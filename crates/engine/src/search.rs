//! Free-text search over the inventory list.

use crate::Vehicle;

/// `true` when `query` (already trimmed and lowercased) appears in the make,
/// model or year of the vehicle.
fn matches(vehicle: &Vehicle, query: &str) -> bool {
    vehicle.make.to_lowercase().contains(query)
        || vehicle.model.to_lowercase().contains(query)
        || vehicle.year.to_string().contains(query)
}

/// Filter vehicles by a case-insensitive substring match on make, model or
/// year, then order them newest first by creation time.
///
/// A blank query keeps every vehicle. Sorting happens regardless of the query
/// and is stable, so vehicles created at the same instant keep their input
/// order.
pub fn filter_and_sort<'a, I>(vehicles: I, query: &str) -> Vec<&'a Vehicle>
where
    I: IntoIterator<Item = &'a Vehicle>,
{
    let needle = query.trim().to_lowercase();

    let mut out: Vec<&Vehicle> = if needle.is_empty() {
        vehicles.into_iter().collect()
    } else {
        vehicles
            .into_iter()
            .filter(|vehicle| matches(vehicle, &needle))
            .collect()
    };

    out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    out
}

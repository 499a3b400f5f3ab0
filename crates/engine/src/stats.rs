//! Aggregate profit/loss figures over the whole inventory.

use serde::{Deserialize, Serialize};

use crate::{MoneyCents, Vehicle};

/// Summary metrics derived from hydrated vehicles. Never persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryStats {
    pub total_cars: usize,
    pub sold_cars: usize,
    pub inventory_cars: usize,
    /// Purchase prices plus expenses, over every vehicle.
    pub total_investment: MoneyCents,
    /// Sale prices of sold vehicles.
    pub total_revenue: MoneyCents,
    pub total_profit: MoneyCents,
    /// `total_profit / sold_cars`, zero when nothing has been sold.
    pub average_profit: MoneyCents,
    /// Book value of vehicles still in inventory.
    pub total_book_value: MoneyCents,
}

impl InventoryStats {
    /// Compute the stats from vehicles whose expenses are already loaded.
    pub fn from_vehicles<'a, I>(vehicles: I) -> Self
    where
        I: IntoIterator<Item = &'a Vehicle>,
    {
        let mut stats = Self::default();

        for vehicle in vehicles {
            let cost = vehicle.total_cost();
            stats.total_cars += 1;
            stats.total_investment += cost;

            match vehicle.sale_price() {
                Some(price) => {
                    stats.sold_cars += 1;
                    stats.total_revenue += price;
                    stats.total_profit += price - cost;
                }
                None => {
                    stats.inventory_cars += 1;
                    stats.total_book_value += vehicle.book_value;
                }
            }
        }

        stats.average_profit = stats.total_profit.div_round(stats.sold_cars as u64);
        stats
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::{Expense, ExpenseId, NewVehicle, VehicleId};

    fn vehicle(id: &str, purchase: i64, book: i64, expenses: &[i64], sold_at: Option<i64>) -> Vehicle {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut vehicle = Vehicle::from_new(
            VehicleId::new(id),
            NewVehicle {
                make: "Ford".to_string(),
                model: "Focus".to_string(),
                year: 2015,
                miles: 90_000,
                purchase_price: MoneyCents::from_dollars(purchase),
                book_value: MoneyCents::from_dollars(book),
                color: None,
                notes: None,
                image_url: None,
                invoice_url: None,
            },
            created,
        );
        vehicle.expenses = expenses
            .iter()
            .enumerate()
            .map(|(idx, amount)| Expense {
                id: ExpenseId::new(format!("{id}-e{idx}")),
                description: "repair".to_string(),
                amount: MoneyCents::from_dollars(*amount),
                date: created + Duration::days(idx as i64),
            })
            .collect();
        if let Some(price) = sold_at {
            vehicle
                .sell(MoneyCents::from_dollars(price), created + Duration::days(30))
                .unwrap();
        }
        vehicle
    }

    #[test]
    fn extreme_amounts_saturate_instead_of_panicking() {
        let mut vehicles = vec![vehicle("a", 0, 0, &[], None), vehicle("b", 0, 0, &[], None)];
        for vehicle in &mut vehicles {
            vehicle.purchase_price = MoneyCents::new(i64::MAX);
            vehicle.book_value = MoneyCents::new(i64::MAX);
        }
        let stats = InventoryStats::from_vehicles(&vehicles);
        assert_eq!(stats.total_cars, 2);
        assert_eq!(stats.total_investment, MoneyCents::new(i64::MAX));
        assert_eq!(stats.total_book_value, MoneyCents::new(i64::MAX));
    }

    #[test]
    fn empty_inventory_is_all_zero() {
        let stats = InventoryStats::from_vehicles(&Vec::<Vehicle>::new());
        assert_eq!(stats, InventoryStats::default());
        assert_eq!(stats.average_profit, MoneyCents::ZERO);
    }

    #[test]
    fn one_sold_one_in_stock() {
        let vehicles = vec![
            vehicle("a", 10_000, 10_000, &[500], Some(12_000)),
            vehicle("b", 8_000, 9_000, &[], None),
        ];
        let stats = InventoryStats::from_vehicles(&vehicles);

        assert_eq!(stats.total_cars, 2);
        assert_eq!(stats.sold_cars, 1);
        assert_eq!(stats.inventory_cars, 1);
        assert_eq!(stats.total_profit, MoneyCents::from_dollars(1_500));
        assert_eq!(stats.average_profit, MoneyCents::from_dollars(1_500));
        assert_eq!(stats.total_book_value, MoneyCents::from_dollars(9_000));
        assert_eq!(stats.total_investment, MoneyCents::from_dollars(18_500));
        assert_eq!(stats.total_revenue, MoneyCents::from_dollars(12_000));
    }

    #[test]
    fn nothing_sold_means_zero_average() {
        let vehicles = vec![
            vehicle("a", 5_000, 6_000, &[200, 300], None),
            vehicle("b", 7_000, 7_000, &[], None),
        ];
        let stats = InventoryStats::from_vehicles(&vehicles);
        assert_eq!(stats.sold_cars, 0);
        assert_eq!(stats.average_profit, MoneyCents::ZERO);
        assert_eq!(stats.total_profit, MoneyCents::ZERO);
        assert_eq!(stats.total_book_value, MoneyCents::from_dollars(13_000));
    }

    #[test]
    fn book_value_ignores_sold_vehicles_and_counts_partition() {
        let vehicles = vec![
            vehicle("a", 1_000, 50_000, &[], Some(2_000)),
            vehicle("b", 1_000, 1_500, &[], None),
            vehicle("c", 3_000, 3_000, &[1_000], Some(2_500)),
        ];
        let stats = InventoryStats::from_vehicles(&vehicles);
        assert_eq!(stats.total_cars, stats.sold_cars + stats.inventory_cars);
        assert_eq!(stats.total_book_value, MoneyCents::from_dollars(1_500));
        // (2000 - 1000) + (2500 - 3000 - 1000) = -500, averaged over two sales
        assert_eq!(stats.total_profit, MoneyCents::from_dollars(-500));
        assert_eq!(stats.average_profit, MoneyCents::from_dollars(-250));
    }
}

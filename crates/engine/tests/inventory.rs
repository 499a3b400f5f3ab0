use std::path::PathBuf;

use engine::{
    AttachmentTarget, EngineError, ExpenseEditForm, ExpenseForm, Field, Gateway, Inventory,
    MemoryGateway, MoneyCents, VehicleEditForm, VehicleForm, VehicleId,
};
use uuid::Uuid;

async fn inventory() -> Inventory<MemoryGateway> {
    let gateway = MemoryGateway::with_signed_in("dealer@lot.test", "secret")
        .await
        .unwrap();
    let mut inventory = Inventory::new(gateway);
    inventory.load().await.unwrap();
    inventory
}

fn form(make: &str, model: &str, year: &str, price: &str) -> VehicleForm {
    VehicleForm {
        make: make.to_string(),
        model: model.to_string(),
        year: year.to_string(),
        miles: "80000".to_string(),
        purchase_price: price.to_string(),
        ..Default::default()
    }
}

fn expense(description: &str, amount: &str, date: &str) -> ExpenseForm {
    ExpenseForm {
        description: description.to_string(),
        amount: amount.to_string(),
        date: date.to_string(),
    }
}

fn temp_file(name: &str, bytes: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("lotbook_{}_{name}", Uuid::new_v4()));
    std::fs::write(&path, bytes).unwrap();
    path
}

#[tokio::test]
async fn sold_and_unsold_vehicles_aggregate_into_stats() {
    let mut inventory = inventory().await;

    let sold = inventory
        .add_vehicle(&form("Honda", "Civic", "2018", "10000"))
        .await
        .unwrap();
    inventory
        .add_expense(&sold, &expense("Brakes", "500", "2024-04-02"))
        .await
        .unwrap();
    inventory.sell_vehicle(&sold, "12000").await.unwrap();

    let mut kept = form("Ford", "Focus", "2015", "8000");
    kept.book_value = "9000".to_string();
    inventory.add_vehicle(&kept).await.unwrap();

    let stats = inventory.stats();
    assert_eq!(stats.total_cars, 2);
    assert_eq!(stats.sold_cars, 1);
    assert_eq!(stats.inventory_cars, 1);
    assert_eq!(stats.total_investment, MoneyCents::from_dollars(18_500));
    assert_eq!(stats.total_revenue, MoneyCents::from_dollars(12_000));
    assert_eq!(stats.total_profit, MoneyCents::from_dollars(1_500));
    assert_eq!(stats.average_profit, MoneyCents::from_dollars(1_500));
    assert_eq!(stats.total_book_value, MoneyCents::from_dollars(9_000));

    // A fresh load from the backend yields the same numbers.
    inventory.load().await.unwrap();
    assert_eq!(inventory.stats(), stats);
}

#[tokio::test]
async fn invalid_forms_never_reach_the_gateway() {
    let mut inventory = inventory().await;
    inventory.gateway().set_offline(true);

    let err = inventory
        .add_vehicle(&form("", "Civic", "1850", "-4"))
        .await
        .unwrap_err();
    let EngineError::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(errors.get(Field::Make), Some("Make is required"));
    assert_eq!(errors.get(Field::Year), Some("Please enter a valid year"));
    assert_eq!(
        errors.get(Field::PurchasePrice),
        Some("Please enter a valid purchase price")
    );
}

#[tokio::test]
async fn oversized_prices_are_rejected_and_stats_stay_exact() {
    let mut inventory = inventory().await;

    for _ in 0..2 {
        let err = inventory
            .add_vehicle(&form("Bugatti", "Chiron", "2020", "90000000000000000"))
            .await
            .unwrap_err();
        let EngineError::Validation(errors) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(
            errors.get(Field::PurchasePrice),
            Some("Please enter a valid purchase price")
        );
    }

    for _ in 0..2 {
        inventory
            .add_vehicle(&form("Bugatti", "Chiron", "2020", "1000000000"))
            .await
            .unwrap();
    }
    let stats = inventory.stats();
    assert_eq!(stats.total_cars, 2);
    assert_eq!(stats.total_investment, MoneyCents::from_dollars(2_000_000_000));
    assert_eq!(stats.total_book_value, MoneyCents::from_dollars(2_000_000_000));
}

#[tokio::test]
async fn selling_requires_a_positive_price() {
    let mut inventory = inventory().await;
    let id = inventory
        .add_vehicle(&form("Kia", "Rio", "2019", "6000"))
        .await
        .unwrap();

    for price in ["0", "-100", "abc", ""] {
        let err = inventory.sell_vehicle(&id, price).await.unwrap_err();
        assert!(err.is_validation(), "{price:?} -> {err:?}");
    }
    assert!(!inventory.vehicle(&id).unwrap().is_sold());

    inventory.sell_vehicle(&id, "7250.50").await.unwrap();
    let vehicle = inventory.vehicle(&id).unwrap();
    assert_eq!(vehicle.sale_price(), Some(MoneyCents::new(725_050)));
    assert!(vehicle.sale_date().is_some());

    let err = inventory.sell_vehicle(&id, "8000").await.unwrap_err();
    assert!(matches!(err, EngineError::AlreadySold(_)));
}

#[tokio::test]
async fn failed_writes_leave_local_state_untouched() {
    let mut inventory = inventory().await;
    let id = inventory
        .add_vehicle(&form("Mazda", "3", "2017", "7000"))
        .await
        .unwrap();
    let before = inventory.vehicles().to_vec();

    inventory.gateway().set_offline(true);

    let err = inventory
        .add_vehicle(&form("Audi", "A4", "2016", "12000"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::GatewayWrite(_)));

    let edit = VehicleEditForm {
        miles: Some("90000".to_string()),
        ..Default::default()
    };
    assert!(inventory.update_vehicle(&id, &edit).await.is_err());
    assert!(inventory.sell_vehicle(&id, "9000").await.is_err());
    assert!(
        inventory
            .add_expense(&id, &expense("Detailing", "150", ""))
            .await
            .is_err()
    );
    assert!(inventory.delete_vehicle(&id).await.is_err());

    assert_eq!(inventory.vehicles(), before.as_slice());
}

#[tokio::test]
async fn failed_load_keeps_the_stale_list() {
    let mut inventory = inventory().await;
    inventory
        .add_vehicle(&form("Mazda", "3", "2017", "7000"))
        .await
        .unwrap();

    inventory.gateway().set_offline(true);
    let err = inventory.load().await.unwrap_err();
    assert!(matches!(err, EngineError::GatewayRead(_)));
    assert_eq!(
        err.alert(),
        "Failed to load inventory data. Please try again."
    );
    assert_eq!(inventory.vehicles().len(), 1);
}

#[tokio::test]
async fn query_filters_visible_vehicles_but_not_stats() {
    let mut inventory = inventory().await;
    for (make, model) in [("Honda", "Civic"), ("Ford", "Fiesta"), ("Honda", "Jazz")] {
        inventory
            .add_vehicle(&form(make, model, "2014", "4000"))
            .await
            .unwrap();
    }

    inventory.set_query("  honda ");
    let visible: Vec<&str> = inventory
        .visible()
        .iter()
        .map(|vehicle| vehicle.model.as_str())
        .collect();
    assert_eq!(visible, vec!["Jazz", "Civic"]);
    assert_eq!(inventory.stats().total_cars, 3);

    inventory.set_query("");
    assert_eq!(inventory.visible().len(), 3);
}

#[tokio::test]
async fn expenses_are_edited_and_removed() {
    let mut inventory = inventory().await;
    let id = inventory
        .add_vehicle(&form("Toyota", "Yaris", "2012", "3000"))
        .await
        .unwrap();
    let older = inventory
        .add_expense(&id, &expense("Oil change", "80", "2024-01-10"))
        .await
        .unwrap();
    let newer = inventory
        .add_expense(&id, &expense("Tyres", "320.40", "2024-02-10"))
        .await
        .unwrap();

    let ids: Vec<_> = inventory.vehicle(&id).unwrap().expenses.iter().map(|e| e.id.clone()).collect();
    assert_eq!(ids, vec![newer.clone(), older.clone()]);

    let edit = ExpenseEditForm {
        amount: Some("95".to_string()),
        ..Default::default()
    };
    inventory.update_expense(&id, &older, &edit).await.unwrap();
    inventory.delete_expense(&id, &newer).await.unwrap();

    let vehicle = inventory.vehicle(&id).unwrap();
    assert_eq!(vehicle.expenses.len(), 1);
    assert_eq!(vehicle.total_expenses(), MoneyCents::from_dollars(95));
    assert_eq!(vehicle.total_cost(), MoneyCents::from_dollars(3_095));

    inventory.load().await.unwrap();
    assert_eq!(
        inventory.vehicle(&id).unwrap().total_expenses(),
        MoneyCents::from_dollars(95)
    );
}

#[tokio::test]
async fn deleting_a_vehicle_works_from_either_state() {
    let mut inventory = inventory().await;
    let sold = inventory
        .add_vehicle(&form("Kia", "Ceed", "2016", "5000"))
        .await
        .unwrap();
    inventory.sell_vehicle(&sold, "6000").await.unwrap();
    let unsold = inventory
        .add_vehicle(&form("Kia", "Picanto", "2018", "4000"))
        .await
        .unwrap();

    inventory.delete_vehicle(&sold).await.unwrap();
    inventory.delete_vehicle(&unsold).await.unwrap();
    assert!(inventory.vehicles().is_empty());

    let err = inventory.delete_vehicle(&sold).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn attachments_are_uploaded_and_resolved() {
    let mut inventory = inventory().await;
    let id = inventory
        .add_vehicle(&form("Skoda", "Octavia", "2019", "11000"))
        .await
        .unwrap();

    let err = inventory.open_invoice(&id).unwrap_err();
    assert_eq!(err.alert(), "no invoice attached");

    let pdf = temp_file("invoice.pdf", b"%PDF-1.4 test");
    let url = inventory.attach_invoice(&id, &pdf).await.unwrap();
    assert!(url.contains("/invoices/"));
    assert!(url.ends_with(".pdf"));
    assert_eq!(
        inventory.gateway().blob(&url).await.as_deref(),
        Some(b"%PDF-1.4 test".as_slice())
    );
    assert_eq!(
        inventory.vehicle(&id).unwrap().invoice_url.as_deref(),
        Some(url.as_str())
    );
    let _ = std::fs::remove_file(pdf);

    let missing = std::env::temp_dir().join(format!("lotbook_{}.jpg", Uuid::new_v4()));
    let err = inventory.attach_image(&id, &missing).await.unwrap_err();
    assert!(matches!(err, EngineError::Attachment(_)));
    assert!(inventory.vehicle(&id).unwrap().image_url.is_none());
}

#[tokio::test]
async fn non_pdf_invoices_are_not_uploaded() {
    let mut inventory = inventory().await;
    let id = inventory
        .add_vehicle(&form("Volvo", "V70", "2008", "3200"))
        .await
        .unwrap();

    let notes = temp_file("notes.txt", b"plain text");
    let err = inventory.attach_invoice(&id, &notes).await.unwrap_err();
    assert_eq!(err, EngineError::Attachment("Please select a PDF file".to_string()));
    assert!(inventory.vehicle(&id).unwrap().invoice_url.is_none());
    let _ = std::fs::remove_file(notes);
}

#[tokio::test]
async fn local_invoice_paths_resolve_when_present() {
    let mut inventory = inventory().await;
    let pdf = temp_file("local.pdf", b"%PDF");
    let mut with_invoice = form("Fiat", "Panda", "2013", "2500");
    with_invoice.invoice_url = pdf.display().to_string();
    let id = inventory.add_vehicle(&with_invoice).await.unwrap();

    assert_eq!(
        inventory.open_invoice(&id).unwrap(),
        AttachmentTarget::Local(pdf.clone())
    );

    std::fs::remove_file(&pdf).unwrap();
    assert!(matches!(
        inventory.open_invoice(&id),
        Err(EngineError::Attachment(_))
    ));
}

#[tokio::test]
async fn unknown_vehicle_is_reported() {
    let inventory = inventory().await;
    let err = inventory.vehicle(&VehicleId::new("nope")).unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
    assert!(inventory.gateway().current_user().await.unwrap().is_some());
}

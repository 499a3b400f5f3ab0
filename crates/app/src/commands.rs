use std::{fs::File, io::Write};

use engine::{
    AttachmentTarget, BlobKind, EngineError, ExpenseEditForm, ExpenseForm, ExpenseId, Gateway,
    Inventory, InventoryStats, SettingsStore, Vehicle, VehicleEditForm, VehicleForm, VehicleId,
    export,
};

use crate::{
    cli::{AddArgs, AuthArgs, Command, EditArgs, ExpenseCommand, ThemeAction},
    error::Result,
    prompt,
};

/// Execute one command. Output goes to `out`, prompts to stderr.
pub async fn run<G: Gateway, W: Write>(
    command: Command,
    inventory: &mut Inventory<G>,
    settings: &mut SettingsStore,
    out: &mut W,
) -> Result<()> {
    match command {
        Command::Signup(args) => {
            let (email, password) = credentials(args, true)?;
            let session = inventory.gateway().sign_up(&email, &password).await?;
            writeln!(out, "Account created, signed in as {}", display_user(&session.user))?;
        }
        Command::Login(args) => {
            let (email, password) = credentials(args, false)?;
            let session = inventory.gateway().sign_in(&email, &password).await?;
            writeln!(out, "Signed in as {}", display_user(&session.user))?;
        }
        Command::Logout => {
            inventory.gateway().sign_out().await?;
            writeln!(out, "Signed out")?;
        }
        Command::Whoami => match inventory.gateway().current_user().await? {
            Some(user) => writeln!(out, "{}", display_user(&user))?,
            None => return Err(EngineError::NotAuthenticated.into()),
        },
        Command::List(args) => {
            inventory.load().await?;
            inventory.set_query(args.query.unwrap_or_default());
            let visible = inventory.visible();
            if args.output.json {
                serde_json::to_writer_pretty(&mut *out, &visible)?;
                writeln!(out)?;
            } else if visible.is_empty() {
                writeln!(out, "No vehicles found")?;
            } else {
                for vehicle in visible {
                    writeln!(out, "{}", list_line(vehicle))?;
                }
            }
        }
        Command::Show(args) => {
            inventory.load().await?;
            let vehicle = inventory.vehicle(&VehicleId::new(args.id))?;
            if args.output.json {
                serde_json::to_writer_pretty(&mut *out, vehicle)?;
                writeln!(out)?;
            } else {
                write_detail(out, vehicle)?;
            }
        }
        Command::Add(args) => add(inventory, args, out).await?,
        Command::Edit(args) => {
            inventory.load().await?;
            let id = VehicleId::new(&args.id);
            inventory.update_vehicle(&id, &edit_form(args)).await?;
            writeln!(out, "Updated {}", inventory.vehicle(&id)?.title())?;
        }
        Command::Delete(args) => {
            inventory.load().await?;
            let id = VehicleId::new(args.id);
            let title = inventory.vehicle(&id)?.title();
            inventory.delete_vehicle(&id).await?;
            writeln!(out, "Deleted {title}")?;
        }
        Command::Sell(args) => {
            inventory.load().await?;
            let id = VehicleId::new(args.id);
            inventory.sell_vehicle(&id, &args.price).await?;
            let vehicle = inventory.vehicle(&id)?;
            writeln!(out, "Sold {}", vehicle.title())?;
            if let Some(profit) = vehicle.profit() {
                writeln!(out, "Profit: {profit}")?;
            }
        }
        Command::Expense(args) => expense(inventory, args.command, out).await?,
        Command::Stats(args) => {
            inventory.load().await?;
            let stats = inventory.stats();
            if args.json {
                serde_json::to_writer_pretty(&mut *out, &stats)?;
                writeln!(out)?;
            } else {
                write_stats(out, &stats)?;
            }
        }
        Command::Export(args) => {
            inventory.load().await?;
            let vehicles = inventory.visible();
            if args.out == "-" {
                export::write_csv(&mut *out, vehicles.iter().copied())?;
            } else {
                let file = File::create(&args.out)?;
                export::write_csv(file, vehicles.iter().copied())?;
                writeln!(out, "Exported {} vehicles to {}", vehicles.len(), args.out)?;
            }
        }
        Command::Attach(args) => {
            inventory.load().await?;
            let id = VehicleId::new(args.id);
            let url = match BlobKind::from(args.kind) {
                BlobKind::Image => inventory.attach_image(&id, &args.path).await?,
                BlobKind::Invoice => inventory.attach_invoice(&id, &args.path).await?,
            };
            writeln!(out, "{url}")?;
        }
        Command::Open(args) => {
            inventory.load().await?;
            let id = VehicleId::new(args.id);
            let target = match BlobKind::from(args.kind) {
                BlobKind::Image => inventory.open_image(&id)?,
                BlobKind::Invoice => inventory.open_invoice(&id)?,
            };
            match target {
                AttachmentTarget::Remote(url) => writeln!(out, "{url}")?,
                AttachmentTarget::Local(path) => writeln!(out, "{}", path.display())?,
            }
        }
        Command::Theme(args) => {
            let dark = match args.action {
                ThemeAction::Show => settings.dark_mode(),
                ThemeAction::Toggle => settings.toggle_dark_mode()?,
                ThemeAction::Dark => {
                    settings.set_dark_mode(true)?;
                    true
                }
                ThemeAction::Light => {
                    settings.set_dark_mode(false)?;
                    false
                }
            };
            writeln!(out, "Dark mode: {}", if dark { "on" } else { "off" })?;
        }
    }
    Ok(())
}

fn credentials(args: AuthArgs, new_account: bool) -> Result<(String, String)> {
    let email = match args.email {
        Some(email) => email,
        None => prompt::prompt_line("Email: ")?,
    };
    let password = match args.password {
        Some(password) => password,
        None if new_account => prompt::prompt_new_password()?,
        None => prompt::prompt_password("Password: ")?,
    };
    Ok((email, password))
}

fn display_user(user: &engine::User) -> String {
    match &user.email {
        Some(email) => format!("{email} ({})", user.id),
        None => user.id.clone(),
    }
}

async fn add<G: Gateway, W: Write>(
    inventory: &mut Inventory<G>,
    args: AddArgs,
    out: &mut W,
) -> Result<()> {
    let form = VehicleForm {
        make: args.make,
        model: args.model,
        year: args.year,
        miles: args.miles,
        purchase_price: args.price,
        book_value: args.book_value.unwrap_or_default(),
        color: args.color.unwrap_or_default(),
        notes: args.notes.unwrap_or_default(),
        ..Default::default()
    };
    let id = inventory.add_vehicle(&form).await?;
    writeln!(out, "Added {} ({id})", inventory.vehicle(&id)?.title())?;

    // The vehicle exists at this point; a failed upload is reported but
    // does not undo it.
    if let Some(path) = args.image {
        match inventory.attach_image(&id, &path).await {
            Ok(url) => writeln!(out, "Image: {url}")?,
            Err(err) => writeln!(out, "Image not attached: {}", err.alert())?,
        }
    }
    if let Some(path) = args.invoice {
        match inventory.attach_invoice(&id, &path).await {
            Ok(url) => writeln!(out, "Invoice: {url}")?,
            Err(err) => writeln!(out, "Invoice not attached: {}", err.alert())?,
        }
    }
    Ok(())
}

fn edit_form(args: EditArgs) -> VehicleEditForm {
    VehicleEditForm {
        make: args.make,
        model: args.model,
        year: args.year,
        miles: args.miles,
        purchase_price: args.price,
        book_value: args.book_value,
        color: args.color,
        notes: args.notes,
    }
}

async fn expense<G: Gateway, W: Write>(
    inventory: &mut Inventory<G>,
    command: ExpenseCommand,
    out: &mut W,
) -> Result<()> {
    inventory.load().await?;
    match command {
        ExpenseCommand::List(args) => {
            let vehicle = inventory.vehicle(&VehicleId::new(args.vehicle))?;
            if args.output.json {
                serde_json::to_writer_pretty(&mut *out, &vehicle.expenses)?;
                writeln!(out)?;
            } else {
                write_expenses(out, vehicle)?;
            }
        }
        ExpenseCommand::Add(args) => {
            let form = ExpenseForm {
                description: args.description,
                amount: args.amount,
                date: args.date.unwrap_or_default(),
            };
            let vehicle_id = VehicleId::new(args.vehicle);
            let id = inventory.add_expense(&vehicle_id, &form).await?;
            writeln!(out, "Added expense {id}")?;
        }
        ExpenseCommand::Edit(args) => {
            let form = ExpenseEditForm {
                description: args.description,
                amount: args.amount,
                date: args.date,
            };
            let vehicle_id = VehicleId::new(args.vehicle);
            let id = ExpenseId::new(args.expense);
            inventory.update_expense(&vehicle_id, &id, &form).await?;
            writeln!(out, "Updated expense {id}")?;
        }
        ExpenseCommand::Delete(args) => {
            let vehicle_id = VehicleId::new(args.vehicle);
            let id = ExpenseId::new(args.expense);
            inventory.delete_expense(&vehicle_id, &id).await?;
            writeln!(out, "Deleted expense {id}")?;
        }
    }
    Ok(())
}

fn list_line(vehicle: &Vehicle) -> String {
    let status = match vehicle.sale_price() {
        Some(price) => format!("sold {price}"),
        None => "in stock".to_string(),
    };
    format!(
        "{:<38} {:<28} {:>9} mi  {:>14}  {status}",
        vehicle.id.as_str(),
        vehicle.title(),
        vehicle.miles,
        vehicle.purchase_price.to_string(),
    )
}

fn write_detail<W: Write>(out: &mut W, vehicle: &Vehicle) -> Result<()> {
    writeln!(out, "{}", vehicle.title())?;
    writeln!(out, "  id:             {}", vehicle.id)?;
    writeln!(out, "  miles:          {}", vehicle.miles)?;
    if let Some(color) = &vehicle.color {
        writeln!(out, "  color:          {color}")?;
    }
    writeln!(out, "  purchase price: {}", vehicle.purchase_price)?;
    writeln!(out, "  book value:     {}", vehicle.book_value)?;
    writeln!(out, "  expenses:       {}", vehicle.total_expenses())?;
    writeln!(out, "  total cost:     {}", vehicle.total_cost())?;
    match (vehicle.sale_price(), vehicle.sale_date(), vehicle.profit()) {
        (Some(price), Some(date), Some(profit)) => {
            writeln!(out, "  sold:           {price} on {}", date.format("%Y-%m-%d"))?;
            writeln!(out, "  profit:         {profit}")?;
        }
        _ => writeln!(out, "  status:         in stock")?,
    }
    if let Some(notes) = &vehicle.notes {
        writeln!(out, "  notes:          {notes}")?;
    }
    if let Some(url) = &vehicle.image_url {
        writeln!(out, "  image:          {url}")?;
    }
    if let Some(url) = &vehicle.invoice_url {
        writeln!(out, "  invoice:        {url}")?;
    }
    write_expenses(out, vehicle)
}

fn write_expenses<W: Write>(out: &mut W, vehicle: &Vehicle) -> Result<()> {
    let expenses = vehicle.expenses_newest_first();
    if expenses.is_empty() {
        writeln!(out, "No expenses recorded")?;
        return Ok(());
    }
    writeln!(out, "Expenses:")?;
    for expense in expenses {
        writeln!(
            out,
            "  {}  {:>12}  {}  ({})",
            expense.date.format("%Y-%m-%d"),
            expense.amount.to_string(),
            expense.description,
            expense.id
        )?;
    }
    Ok(())
}

fn write_stats<W: Write>(out: &mut W, stats: &InventoryStats) -> Result<()> {
    writeln!(out, "Total cars:       {}", stats.total_cars)?;
    writeln!(out, "Sold:             {}", stats.sold_cars)?;
    writeln!(out, "In inventory:     {}", stats.inventory_cars)?;
    writeln!(out, "Total investment: {}", stats.total_investment)?;
    writeln!(out, "Total revenue:    {}", stats.total_revenue)?;
    writeln!(out, "Total profit:     {}", stats.total_profit)?;
    writeln!(out, "Average profit:   {}", stats.average_profit)?;
    writeln!(out, "Inventory value:  {}", stats.total_book_value)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use engine::MemoryGateway;

    use super::*;
    use crate::cli::Cli;

    struct Harness {
        inventory: Inventory<MemoryGateway>,
        settings: SettingsStore,
    }

    impl Harness {
        async fn new() -> Self {
            let path = std::env::temp_dir()
                .join(format!("lotbook_cli_{}", uuid::Uuid::new_v4()))
                .join("settings.json");
            Self {
                inventory: Inventory::new(MemoryGateway::demo().await.unwrap()),
                settings: SettingsStore::load(path).unwrap(),
            }
        }

        async fn run(&mut self, args: &[&str]) -> Result<String> {
            let cli = Cli::try_parse_from(std::iter::once("lotbook").chain(args.iter().copied()))
                .unwrap();
            let mut out = Vec::new();
            run(cli.command, &mut self.inventory, &mut self.settings, &mut out).await?;
            Ok(String::from_utf8(out).unwrap())
        }
    }

    #[tokio::test]
    async fn stats_reflect_the_demo_lot() {
        let mut harness = Harness::new().await;
        let out = harness.run(&["stats", "--json"]).await.unwrap();
        let stats: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(stats["total_cars"], 3);
        assert_eq!(stats["sold_cars"], 1);
        // 11_900 - 9_800 - 320 - 150
        assert_eq!(stats["total_profit"], 163_000);
    }

    #[tokio::test]
    async fn add_then_sell_prints_profit() {
        let mut harness = Harness::new().await;
        let out = harness
            .run(&[
                "add", "--make", "Kia", "--model", "Rio", "--year", "2019", "--miles", "30000",
                "--price", "6000",
            ])
            .await
            .unwrap();
        assert!(out.starts_with("Added 2019 Kia Rio"), "{out}");

        let id = harness
            .inventory
            .vehicles()
            .iter()
            .find(|v| v.model == "Rio")
            .map(|v| v.id.to_string())
            .unwrap();
        let out = harness.run(&["sell", &id, "--price", "7000"]).await.unwrap();
        assert!(out.contains("Profit: $1,000.00"), "{out}");

        let err = harness.run(&["sell", &id, "--price", "8000"]).await.unwrap_err();
        assert_eq!(err.alert(), "This car has already been sold.");
    }

    #[tokio::test]
    async fn invalid_input_reports_field_messages() {
        let mut harness = Harness::new().await;
        let err = harness
            .run(&[
                "add", "--make", "", "--model", "Rio", "--year", "19", "--miles", "1",
                "--price", "1",
            ])
            .await
            .unwrap_err();
        let alert = err.alert();
        assert!(alert.contains("Make is required"), "{alert}");
        assert!(alert.contains("Please enter a valid year"), "{alert}");
    }

    #[tokio::test]
    async fn list_filters_by_query() {
        let mut harness = Harness::new().await;
        let out = harness.run(&["list", "--query", "toyota"]).await.unwrap();
        assert_eq!(out.lines().count(), 1);
        assert!(out.contains("2019 Toyota Corolla"));

        let out = harness.run(&["list", "-q", "tesla"]).await.unwrap();
        assert_eq!(out.trim(), "No vehicles found");
    }

    #[tokio::test]
    async fn export_to_stdout_writes_csv() {
        let mut harness = Harness::new().await;
        let out = harness.run(&["export", "--out", "-"]).await.unwrap();
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some(export::HEADER.join(",").as_str()));
        assert_eq!(lines.count(), 3);
    }

    #[tokio::test]
    async fn theme_toggle_persists() {
        let mut harness = Harness::new().await;
        assert_eq!(harness.run(&["theme"]).await.unwrap().trim(), "Dark mode: off");
        assert_eq!(
            harness.run(&["theme", "toggle"]).await.unwrap().trim(),
            "Dark mode: on"
        );
        let reloaded = SettingsStore::load(harness.settings.path()).unwrap();
        assert!(reloaded.dark_mode());
    }

    #[tokio::test]
    async fn open_without_invoice_is_reported() {
        let mut harness = Harness::new().await;
        let id = harness.inventory.gateway().list_vehicles().await.unwrap()[0]
            .id
            .to_string();
        let err = harness.run(&["open", "invoice", &id]).await.unwrap_err();
        assert_eq!(err.alert(), "no invoice attached");
    }
}

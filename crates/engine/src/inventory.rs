//! The inventory state container.
//!
//! [`Inventory`] owns a [`Gateway`], the hydrated vehicle list and the
//! current search query. Input arrives as raw forms and is validated before
//! any gateway call. Every write goes to the gateway first; the local list is
//! only touched once the gateway confirmed it, so a failed write leaves the
//! inventory exactly as it was.

use std::path::Path;

use chrono::Utc;

use crate::{
    EngineError, ExpenseId, ResultEngine, VehicleId,
    attachment::{self, AttachmentTarget},
    expense,
    forms::{self, ExpenseEditForm, ExpenseForm, VehicleEditForm, VehicleForm},
    gateway::{BlobKind, Gateway},
    search,
    stats::InventoryStats,
    vehicle::{Vehicle, VehiclePatch},
};

#[derive(Debug)]
pub struct Inventory<G> {
    gateway: G,
    vehicles: Vec<Vehicle>,
    query: String,
}

impl<G: Gateway> Inventory<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            vehicles: Vec::new(),
            query: String::new(),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Fetch every vehicle and hydrate its expenses.
    ///
    /// On failure the previously loaded list is kept.
    pub async fn load(&mut self) -> ResultEngine<()> {
        match self.fetch_all().await {
            Ok(vehicles) => {
                tracing::debug!("loaded {} vehicles", vehicles.len());
                self.vehicles = vehicles;
                Ok(())
            }
            Err(err) => {
                tracing::warn!("inventory load failed: {err}");
                Err(err)
            }
        }
    }

    async fn fetch_all(&self) -> ResultEngine<Vec<Vehicle>> {
        let mut vehicles = self.gateway.list_vehicles().await?;
        for vehicle in &mut vehicles {
            let mut expenses = self.gateway.list_expenses(&vehicle.id).await?;
            expense::sort_newest_first(&mut expenses);
            vehicle.expenses = expenses;
        }
        Ok(vehicles)
    }

    /// All loaded vehicles, in gateway order.
    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    /// Vehicles matching the current query, newest first.
    pub fn visible(&self) -> Vec<&Vehicle> {
        search::filter_and_sort(&self.vehicles, &self.query)
    }

    /// Aggregates over every loaded vehicle, regardless of the query.
    pub fn stats(&self) -> InventoryStats {
        InventoryStats::from_vehicles(&self.vehicles)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn vehicle(&self, id: &VehicleId) -> ResultEngine<&Vehicle> {
        self.vehicles
            .iter()
            .find(|vehicle| &vehicle.id == id)
            .ok_or_else(|| EngineError::KeyNotFound(format!("vehicle {id}")))
    }

    fn vehicle_mut(&mut self, id: &VehicleId) -> ResultEngine<&mut Vehicle> {
        self.vehicles
            .iter_mut()
            .find(|vehicle| &vehicle.id == id)
            .ok_or_else(|| EngineError::KeyNotFound(format!("vehicle {id}")))
    }

    pub async fn add_vehicle(&mut self, form: &VehicleForm) -> ResultEngine<VehicleId> {
        let new = form.validate()?;
        let created = self.gateway.create_vehicle(&new).await?;
        let id = created.id.clone();
        tracing::info!("added {} ({id})", created.title());
        self.vehicles.insert(0, created);
        Ok(id)
    }

    /// Apply the edited fields. An edit that changes nothing is a no-op.
    pub async fn update_vehicle(
        &mut self,
        id: &VehicleId,
        form: &VehicleEditForm,
    ) -> ResultEngine<()> {
        let patch = form.validate()?;
        self.apply_vehicle_patch(id, patch).await
    }

    async fn apply_vehicle_patch(&mut self, id: &VehicleId, patch: VehiclePatch) -> ResultEngine<()> {
        self.vehicle(id)?;
        if patch.is_empty() {
            return Ok(());
        }
        self.gateway.update_vehicle(id, &patch).await?;
        self.vehicle_mut(id)?.apply_patch(&patch);
        Ok(())
    }

    pub async fn delete_vehicle(&mut self, id: &VehicleId) -> ResultEngine<()> {
        self.vehicle(id)?;
        self.gateway.delete_vehicle(id).await?;
        self.vehicles.retain(|vehicle| &vehicle.id != id);
        tracing::info!("deleted vehicle {id}");
        Ok(())
    }

    /// Move a vehicle to `Sold` at the typed price, stamped with the current
    /// time.
    pub async fn sell_vehicle(&mut self, id: &VehicleId, price: &str) -> ResultEngine<()> {
        let price = forms::parse_sale_price(price)?;
        self.vehicle(id)?.check_sellable(price)?;
        let date = Utc::now();
        self.gateway.mark_sold(id, price, date).await?;
        self.vehicle_mut(id)?.sell(price, date)?;
        tracing::info!("sold vehicle {id} for {price}");
        Ok(())
    }

    pub async fn add_expense(
        &mut self,
        vehicle_id: &VehicleId,
        form: &ExpenseForm,
    ) -> ResultEngine<ExpenseId> {
        let new = form.validate()?;
        self.vehicle(vehicle_id)?;
        let created = self.gateway.create_expense(vehicle_id, &new).await?;
        let id = created.id.clone();
        let vehicle = self.vehicle_mut(vehicle_id)?;
        vehicle.expenses.push(created);
        expense::sort_newest_first(&mut vehicle.expenses);
        Ok(id)
    }

    pub async fn update_expense(
        &mut self,
        vehicle_id: &VehicleId,
        id: &ExpenseId,
        form: &ExpenseEditForm,
    ) -> ResultEngine<()> {
        let patch = form.validate()?;
        self.expense_index(vehicle_id, id)?;
        if patch.is_empty() {
            return Ok(());
        }
        self.gateway.update_expense(vehicle_id, id, &patch).await?;
        let index = self.expense_index(vehicle_id, id)?;
        let vehicle = self.vehicle_mut(vehicle_id)?;
        vehicle.expenses[index].apply_patch(&patch);
        expense::sort_newest_first(&mut vehicle.expenses);
        Ok(())
    }

    pub async fn delete_expense(
        &mut self,
        vehicle_id: &VehicleId,
        id: &ExpenseId,
    ) -> ResultEngine<()> {
        self.expense_index(vehicle_id, id)?;
        self.gateway.delete_expense(vehicle_id, id).await?;
        let index = self.expense_index(vehicle_id, id)?;
        self.vehicle_mut(vehicle_id)?.expenses.remove(index);
        Ok(())
    }

    fn expense_index(&self, vehicle_id: &VehicleId, id: &ExpenseId) -> ResultEngine<usize> {
        self.vehicle(vehicle_id)?
            .expenses
            .iter()
            .position(|expense| &expense.id == id)
            .ok_or_else(|| EngineError::KeyNotFound(format!("expense {id}")))
    }

    /// Upload a photo and store its public URL on the vehicle.
    pub async fn attach_image(&mut self, id: &VehicleId, path: &Path) -> ResultEngine<String> {
        self.attach(id, BlobKind::Image, path).await
    }

    /// Upload an invoice PDF and store its public URL on the vehicle.
    pub async fn attach_invoice(&mut self, id: &VehicleId, path: &Path) -> ResultEngine<String> {
        self.attach(id, BlobKind::Invoice, path).await
    }

    async fn attach(&mut self, id: &VehicleId, kind: BlobKind, path: &Path) -> ResultEngine<String> {
        self.vehicle(id)?;
        let bytes = attachment::read_upload(kind, path).await?;
        let url = self.gateway.upload_blob(id, kind, bytes).await?;
        let patch = match kind {
            BlobKind::Image => VehiclePatch {
                image_url: Some(Some(url.clone())),
                ..Default::default()
            },
            BlobKind::Invoice => VehiclePatch {
                invoice_url: Some(Some(url.clone())),
                ..Default::default()
            },
        };
        self.apply_vehicle_patch(id, patch).await?;
        tracing::info!("attached {} to vehicle {id}", kind.label());
        Ok(url)
    }

    /// Resolve the invoice of a vehicle for opening.
    pub fn open_invoice(&self, id: &VehicleId) -> ResultEngine<AttachmentTarget> {
        let vehicle = self.vehicle(id)?;
        attachment::resolve(BlobKind::Invoice, vehicle.invoice_url.as_deref())
    }

    /// Resolve the photo of a vehicle for opening.
    pub fn open_image(&self, id: &VehicleId) -> ResultEngine<AttachmentTarget> {
        let vehicle = self.vehicle(id)?;
        attachment::resolve(BlobKind::Image, vehicle.image_url.as_deref())
    }
}

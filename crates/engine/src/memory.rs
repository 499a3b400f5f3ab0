//! In-process [`Gateway`] used by tests and by offline demo sessions.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, Ordering},
};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    EngineError, ExpenseId, ExpensePatch, MoneyCents, NewExpense, NewVehicle, ResultEngine,
    SaleState, VehicleId, VehiclePatch,
    expense::{self, Expense},
    gateway::{BlobKind, Gateway, Session, User},
    vehicle::Vehicle,
};

const PUBLIC_BASE: &str = "memory://storage/v1/object/public";

pub const DEMO_EMAIL: &str = "demo@lotbook.local";
pub const DEMO_PASSWORD: &str = "demo";

#[derive(Debug)]
struct Account {
    password: String,
    user: User,
}

#[derive(Debug)]
struct StoredVehicle {
    user_id: String,
    vehicle: Vehicle,
}

#[derive(Debug)]
struct StoredExpense {
    user_id: String,
    vehicle_id: VehicleId,
    expense: Expense,
}

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<String, Account>,
    session: Option<User>,
    vehicles: Vec<StoredVehicle>,
    expenses: Vec<StoredExpense>,
    blobs: HashMap<String, Vec<u8>>,
    last_created_at: Option<DateTime<Utc>>,
}

impl State {
    fn user_id(&self) -> ResultEngine<String> {
        self.session
            .as_ref()
            .map(|user| user.id.clone())
            .ok_or(EngineError::NotAuthenticated)
    }

    /// Creation stamps are strictly increasing so newest-first is total.
    fn next_created_at(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_created_at {
            Some(last) if now <= last => last + Duration::milliseconds(1),
            _ => now,
        };
        self.last_created_at = Some(stamp);
        stamp
    }

    fn vehicle_mut(&mut self, user_id: &str, id: &VehicleId) -> ResultEngine<&mut Vehicle> {
        self.vehicles
            .iter_mut()
            .find(|row| row.user_id == user_id && &row.vehicle.id == id)
            .map(|row| &mut row.vehicle)
            .ok_or_else(|| EngineError::KeyNotFound(format!("vehicle {id}")))
    }

    fn expense_mut(
        &mut self,
        user_id: &str,
        vehicle_id: &VehicleId,
        id: &ExpenseId,
    ) -> ResultEngine<&mut Expense> {
        self.expenses
            .iter_mut()
            .find(|row| {
                row.user_id == user_id && &row.vehicle_id == vehicle_id && &row.expense.id == id
            })
            .map(|row| &mut row.expense)
            .ok_or_else(|| EngineError::KeyNotFound(format!("expense {id}")))
    }

    fn session_for(user: &User) -> Session {
        Session {
            access_token: format!("memory-{}", user.id),
            refresh_token: None,
            user: user.clone(),
        }
    }
}

/// A gateway that keeps every row in memory.
///
/// `set_offline(true)` makes every call fail the way a dropped network would,
/// which is how write and read failure paths are exercised.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    state: Mutex<State>,
    offline: AtomicBool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account and sign it in.
    pub async fn with_signed_in(email: &str, password: &str) -> ResultEngine<Self> {
        let gateway = Self::new();
        gateway.sign_up(email, password).await?;
        Ok(gateway)
    }

    /// A signed-in demo account with a small lot: two cars in stock and one
    /// sold with expenses.
    pub async fn demo() -> ResultEngine<Self> {
        let gateway = Self::with_signed_in(DEMO_EMAIL, DEMO_PASSWORD).await?;
        let lot = [
            ("Honda", "Civic", 2018, 61_200, 980_000, None),
            ("Ford", "Focus", 2015, 98_400, 520_000, Some(590_000)),
            ("Toyota", "Corolla", 2019, 42_000, 1_150_000, None),
        ];
        let mut ids = Vec::new();
        for (make, model, year, miles, price, book) in lot {
            let vehicle = gateway
                .create_vehicle(&NewVehicle {
                    make: make.to_string(),
                    model: model.to_string(),
                    year,
                    miles,
                    purchase_price: MoneyCents::new(price),
                    book_value: MoneyCents::new(book.unwrap_or(price)),
                    color: None,
                    notes: None,
                    image_url: None,
                    invoice_url: None,
                })
                .await?;
            ids.push(vehicle.id);
        }

        let now = Utc::now();
        let expenses = [("Brake pads", 32_000, 20), ("Detailing", 15_000, 12)];
        for (description, amount, days_ago) in expenses {
            gateway
                .create_expense(
                    &ids[0],
                    &NewExpense {
                        description: description.to_string(),
                        amount: MoneyCents::new(amount),
                        date: now - Duration::days(days_ago),
                    },
                )
                .await?;
        }
        gateway
            .mark_sold(&ids[0], MoneyCents::new(1_190_000), now - Duration::days(3))
            .await?;
        Ok(gateway)
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Raw bytes of an uploaded object, looked up by its public URL.
    pub async fn blob(&self, url: &str) -> Option<Vec<u8>> {
        self.state.lock().await.blobs.get(url).cloned()
    }

    fn check_read(&self) -> ResultEngine<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(EngineError::GatewayRead("network unavailable".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> ResultEngine<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(EngineError::GatewayWrite("network unavailable".to_string()));
        }
        Ok(())
    }
}

impl Gateway for MemoryGateway {
    async fn current_user(&self) -> ResultEngine<Option<User>> {
        self.check_read()?;
        Ok(self.state.lock().await.session.clone())
    }

    async fn sign_in(&self, email: &str, password: &str) -> ResultEngine<Session> {
        self.check_read()?;
        let mut state = self.state.lock().await;
        let user = match state.accounts.get(&email.to_lowercase()) {
            Some(account) if account.password == password => account.user.clone(),
            _ => return Err(EngineError::Auth("Invalid login credentials".to_string())),
        };
        state.session = Some(user.clone());
        tracing::debug!("signed in {}", user.id);
        Ok(State::session_for(&user))
    }

    async fn sign_up(&self, email: &str, password: &str) -> ResultEngine<Session> {
        self.check_write()?;
        if email.trim().is_empty() || password.is_empty() {
            return Err(EngineError::Auth(
                "Email and password are required".to_string(),
            ));
        }
        let key = email.to_lowercase();
        let mut state = self.state.lock().await;
        if state.accounts.contains_key(&key) {
            return Err(EngineError::Auth("User already registered".to_string()));
        }
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: Some(email.to_string()),
        };
        state.accounts.insert(
            key,
            Account {
                password: password.to_string(),
                user: user.clone(),
            },
        );
        state.session = Some(user.clone());
        Ok(State::session_for(&user))
    }

    async fn sign_out(&self) -> ResultEngine<()> {
        self.check_write()?;
        self.state.lock().await.session = None;
        Ok(())
    }

    async fn list_vehicles(&self) -> ResultEngine<Vec<Vehicle>> {
        self.check_read()?;
        let state = self.state.lock().await;
        let user_id = state.user_id()?;
        let mut out: Vec<Vehicle> = state
            .vehicles
            .iter()
            .filter(|row| row.user_id == user_id)
            .map(|row| row.vehicle.clone())
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn create_vehicle(&self, new: &NewVehicle) -> ResultEngine<Vehicle> {
        self.check_write()?;
        let mut state = self.state.lock().await;
        let user_id = state.user_id()?;
        let created_at = state.next_created_at();
        let vehicle = Vehicle::from_new(
            VehicleId::new(Uuid::new_v4().to_string()),
            new.clone(),
            created_at,
        );
        state.vehicles.push(StoredVehicle {
            user_id,
            vehicle: vehicle.clone(),
        });
        Ok(vehicle)
    }

    async fn update_vehicle(&self, id: &VehicleId, patch: &VehiclePatch) -> ResultEngine<()> {
        self.check_write()?;
        let mut state = self.state.lock().await;
        let user_id = state.user_id()?;
        state.vehicle_mut(&user_id, id)?.apply_patch(patch);
        Ok(())
    }

    async fn delete_vehicle(&self, id: &VehicleId) -> ResultEngine<()> {
        self.check_write()?;
        let mut state = self.state.lock().await;
        let user_id = state.user_id()?;
        let before = state.vehicles.len();
        state
            .vehicles
            .retain(|row| !(row.user_id == user_id && &row.vehicle.id == id));
        if state.vehicles.len() == before {
            return Err(EngineError::KeyNotFound(format!("vehicle {id}")));
        }
        state
            .expenses
            .retain(|row| !(row.user_id == user_id && &row.vehicle_id == id));
        Ok(())
    }

    async fn mark_sold(
        &self,
        id: &VehicleId,
        price: MoneyCents,
        date: DateTime<Utc>,
    ) -> ResultEngine<()> {
        self.check_write()?;
        let mut state = self.state.lock().await;
        let user_id = state.user_id()?;
        state.vehicle_mut(&user_id, id)?.sale = SaleState::Sold { price, date };
        Ok(())
    }

    async fn list_expenses(&self, vehicle_id: &VehicleId) -> ResultEngine<Vec<Expense>> {
        self.check_read()?;
        let state = self.state.lock().await;
        let user_id = state.user_id()?;
        let mut out: Vec<Expense> = state
            .expenses
            .iter()
            .filter(|row| row.user_id == user_id && &row.vehicle_id == vehicle_id)
            .map(|row| row.expense.clone())
            .collect();
        expense::sort_newest_first(&mut out);
        Ok(out)
    }

    async fn create_expense(
        &self,
        vehicle_id: &VehicleId,
        new: &NewExpense,
    ) -> ResultEngine<Expense> {
        self.check_write()?;
        let mut state = self.state.lock().await;
        let user_id = state.user_id()?;
        state.vehicle_mut(&user_id, vehicle_id)?;
        let expense = Expense::from_new(ExpenseId::new(Uuid::new_v4().to_string()), new.clone());
        state.expenses.push(StoredExpense {
            user_id,
            vehicle_id: vehicle_id.clone(),
            expense: expense.clone(),
        });
        Ok(expense)
    }

    async fn update_expense(
        &self,
        vehicle_id: &VehicleId,
        id: &ExpenseId,
        patch: &ExpensePatch,
    ) -> ResultEngine<()> {
        self.check_write()?;
        let mut state = self.state.lock().await;
        let user_id = state.user_id()?;
        state.expense_mut(&user_id, vehicle_id, id)?.apply_patch(patch);
        Ok(())
    }

    async fn delete_expense(&self, vehicle_id: &VehicleId, id: &ExpenseId) -> ResultEngine<()> {
        self.check_write()?;
        let mut state = self.state.lock().await;
        let user_id = state.user_id()?;
        let before = state.expenses.len();
        state.expenses.retain(|row| {
            !(row.user_id == user_id && &row.vehicle_id == vehicle_id && &row.expense.id == id)
        });
        if state.expenses.len() == before {
            return Err(EngineError::KeyNotFound(format!("expense {id}")));
        }
        Ok(())
    }

    async fn upload_blob(
        &self,
        vehicle_id: &VehicleId,
        kind: BlobKind,
        bytes: Vec<u8>,
    ) -> ResultEngine<String> {
        self.check_write()?;
        let mut state = self.state.lock().await;
        let user_id = state.user_id()?;
        state.vehicle_mut(&user_id, vehicle_id)?;
        let path = kind.object_path(&user_id, vehicle_id, Utc::now());
        let url = format!("{PUBLIC_BASE}/{}/{path}", kind.bucket());
        state.blobs.insert(url.clone(), bytes);
        Ok(url)
    }
}

//! Core of the used-car inventory: domain model, money, statistics, search,
//! form validation, CSV export and the gateway seam to the backend.

pub use attachment::AttachmentTarget;
pub use error::EngineError;
pub use expense::{Expense, ExpenseId, ExpensePatch, NewExpense};
pub use forms::{
    ExpenseEditForm, ExpenseForm, Field, FieldErrors, VehicleEditForm, VehicleForm,
};
pub use gateway::{BlobKind, Gateway, Session, User};
pub use inventory::Inventory;
pub use memory::{DEMO_EMAIL, DEMO_PASSWORD, MemoryGateway};
pub use money::MoneyCents;
pub use settings::{Settings, SettingsStore};
pub use stats::InventoryStats;
pub use vehicle::{NewVehicle, SaleState, Vehicle, VehicleId, VehiclePatch};

pub mod attachment;
mod error;
pub mod expense;
pub mod export;
pub mod forms;
mod gateway;
mod inventory;
mod memory;
mod money;
pub mod search;
pub mod settings;
mod stats;
mod vehicle;

pub type ResultEngine<T> = Result<T, EngineError>;

//! The persistence gateway seam.
//!
//! The engine never talks to the backend directly. Everything that leaves the
//! process goes through [`Gateway`]: session handling, vehicle and expense
//! rows, and blob uploads. Implementations scope every read and write to the
//! signed-in user.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    ExpenseId, ExpensePatch, MoneyCents, NewExpense, NewVehicle, ResultEngine, VehicleId,
    VehiclePatch, expense::Expense, vehicle::Vehicle,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
}

/// An authenticated session as returned by sign in / sign up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: User,
}

/// The two kinds of files that can be attached to a vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlobKind {
    Image,
    Invoice,
}

impl BlobKind {
    pub fn bucket(self) -> &'static str {
        match self {
            Self::Image => "car-photos",
            Self::Invoice => "invoices",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Image => "image/jpeg",
            Self::Invoice => "application/pdf",
        }
    }

    /// Object path inside the bucket, namespaced by user and vehicle.
    pub fn object_path(self, user_id: &str, vehicle_id: &VehicleId, at: DateTime<Utc>) -> String {
        let millis = at.timestamp_millis();
        match self {
            Self::Image => format!("{user_id}/{vehicle_id}/{millis}.jpg"),
            Self::Invoice => format!("{user_id}/{vehicle_id}/invoice_{millis}.pdf"),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Invoice => "invoice",
        }
    }
}

/// Backend operations consumed by the inventory.
///
/// Reads fail with [`EngineError::GatewayRead`], writes with
/// [`EngineError::GatewayWrite`]. Calls made without a session fail with
/// [`EngineError::NotAuthenticated`].
///
/// `list_vehicles` returns vehicles newest first with empty expense lists;
/// expenses are fetched per vehicle with `list_expenses`.
///
///  [`EngineError::GatewayRead`]: crate::EngineError::GatewayRead
///  [`EngineError::GatewayWrite`]: crate::EngineError::GatewayWrite
///  [`EngineError::NotAuthenticated`]: crate::EngineError::NotAuthenticated
pub trait Gateway: Send + Sync {
    fn current_user(&self) -> impl Future<Output = ResultEngine<Option<User>>> + Send;

    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = ResultEngine<Session>> + Send;

    fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = ResultEngine<Session>> + Send;

    fn sign_out(&self) -> impl Future<Output = ResultEngine<()>> + Send;

    fn list_vehicles(&self) -> impl Future<Output = ResultEngine<Vec<Vehicle>>> + Send;

    fn create_vehicle(
        &self,
        new: &NewVehicle,
    ) -> impl Future<Output = ResultEngine<Vehicle>> + Send;

    fn update_vehicle(
        &self,
        id: &VehicleId,
        patch: &VehiclePatch,
    ) -> impl Future<Output = ResultEngine<()>> + Send;

    fn delete_vehicle(&self, id: &VehicleId) -> impl Future<Output = ResultEngine<()>> + Send;

    fn mark_sold(
        &self,
        id: &VehicleId,
        price: MoneyCents,
        date: DateTime<Utc>,
    ) -> impl Future<Output = ResultEngine<()>> + Send;

    fn list_expenses(
        &self,
        vehicle_id: &VehicleId,
    ) -> impl Future<Output = ResultEngine<Vec<Expense>>> + Send;

    fn create_expense(
        &self,
        vehicle_id: &VehicleId,
        new: &NewExpense,
    ) -> impl Future<Output = ResultEngine<Expense>> + Send;

    fn update_expense(
        &self,
        vehicle_id: &VehicleId,
        id: &ExpenseId,
        patch: &ExpensePatch,
    ) -> impl Future<Output = ResultEngine<()>> + Send;

    fn delete_expense(
        &self,
        vehicle_id: &VehicleId,
        id: &ExpenseId,
    ) -> impl Future<Output = ResultEngine<()>> + Send;

    /// Store `bytes` and return the public URL of the object.
    fn upload_blob(
        &self,
        vehicle_id: &VehicleId,
        kind: BlobKind,
        bytes: Vec<u8>,
    ) -> impl Future<Output = ResultEngine<String>> + Send;
}

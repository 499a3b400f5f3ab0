//! HTTP implementation of the engine's [`Gateway`] against a Supabase-style
//! backend: `/auth/v1` for sessions, `/rest/v1` for rows and `/storage/v1`
//! for images and invoices.

use api_types::{
    auth::{AuthUser, Credentials, TokenResponse},
    car::CarRow,
    expense::ExpenseRow,
    storage::UploadResponse,
};
use chrono::{DateTime, Utc};
use engine::{
    BlobKind, EngineError, Expense, ExpenseId, ExpensePatch, Gateway, MoneyCents, NewExpense,
    NewVehicle, ResultEngine, Session, User, Vehicle, VehicleId, VehiclePatch,
};
use reqwest::{Method, header::CONTENT_TYPE};
use tokio::sync::RwLock;

pub use error::GatewayError;

use client::RestClient;

mod client;
mod error;
pub mod session_file;
pub mod translate;

const CARS: &str = "rest/v1/cars";
const EXPENSES: &str = "rest/v1/expenses";

#[derive(Debug)]
pub struct HttpGateway {
    rest: RestClient,
    session: RwLock<Option<Session>>,
}

impl HttpGateway {
    /// Return a builder for `HttpGateway`.
    pub fn builder() -> HttpGatewayBuilder {
        HttpGatewayBuilder::default()
    }

    /// The current session, if any. Callers persist it between runs.
    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    /// Public URL of an object in a storage bucket.
    pub fn public_url(&self, kind: BlobKind, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{path}",
            self.rest.base_url(),
            kind.bucket()
        )
    }

    /// Access token and user id of the current session.
    async fn credentials(&self) -> ResultEngine<(String, String)> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|session| (session.access_token.clone(), session.user.id.clone()))
            .ok_or(EngineError::NotAuthenticated)
    }

    async fn store_session(&self, resp: TokenResponse) -> ResultEngine<Session> {
        let Some(access_token) = resp.access_token else {
            return Err(EngineError::Auth(
                "Check your email for the confirmation link".to_string(),
            ));
        };
        let user = resp
            .user
            .or_else(|| {
                resp.id.map(|id| AuthUser {
                    id,
                    email: resp.email.clone(),
                })
            })
            .ok_or_else(|| EngineError::Auth("auth response without user".to_string()))?;

        let session = Session {
            access_token,
            refresh_token: resp.refresh_token,
            user: user_from(user),
        };
        *self.session.write().await = Some(session.clone());
        tracing::info!("signed in as {}", session.user.id);
        Ok(session)
    }

    async fn password_auth(&self, path: &str, email: &str, password: &str) -> ResultEngine<Session> {
        let req = self.rest.request(Method::POST, path, None);
        let body = Credentials {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let resp: TokenResponse = RestClient::json_body(req, &body)
            .await
            .map_err(GatewayError::into_auth)?;
        self.store_session(resp).await
    }

    /// `PATCH` one row of `cars` owned by the current user.
    async fn patch_car<T: serde::Serialize>(&self, id: &VehicleId, body: &T) -> ResultEngine<()> {
        let (token, user_id) = self.credentials().await?;
        let req = self
            .rest
            .request(Method::PATCH, CARS, Some(&token))
            .query(&[("id", eq(id)), ("user_id", eq(&user_id))])
            .json(body);
        RestClient::unit(req).await.map_err(GatewayError::into_write)
    }
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

fn user_from(user: AuthUser) -> User {
    User {
        id: user.id,
        email: user.email,
    }
}

/// Take the single row a `return=representation` write answers with.
fn first_row<T>(rows: Vec<T>) -> Result<T, GatewayError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| GatewayError::Decode("write returned no row".to_string()))
}

impl Gateway for HttpGateway {
    async fn current_user(&self) -> ResultEngine<Option<User>> {
        let Ok((token, _)) = self.credentials().await else {
            return Ok(None);
        };
        let req = self.rest.request(Method::GET, "auth/v1/user", Some(&token));
        match RestClient::json::<AuthUser>(req).await {
            Ok(user) => Ok(Some(user_from(user))),
            Err(GatewayError::Server { status, .. }) if status == reqwest::StatusCode::UNAUTHORIZED => {
                tracing::debug!("stored session is no longer valid");
                *self.session.write().await = None;
                Ok(None)
            }
            Err(err) => Err(err.into_read()),
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> ResultEngine<Session> {
        self.password_auth("auth/v1/token?grant_type=password", email, password)
            .await
    }

    async fn sign_up(&self, email: &str, password: &str) -> ResultEngine<Session> {
        self.password_auth("auth/v1/signup", email, password).await
    }

    async fn sign_out(&self) -> ResultEngine<()> {
        let Some(session) = self.session.write().await.take() else {
            return Ok(());
        };
        let req = self
            .rest
            .request(Method::POST, "auth/v1/logout", Some(&session.access_token));
        RestClient::unit(req).await.map_err(GatewayError::into_write)?;
        tracing::info!("signed out {}", session.user.id);
        Ok(())
    }

    async fn list_vehicles(&self) -> ResultEngine<Vec<Vehicle>> {
        let (token, user_id) = self.credentials().await?;
        let req = self
            .rest
            .request(Method::GET, CARS, Some(&token))
            .query(&[
                ("select", "*".to_string()),
                ("user_id", eq(&user_id)),
                ("order", "created_at.desc".to_string()),
            ]);
        let rows: Vec<CarRow> = RestClient::json(req).await.map_err(GatewayError::into_read)?;
        rows.into_iter().map(translate::vehicle).collect()
    }

    async fn create_vehicle(&self, new: &NewVehicle) -> ResultEngine<Vehicle> {
        let (token, user_id) = self.credentials().await?;
        let req = self
            .rest
            .request(Method::POST, CARS, Some(&token))
            .header("Prefer", "return=representation");
        let rows: Vec<CarRow> = RestClient::json_body(req, &translate::car_insert(&user_id, new))
            .await
            .map_err(GatewayError::into_write)?;
        let row = first_row(rows).map_err(GatewayError::into_write)?;
        translate::vehicle(row)
    }

    async fn update_vehicle(&self, id: &VehicleId, patch: &VehiclePatch) -> ResultEngine<()> {
        self.patch_car(id, &translate::car_update(patch)).await
    }

    async fn delete_vehicle(&self, id: &VehicleId) -> ResultEngine<()> {
        let (token, user_id) = self.credentials().await?;
        let req = self
            .rest
            .request(Method::DELETE, CARS, Some(&token))
            .query(&[("id", eq(id)), ("user_id", eq(&user_id))]);
        RestClient::unit(req).await.map_err(GatewayError::into_write)
    }

    async fn mark_sold(
        &self,
        id: &VehicleId,
        price: MoneyCents,
        date: DateTime<Utc>,
    ) -> ResultEngine<()> {
        self.patch_car(id, &translate::car_sold(price, date)).await
    }

    async fn list_expenses(&self, vehicle_id: &VehicleId) -> ResultEngine<Vec<Expense>> {
        let (token, user_id) = self.credentials().await?;
        let req = self
            .rest
            .request(Method::GET, EXPENSES, Some(&token))
            .query(&[
                ("select", "*".to_string()),
                ("car_id", eq(vehicle_id)),
                ("user_id", eq(&user_id)),
                ("order", "expense_date.desc".to_string()),
            ]);
        let rows: Vec<ExpenseRow> = RestClient::json(req).await.map_err(GatewayError::into_read)?;
        rows.into_iter().map(translate::expense).collect()
    }

    async fn create_expense(
        &self,
        vehicle_id: &VehicleId,
        new: &NewExpense,
    ) -> ResultEngine<Expense> {
        let (token, user_id) = self.credentials().await?;
        let req = self
            .rest
            .request(Method::POST, EXPENSES, Some(&token))
            .header("Prefer", "return=representation");
        let body = translate::expense_insert(&user_id, vehicle_id, new);
        let rows: Vec<ExpenseRow> = RestClient::json_body(req, &body)
            .await
            .map_err(GatewayError::into_write)?;
        let row = first_row(rows).map_err(GatewayError::into_write)?;
        translate::expense(row)
    }

    async fn update_expense(
        &self,
        vehicle_id: &VehicleId,
        id: &ExpenseId,
        patch: &ExpensePatch,
    ) -> ResultEngine<()> {
        let (token, user_id) = self.credentials().await?;
        let req = self
            .rest
            .request(Method::PATCH, EXPENSES, Some(&token))
            .query(&[
                ("id", eq(id)),
                ("car_id", eq(vehicle_id)),
                ("user_id", eq(&user_id)),
            ])
            .json(&translate::expense_update(patch));
        RestClient::unit(req).await.map_err(GatewayError::into_write)
    }

    async fn delete_expense(&self, vehicle_id: &VehicleId, id: &ExpenseId) -> ResultEngine<()> {
        let (token, user_id) = self.credentials().await?;
        let req = self
            .rest
            .request(Method::DELETE, EXPENSES, Some(&token))
            .query(&[
                ("id", eq(id)),
                ("car_id", eq(vehicle_id)),
                ("user_id", eq(&user_id)),
            ]);
        RestClient::unit(req).await.map_err(GatewayError::into_write)
    }

    async fn upload_blob(
        &self,
        vehicle_id: &VehicleId,
        kind: BlobKind,
        bytes: Vec<u8>,
    ) -> ResultEngine<String> {
        let (token, user_id) = self.credentials().await?;
        let path = kind.object_path(&user_id, vehicle_id, Utc::now());
        let req = self
            .rest
            .request(
                Method::POST,
                &format!("storage/v1/object/{}/{path}", kind.bucket()),
                Some(&token),
            )
            .header(CONTENT_TYPE, kind.content_type())
            .header("x-upsert", "true")
            .body(bytes);
        let stored: UploadResponse = RestClient::json(req).await.map_err(|err| {
            EngineError::Attachment(format!("{} upload failed: {err}", kind.label()))
        })?;
        tracing::debug!(
            "uploaded {} as {}",
            kind.label(),
            stored.key.as_deref().unwrap_or(&path)
        );
        Ok(self.public_url(kind, &path))
    }
}

#[derive(Debug, Default)]
pub struct HttpGatewayBuilder {
    base_url: String,
    anon_key: String,
    client: Option<reqwest::Client>,
    session: Option<Session>,
}

impl HttpGatewayBuilder {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Public anon key of the project.
    pub fn anon_key(mut self, anon_key: impl Into<String>) -> Self {
        self.anon_key = anon_key.into();
        self
    }

    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Resume a previously stored session.
    pub fn session(mut self, session: Option<Session>) -> Self {
        self.session = session;
        self
    }

    pub fn build(self) -> Result<HttpGateway, GatewayError> {
        let base_url = self.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(GatewayError::Config(format!(
                "base_url must be an http(s) URL, got {base_url:?}"
            )));
        }
        if self.anon_key.trim().is_empty() {
            return Err(GatewayError::Config("anon_key is required".to_string()));
        }

        let client = self.client.unwrap_or_default();
        Ok(HttpGateway {
            rest: RestClient::new(client, base_url.to_string(), self.anon_key),
            session: RwLock::new(self.session),
        })
    }
}

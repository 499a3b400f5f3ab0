//! Row and payload shapes exchanged with the hosted backend.
//!
//! These types mirror the JSON the backend actually sends, so almost every
//! field is optional and timestamps stay strings. Turning them into the
//! strongly-typed domain model is the job of the gateway's translation layer.

use serde::{Deserialize, Serialize};

pub mod auth {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Credentials {
        pub email: String,
        pub password: String,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct AuthUser {
        pub id: String,
        pub email: Option<String>,
    }

    /// Body of `/auth/v1/token` and `/auth/v1/signup`.
    ///
    /// Sign up returns a bare user (no token) when email confirmation is
    /// enabled on the project, hence the optional fields and the flattened
    /// `id`/`email` pair.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TokenResponse {
        pub access_token: Option<String>,
        pub refresh_token: Option<String>,
        pub user: Option<AuthUser>,
        pub id: Option<String>,
        pub email: Option<String>,
    }
}

pub mod car {
    use super::*;

    /// A row of the `cars` table.
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    pub struct CarRow {
        pub id: Option<String>,
        pub user_id: Option<String>,
        pub make: Option<String>,
        pub model: Option<String>,
        pub year: Option<i64>,
        pub mileage: Option<f64>,
        pub purchase_price: Option<f64>,
        pub book_value: Option<f64>,
        pub color: Option<String>,
        pub notes: Option<String>,
        pub image_url: Option<String>,
        pub invoice_url: Option<String>,
        pub sold: Option<bool>,
        pub sale_price: Option<f64>,
        /// RFC 3339 timestamp.
        pub sale_date: Option<String>,
        /// RFC 3339 timestamp.
        pub created_at: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CarInsert {
        pub user_id: String,
        pub make: String,
        pub model: String,
        pub year: i64,
        pub mileage: i64,
        pub purchase_price: f64,
        pub book_value: f64,
        pub color: Option<String>,
        pub notes: Option<String>,
        pub image_url: Option<String>,
        pub invoice_url: Option<String>,
        pub sold: bool,
    }

    /// Partial update. Absent fields are not sent; `Some(None)` sends `null`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CarUpdate {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub make: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub model: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub year: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub mileage: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub purchase_price: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub book_value: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub color: Option<Option<String>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub notes: Option<Option<String>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub image_url: Option<Option<String>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub invoice_url: Option<Option<String>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CarSold {
        pub sold: bool,
        pub sale_price: f64,
        pub sale_date: String,
    }
}

pub mod expense {
    use super::*;

    /// A row of the `expenses` table.
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseRow {
        pub id: Option<String>,
        pub car_id: Option<String>,
        pub user_id: Option<String>,
        pub description: Option<String>,
        pub amount: Option<f64>,
        /// RFC 3339 timestamp, older rows may carry a plain date.
        pub expense_date: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseInsert {
        pub car_id: String,
        pub user_id: String,
        pub description: String,
        pub amount: f64,
        pub expense_date: String,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseUpdate {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub amount: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub expense_date: Option<String>,
    }
}

pub mod storage {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct UploadResponse {
        #[serde(rename = "Key")]
        pub key: Option<String>,
    }
}

/// Error body of any endpoint. Auth, REST and storage each use a different
/// subset of these fields.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
    pub error_description: Option<String>,
    pub msg: Option<String>,
    pub message: Option<String>,
    pub code: Option<String>,
}

impl ErrorBody {
    /// The most descriptive message present.
    pub fn text(&self) -> Option<&str> {
        self.error_description
            .as_deref()
            .or(self.msg.as_deref())
            .or(self.message.as_deref())
            .or(self.error.as_deref())
    }
}

pub mod auth;
pub mod catalog;
pub mod customer;
pub mod dashboard;
pub mod invoice;
pub mod payment;
pub mod subscription;
pub mod user;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error body shared with erp-core's IntoResponse shape.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// `?id=` query used by single-item GET and DELETE.
#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<Uuid>,
}

/// Body of successful DELETE responses.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

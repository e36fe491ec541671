//! Request shapes for the catalog resource families (products, plans,
//! taxes, discounts). Required fields stay optional here so handlers can
//! answer with the field-specific 400 messages the API promises.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub description: Option<String>,
    pub sales_price: Option<Decimal>,
    pub cost_price: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub id: Option<Uuid>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub description: Option<String>,
    pub sales_price: Option<Decimal>,
    pub cost_price: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanRequest {
    pub name: Option<String>,
    pub billing_period: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub auto_close: Option<bool>,
    pub closable: Option<bool>,
    pub pausable: Option<bool>,
    pub renewable: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlanRequest {
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub billing_period: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub auto_close: Option<bool>,
    pub closable: Option<bool>,
    pub pausable: Option<bool>,
    pub renewable: Option<bool>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaxRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub tax_type: Option<String>,
    pub rate: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaxRequest {
    pub id: Option<Uuid>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub tax_type: Option<String>,
    pub rate: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDiscountRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    #[serde(rename = "type")]
    pub discount_type: Option<String>,
    pub value: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDiscountRequest {
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub code: Option<String>,
    #[serde(rename = "type")]
    pub discount_type: Option<String>,
    pub value: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

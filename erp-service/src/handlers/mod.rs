pub mod auth;
pub mod customers;
pub mod dashboard;
pub mod discounts;
pub mod invoices;
pub mod payments;
pub mod plans;
pub mod products;
pub mod subscriptions;
pub mod taxes;
pub mod users;

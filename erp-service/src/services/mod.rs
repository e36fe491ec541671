pub mod auth;
pub mod database;
pub mod email;
pub mod jwt;
pub mod metrics;
pub mod policy;
pub mod settlement;

pub use auth::AuthService;
pub use database::Database;
pub use email::{EmailProvider, EmailService, NoopEmailer};
pub use jwt::{Claims, JwtService};
pub use metrics::{get_metrics, init_metrics};

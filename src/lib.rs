pub mod api;
pub mod booking;
pub mod db;
pub mod docs;
pub mod gateway;
pub mod mailer;
pub mod models;
pub mod notify;

use sqlx::PgPool;

use crate::gateway::PaymentGateway;
use crate::mailer::Mailer;
use crate::notify::Notifier;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub gateway: PaymentGateway,
    pub notifier: Notifier,
    pub mailer: Mailer,
}

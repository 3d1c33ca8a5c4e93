mod database;
pub mod webhook_delivery_store_postgres;
pub mod webhook_store_postgres;

pub use database::PostgresDatabase;

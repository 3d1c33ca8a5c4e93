pub mod health;
pub mod internal;
pub mod metrics;
pub mod ready;
pub mod webhook;

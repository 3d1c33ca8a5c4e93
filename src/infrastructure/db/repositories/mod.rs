pub mod factory;
pub mod webhook_delivery_repository;
pub mod webhook_repository;

pub use factory::Repositories;

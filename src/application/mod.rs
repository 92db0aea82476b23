// Application layer - Use cases over the dashboard model
pub mod dashboard_repository;
pub mod dashboard_service;
pub mod dashboard_store;
pub mod layout_session;
pub mod persistence;
pub mod templates;
pub mod widget_registry;

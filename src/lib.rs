// Dashboard layout service for the consumption tracker
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

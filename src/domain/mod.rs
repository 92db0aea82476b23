// Domain layer - Dashboard tree and widget catalog types
pub mod dashboard;
pub mod widget;

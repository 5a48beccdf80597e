// Domain layer - Dashboard model, time ranges and page layout
pub mod dashboard;
pub mod layout;
pub mod time_range;

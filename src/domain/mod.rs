pub mod chart;
pub mod errors;
pub mod models;
pub mod session;

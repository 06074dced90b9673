//! Per-account chart state on top of the pure pipeline in [`crate::domain::chart`].
//!
//! [`app::App`] keeps one [`view::ChartView`] per account and rebuilds it
//! whenever the account's history or the requested granularity changes.

pub mod app;
pub mod view;

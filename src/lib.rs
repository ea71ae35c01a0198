//! Computation behind a health tracking app's dashboards: macro ring
//! percentages, bucketed body-metric charts and swipe-to-act list rows.

pub mod config;
pub mod macros;
pub mod models;
pub mod screen;
pub mod series;
pub mod source;
pub mod swipe;

pub use config::Config;
pub use macros::{percentages_of_target, reconcile_macro_percentages, DailyIntake};
pub use series::{bucket_series, bucket_series_at, parse_samples, SeriesSummary, Timeframe};
pub use swipe::{update_swipe_offset, SwipeEvent, SwipeRow};

// Pipeline processing: column normalization, type coercion, joining and derived metrics

pub mod coerce;
pub mod derive;
pub mod join;
pub mod normalize;

pub use coerce::coerce;
pub use derive::add_derived_metrics;
pub use join::{join_on_year, key_by_year, KeyedTable};
pub use normalize::normalize;

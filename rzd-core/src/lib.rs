pub mod error;
pub mod observation;
pub mod site_series;
pub mod table;

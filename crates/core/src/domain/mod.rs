pub mod forecast;
pub mod series;

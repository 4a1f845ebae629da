pub mod in_market;

pub use in_market::resolve_as_of_date;

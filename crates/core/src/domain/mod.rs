pub mod contract;
pub mod investor;
pub mod security;
pub mod universe;

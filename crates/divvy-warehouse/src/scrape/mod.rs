pub mod month;
pub mod row;
pub mod yahoo;

pub use yahoo::YahooFinance;

pub mod alphavantage;
pub mod mock;
pub mod multi_provider;
pub mod quote_provider;
pub mod yahoo;

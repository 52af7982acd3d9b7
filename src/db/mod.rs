pub mod account_queries;
pub mod holding_queries;

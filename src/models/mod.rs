pub mod account;
pub mod consent;
pub mod token;

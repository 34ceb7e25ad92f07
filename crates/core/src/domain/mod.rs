pub mod fiscal;
pub mod quote;
pub mod suggestion;

pub mod history;
pub mod reports;

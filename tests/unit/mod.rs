pub mod investment;
pub mod screening;

pub mod check;
pub mod rule;
pub mod settings;
pub mod usage;

pub mod cleanup;
pub mod health;
pub mod uploads;

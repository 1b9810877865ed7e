pub mod health;
pub mod markets;
pub mod metrics;
pub mod orders;
pub mod portfolio;
pub mod settings;
pub mod trading;

pub mod order_sync;
pub mod portfolio_sync;
pub mod scheduler;
pub mod stop_loss_monitor;
pub mod trading;

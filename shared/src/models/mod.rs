//! Domain models for the retail POS backend

mod cashier;
mod expense;
mod movement;
mod product;
mod sale;
mod stock_take;
mod transfer;
mod waste;

pub use cashier::*;
pub use expense::*;
pub use movement::*;
pub use product::*;
pub use sale::*;
pub use stock_take::*;
pub use transfer::*;
pub use waste::*;

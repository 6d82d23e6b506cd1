//! HTTP handlers for the retail POS backend

pub mod auth;
pub mod expense;
pub mod health;
pub mod movement;
pub mod product;
pub mod sale;
pub mod stock_take;
pub mod transfer;
pub mod waste;

pub use auth::*;
pub use expense::*;
pub use health::*;
pub use movement::*;
pub use product::*;
pub use sale::*;
pub use stock_take::*;
pub use transfer::*;
pub use waste::*;

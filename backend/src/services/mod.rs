//! Business logic services for the retail POS backend

pub mod auth;
pub mod expense;
pub mod ledger;
pub mod product;
pub mod sale;
pub mod stock_take;
pub mod transfer;
pub mod waste;

pub use auth::AuthService;
pub use expense::ExpenseService;
pub use ledger::LedgerService;
pub use product::ProductService;
pub use sale::SaleService;
pub use stock_take::StockTakeService;
pub use transfer::TransferService;
pub use waste::WasteService;

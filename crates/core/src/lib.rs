//! Card-drop and reward resolution for the trading-card game. Keep this crate
//! free of IO; persistence goes through [`GameStore`].

pub mod api;
pub mod booster;
pub mod catalog;
pub mod config;
pub mod drops;
pub mod error;
pub mod events;
pub mod ledger;
pub mod market;
pub mod owned;
pub mod rarity;
pub mod rng;
pub mod slot;
pub mod solo;
pub mod store;

pub use api::*;
pub use booster::*;
pub use catalog::*;
pub use config::*;
pub use drops::*;
pub use error::*;
pub use events::*;
pub use ledger::*;
pub use market::*;
pub use owned::*;
pub use rarity::*;
pub use rng::*;
pub use slot::*;
pub use solo::*;
pub use store::*;

//! Core case opening logic. Keep this crate free of IO and platform concerns.

pub mod config;
pub mod display;
pub mod engine;
pub mod events;
pub mod level;
pub mod memory;
pub mod patterns;
pub mod powerup;
pub mod progression;
pub mod rarity;
pub mod rng;
pub mod services;
pub mod spin;
pub mod timer;
pub mod wear;

pub use config::*;
pub use display::*;
pub use engine::*;
pub use events::*;
pub use level::*;
pub use memory::*;
pub use patterns::*;
pub use powerup::*;
pub use progression::*;
pub use rarity::*;
pub use rng::*;
pub use services::*;
pub use spin::*;
pub use timer::*;
pub use wear::*;

pub mod deck_loader;

pub use deck_loader::{discover_decks, locate_decks};

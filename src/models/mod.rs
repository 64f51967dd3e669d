pub mod deck;
pub mod loaders;
pub mod print;

pub use deck::{Deck, RenderJob};
pub use loaders::{discover_decks, locate_decks};
pub use print::{Margins, PageSize, PrintConfig};

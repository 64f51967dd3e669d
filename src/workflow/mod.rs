pub mod deck_ctx;
pub mod render_flow;
pub mod renderer;

pub use deck_ctx::DeckCtx;
pub use render_flow::{RenderFlow, RenderMode, RenderOutcome};
pub use renderer::{ChromeRenderer, DeckRenderer};

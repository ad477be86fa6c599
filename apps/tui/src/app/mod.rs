// Application state, background actions and key handling

pub mod actions;
pub mod input;
pub mod state;

pub use actions::{AppActions, AppMessage};
pub use input::handle_input;
pub use state::App;

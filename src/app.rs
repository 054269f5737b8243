//! Application module: the view model and key bindings used by the TUI and runtime.
//!
//! `App` lives in `app::model` and holds the selection cursor, input mode and
//! status line. `app::keymap` turns key presses into `Action`s.

mod keymap;
mod model;

pub use keymap::{Action, map_key};
pub use model::*;

// Command surface: the slash-command table, typed actions, dispatch and rendering.

pub mod action;
pub mod commands;
pub mod reply;
pub mod surface;

pub use action::{Action, AutocompleteRequest, Caller, Invocation, OptionValue};
pub use reply::{Embed, EmbedColor, Reply};
pub use surface::CommandSurface;

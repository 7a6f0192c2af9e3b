pub mod cursor;
pub mod gui;
pub mod input;
pub mod logging;
pub mod settings;
pub mod zoom;

pub mod capture;
pub mod input;
pub mod messages;
pub mod model;
pub mod render;
pub mod session;
pub mod state;
pub mod tools;
pub mod transform;
pub mod view;

pub use capture::{DesktopGrabber, ScreenGrabber, CAPTURE_DELAY};
pub use messages::SessionEvent;
pub use session::ZoomSession;

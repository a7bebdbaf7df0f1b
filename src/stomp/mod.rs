mod frame;
mod session;

pub use frame::{Command, Frame, FrameDecoder, FrameError};
pub use session::StompSession;

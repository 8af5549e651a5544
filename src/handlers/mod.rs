pub mod chat;
pub mod sessions;
pub mod transcribe;
pub mod uploads;

pub use chat::*;
pub use sessions::*;
pub use transcribe::*;
pub use uploads::*;

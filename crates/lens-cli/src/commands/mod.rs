pub mod classify;
pub mod decode;
pub mod dirty;
pub mod encode;
mod input;

pub use classify::ClassifyCommand;
pub use decode::DecodeCommand;
pub use dirty::DirtyCommand;
pub use encode::EncodeCommand;

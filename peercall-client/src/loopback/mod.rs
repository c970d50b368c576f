//! In-process stand-ins for the relay and the media engine, for demos and
//! tests that want two real controllers talking to each other.

mod media;
mod relay;

pub use media::{ScriptedMediaEngine, ScriptedMediaOptions};
pub use relay::{LoopbackChannel, LoopbackRelay};

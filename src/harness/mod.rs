//! Drivers that own a `GameState` and step it
//!
//! - `solo`: one step per rendered frame, intents from the local player
//! - `authority`: fixed-tick owner for networked play; remote seats only
//!   submit intents and receive serialized snapshots

pub mod authority;
pub mod solo;

pub use authority::{Authority, ClientMessage, IntentSender, ServerMessage, WireError};
pub use solo::{FrameOutput, SoloHarness};

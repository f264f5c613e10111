//! # Events Module
//!
//! Progress reporting for pipeline runs.
//!
//! ## Design
//! Stages emit events through a channel, so a CLI (or a test harness)
//! can follow every stage's lifecycle without touching the pipeline.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = event_channel();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Stage(StageEvent::StateChanged { name, state, .. }) = event {
//!             println!("{name}: {state}");
//!         }
//!     }
//! });
//!
//! signer.sign_with_events(values, &sender)?;
//! ```

mod channel;
mod types;

pub use channel::{event_channel, null_sender, EventReceiver, EventSender};
pub use types::*;

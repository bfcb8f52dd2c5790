//! # Events Module
//!
//! Progress reporting and cancellation, kept as two separate contracts.
//!
//! ## Design
//! The engine emits [`Event`]s through a channel so any UI (CLI, GUI)
//! can observe a run without the engine knowing about it. Stopping a run
//! early goes through a [`CancellationToken`] instead; observers never
//! steer the engine through return values.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//! let token = engine.cancellation_token();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Organize(OrganizeEvent::Progress(p)) = event {
//!             println!("{}/{} {}", p.current, p.total, p.filename);
//!         }
//!     }
//! });
//!
//! let report = engine.run_with_events(&request, &sender)?;
//! ```

mod cancel;
mod channel;
mod types;

pub use cancel::CancellationToken;
pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;

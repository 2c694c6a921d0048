//! # Events Module
//!
//! Progress reporting for long-running analysis and sort operations.
//!
//! ## Design
//! The engine runs on a worker thread and emits events through a channel.
//! The UI thread only reads them; no progress state is shared.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Extract(ExtractEvent::Progress(p)) = event {
//!             println!("{:.0}%", p.fraction() * 100.0);
//!         }
//!     }
//! });
//!
//! analyzer.run_with_events(folder, &sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender, PROGRESS_BUFFER};
pub use types::*;

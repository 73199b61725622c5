//! # Donation overlay
//!
//! The overlay is what viewers see on stream. It subscribes to the server's live alert stream and plays each donation
//! alert in turn:
//!
//! * [`playback`] holds the queue and the `Idle ⇄ Showing` state machine. It is pure, and driven by explicit instants.
//! * [`session`] runs one connection: it feeds arriving alerts and timer expiries into the playback machine, and hands
//!   the results to a [`renderer::AlertRenderer`].
//! * [`template`] fills the streamer's headline template in.
//! * [`sse_client`] and [`client`] talk to the server, and [`watch`] reconnects when the server goes away.
pub mod client;
pub mod playback;
pub mod renderer;
pub mod session;
pub mod sse_client;
pub mod template;
pub mod watch;

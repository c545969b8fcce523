//! Method names the dispatcher treats specially.
//!
//! Everything else is routed through the handler table by exact,
//! case-sensitive match.

/// The handshake call that opens the initialization gate.
pub const INITIALIZE: &str = "initialize";

/// The call that asks the server to prepare for exit.
pub const SHUTDOWN: &str = "shutdown";

/// The notification that stops the dispatch loop.
pub const EXIT: &str = "exit";

/// The notification that cancels an in-flight inbound call.
pub const CANCEL_REQUEST: &str = "$/cancelRequest";

//! Session establishment (handshake) and the established-session
//! reader/writer loops.

mod handshake;
mod io;
mod session;

pub(crate) use handshake::{handshake_acceptor, handshake_initiator};
pub(crate) use session::{ActiveSession, SessionContext, run_session, send_queue};

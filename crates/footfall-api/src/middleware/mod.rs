//! The request middleware chain, outermost first: remote address → request
//! logging → panic recovery → identity.

pub mod identity;
pub mod logging;
pub mod recovery;
pub mod remote_addr;

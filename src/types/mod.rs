pub mod candidate;
pub mod connection;
pub mod decision;
pub mod message;
pub mod profile;
pub mod session;

pub use candidate::*;
pub use connection::*;
pub use decision::*;
pub use message::*;
pub use profile::*;
pub use session::*;

#![recursion_limit = "128"]

pub mod codec;
pub mod constants;
pub mod error;
pub mod mem;
pub mod name;
pub mod node;
pub mod rdata;
pub mod rrset;
pub mod zone;

pub use codec::Packet;
pub use constants::*;
pub use error::{Error, Result};
pub use mem::MemoryContext;
pub use name::DName;
pub use node::{Node, NodeId};
pub use rrset::RRSet;
pub use zone::Zone;

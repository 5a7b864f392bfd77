//! Wire format of the CPU <-> ESP byte stream: length-prefixed frames and
//! the opcode enumerations carried in them.

mod codec;
mod opcode;

pub use codec::{FrameAssembler, MAX_PAYLOAD, push_frame};
pub use opcode::{Command, Reply, UnknownCommand};

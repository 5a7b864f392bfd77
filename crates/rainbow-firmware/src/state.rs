use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError},
    thread::JoinHandle,
};

use rainbow_fs::{NO_FILE, VirtualFs};
use rainbow_wire::{FrameAssembler, MAX_PAYLOAD, Reply, push_frame};
use tracing::debug;

use crate::link::Link;

/// Read/write position of the protocol's file commands.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Cursor {
    pub path: u8,
    /// [`NO_FILE`] when nothing is open.
    pub file: u8,
    pub offset: u32,
}

impl Cursor {
    #[inline]
    pub fn is_open(&self) -> bool {
        self.file != NO_FILE
    }
}

/// Everything the emulator task, the admin thread and the dispatcher share.
/// Lives behind the engine mutex; methods assume the caller holds it.
pub(crate) struct ChipState {
    pub assembler: FrameAssembler,
    pub tx: VecDeque<u8>,
    /// Last byte the CPU read; every response frame starts with it.
    pub last_byte_read: u8,
    pub fs: VirtualFs,
    pub cursor: Cursor,
    pub link: Link,
    /// Close-waiter threads still draining their socket. Joined on drop.
    pub close_waiters: Vec<JoinHandle<()>>,
    pub server_url: String,
}

impl ChipState {
    pub fn new(server_url: String) -> Self {
        Self {
            assembler: FrameAssembler::new(),
            tx: VecDeque::new(),
            last_byte_read: 0,
            fs: VirtualFs::new(),
            cursor: Cursor { path: 0, file: NO_FILE, offset: 0 },
            link: Link::Down,
            close_waiters: Vec::new(),
            server_url,
        }
    }

    /// Queue one response frame: preamble (the latch byte), length, payload.
    pub fn reply(&mut self, payload: &[u8]) {
        push_frame(&mut self.tx, self.last_byte_read, payload);
    }

    /// One cooperative poll tick: complete inbound server frames become
    /// MESSAGE_FROM_SERVER response frames on the tx queue.
    pub fn pump_link(&mut self) {
        let Self { link, tx, last_byte_read, .. } = self;
        link.pump(|data| {
            // The opcode byte leaves room for one byte less than a frame's
            // maximum payload.
            if data.len() > MAX_PAYLOAD - 1 {
                debug!(len = data.len(), "dropping oversized server message");
                return;
            }
            let mut payload = Vec::with_capacity(data.len() + 1);
            payload.push(Reply::MessageFromServer as u8);
            payload.extend_from_slice(data);
            push_frame(tx, *last_byte_read, &payload);
        });
    }
}

/// The engine lock. Poisoning is ignored: the state record stays usable for
/// the emulator even if an admin request handler panicked.
pub(crate) fn lock(state: &Mutex<ChipState>) -> MutexGuard<'_, ChipState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

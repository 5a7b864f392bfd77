use rainbow_fs::{NO_FILE, PATH_COUNT, VirtualFs};
use rainbow_wire::{Command, MAX_PAYLOAD, Reply};
use tracing::debug;

use crate::state::{ChipState, Cursor};

/// Wifi status answer byte: the emulated stack is always up.
const WIFI_OK: u8 = 3;
/// A FILE_DATA payload spends two bytes on opcode and count.
const MAX_READ_CHUNK: usize = MAX_PAYLOAD - 2;

/// Work a command requests that must run without the engine lock held.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FollowUp {
    /// Dial the configured server and install the resulting link.
    Redial,
}

/// Execute one complete inbound frame against the shared state.
///
/// Runs under the engine lock, so the frame's effects (including its
/// response bytes) are atomic with respect to the admin surface and the
/// link pump. Malformed frames are dropped without a response.
///
/// Anything that would block the lock for an unbounded time is not done
/// here; it is handed back to the caller as a [`FollowUp`].
pub(crate) fn dispatch(state: &mut ChipState, frame: &[u8]) -> Option<FollowUp> {
    if frame.len() < 2 || frame.len() != frame[0] as usize + 1 {
        debug!(len = frame.len(), "dropping malformed frame");
        return None;
    }
    let declared = frame[0] as usize;
    let cmd = match Command::try_from(frame[1]) {
        Ok(cmd) => cmd,
        Err(err) => {
            debug!(%err, "dropping frame");
            return None;
        }
    };
    debug!(?cmd, declared, "command");

    match cmd {
        Command::GetEspStatus => state.reply(&[Reply::Ready as u8]),
        Command::DebugLog => debug!(payload = %hex(&frame[2..]), "game debug log"),
        Command::ClearBuffers => {
            state.tx.clear();
            state.assembler.reset();
        }
        Command::GetWifiStatus => state.reply(&[Reply::WifiStatus as u8, WIFI_OK]),
        Command::GetServerStatus => {
            let up = state.link.is_up();
            state.reply(&[Reply::ServerStatus as u8, up as u8]);
        }
        Command::ConnectToServer => {
            // The dial blocks for an unbounded time, so it cannot happen
            // under the engine lock; the caller runs it once the lock is
            // released. Status queries report down until it completes.
            close_link(state);
            return Some(FollowUp::Redial);
        }
        Command::DisconnectFromServer => close_link(state),
        Command::SendMessageToServer => state.link.send_binary(&frame[2..]),
        Command::GetRndByte
        | Command::GetRndByteRange
        | Command::GetRndWord
        | Command::GetRndWordRange
        | Command::SendMessageToGame => debug!(?cmd, "reserved command ignored"),
        Command::FileOpen => {
            if declared == 3 && state.fs.touch(frame[2], frame[3]) {
                state.cursor = Cursor { path: frame[2], file: frame[3], offset: 0 };
            }
        }
        Command::FileClose => state.cursor.file = NO_FILE,
        Command::FileExists => {
            if declared == 3 && VirtualFs::in_range(frame[2], frame[3]) {
                let exists = state.fs.exists(frame[2], frame[3]);
                state.reply(&[Reply::FileExists as u8, exists as u8]);
            }
        }
        Command::FileDelete => {
            if declared == 3 && VirtualFs::in_range(frame[2], frame[3]) {
                state.fs.delete(frame[2], frame[3]);
            }
        }
        Command::FileSetCur => {
            if (2..=5).contains(&declared) {
                let mut offset = 0u32;
                for (i, byte) in frame[2..].iter().enumerate() {
                    offset |= u32::from(*byte) << (8 * i);
                }
                state.cursor.offset = offset;
            }
        }
        Command::FileRead => {
            if declared != 2 {
                return None;
            }
            if !state.cursor.is_open() {
                state.reply(&[Reply::FileData as u8, 0]);
                return None;
            }
            let n = frame[2] as usize;
            let Cursor { path, file, offset } = state.cursor;
            let data = state.fs.read_at(path, file, offset, n.min(MAX_READ_CHUNK));
            let mut payload = Vec::with_capacity(data.len() + 2);
            payload.push(Reply::FileData as u8);
            payload.push(data.len() as u8);
            payload.extend_from_slice(data);
            state.reply(&payload);
            // The cursor advances by the requested count, then clamps to the
            // file's size.
            let size = state.fs.size(path, file) as u32;
            state.cursor.offset = offset.saturating_add(n as u32).min(size);
        }
        Command::FileWrite => {
            if declared >= 3 && frame[2] as usize == declared - 2 && state.cursor.is_open() {
                let Cursor { path, file, offset } = state.cursor;
                state.fs.write_at(path, file, offset, &frame[3..]);
                state.cursor.offset = offset.saturating_add((declared - 2) as u32);
            }
        }
        Command::FileAppend => {
            if declared >= 3 && frame[2] as usize == declared - 2 && state.cursor.is_open() {
                let Cursor { path, file, .. } = state.cursor;
                state.fs.append(path, file, &frame[3..]);
            }
        }
        Command::GetFileList => {
            if declared == 2 && (frame[2] as usize) < PATH_COUNT {
                let indices = state.fs.list(frame[2]);
                let mut payload = Vec::with_capacity(indices.len() + 2);
                payload.push(Reply::FileList as u8);
                payload.push(indices.len() as u8);
                payload.extend_from_slice(&indices);
                state.reply(&payload);
            }
        }
    }
    None
}

/// Hand the open socket, if any, to a close-waiter thread. Finished waiters
/// are pruned here so the handle list stays short.
pub(crate) fn close_link(state: &mut ChipState) {
    state.close_waiters.retain(|waiter| !waiter.is_finished());
    if let Some(waiter) = state.link.begin_close() {
        state.close_waiters.push(waiter);
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect::<Vec<_>>().join(" ")
}

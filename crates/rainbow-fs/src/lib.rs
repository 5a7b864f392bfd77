//! In-memory virtual filesystem of the chip: a fixed grid of byte-vector
//! slots addressed by `(path, file)` coordinates.

mod naming;

pub use naming::{parse_slot_name, slot_name};

/// Number of named storage paths.
pub const PATH_COUNT: usize = 3;
/// Fixed number of file slots per path.
pub const FILES_PER_PATH: usize = 64;
/// Cursor sentinel: no file open.
pub const NO_FILE: u8 = 0xff;

pub(crate) const PATH_NAMES: [&str; PATH_COUNT] = ["SAVE", "ROMS", "USER"];

#[derive(Clone, Debug, Default)]
struct Slot {
    content: Vec<u8>,
    present: bool,
}

/// Fixed 3x64 grid of files.
///
/// Slots always exist as storage; `present` tracks whether the file has been
/// created (open, write, append or upload) and not deleted since.
/// Out-of-range coordinates address no slot: reads come back empty, writes
/// are dropped, and the fallible operations report failure.
#[derive(Debug)]
pub struct VirtualFs {
    slots: [[Slot; FILES_PER_PATH]; PATH_COUNT],
}

impl Default for VirtualFs {
    fn default() -> Self {
        Self { slots: std::array::from_fn(|_| std::array::from_fn(|_| Slot::default())) }
    }
}

impl VirtualFs {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn in_range(path: u8, file: u8) -> bool {
        (path as usize) < PATH_COUNT && (file as usize) < FILES_PER_PATH
    }

    #[inline]
    fn slot(&self, path: u8, file: u8) -> Option<&Slot> {
        self.slots.get(path as usize)?.get(file as usize)
    }

    #[inline]
    fn slot_mut(&mut self, path: u8, file: u8) -> Option<&mut Slot> {
        self.slots.get_mut(path as usize)?.get_mut(file as usize)
    }

    #[inline]
    pub fn exists(&self, path: u8, file: u8) -> bool {
        self.slot(path, file).is_some_and(|slot| slot.present)
    }

    #[inline]
    pub fn size(&self, path: u8, file: u8) -> usize {
        self.slot(path, file).map_or(0, |slot| slot.content.len())
    }

    /// Whole content of a slot; empty when out of range.
    #[inline]
    pub fn content(&self, path: u8, file: u8) -> &[u8] {
        self.slot(path, file).map_or(&[], |slot| slot.content.as_slice())
    }

    /// Mark a slot as created. Returns false when out of range.
    pub fn touch(&mut self, path: u8, file: u8) -> bool {
        match self.slot_mut(path, file) {
            Some(slot) => {
                slot.present = true;
                true
            }
            None => false,
        }
    }

    /// Clear content and presence. No-op when out of range.
    pub fn delete(&mut self, path: u8, file: u8) {
        if let Some(slot) = self.slot_mut(path, file) {
            slot.content.clear();
            slot.present = false;
        }
    }

    /// Bytes in `[offset, offset + n)`, clamped to the slot's size. Empty
    /// when out of range or entirely past the end.
    pub fn read_at(&self, path: u8, file: u8, offset: u32, n: usize) -> &[u8] {
        let Some(slot) = self.slot(path, file) else { return &[] };
        let start = (offset as usize).min(slot.content.len());
        let end = start.saturating_add(n).min(slot.content.len());
        &slot.content[start..end]
    }

    /// Overwrite `[offset, offset + len)`, zero-extending the slot first if
    /// it ends short of the range. Marks the slot present.
    pub fn write_at(&mut self, path: u8, file: u8, offset: u32, bytes: &[u8]) {
        let Some(slot) = self.slot_mut(path, file) else { return };
        let offset = offset as usize;
        let end = offset + bytes.len();
        if end > slot.content.len() {
            slot.content.resize(end, 0);
        }
        slot.content[offset..end].copy_from_slice(bytes);
        slot.present = true;
    }

    /// Write at the current end of the slot.
    pub fn append(&mut self, path: u8, file: u8, bytes: &[u8]) {
        let size = self.size(path, file) as u32;
        self.write_at(path, file, size, bytes);
    }

    /// Replace the whole content. Returns false when out of range.
    pub fn replace(&mut self, path: u8, file: u8, content: Vec<u8>) -> bool {
        match self.slot_mut(path, file) {
            Some(slot) => {
                slot.content = content;
                slot.present = true;
                true
            }
            None => false,
        }
    }

    /// Move content and presence from one slot to another; the source is
    /// always cleared afterwards, even when it was absent. Returns false
    /// when either coordinate is out of range.
    pub fn rename(&mut self, from: (u8, u8), to: (u8, u8)) -> bool {
        if !Self::in_range(from.0, from.1) || !Self::in_range(to.0, to.1) {
            return false;
        }
        if from == to {
            return true;
        }
        let source = std::mem::take(&mut self.slots[from.0 as usize][from.1 as usize]);
        self.slots[to.0 as usize][to.1 as usize] = source;
        true
    }

    /// Ascending indices of present slots on one path; empty when the path
    /// is out of range.
    pub fn list(&self, path: u8) -> Vec<u8> {
        let Some(row) = self.slots.get(path as usize) else { return Vec::new() };
        row.iter()
            .enumerate()
            .filter(|(_, slot)| slot.present)
            .map(|(file, _)| file as u8)
            .collect()
    }

    /// All present slots across every path, path-major then index order.
    pub fn iter_present(&self) -> impl Iterator<Item = (u8, u8, usize)> + '_ {
        self.slots.iter().enumerate().flat_map(|(path, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, slot)| slot.present)
                .map(move |(file, slot)| (path as u8, file as u8, slot.content.len()))
        })
    }
}

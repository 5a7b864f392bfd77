use crate::{PATH_COUNT, PATH_NAMES};

/// Canonical admin-facing name of a slot, e.g. `"USER/file10.bin"`.
pub fn slot_name(path: u8, file: u8) -> String {
    debug_assert!((path as usize) < PATH_COUNT);
    format!("{}/file{file}.bin", PATH_NAMES[path as usize])
}

/// Parse `"[/]<DIR>/file<N>.bin"` into `(path, file)` coordinates.
///
/// `<DIR>` is one of the named paths and `<N>` a decimal index 0..=255
/// (leading zeros accepted). The parsed index may still address no slot,
/// which callers decide how to treat. Anything non-matching is `None`.
pub fn parse_slot_name(name: &str) -> Option<(u8, u8)> {
    let name = name.strip_prefix('/').unwrap_or(name);
    let (dir, rest) = name.split_once('/')?;
    let path = PATH_NAMES.iter().position(|candidate| *candidate == dir)? as u8;

    let digits = rest.strip_prefix("file")?.strip_suffix(".bin")?;
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    let file = digits.parse::<u32>().ok()?;
    (file <= 0xff).then_some((path, file as u8))
}

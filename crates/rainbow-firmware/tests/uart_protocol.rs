use rainbow_firmware::{Firmware, FirmwareConfig, FirmwareKind, RainbowFirmware};

/// Boot a chip with no admin surface and a server URL that refuses
/// instantly, so the link is deterministically down.
fn boot() -> RainbowFirmware {
    RainbowFirmware::new(
        FirmwareConfig::default().without_admin().with_server_url("ws://127.0.0.1:9"),
    )
}

fn feed(fw: &mut RainbowFirmware, bytes: &[u8]) {
    for byte in bytes {
        fw.rx(*byte);
    }
}

fn drain(fw: &mut RainbowFirmware) -> Vec<u8> {
    let mut out = Vec::new();
    while fw.get_gpio15() {
        out.push(fw.tx());
    }
    out
}

#[test]
fn boot_through_the_firmware_kind() {
    let mut fw = FirmwareKind::Rainbow
        .boot(FirmwareConfig::default().without_admin().with_server_url("ws://127.0.0.1:9"));
    fw.rx(0x01);
    fw.rx(0x00);
    assert!(fw.get_gpio15());
    assert_eq!(fw.tx(), 0x00);
    assert_eq!(fw.tx(), 0x01);
    assert_eq!(fw.tx(), 0x00);
}

#[test]
fn status_query() {
    let mut fw = boot();
    feed(&mut fw, &[0x01, 0x00]);
    assert_eq!(drain(&mut fw), vec![0x00, 0x01, 0x00]);
}

#[test]
fn tx_repeats_last_byte_when_idle() {
    let mut fw = boot();
    assert_eq!(fw.tx(), 0x00);

    feed(&mut fw, &[0x01, 0x03]);
    assert_eq!(drain(&mut fw), vec![0x00, 0x02, 0x04, 0x03]);
    // Nothing queued: the data register re-reads as the last byte.
    assert_eq!(fw.tx(), 0x03);
    assert_eq!(fw.tx(), 0x03);
}

#[test]
fn responses_carry_the_latch_as_preamble() {
    let mut fw = boot();
    feed(&mut fw, &[0x01, 0x03]);
    assert_eq!(drain(&mut fw), vec![0x00, 0x02, 0x04, 0x03]);

    // The latch is now 0x03, so the next response frame starts with it.
    feed(&mut fw, &[0x01, 0x00]);
    assert_eq!(drain(&mut fw), vec![0x03, 0x01, 0x00]);
}

#[test]
fn write_then_read() {
    let mut fw = boot();
    feed(&mut fw, &[0x03, 0x0d, 0x02, 0x0a]); // FILE_OPEN path=2 file=10
    feed(&mut fw, &[0x06, 0x13, 0x04, 0xde, 0xad, 0xbe, 0xef]); // FILE_WRITE
    feed(&mut fw, &[0x02, 0x11, 0x00]); // FILE_SET_CUR offset=0
    feed(&mut fw, &[0x02, 0x12, 0x04]); // FILE_READ n=4
    assert_eq!(drain(&mut fw), vec![0x00, 0x06, 0x03, 0x04, 0xde, 0xad, 0xbe, 0xef]);
}

#[test]
fn file_listing() {
    let mut fw = boot();
    feed(&mut fw, &[0x03, 0x0d, 0x02, 0x01]); // FILE_OPEN (2,1)
    feed(&mut fw, &[0x03, 0x0d, 0x02, 0x05]); // FILE_OPEN (2,5)
    feed(&mut fw, &[0x02, 0x15, 0x02]); // GET_FILE_LIST path=2
    assert_eq!(drain(&mut fw), vec![0x00, 0x04, 0x02, 0x02, 0x01, 0x05]);
}

#[test]
fn delete_clears_the_exists_flag() {
    let mut fw = boot();
    feed(&mut fw, &[0x03, 0x0d, 0x02, 0x0a]); // FILE_OPEN (2,10)
    feed(&mut fw, &[0x03, 0x0f, 0x02, 0x0a]); // FILE_EXISTS
    assert_eq!(drain(&mut fw), vec![0x00, 0x02, 0x01, 0x01]);

    feed(&mut fw, &[0x03, 0x10, 0x02, 0x0a]); // FILE_DELETE
    feed(&mut fw, &[0x03, 0x0f, 0x02, 0x0a]); // FILE_EXISTS
    assert_eq!(drain(&mut fw), vec![0x01, 0x02, 0x01, 0x00]);
}

#[test]
fn read_without_open_file_returns_empty_data() {
    let mut fw = boot();
    feed(&mut fw, &[0x02, 0x12, 0x10]); // FILE_READ n=16
    assert_eq!(drain(&mut fw), vec![0x00, 0x02, 0x03, 0x00]);
}

#[test]
fn read_clamps_and_advances_the_cursor() {
    let mut fw = boot();
    feed(&mut fw, &[0x03, 0x0d, 0x00, 0x00]); // FILE_OPEN (0,0)
    feed(&mut fw, &[0x06, 0x13, 0x04, 0x01, 0x02, 0x03, 0x04]); // FILE_WRITE
    feed(&mut fw, &[0x02, 0x11, 0x02]); // FILE_SET_CUR offset=2
    feed(&mut fw, &[0x02, 0x12, 0x0a]); // FILE_READ n=10, only 2 bytes left
    assert_eq!(drain(&mut fw), vec![0x00, 0x04, 0x03, 0x02, 0x03, 0x04]);

    // The cursor clamped to the file size, so the next read is empty.
    feed(&mut fw, &[0x02, 0x12, 0x0a]);
    assert_eq!(drain(&mut fw), vec![0x04, 0x02, 0x03, 0x00]);
}

#[test]
fn append_leaves_the_cursor_alone() {
    let mut fw = boot();
    feed(&mut fw, &[0x03, 0x0d, 0x01, 0x00]); // FILE_OPEN (1,0)
    feed(&mut fw, &[0x04, 0x13, 0x02, 0xaa, 0xbb]); // FILE_WRITE, cursor -> 2
    feed(&mut fw, &[0x03, 0x14, 0x01, 0xcc]); // FILE_APPEND at end
    feed(&mut fw, &[0x02, 0x12, 0x04]); // FILE_READ from cursor (2)
    assert_eq!(drain(&mut fw), vec![0x00, 0x03, 0x03, 0x01, 0xcc]);

    feed(&mut fw, &[0x02, 0x11, 0x00]); // FILE_SET_CUR 0
    feed(&mut fw, &[0x02, 0x12, 0x04]);
    assert_eq!(drain(&mut fw), vec![0xcc, 0x05, 0x03, 0x03, 0xaa, 0xbb, 0xcc]);
}

#[test]
fn wide_offsets_zero_extend_the_file() {
    let mut fw = boot();
    feed(&mut fw, &[0x03, 0x0d, 0x00, 0x01]); // FILE_OPEN (0,1)
    feed(&mut fw, &[0x03, 0x11, 0x02, 0x01]); // FILE_SET_CUR offset=0x0102
    feed(&mut fw, &[0x03, 0x13, 0x01, 0xee]); // FILE_WRITE one byte at 258
    feed(&mut fw, &[0x03, 0x11, 0x02, 0x01]); // back to 258
    feed(&mut fw, &[0x02, 0x12, 0x01]); // FILE_READ n=1
    assert_eq!(drain(&mut fw), vec![0x00, 0x03, 0x03, 0x01, 0xee]);

    // The bytes before the write offset are zero padding.
    feed(&mut fw, &[0x02, 0x11, 0x00]);
    feed(&mut fw, &[0x02, 0x12, 0x02]);
    assert_eq!(drain(&mut fw), vec![0xee, 0x04, 0x03, 0x02, 0x00, 0x00]);
}

#[test]
fn clear_buffers_discards_pending_output() {
    let mut fw = boot();
    feed(&mut fw, &[0x01, 0x00]); // queue a READY response
    feed(&mut fw, &[0x01, 0x02]); // CLEAR_BUFFERS
    assert!(!fw.get_gpio15());
    assert_eq!(drain(&mut fw), Vec::<u8>::new());
}

#[test]
fn wifi_status_reports_ok() {
    let mut fw = boot();
    feed(&mut fw, &[0x01, 0x03]);
    assert_eq!(drain(&mut fw), vec![0x00, 0x02, 0x04, 0x03]);
}

#[test]
fn server_status_reports_down_without_a_link() {
    let mut fw = boot();
    feed(&mut fw, &[0x01, 0x08]);
    assert_eq!(drain(&mut fw), vec![0x00, 0x02, 0x05, 0x00]);
}

#[test]
fn out_of_range_file_commands_are_silent() {
    let mut fw = boot();
    feed(&mut fw, &[0x03, 0x0f, 0x03, 0x00]); // FILE_EXISTS path=3
    feed(&mut fw, &[0x03, 0x0f, 0x00, 0x40]); // FILE_EXISTS file=64
    feed(&mut fw, &[0x02, 0x15, 0x03]); // GET_FILE_LIST path=3
    assert!(!fw.get_gpio15());
}

#[test]
fn malformed_and_unknown_frames_are_silent() {
    let mut fw = boot();
    feed(&mut fw, &[0x01, 0x63]); // unknown opcode
    feed(&mut fw, &[0x02, 0x0d, 0x02]); // FILE_OPEN with one argument only
    feed(&mut fw, &[0x05, 0x13, 0x09, 0xaa, 0xbb, 0xcc]); // FILE_WRITE, bad count
    assert!(!fw.get_gpio15());

    // The stream stays in sync: a valid command still answers.
    feed(&mut fw, &[0x01, 0x00]);
    assert_eq!(drain(&mut fw), vec![0x00, 0x01, 0x00]);
}

#[test]
fn gpio15_set_half_is_ignored() {
    let mut fw = boot();
    fw.set_gpio15(true);
    fw.set_gpio15(false);
    assert!(!fw.get_gpio15());
}

#[test]
fn open_resets_offset_and_marks_existence() {
    let mut fw = boot();
    feed(&mut fw, &[0x03, 0x0d, 0x01, 0x07]); // FILE_OPEN (1,7)
    feed(&mut fw, &[0x04, 0x13, 0x02, 0x11, 0x22]); // write two bytes
    feed(&mut fw, &[0x03, 0x0d, 0x01, 0x07]); // re-open: offset back to 0
    feed(&mut fw, &[0x02, 0x12, 0x02]);
    assert_eq!(drain(&mut fw), vec![0x00, 0x04, 0x03, 0x02, 0x11, 0x22]);

    feed(&mut fw, &[0x03, 0x0f, 0x01, 0x07]); // FILE_EXISTS
    assert_eq!(drain(&mut fw), vec![0x22, 0x02, 0x01, 0x01]);
}

#[test]
fn close_makes_reads_answer_empty() {
    let mut fw = boot();
    feed(&mut fw, &[0x03, 0x0d, 0x02, 0x00]); // FILE_OPEN (2,0)
    feed(&mut fw, &[0x01, 0x0e]); // FILE_CLOSE
    feed(&mut fw, &[0x02, 0x12, 0x08]); // FILE_READ
    assert_eq!(drain(&mut fw), vec![0x00, 0x02, 0x03, 0x00]);
}

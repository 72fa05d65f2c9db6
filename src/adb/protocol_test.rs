use super::protocol::*;
use crate::error::AdbError;

#[test]
fn test_encode_request() {
    assert_eq!(&encode_request("host:version").unwrap()[..], b"000chost:version");
    assert_eq!(&encode_request("sync:").unwrap()[..], b"0005sync:");
    assert_eq!(&encode_request("").unwrap()[..], b"0000");
}

#[test]
fn test_encode_request_counts_bytes_not_chars() {
    // "é" is two bytes in UTF-8
    assert_eq!(&encode_request("shell:é").unwrap()[..4], b"0008");
}

#[test]
fn test_encode_request_too_long() {
    let request = "x".repeat(MAX_REQUEST_LEN + 1);
    assert!(matches!(encode_request(&request), Err(AdbError::Protocol(_))));

    let request = "x".repeat(MAX_REQUEST_LEN);
    assert_eq!(&encode_request(&request).unwrap()[..4], b"ffff");
}

#[test]
fn test_parse_hex_length_is_case_insensitive() {
    assert_eq!(parse_hex_length(b"001a").unwrap(), 26);
    assert_eq!(parse_hex_length(b"001A").unwrap(), 26);
    assert_eq!(parse_hex_length(b"FFFF").unwrap(), 0xFFFF);
    assert!(matches!(parse_hex_length(b"00zz"), Err(AdbError::Protocol(_))));
    assert!(parse_hex_length(&[0xff, 0, 0, 0]).is_err());
}

#[test]
fn test_parse_hex_length_rejects_signs_and_spaces() {
    assert!(matches!(parse_hex_length(b"+fff"), Err(AdbError::Protocol(_))));
    assert!(matches!(parse_hex_length(b"-001"), Err(AdbError::Protocol(_))));
    assert!(matches!(parse_hex_length(b" 01a"), Err(AdbError::Protocol(_))));
}

#[test]
fn test_sync_command_codes() {
    for cmd in [
        SyncCommand::List,
        SyncCommand::Dent,
        SyncCommand::Send,
        SyncCommand::Recv,
        SyncCommand::Data,
        SyncCommand::Done,
        SyncCommand::Okay,
        SyncCommand::Fail,
        SyncCommand::Stat,
        SyncCommand::Quit,
    ] {
        assert_eq!(SyncCommand::from_code(cmd.code()), Some(cmd));
    }
    assert_eq!(SyncCommand::from_code(b"NOPE"), None);
    assert_eq!(SyncCommand::Recv.to_string(), "RECV");
}

#[test]
fn test_encode_sync_frame() {
    let frame = encode_sync_frame(SyncCommand::List, b"/sdcard").unwrap();
    assert_eq!(&frame[..], b"LIST\x07\x00\x00\x00/sdcard");
}

#[test]
fn test_encode_sync_status() {
    let frame = encode_sync_status(SyncCommand::Done, 0x01020304);
    assert_eq!(&frame[..], b"DONE\x04\x03\x02\x01");
}

#[test]
fn test_send_argument_uses_decimal_mode() {
    assert_eq!(send_argument("/sdcard/a.txt", 0o664), "/sdcard/a.txt,436");
    assert_eq!(
        send_argument("/data/local/tmp/run,me", 0o755),
        "/data/local/tmp/run,me,493"
    );
}

#[test]
fn test_shell_message_ids() {
    assert_eq!(ShellMessageId::from_byte(0), ShellMessageId::Stdin);
    assert_eq!(ShellMessageId::from_byte(1), ShellMessageId::Stdout);
    assert_eq!(ShellMessageId::from_byte(2), ShellMessageId::Stderr);
    assert_eq!(ShellMessageId::from_byte(3), ShellMessageId::Exit);
    assert_eq!(ShellMessageId::from_byte(4), ShellMessageId::CloseStdin);
    assert_eq!(ShellMessageId::from_byte(5), ShellMessageId::WindowSizeChange);
    assert_eq!(ShellMessageId::from_byte(9), ShellMessageId::Invalid(9));
    assert_eq!(ShellMessageId::Invalid(9).as_byte(), 9);
}

#[test]
fn test_encode_shell_frame() {
    let frame = encode_shell_frame(ShellMessageId::Stdin, b"ls\n").unwrap();
    assert_eq!(&frame[..], b"\x00\x03\x00\x00\x00ls\n");
}

#[test]
fn test_directory_entry_end_marker() {
    assert!(DirectoryEntry::default().is_end());
    let entry = DirectoryEntry {
        name: "a".to_string(),
        ..Default::default()
    };
    assert!(!entry.is_end());
}

#[test]
fn test_directory_entry_file_types() {
    let dir = DirectoryEntry {
        mode: 0o040751,
        size: 4096,
        mtime: 1_700_000_000,
        name: "data".to_string(),
    };
    assert!(dir.is_dir());
    assert!(!dir.is_file());
    assert_eq!(dir.file_type(), "directory");
    assert_eq!(dir.permissions_string(), "drwxr-x--x");
    assert_eq!(dir.modified().unwrap().timestamp(), 1_700_000_000);

    let link = DirectoryEntry {
        mode: 0o120777,
        ..Default::default()
    };
    assert!(link.is_symlink());
    assert_eq!(link.permissions_string(), "lrwxrwxrwx");

    let setuid = DirectoryEntry {
        mode: 0o104755,
        ..Default::default()
    };
    assert_eq!(setuid.permissions_string(), "-rwsr-xr-x");

    let sticky = DirectoryEntry {
        mode: 0o041770,
        ..Default::default()
    };
    assert_eq!(sticky.permissions_string(), "drwxrwx--T");
}

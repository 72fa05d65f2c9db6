/// Serial the fake device answers to.
pub const TEST_SERIAL: &str = "emulator-5554";

/// `host:devices-l` reply with one online and one unauthorized device.
pub const DEVICES_L: &str = "emulator-5554          device product:sdk_gphone64 model:Pixel_7 device:emu64a transport_id:1\n\
R5CT1234567            unauthorized usb:1-1 transport_id:2\n";

/// `host:list-forward` reply covering two devices.
pub const FORWARD_LIST: &str = "emulator-5554 tcp:8080 tcp:80\n\
R5CT1234567 tcp:9000 localabstract:chrome_devtools_remote\n";

/// `reverse:list-forward` reply mixing both line shapes seen in the wild.
pub const REVERSE_LIST: &str = "tcp:5000 tcp:6000\nUsbFfs tcp:7000 tcp:7001\n";

/// Test file content
pub fn test_file_content() -> Vec<u8> {
    b"This is test file content.\nLine 2\nLine 3\n".to_vec()
}

/// Deterministic non-repeating-looking bytes of the given length.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 31 + i / 251) % 256) as u8).collect()
}

/// Regular file with rw-r--r-- permissions.
pub const MODE_FILE: u32 = 0o100644;
/// Directory with rwxr-x--x permissions.
pub const MODE_DIR: u32 = 0o040751;

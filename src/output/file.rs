use crate::output::{PlainFormat, TableFormat};
use adbwire::DirectoryEntry;
use chrono::Local;

/// Format size in human-readable format
pub fn format_size(size: u64) -> String {
    const UNITS: &[&str] = &["B", "K", "M", "G", "T"];

    if size == 0 {
        return "0B".to_string();
    }

    let mut scaled = size as f64;
    let mut unit_index = 0;

    while scaled >= 1024.0 && unit_index < UNITS.len() - 1 {
        scaled /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{}{}", size, UNITS[unit_index])
    } else {
        format!("{:.1}{}", scaled, UNITS[unit_index])
    }
}

/// Local-time modification stamp, `-` when the daemon sent none.
pub fn format_modified(entry: &DirectoryEntry) -> String {
    match entry.modified() {
        Some(when) if entry.mtime != 0 => when
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        _ => "-".to_string(),
    }
}

impl TableFormat for DirectoryEntry {
    fn headers() -> Vec<&'static str> {
        vec!["NAME", "SIZE", "TYPE", "PERMISSIONS", "MODIFIED"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            format_size(u64::from(self.size)),
            self.file_type().to_string(),
            self.permissions_string(),
            format_modified(self),
        ]
    }
}

impl PlainFormat for DirectoryEntry {
    fn plain(&self) -> String {
        format!(
            "{} {} {} {}",
            self.permissions_string(),
            format_size(u64::from(self.size)),
            format_modified(self),
            self.name
        )
    }
}

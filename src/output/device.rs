use crate::output::{PlainFormat, TableFormat};
use adbwire::{DeviceForward, DeviceInfo};

impl TableFormat for DeviceInfo {
    fn headers() -> Vec<&'static str> {
        vec!["SERIAL", "STATE", "MODEL", "PRODUCT", "TRANSPORT"]
    }

    fn row(&self) -> Vec<String> {
        let transport = if self.is_usb() { "usb" } else { "tcp" };
        vec![
            self.serial.clone(),
            self.state.to_string(),
            self.model().unwrap_or_default().to_string(),
            self.product().unwrap_or_default().to_string(),
            transport.to_string(),
        ]
    }
}

impl PlainFormat for DeviceInfo {
    fn plain(&self) -> String {
        format!("{}\t{}", self.serial, self.state)
    }
}

impl TableFormat for DeviceForward {
    fn headers() -> Vec<&'static str> {
        vec!["SERIAL", "LOCAL", "REMOTE"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.serial.clone(), self.local.clone(), self.remote.clone()]
    }
}

impl PlainFormat for DeviceForward {
    fn plain(&self) -> String {
        format!("{} {} {}", self.serial, self.local, self.remote)
    }
}

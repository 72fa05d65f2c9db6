use crate::cli::OutputType;
use adbwire::Result;
use colored::*;
use comfy_table::Table;
use serde::Serialize;
use std::io;

/// Unified output formatter for all commands
pub struct OutputFormatter {
    color_enabled: bool,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new() -> Self {
        Self {
            color_enabled: true,
            quiet: false,
        }
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Print `items` in the requested format.
    pub fn list<T>(&self, format: OutputType, items: &[T]) -> Result<()>
    where
        T: TableFormat + PlainFormat + Serialize,
    {
        match format {
            OutputType::Table => self.table(items),
            OutputType::Json => self.json(items),
            OutputType::Plain => self.plain(items),
        }
    }

    /// Format items as a table
    pub fn table<T: TableFormat>(&self, items: &[T]) -> Result<()> {
        let mut table = Table::new();
        table.set_header(T::headers());
        table.load_preset(comfy_table::presets::NOTHING);

        for item in items {
            table.add_row(item.row());
        }

        println!("{}", table);
        Ok(())
    }

    /// Format items as JSON
    pub fn json<T: Serialize + ?Sized>(&self, items: &T) -> Result<()> {
        let value = serde_json::to_value(items).map_err(io::Error::from)?;
        let json = if self.color_enabled {
            colored_json::to_colored_json_auto(&value)
        } else {
            serde_json::to_string_pretty(&value)
        }
        .map_err(io::Error::from)?;
        println!("{}", json);
        Ok(())
    }

    /// Format items as plain text
    pub fn plain<T: PlainFormat>(&self, items: &[T]) -> Result<()> {
        for item in items {
            println!("{}", item.plain());
        }
        Ok(())
    }

    pub fn success(&self, msg: &str) {
        if !self.quiet {
            if self.color_enabled {
                eprintln!("{}", msg.bright_green());
            } else {
                eprintln!("SUCCESS: {}", msg);
            }
        }
    }

    pub fn error(&self, msg: &str) {
        if self.color_enabled {
            eprintln!("{}", msg.bright_red());
        } else {
            eprintln!("ERROR: {}", msg);
        }
    }
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for types that can be formatted as a table
pub trait TableFormat {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

/// Trait for types that can be formatted as plain text
pub trait PlainFormat {
    fn plain(&self) -> String;
}

pub mod device;
pub mod file;

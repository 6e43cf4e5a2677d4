//! Advisory status output: menu prompts, selection echoes, and dispense
//! progress. Lines are free-form text for a human watching a terminal (or
//! the serial monitor); nothing machine-parses them.

pub trait StatusSink {
    fn line(&mut self, line: &str);
}

impl<T: StatusSink + ?Sized> StatusSink for Box<T> {
    fn line(&mut self, line: &str) {
        (**self).line(line);
    }
}

/// Stdout sink used by the CLI.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleStatus;

impl StatusSink for ConsoleStatus {
    fn line(&mut self, line: &str) {
        println!("{line}");
    }
}

/// Discards all output; the default when no sink is supplied.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStatus;

impl StatusSink for NullStatus {
    fn line(&mut self, _line: &str) {}
}

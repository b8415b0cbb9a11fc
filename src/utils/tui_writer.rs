use std::io;
use tokio::sync::mpsc;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ERROR" => Some(LogLevel::Error),
            "WARN" => Some(LogLevel::Warn),
            "INFO" => Some(LogLevel::Info),
            "DEBUG" => Some(LogLevel::Debug),
            "TRACE" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Captures tracing output and forwards it to the TUI log pane, so logging
/// never writes over the alternate screen.
#[derive(Clone)]
pub struct TuiWriter {
    sender: mpsc::UnboundedSender<LogEntry>,
}

impl TuiWriter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<LogEntry>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (TuiWriter { sender }, receiver)
    }
}

impl io::Write for TuiWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let log_text = String::from_utf8_lossy(buf);
        for line in log_text.lines() {
            if let Some(parsed) = parse_tracing_line(line) {
                // Receiver gone means the TUI has exited; drop the line.
                let _ = self.sender.send(parsed);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for TuiWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Parse one line of the default `tracing_subscriber::fmt` output (without
/// ANSI colors), e.g.
/// `2025-08-24T16:43:07.498408Z  INFO chatmux::client::controller: Loaded session`.
/// Anything else is kept verbatim as an info entry.
fn parse_tracing_line(line: &str) -> Option<LogEntry> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let plain = || LogEntry {
        level: LogLevel::Info,
        message: line.to_string(),
        timestamp: chrono::Utc::now(),
    };

    let mut parts = line.split_whitespace();
    let (Some(timestamp_str), Some(level_str)) = (parts.next(), parts.next()) else {
        return Some(plain());
    };
    let Ok(timestamp) = chrono::DateTime::parse_from_rfc3339(timestamp_str) else {
        return Some(plain());
    };
    let Some(level) = LogLevel::parse(level_str) else {
        return Some(plain());
    };

    // Everything after the level, minus the "target: " prefix
    let rest = line
        .split_once(level_str)
        .map(|(_, rest)| rest.trim_start())
        .unwrap_or_default();
    let message = match rest.split_once(": ") {
        Some((target, message)) if !target.contains(' ') => message.to_string(),
        _ => rest.to_string(),
    };

    Some(LogEntry {
        level,
        message,
        timestamp: timestamp.with_timezone(&chrono::Utc),
    })
}

//! Minimal STOMP 1.2 text frames.
//!
//! Only what a subscriber needs: `CONNECT`, `SUBSCRIBE` and `DISCONNECT`
//! going out; `CONNECTED`, `MESSAGE`, `RECEIPT` and `ERROR` coming in.

use thiserror::Error;

/// Errors from parsing an inbound frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame has no command line")]
    MissingCommand,
    #[error("frame has no blank line after its headers")]
    MissingHeaderTerminator,
    #[error("malformed header line: {0:?}")]
    MalformedHeader(String),
    #[error("invalid escape sequence in header: {0:?}")]
    InvalidEscape(String),
    #[error("frame is not NUL-terminated")]
    MissingNul,
}

/// A STOMP frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Frame {
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            headers: Vec::new(),
            body: String::new(),
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// `CONNECT` for STOMP 1.2 with heart-beating disabled.
    #[must_use]
    pub fn connect(host: &str) -> Self {
        Self::new("CONNECT")
            .header("accept-version", "1.2")
            .header("host", host)
            .header("heart-beat", "0,0")
    }

    #[must_use]
    pub fn subscribe(id: &str, destination: &str) -> Self {
        Self::new("SUBSCRIBE")
            .header("id", id)
            .header("destination", destination)
            .header("ack", "auto")
    }

    #[must_use]
    pub fn disconnect() -> Self {
        Self::new("DISCONNECT")
    }

    /// First value of a header. STOMP gives the first occurrence precedence.
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// `CONNECT`/`CONNECTED` frames carry headers verbatim.
    fn escapes_headers(&self) -> bool {
        !matches!(self.command.as_str(), "CONNECT" | "CONNECTED")
    }

    /// Serialize to wire text, including the trailing NUL.
    #[must_use]
    pub fn encode(&self) -> String {
        let escape = self.escapes_headers();
        let mut out = String::with_capacity(self.command.len() + self.body.len() + 64);
        out.push_str(&self.command);
        out.push('\n');
        for (name, value) in &self.headers {
            if escape {
                out.push_str(&escape_header(name));
                out.push(':');
                out.push_str(&escape_header(value));
            } else {
                out.push_str(name);
                out.push(':');
                out.push_str(value);
            }
            out.push('\n');
        }
        if !self.body.is_empty() {
            out.push_str(&format!("content-length:{}\n", self.body.len()));
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }

    /// Parse one frame.
    ///
    /// Returns `Ok(None)` for a heart-beat (nothing but end-of-line bytes).
    ///
    /// # Errors
    ///
    /// Returns a [`FrameError`] describing the first structural problem.
    pub fn parse(raw: &str) -> Result<Option<Self>, FrameError> {
        let trimmed = raw.trim_start_matches(['\r', '\n']);
        if trimmed.is_empty() || trimmed == "\0" {
            return Ok(None);
        }

        let (head, rest) = split_head(trimmed).ok_or(FrameError::MissingHeaderTerminator)?;
        let mut lines = head.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line));

        let command = lines
            .next()
            .filter(|c| !c.is_empty())
            .ok_or(FrameError::MissingCommand)?
            .to_string();
        let unescape = !matches!(command.as_str(), "CONNECT" | "CONNECTED");

        let mut headers = Vec::new();
        for line in lines {
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| FrameError::MalformedHeader(line.to_string()))?;
            if unescape {
                headers.push((unescape_header(name)?, unescape_header(value)?));
            } else {
                headers.push((name.to_string(), value.to_string()));
            }
        }

        let body_end = rest.find('\0').ok_or(FrameError::MissingNul)?;
        let body = rest.get(..body_end).unwrap_or_default().to_string();

        Ok(Some(Self {
            command,
            headers,
            body,
        }))
    }
}

/// Split a frame at the blank line ending its headers.
fn split_head(frame: &str) -> Option<(&str, &str)> {
    if let Some(pos) = frame.find("\n\n") {
        return Some((frame.get(..pos)?, frame.get(pos + 2..)?));
    }
    let pos = frame.find("\r\n\r\n")?;
    Some((frame.get(..pos)?, frame.get(pos + 4..)?))
}

fn escape_header(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            other => out.push(other),
        }
    }
    out
}

fn unescape_header(raw: &str) -> Result<String, FrameError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            _ => return Err(FrameError::InvalidEscape(raw.to_string())),
        }
    }
    Ok(out)
}

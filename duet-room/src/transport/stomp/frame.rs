use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Connect,
    Stomp,
    Connected,
    Send,
    Subscribe,
    Unsubscribe,
    Disconnect,
    Message,
    Receipt,
    Error,
}

impl Command {
    const ALL: [Command; 10] = [
        Command::Connect,
        Command::Stomp,
        Command::Connected,
        Command::Send,
        Command::Subscribe,
        Command::Unsubscribe,
        Command::Disconnect,
        Command::Message,
        Command::Receipt,
        Command::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Connect => "CONNECT",
            Command::Stomp => "STOMP",
            Command::Connected => "CONNECTED",
            Command::Send => "SEND",
            Command::Subscribe => "SUBSCRIBE",
            Command::Unsubscribe => "UNSUBSCRIBE",
            Command::Disconnect => "DISCONNECT",
            Command::Message => "MESSAGE",
            Command::Receipt => "RECEIPT",
            Command::Error => "ERROR",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }

    // CONNECT and CONNECTED headers are sent verbatim.
    fn escapes_headers(&self) -> bool {
        !matches!(self, Command::Connect | Command::Connected)
    }
}

/// A decoded WebSocket payload: either a frame or a bare end-of-line heart-beat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    Heartbeat,
    Frame(Frame),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    #[error("malformed header line `{0}`")]
    InvalidHeader(String),

    #[error("invalid escape sequence in `{0}`")]
    InvalidEscape(String),

    #[error("invalid content-length `{0}`")]
    InvalidContentLength(String),

    #[error("frame is truncated or not NUL-terminated")]
    Unterminated,

    #[error("frame head is not valid UTF-8")]
    NotUtf8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: Command,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Frame {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// First value of `name`; repeated headers keep the earliest occurrence.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn encode(&self) -> Vec<u8> {
        let escape_headers = self.command.escapes_headers();
        let mut head = String::with_capacity(64);
        head.push_str(self.command.as_str());
        head.push('\n');

        for (name, value) in &self.headers {
            if escape_headers {
                head.push_str(&escape(name));
                head.push(':');
                head.push_str(&escape(value));
            } else {
                head.push_str(name);
                head.push(':');
                head.push_str(value);
            }
            head.push('\n');
        }
        if !self.body.is_empty() && self.get("content-length").is_none() {
            head.push_str(&format!("content-length:{}\n", self.body.len()));
        }
        head.push('\n');

        let mut out = Vec::with_capacity(head.len() + self.body.len() + 1);
        out.extend_from_slice(head.as_bytes());
        out.extend_from_slice(&self.body);
        out.push(0);
        out
    }

    pub fn decode(data: &[u8]) -> Result<Incoming, FrameError> {
        let Some(start) = data.iter().position(|b| *b != b'\n' && *b != b'\r') else {
            return Ok(Incoming::Heartbeat);
        };
        let data = &data[start..];
        let mut cursor = 0;

        let command_line = next_line(data, &mut cursor)?;
        let command = Command::parse(command_line)
            .ok_or_else(|| FrameError::UnknownCommand(command_line.to_owned()))?;
        let escaped = command.escapes_headers();

        let mut headers = Vec::new();
        loop {
            let line = next_line(data, &mut cursor)?;
            if line.is_empty() {
                break;
            }
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| FrameError::InvalidHeader(line.to_owned()))?;
            if escaped {
                headers.push((unescape(name)?, unescape(value)?));
            } else {
                headers.push((name.to_owned(), value.to_owned()));
            }
        }

        let mut frame = Frame {
            command,
            headers,
            body: Bytes::new(),
        };

        let rest = &data[cursor..];
        let body = match frame.get("content-length") {
            Some(raw) => {
                let len: usize = raw
                    .trim()
                    .parse()
                    .map_err(|_| FrameError::InvalidContentLength(raw.to_owned()))?;
                if rest.len() <= len || rest[len] != 0 {
                    return Err(FrameError::Unterminated);
                }
                &rest[..len]
            }
            None => {
                let end = rest
                    .iter()
                    .position(|b| *b == 0)
                    .ok_or(FrameError::Unterminated)?;
                &rest[..end]
            }
        };
        frame.body = Bytes::copy_from_slice(body);
        Ok(Incoming::Frame(frame))
    }
}

fn next_line<'a>(data: &'a [u8], cursor: &mut usize) -> Result<&'a str, FrameError> {
    let rest = &data[*cursor..];
    let end = rest
        .iter()
        .position(|b| *b == b'\n')
        .ok_or(FrameError::Unterminated)?;
    *cursor += end + 1;
    let line = &rest[..end];
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    std::str::from_utf8(line).map_err(|_| FrameError::NotUtf8)
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            c => out.push(c),
        }
    }
    out
}

fn unescape(raw: &str) -> Result<String, FrameError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            _ => return Err(FrameError::InvalidEscape(raw.to_owned())),
        }
    }
    Ok(out)
}

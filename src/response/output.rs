use std::io::{self, Write};
use std::sync::Arc;

/// Reason phrase for a status code
#[must_use]
pub fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        402 => "Payment Required",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        410 => "Gone",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Unknown",
    }
}

/// The single sink a request's response is written to.
pub trait Output {
    fn send(&mut self, status: u16, headers: &[(Arc<str>, String)], body: &[u8]) -> io::Result<()>;
}

/// First line written by [`HttpOutput`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLine {
    /// `Status: 200 OK` (CGI gateway)
    Cgi,
    /// `HTTP/1.1 200 OK`
    Http11,
}

/// Writes a response in HTTP wire form to any [`Write`].
///
/// A second `send` fails with [`io::ErrorKind::AlreadyExists`].
#[derive(Debug)]
pub struct HttpOutput<W: Write> {
    writer: W,
    style: StatusLine,
    sent: bool,
}

impl<W: Write> HttpOutput<W> {
    pub fn new(writer: W, style: StatusLine) -> Self {
        Self {
            writer,
            style,
            sent: false,
        }
    }

    /// CGI-style output (`Status:` header line)
    pub fn cgi(writer: W) -> Self {
        Self::new(writer, StatusLine::Cgi)
    }

    #[must_use]
    pub fn is_sent(&self) -> bool {
        self.sent
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Output for HttpOutput<W> {
    fn send(&mut self, status: u16, headers: &[(Arc<str>, String)], body: &[u8]) -> io::Result<()> {
        if self.sent {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "response already sent",
            ));
        }
        self.sent = true;

        let reason = status_reason(status);
        match self.style {
            StatusLine::Cgi => write!(self.writer, "Status: {status} {reason}\r\n")?,
            StatusLine::Http11 => write!(self.writer, "HTTP/1.1 {status} {reason}\r\n")?,
        }
        for (name, value) in headers {
            write!(self.writer, "{name}: {value}\r\n")?;
        }
        if !headers
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        {
            write!(self.writer, "Content-Length: {}\r\n", body.len())?;
        }
        self.writer.write_all(b"\r\n")?;
        self.writer.write_all(body)?;
        self.writer.flush()
    }
}

/// One captured `send` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Sent {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn body_str(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// In-memory output that records every send.
#[derive(Debug, Default, Clone)]
pub struct BufferedOutput {
    sends: Vec<Sent>,
}

impl BufferedOutput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn send_count(&self) -> usize {
        self.sends.len()
    }

    #[must_use]
    pub fn last(&self) -> Option<&Sent> {
        self.sends.last()
    }

    #[must_use]
    pub fn sends(&self) -> &[Sent] {
        &self.sends
    }
}

impl Output for BufferedOutput {
    fn send(&mut self, status: u16, headers: &[(Arc<str>, String)], body: &[u8]) -> io::Result<()> {
        self.sends.push(Sent {
            status,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            body: body.to_vec(),
        });
        Ok(())
    }
}

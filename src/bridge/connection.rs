//! Line framing for a single accepted connection.
//!
//! Wire rules:
//!
//! - Messages are UTF-8 encoded JSON-RPC
//! - Messages are delimited by newlines
//! - Messages must not contain embedded newlines
//! - Exactly one request/response exchange per connection
//!
//! The accepted stream is switched back to blocking mode with a read
//! timeout: the poll loop only reaches this code once the listener reported
//! a pending connection, and the exchange is serviced synchronously.

use std::io::{self, BufRead, BufReader, Write};
use std::net::TcpStream;
use std::time::Duration;

use crate::bridge::protocol::{JsonRpcError, JsonRpcResponse};

/// A line-framed request/response connection.
pub struct Connection {
    reader: BufReader<TcpStream>,
}

impl Connection {
    /// Prepares an accepted stream for a framed exchange.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream's blocking mode or read timeout
    /// cannot be configured.
    pub fn new(stream: TcpStream, read_timeout: Duration) -> io::Result<Self> {
        // The listener is non-blocking; accepted streams inherit that on
        // some platforms.
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(read_timeout))?;

        Ok(Self {
            reader: BufReader::new(stream),
        })
    }

    /// Reads the next message line.
    ///
    /// Returns `None` when the peer closed the connection or no complete
    /// line arrived within the read timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if reading from the stream fails.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let bytes_read = match self.reader.read_line(&mut line) {
            Ok(n) => n,
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        if bytes_read == 0 {
            // EOF - peer closed the connection
            return Ok(None);
        }

        // Remove the trailing newline
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }

        Ok(Some(line))
    }

    /// Writes a JSON-RPC response.
    ///
    /// The response is serialised to JSON and terminated with a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub fn write_response(&mut self, response: &JsonRpcResponse) -> io::Result<()> {
        let json = serde_json::to_string(response)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        self.write_raw(&json)
    }

    /// Writes a JSON-RPC error.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub fn write_error(&mut self, error: &JsonRpcError) -> io::Result<()> {
        let json = serde_json::to_string(error)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        self.write_raw(&json)
    }

    /// Writes a raw JSON string with newline termination.
    fn write_raw(&mut self, json: &str) -> io::Result<()> {
        // Framing requires messages without embedded newlines
        debug_assert!(
            !json.contains('\n'),
            "JSON message must not contain embedded newlines"
        );

        let stream = self.reader.get_mut();
        stream.write_all(json.as_bytes())?;
        stream.write_all(b"\n")?;
        stream.flush()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::protocol::JsonRpcError;
    use serde_json::json;
    use std::net::TcpListener;

    fn connected_pair() -> (Connection, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).unwrap();
        let (server_side, _) = listener.accept().unwrap();
        let conn = Connection::new(server_side, Duration::from_millis(200)).unwrap();
        (conn, client)
    }

    #[test]
    fn read_line_trims_crlf() {
        let (mut conn, mut client) = connected_pair();
        client.write_all(b"{\"method\":\"ping\"}\r\n").unwrap();
        let line = conn.read_line().unwrap().unwrap();
        assert_eq!(line, "{\"method\":\"ping\"}");
    }

    #[test]
    fn read_line_returns_none_on_eof() {
        let (mut conn, client) = connected_pair();
        drop(client);
        assert!(conn.read_line().unwrap().is_none());
    }

    #[test]
    fn read_line_returns_none_on_timeout() {
        let (mut conn, _client) = connected_pair();
        assert!(conn.read_line().unwrap().is_none());
    }

    #[test]
    fn write_error_is_newline_terminated() {
        let (mut conn, client) = connected_pair();
        conn.write_error(&JsonRpcError::method_not_found(json!(1), "nope"))
            .unwrap();
        drop(conn);

        let mut reader = BufReader::new(client);
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        assert!(line.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["error"]["code"], json!(-32601));
    }

    #[test]
    fn serialise_response_no_newlines() {
        let response = JsonRpcResponse::success(
            json!(1),
            json!({
                "message": "hello world",
                "nested": {"key": "value"}
            }),
        );

        let encoded = serde_json::to_string(&response).unwrap();
        assert!(
            !encoded.contains('\n'),
            "Serialised JSON should not contain newlines"
        );
    }
}

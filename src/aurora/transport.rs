use std::io;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use log::{debug, trace, warn};
use net2::TcpStreamExt;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_serial::{SerialPort, SerialStream};

use crate::aurora::error::AuroraError;
use crate::aurora::frame::RESPONSE_LEN;

pub const DEFAULT_TCP_PORT: u16 = 8899;
pub const DEFAULT_BAUD_RATE: u32 = 19200;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_TRIES: u32 = 3;

const TCP_KEEPALIVE_SECS: u64 = 60;

/// A connection that can run one request/response exchange at a time.
///
/// The protocol has no framing beyond the fixed lengths, so whoever owns
/// the transport must never interleave exchanges; response bytes cannot be
/// matched to a request after the fact.
#[async_trait]
pub trait Transport: Send {
    async fn open(&mut self) -> Result<(), AuroraError>;
    async fn close(&mut self) -> Result<(), AuroraError>;

    /// Writes one request frame and accumulates at least one response
    /// frame's worth of bytes. `NotConnected` when called before `open`.
    async fn exchange(&mut self, request: &[u8]) -> Result<Bytes, AuroraError>;

    fn is_connected(&self) -> bool;
}

/// Reads until a full response frame is buffered. Every poll gets the full
/// `timeout`; expiry fails the exchange even when some bytes already
/// arrived, since a short frame must never be treated as a response.
pub async fn read_frame<R>(reader: &mut R, timeout: Duration) -> Result<Bytes, AuroraError>
where
    R: AsyncRead + Unpin + Send,
{
    let mut response = BytesMut::with_capacity(RESPONSE_LEN * 2);

    while response.len() < RESPONSE_LEN {
        match tokio::time::timeout(timeout, reader.read_buf(&mut response)).await {
            Ok(Ok(0)) => {
                return Err(AuroraError::Transport(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed mid-exchange",
                )))
            }
            Ok(Ok(n)) => trace!("read {} bytes ({} buffered)", n, response.len()),
            Ok(Err(e)) => return Err(AuroraError::Transport(e)),
            Err(_) => return Err(AuroraError::ReadTimeout),
        }
    }

    Ok(response.freeze())
}

/// Serial variant of [`read_frame`]: at most `tries` reads, each bounded by
/// `timeout`. Exhausting the attempts without a full frame is `NoResponse`.
pub async fn read_frame_with_retries<R>(
    reader: &mut R,
    timeout: Duration,
    tries: u32,
) -> Result<Bytes, AuroraError>
where
    R: AsyncRead + Unpin + Send,
{
    let mut response = BytesMut::with_capacity(RESPONSE_LEN * 2);
    let mut attempts = 0;

    while response.len() < RESPONSE_LEN && attempts < tries {
        attempts += 1;
        match tokio::time::timeout(timeout, reader.read_buf(&mut response)).await {
            Ok(Ok(0)) => {
                return Err(AuroraError::Transport(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "serial line closed",
                )))
            }
            Ok(Ok(n)) => trace!("attempt {}/{}: read {} bytes", attempts, tries, n),
            Ok(Err(e)) => return Err(AuroraError::Transport(e)),
            Err(_) => debug!(
                "attempt {}/{} timed out with {} bytes buffered",
                attempts,
                tries,
                response.len()
            ),
        }
    }

    if response.len() < RESPONSE_LEN {
        return Err(AuroraError::NoResponse { attempts });
    }

    Ok(response.freeze())
}

// TcpTransport {{{
/// Stream transport for serial-to-Ethernet converters sitting in front of
/// the inverter's RS-485 line.
pub struct TcpTransport {
    host: String,
    port: u16,
    timeout: Duration,
    stream: Option<TcpStream>,
}

impl TcpTransport {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
            stream: None,
        }
    }

    /// Throws away whatever is already buffered on the socket. A timed-out
    /// exchange leaves its late response behind, and those stale bytes
    /// would otherwise be taken for the next command's answer.
    fn drain(&mut self) -> Result<(), AuroraError> {
        let stream = match self.stream.as_mut() {
            Some(stream) => stream,
            None => return Ok(()),
        };

        let mut discarded = BytesMut::new();
        let mut buf = [0u8; 4096];

        loop {
            match stream.try_read(&mut buf) {
                Ok(0) => break, // peer gone; the exchange read will surface it
                Ok(n) => discarded.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(AuroraError::Transport(e)),
            }
        }

        if !discarded.is_empty() {
            warn!(
                "discarded {} stale bytes before exchange: {:02x?}",
                discarded.len(),
                &discarded[..]
            );
        }

        Ok(())
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn open(&mut self) -> Result<(), AuroraError> {
        debug!("connecting to {}:{}", self.host, self.port);

        let address = (self.host.clone(), self.port);
        let stream = match tokio::time::timeout(self.timeout, TcpStream::connect(address)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(AuroraError::Transport(e)),
            Err(_) => {
                return Err(AuroraError::Transport(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("connecting to {}:{} timed out", self.host, self.port),
                )))
            }
        };

        let std_stream = stream.into_std()?;
        if let Err(e) = std_stream.set_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS))) {
            warn!("failed to set TCP keepalive: {}", e);
        }
        let stream = TcpStream::from_std(std_stream)?;
        if let Err(e) = stream.set_nodelay(true) {
            warn!("failed to set TCP_NODELAY: {}", e);
        }

        self.stream = Some(stream);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), AuroraError> {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
        Ok(())
    }

    async fn exchange(&mut self, request: &[u8]) -> Result<Bytes, AuroraError> {
        if self.stream.is_none() {
            return Err(AuroraError::NotConnected);
        }

        self.drain()?;

        let timeout = self.timeout;
        let stream = self.stream.as_mut().ok_or(AuroraError::NotConnected)?;

        trace!("TX: {:02x?}", request);
        stream.write_all(request).await?;
        stream.flush().await?;

        let response = read_frame(stream, timeout).await?;
        trace!("RX: {:02x?}", &response[..]);
        Ok(response)
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
} // }}}

// SerialTransport {{{
/// Line transport for a directly attached RS-485 adapter.
pub struct SerialTransport {
    path: String,
    baud_rate: u32,
    data_bits: tokio_serial::DataBits,
    stop_bits: tokio_serial::StopBits,
    parity: tokio_serial::Parity,
    timeout: Duration,
    tries: u32,
    stream: Option<SerialStream>,
}

impl SerialTransport {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        path: impl Into<String>,
        baud_rate: u32,
        data_bits: tokio_serial::DataBits,
        stop_bits: tokio_serial::StopBits,
        parity: tokio_serial::Parity,
        timeout: Duration,
        tries: u32,
    ) -> Self {
        Self {
            path: path.into(),
            baud_rate,
            data_bits,
            stop_bits,
            parity,
            timeout,
            tries,
            stream: None,
        }
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn open(&mut self) -> Result<(), AuroraError> {
        debug!("opening {} at {} baud", self.path, self.baud_rate);

        let builder = tokio_serial::new(&self.path, self.baud_rate)
            .data_bits(self.data_bits)
            .stop_bits(self.stop_bits)
            .parity(self.parity)
            .timeout(self.timeout);

        let stream = SerialStream::open(&builder)
            .map_err(|e| AuroraError::Transport(io::Error::new(io::ErrorKind::Other, e)))?;

        self.stream = Some(stream);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), AuroraError> {
        self.stream = None;
        Ok(())
    }

    async fn exchange(&mut self, request: &[u8]) -> Result<Bytes, AuroraError> {
        let timeout = self.timeout;
        let tries = self.tries;
        let stream = self.stream.as_mut().ok_or(AuroraError::NotConnected)?;

        stream
            .clear(tokio_serial::ClearBuffer::All)
            .map_err(|e| AuroraError::Transport(io::Error::new(io::ErrorKind::Other, e)))?;

        trace!("TX: {:02x?}", request);
        stream.write_all(request).await?;
        stream.flush().await?;

        match read_frame_with_retries(stream, timeout, tries).await {
            Ok(response) => {
                trace!("RX: {:02x?}", &response[..]);
                Ok(response)
            }
            // an I/O failure mid-read leaves the line in an unknown state
            Err(AuroraError::Transport(e)) => {
                self.stream = None;
                Err(AuroraError::Transport(e))
            }
            Err(e) => Err(e),
        }
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
} // }}}

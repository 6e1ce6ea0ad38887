//! Raw TCP printing for networked TSPL printers
//!
//! TSC printers accept raw command streams on TCP port 9100.

use crate::encoding::encode_commands;
use crate::error::{LabelError, LabelResult};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{info, instrument, warn};

/// Default raw printing port
pub const RAW_PORT: u16 = 9100;

/// Trait for printer adapters
#[allow(async_fn_in_trait)]
pub trait Printer {
    /// Send raw bytes to the printer
    async fn print(&self, data: &[u8]) -> LabelResult<()>;

    /// Check if the printer is online/reachable
    async fn is_online(&self) -> bool;

    /// Encode a TSPL command stream and send it
    async fn print_commands(&self, commands: &str) -> LabelResult<()> {
        self.print(&encode_commands(commands)).await
    }
}

/// Network printer (TCP port 9100)
#[derive(Debug, Clone)]
pub struct NetworkPrinter {
    addr: SocketAddr,
    timeout: Duration,
}

impl NetworkPrinter {
    pub fn new(host: &str, port: u16) -> LabelResult<Self> {
        let addr_str = format!("{}:{}", host, port);
        Self::from_addr(&addr_str)
    }

    /// Create from a socket address string (e.g., "192.168.1.100:9100")
    pub fn from_addr(addr: &str) -> LabelResult<Self> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|_| LabelError::InvalidConfig(format!("Invalid address: {}", addr)))?;

        Ok(Self {
            addr,
            timeout: Duration::from_secs(5),
        })
    }

    /// Set connection timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// [`Printer::is_online`] as a result, for callers that propagate errors
    pub async fn ensure_online(&self) -> LabelResult<()> {
        if self.is_online().await {
            Ok(())
        } else {
            Err(LabelError::Offline(self.addr.to_string()))
        }
    }
}

impl Printer for NetworkPrinter {
    #[instrument(skip(data), fields(addr = %self.addr, data_len = data.len()))]
    async fn print(&self, data: &[u8]) -> LabelResult<()> {
        let mut stream = tokio::time::timeout(self.timeout, TcpStream::connect(self.addr))
            .await
            .map_err(|_| LabelError::Timeout(format!("Connection timeout: {}", self.addr)))?
            .map_err(|e| LabelError::Connection(format!("{}: {}", self.addr, e)))?;

        stream.write_all(data).await.map_err(|e| {
            LabelError::Io(std::io::Error::new(
                e.kind(),
                format!("Write failed: {}", e),
            ))
        })?;
        stream.flush().await?;

        info!("Label job sent");
        Ok(())
    }

    #[instrument(fields(addr = %self.addr))]
    async fn is_online(&self) -> bool {
        let check_timeout = Duration::from_millis(500);

        match tokio::time::timeout(check_timeout, TcpStream::connect(self.addr)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                warn!(error = %e, "Printer offline");
                false
            }
            Err(_) => {
                warn!("Printer check timeout");
                false
            }
        }
    }
}

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::io::Read;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SerialError {
    #[error("failed to open {port}: {source}")]
    Open {
        port: String,
        source: serialport::Error,
    },
}

#[derive(Debug, Clone)]
pub struct SerialConfig {
    pub port_name: String,
    pub baud_rate: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: 115_200,
        }
    }
}

#[derive(Debug, Clone)]
pub enum SerialEvent {
    Rx(Vec<u8>),
    Opened(String),
    Closed,
    Error(String),
}

enum Command {
    Close,
}

/// Receive-only serial link. A reader thread forwards whatever bytes are
/// currently available as [`SerialEvent::Rx`] chunks; the consumer drains
/// [`events`](Self::events) without blocking. There is no transmit path.
#[derive(Debug)]
pub struct SerialService {
    cfg: SerialConfig,
    tx_cmd: Sender<Command>,
    rx_evt: Receiver<SerialEvent>,
}

impl SerialService {
    /// Opens the port on the calling thread so an open failure surfaces
    /// directly, then hands the port to the reader thread.
    pub fn open(cfg: SerialConfig) -> Result<Self, SerialError> {
        let mut port = serialport::new(&cfg.port_name, cfg.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(Duration::from_millis(50))
            .open()
            .map_err(|source| SerialError::Open {
                port: cfg.port_name.clone(),
                source,
            })?;

        let (tx_cmd, rx_cmd) = unbounded::<Command>();
        let (tx_evt, rx_evt) = unbounded::<SerialEvent>();
        let port_name = cfg.port_name.clone();

        std::thread::spawn(move || {
            log::info!("serial reader started on {port_name}");
            let _ = tx_evt.send(SerialEvent::Opened(port_name));
            let mut buf = [0u8; 4096];
            loop {
                match port.read(&mut buf) {
                    Ok(n) if n > 0 => {
                        let _ = tx_evt.send(SerialEvent::Rx(buf[..n].to_vec()));
                    }
                    Ok(_) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {}
                    Err(e) => {
                        // Disconnects and permission errors end the stream;
                        // reconnecting, if wanted, belongs to the caller.
                        let _ = tx_evt.send(SerialEvent::Error(e.to_string()));
                        let _ = tx_evt.send(SerialEvent::Closed);
                        return;
                    }
                }
                if let Ok(Command::Close) = rx_cmd.try_recv() {
                    let _ = tx_evt.send(SerialEvent::Closed);
                    return;
                }
            }
        });

        Ok(Self { cfg, tx_cmd, rx_evt })
    }

    pub fn close(&self) {
        let _ = self.tx_cmd.send(Command::Close);
    }

    pub fn events(&self) -> &Receiver<SerialEvent> {
        &self.rx_evt
    }

    pub fn config(&self) -> &SerialConfig {
        &self.cfg
    }
}

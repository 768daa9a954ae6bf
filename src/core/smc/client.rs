//! SMC key read/write client on top of the raw struct-method call.

use crate::error::{MacPerfError, Result};

use super::codec::{
    self, build_read_bytes, build_read_key_info, build_write_bytes, parse_key_info, value_bytes,
    DataType, KeyInfo, SmcKey, STRUCT_SIZE,
};

/// Candidate CPU temperature keys, probed in order. Different controller
/// generations expose different die/proximity/core sensors; the first key
/// returning a plausible reading wins.
pub const CPU_TEMP_KEYS: &[&str] = &["TC0D", "TC0P", "TC0c", "TC0h", "TC0E", "TCGC", "TCAD"];

/// Plausible CPU temperature range, degrees Celsius (open interval).
/// Readings outside it are treated as an absent sensor, not an error.
const TEMP_PLAUSIBLE_MIN: f64 = 1.0;
const TEMP_PLAUSIBLE_MAX: f64 = 125.0;

/// Upper bound on the fan-key probe (F0Ac, F1Ac, ...).
const MAX_FANS: usize = 8;

/// Fan mode key: 0 = automatic, 1 = manual.
const FAN_MODE_KEY: &str = "F0Md";
/// Fan target RPM key, honored in manual mode.
const FAN_TARGET_KEY: &str = "F0Tg";
/// Target RPM written when turbo mode is enabled.
const TURBO_TARGET_RPM: f64 = 6000.0;

/// The single struct-method IO call the controller interface exposes.
///
/// The real implementation talks to the AppleSMC user client; tests supply a
/// table-driven fake. A port is not safe for concurrent use; the monitor
/// only ever calls it from the fast-tick task.
pub trait SmcPort {
    fn call(&mut self, input: &[u8; STRUCT_SIZE]) -> Result<[u8; STRUCT_SIZE]>;
}

/// Typed key read/write client over any [`SmcPort`].
///
/// Key metadata is re-queried on every read rather than cached, so a
/// type/size change across controller firmware variants can never be masked
/// by stale metadata.
pub struct SmcClient<P: SmcPort> {
    port: P,
}

impl<P: SmcPort> SmcClient<P> {
    pub fn new(port: P) -> Self {
        Self { port }
    }

    /// The underlying port.
    pub fn port(&self) -> &P {
        &self.port
    }

    /// Query type and size for a key. A zero data size means the key does
    /// not exist on this controller.
    fn key_info(&mut self, key: SmcKey) -> Result<KeyInfo> {
        let response = self.port.call(&build_read_key_info(key))?;
        let info = parse_key_info(&response);
        if info.data_size == 0 {
            return Err(MacPerfError::key_not_found(key.to_string()));
        }
        Ok(info)
    }

    /// Read a key and convert it to engineering units.
    pub fn read_key(&mut self, key: SmcKey) -> Result<f64> {
        let info = self.key_info(key)?;
        let response = self.port.call(&build_read_bytes(key, info.data_size))?;
        let bytes = value_bytes(&response, info.data_size);

        let data_type = info.data_type().ok_or_else(|| MacPerfError::TypeUnsupported {
            data_type: info.type_tag.clone(),
            size: info.data_size,
        })?;
        data_type
            .decode(bytes)
            .ok_or(MacPerfError::TypeUnsupported {
                data_type: info.type_tag,
                size: info.data_size,
            })
    }

    /// Write a value to a key, encoding it per the key's reported type.
    ///
    /// Unlike reads, an unsupported encoding surfaces as
    /// [`MacPerfError::TypeUnsupported`] rather than silently doing nothing;
    /// best-effort callers log and continue.
    pub fn write_key(&mut self, key: SmcKey, value: f64) -> Result<()> {
        let info = self.key_info(key)?;
        let payload = info
            .data_type()
            .and_then(|t| t.encode(value))
            .ok_or_else(|| MacPerfError::TypeUnsupported {
                data_type: info.type_tag.clone(),
                size: info.data_size,
            })?;
        self.port.call(&build_write_bytes(key, &payload)?)?;
        Ok(())
    }

    /// Probe the CPU temperature sensor candidates and return the first
    /// plausible reading, or `None` when every candidate is absent or out
    /// of range.
    pub fn cpu_temperature(&mut self) -> Option<f64> {
        for name in CPU_TEMP_KEYS {
            let key = SmcKey::new(name).ok()?;
            match self.read_key(key) {
                Ok(val) if val > TEMP_PLAUSIBLE_MIN && val < TEMP_PLAUSIBLE_MAX => {
                    return Some(val);
                }
                Ok(val) => {
                    log::debug!("SMC key {} reading {:.1} out of range, skipping", name, val);
                }
                Err(MacPerfError::KeyNotFound(_)) => {}
                Err(e) => {
                    log::debug!("SMC key {} read failed: {}", name, e);
                }
            }
        }
        None
    }

    /// Read actual RPM for every physical fan (F0Ac, F1Ac, ...), floored to
    /// whole RPM. The probe stops at the first absent key, so the returned
    /// order is stable across reads of the same controller.
    pub fn fan_speeds(&mut self) -> Vec<u32> {
        let mut speeds = Vec::new();
        for i in 0..MAX_FANS {
            let name = format!("F{}Ac", i);
            let key = match SmcKey::new(&name) {
                Ok(k) => k,
                Err(_) => break,
            };
            match self.read_key(key) {
                Ok(rpm) if rpm >= 0.0 => speeds.push(rpm.floor() as u32),
                Ok(_) => break,
                Err(MacPerfError::KeyNotFound(_)) => break,
                Err(e) => {
                    log::debug!("fan key {} read failed: {}", name, e);
                    break;
                }
            }
        }
        speeds
    }

    /// Switch fan 0 between automatic control and a fixed high target RPM.
    pub fn set_fan_turbo(&mut self, enabled: bool) -> Result<()> {
        let mode = SmcKey::new(FAN_MODE_KEY)?;
        if enabled {
            self.write_key(mode, 1.0)?;
            self.write_key(SmcKey::new(FAN_TARGET_KEY)?, TURBO_TARGET_RPM)?;
        } else {
            self.write_key(mode, 0.0)?;
        }
        Ok(())
    }
}

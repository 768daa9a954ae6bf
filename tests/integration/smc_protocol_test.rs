use std::collections::HashMap;

use macperf::core::smc::codec::{
    CMD_READ_BYTES, CMD_READ_KEYINFO, CMD_WRITE_BYTES, OFFSET_BYTES, OFFSET_COMMAND,
    OFFSET_DATA_SIZE, OFFSET_DATA_TYPE, OFFSET_KEY, STRUCT_SIZE,
};
use macperf::{MacPerfError, Result, SmcClient, SmcKey, SmcPort};

/// Fake controller speaking the 80-byte struct protocol. Keys it does not
/// know answer key-info queries with data size 0, same as real hardware.
#[derive(Default)]
struct ScriptedController {
    keys: HashMap<[u8; 4], (&'static str, Vec<u8>)>,
    writes: Vec<([u8; 4], Vec<u8>)>,
}

impl ScriptedController {
    fn with_key(mut self, name: &str, tag: &'static str, bytes: &[u8]) -> Self {
        let mut k = [0u8; 4];
        k.copy_from_slice(name.as_bytes());
        self.keys.insert(k, (tag, bytes.to_vec()));
        self
    }
}

impl SmcPort for ScriptedController {
    fn call(&mut self, input: &[u8; STRUCT_SIZE]) -> Result<[u8; STRUCT_SIZE]> {
        let mut key = [0u8; 4];
        key.copy_from_slice(&input[OFFSET_KEY..OFFSET_KEY + 4]);
        let mut output = [0u8; STRUCT_SIZE];

        match input[OFFSET_COMMAND] {
            CMD_READ_KEYINFO => {
                if let Some((tag, bytes)) = self.keys.get(&key) {
                    let size = bytes.len() as u32;
                    output[OFFSET_DATA_SIZE..OFFSET_DATA_SIZE + 4]
                        .copy_from_slice(&size.to_le_bytes());
                    output[OFFSET_DATA_TYPE..OFFSET_DATA_TYPE + 4].copy_from_slice(tag.as_bytes());
                }
                Ok(output)
            }
            CMD_READ_BYTES => {
                if let Some((_, bytes)) = self.keys.get(&key) {
                    output[OFFSET_BYTES..OFFSET_BYTES + bytes.len()].copy_from_slice(bytes);
                }
                Ok(output)
            }
            CMD_WRITE_BYTES => {
                let len = input[OFFSET_DATA_SIZE] as usize;
                self.writes
                    .push((key, input[OFFSET_BYTES..OFFSET_BYTES + len].to_vec()));
                Ok(output)
            }
            cmd => Err(MacPerfError::other(format!("unexpected command {}", cmd))),
        }
    }
}

/// A controller resembling a real Intel MacBook: die sensor, proximity
/// sensor, two fans.
fn macbook_like() -> ScriptedController {
    ScriptedController::default()
        .with_key("TC0D", "sp78", &[58, 64]) // 58.25 C
        .with_key("TC0P", "sp78", &[54, 0])
        .with_key("F0Ac", "fpe2", &0x1B58u16.to_be_bytes()) // 7000/4 = 1750 rpm
        .with_key("F1Ac", "fpe2", &0x2000u16.to_be_bytes()) // 8192/4 = 2048 rpm
        .with_key("F0Md", "ui8 ", &[0])
        .with_key("F0Tg", "fpe2", &[0, 0])
}

#[test]
fn test_read_die_temperature_key() {
    let mut client = SmcClient::new(macbook_like());
    let key: SmcKey = "TC0D".parse().unwrap();
    assert_eq!(client.read_key(key).unwrap(), 58.25);
}

#[test]
fn test_temperature_probe_prefers_die_sensor() {
    // TC0D comes first in the candidate list, so the proximity sensor
    // never gets consulted.
    let mut client = SmcClient::new(macbook_like());
    assert_eq!(client.cpu_temperature(), Some(58.25));
}

#[test]
fn test_temperature_probe_falls_through_to_proximity() {
    let controller = ScriptedController::default()
        .with_key("TC0D", "sp78", &[0, 0]) // uninitialized sensor
        .with_key("TC0P", "sp78", &[54, 128]);
    let mut client = SmcClient::new(controller);
    assert_eq!(client.cpu_temperature(), Some(54.5));
}

#[test]
fn test_fan_walk_reads_both_fans() {
    let mut client = SmcClient::new(macbook_like());
    assert_eq!(client.fan_speeds(), vec![1750, 2048]);
}

#[test]
fn test_fanless_machine_reports_no_fans() {
    let controller = ScriptedController::default().with_key("TC0D", "sp78", &[45, 0]);
    let mut client = SmcClient::new(controller);
    assert!(client.fan_speeds().is_empty());
}

#[test]
fn test_fan_turbo_writes_mode_then_target() {
    let mut client = SmcClient::new(macbook_like());
    client.set_fan_turbo(true).unwrap();
    client.set_fan_turbo(false).unwrap();

    let writes = &client.port().writes;
    assert_eq!(writes.len(), 3);
    // on: mode = 1, target = 6000 rpm in fpe2 (24000 = 0x5DC0)
    assert_eq!((&writes[0].0, writes[0].1.as_slice()), (b"F0Md", &[1u8][..]));
    assert_eq!(
        (&writes[1].0, writes[1].1.as_slice()),
        (b"F0Tg", &[0x5D, 0xC0][..])
    );
    // off: back to automatic, no target write
    assert_eq!((&writes[2].0, writes[2].1.as_slice()), (b"F0Md", &[0u8][..]));
}

#[test]
fn test_unknown_key_is_not_found() {
    let mut client = SmcClient::new(macbook_like());
    let key: SmcKey = "TG0D".parse().unwrap();
    assert!(matches!(
        client.read_key(key),
        Err(MacPerfError::KeyNotFound(_))
    ));
}

#[test]
fn test_key_name_round_trips_through_display() {
    let key: SmcKey = "F0Ac".parse().unwrap();
    assert_eq!(key.to_string(), "F0Ac");
    assert!("F0".parse::<SmcKey>().is_err());
    assert!("TOOLONG".parse::<SmcKey>().is_err());
}

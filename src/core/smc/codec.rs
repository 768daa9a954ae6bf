//! Wire codec for the AppleSMC user-client call.
//!
//! The kernel interface exchanges a fixed 80-byte structure in both
//! directions regardless of logical payload; the layout below is the
//! hardware/firmware contract, expressed with named offsets instead of an
//! implicit struct layout so that padding can never drift.

use crate::error::{MacPerfError, Result};

/// Size of the SMC call structure, in both directions.
pub const STRUCT_SIZE: usize = 80;

/// Selector index for the struct-method call on the AppleSMC user client.
pub const KERNEL_INDEX_SMC: u32 = 2;

// Command selectors (written at [`OFFSET_COMMAND`]).
pub const CMD_READ_BYTES: u8 = 5;
pub const CMD_WRITE_BYTES: u8 = 6;
pub const CMD_READ_KEYINFO: u8 = 9;

// Field offsets within the 80-byte structure.
/// Four-character key code, big-endian (offset 0..4).
pub const OFFSET_KEY: usize = 0;
/// Data size: u32 in host order in responses, single low byte in requests.
pub const OFFSET_DATA_SIZE: usize = 24;
/// Four-character ASCII data type tag (offset 28..32), responses only.
pub const OFFSET_DATA_TYPE: usize = 28;
/// Start of the raw value bytes (offset 33..65).
pub const OFFSET_BYTES: usize = 33;
/// Command selector byte.
pub const OFFSET_COMMAND: usize = 71;

/// Maximum logical payload carried by one call.
pub const MAX_DATA_SIZE: usize = 32;

/// A four-character ASCII SMC key, e.g. `TC0D` or `F0Ac`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SmcKey([u8; 4]);

impl SmcKey {
    /// Build a key from a 4-character ASCII string.
    pub fn new(name: &str) -> Result<Self> {
        let bytes = name.as_bytes();
        if bytes.len() != 4 || !bytes.iter().all(u8::is_ascii) {
            return Err(MacPerfError::parse(format!(
                "SMC key must be 4 ASCII characters, got '{}'",
                name
            )));
        }
        Ok(Self([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// The key as a big-endian four-character code.
    pub fn as_u32(self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    pub fn as_bytes(self) -> [u8; 4] {
        self.0
    }
}

impl std::fmt::Display for SmcKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl std::str::FromStr for SmcKey {
    type Err = MacPerfError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Numeric encodings used by the controller's key-value protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// Unsigned byte.
    Ui8,
    /// Unsigned big-endian 16-bit.
    Ui16,
    /// Unsigned 14.2 fixed point: value = raw16 / 4.0.
    Fpe2,
    /// Signed 7.8 fixed point: value = byte0 + byte1 / 256.0.
    Sp78,
}

impl DataType {
    /// Parse a 4-character type tag. Tags are space-padded (`"ui8 "`), so
    /// match on prefix the way the firmware's own tools do.
    pub fn from_tag(tag: &str) -> Option<Self> {
        if tag.starts_with("ui8") {
            Some(DataType::Ui8)
        } else if tag.starts_with("ui16") {
            Some(DataType::Ui16)
        } else if tag.starts_with("fpe2") {
            Some(DataType::Fpe2)
        } else if tag.starts_with("sp78") {
            Some(DataType::Sp78)
        } else {
            None
        }
    }

    /// Decode raw value bytes into engineering units.
    pub fn decode(self, data: &[u8]) -> Option<f64> {
        match (self, data.len()) {
            (DataType::Ui8, 1) => Some(f64::from(data[0])),
            (DataType::Ui16, 2) => Some(f64::from(u16::from_be_bytes([data[0], data[1]]))),
            (DataType::Fpe2, 2) => {
                Some(f64::from(u16::from_be_bytes([data[0], data[1]])) / 4.0)
            }
            (DataType::Sp78, 2) => Some(f64::from(data[0]) + f64::from(data[1]) / 256.0),
            _ => None,
        }
    }

    /// Encode a value for writing. Only the types the controller accepts
    /// writes for are supported.
    pub fn encode(self, value: f64) -> Option<Vec<u8>> {
        match self {
            DataType::Ui8 => Some(vec![value.clamp(0.0, 255.0) as u8]),
            DataType::Fpe2 => {
                let raw = (value * 4.0).round().clamp(0.0, f64::from(u16::MAX)) as u16;
                Some(raw.to_be_bytes().to_vec())
            }
            _ => None,
        }
    }
}

/// Key metadata returned by a key-info query.
#[derive(Debug, Clone)]
pub struct KeyInfo {
    pub data_size: u32,
    /// Raw 4-character tag, kept for diagnostics even when unrecognized.
    pub type_tag: String,
}

impl KeyInfo {
    pub fn data_type(&self) -> Option<DataType> {
        DataType::from_tag(&self.type_tag)
    }
}

fn request_with_key(key: SmcKey, command: u8) -> [u8; STRUCT_SIZE] {
    let mut buf = [0u8; STRUCT_SIZE];
    buf[OFFSET_KEY..OFFSET_KEY + 4].copy_from_slice(&key.as_u32().to_be_bytes());
    buf[OFFSET_COMMAND] = command;
    buf
}

/// Build a "read key info" request.
pub fn build_read_key_info(key: SmcKey) -> [u8; STRUCT_SIZE] {
    request_with_key(key, CMD_READ_KEYINFO)
}

/// Build a "read bytes" request for a key whose size is already known.
pub fn build_read_bytes(key: SmcKey, data_size: u32) -> [u8; STRUCT_SIZE] {
    let mut buf = request_with_key(key, CMD_READ_BYTES);
    // The kernel only looks at the low byte of the size for reads.
    buf[OFFSET_DATA_SIZE] = (data_size & 0xFF) as u8;
    buf
}

/// Build a "write bytes" request carrying an encoded payload.
pub fn build_write_bytes(key: SmcKey, payload: &[u8]) -> Result<[u8; STRUCT_SIZE]> {
    if payload.is_empty() || payload.len() > MAX_DATA_SIZE {
        return Err(MacPerfError::parse(format!(
            "SMC write payload must be 1..={} bytes, got {}",
            MAX_DATA_SIZE,
            payload.len()
        )));
    }
    let mut buf = request_with_key(key, CMD_WRITE_BYTES);
    buf[OFFSET_DATA_SIZE] = payload.len() as u8;
    buf[OFFSET_BYTES..OFFSET_BYTES + payload.len()].copy_from_slice(payload);
    Ok(buf)
}

/// Extract key metadata from a key-info response.
///
/// The size field is in host order; the interface only exists on
/// little-endian Intel hosts, so decode it as little-endian.
pub fn parse_key_info(response: &[u8; STRUCT_SIZE]) -> KeyInfo {
    let data_size = u32::from_le_bytes([
        response[OFFSET_DATA_SIZE],
        response[OFFSET_DATA_SIZE + 1],
        response[OFFSET_DATA_SIZE + 2],
        response[OFFSET_DATA_SIZE + 3],
    ]);
    let type_tag =
        String::from_utf8_lossy(&response[OFFSET_DATA_TYPE..OFFSET_DATA_TYPE + 4]).into_owned();
    KeyInfo {
        data_size,
        type_tag,
    }
}

/// Borrow the raw value bytes out of a "read bytes" response.
pub fn value_bytes(response: &[u8; STRUCT_SIZE], data_size: u32) -> &[u8] {
    let len = (data_size as usize).min(MAX_DATA_SIZE);
    &response[OFFSET_BYTES..OFFSET_BYTES + len]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> SmcKey {
        SmcKey::new(name).unwrap()
    }

    #[test]
    fn test_key_fourcc_encoding() {
        assert_eq!(key("TC0D").as_u32(), 0x5443_3044);
        assert_eq!(key("F0Ac").as_u32(), 0x4630_4163);
        assert_eq!(key("TC0D").to_string(), "TC0D");
    }

    #[test]
    fn test_key_rejects_bad_length() {
        assert!(SmcKey::new("TC0").is_err());
        assert!(SmcKey::new("TC0DX").is_err());
    }

    #[test]
    fn test_read_key_info_request_layout() {
        let buf = build_read_key_info(key("TC0D"));
        assert_eq!(&buf[0..4], b"TC0D");
        assert_eq!(buf[OFFSET_COMMAND], CMD_READ_KEYINFO);
        // Everything else zero-padded to exactly 80 bytes.
        assert_eq!(buf.len(), STRUCT_SIZE);
        assert!(buf[4..OFFSET_COMMAND].iter().all(|&b| b == 0));
        assert!(buf[OFFSET_COMMAND + 1..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_read_bytes_request_layout() {
        let buf = build_read_bytes(key("F0Ac"), 2);
        assert_eq!(&buf[0..4], b"F0Ac");
        assert_eq!(buf[OFFSET_DATA_SIZE], 2);
        assert_eq!(buf[OFFSET_COMMAND], CMD_READ_BYTES);
    }

    #[test]
    fn test_write_bytes_request_layout() {
        let buf = build_write_bytes(key("F0Md"), &[1]).unwrap();
        assert_eq!(&buf[0..4], b"F0Md");
        assert_eq!(buf[OFFSET_DATA_SIZE], 1);
        assert_eq!(buf[OFFSET_BYTES], 1);
        assert_eq!(buf[OFFSET_COMMAND], CMD_WRITE_BYTES);
    }

    #[test]
    fn test_write_bytes_rejects_oversized_payload() {
        assert!(build_write_bytes(key("F0Tg"), &[0u8; 33]).is_err());
        assert!(build_write_bytes(key("F0Tg"), &[]).is_err());
    }

    #[test]
    fn test_parse_key_info_fields() {
        let mut resp = [0u8; STRUCT_SIZE];
        resp[OFFSET_DATA_SIZE..OFFSET_DATA_SIZE + 4].copy_from_slice(&2u32.to_le_bytes());
        resp[OFFSET_DATA_TYPE..OFFSET_DATA_TYPE + 4].copy_from_slice(b"sp78");
        let info = parse_key_info(&resp);
        assert_eq!(info.data_size, 2);
        assert_eq!(info.type_tag, "sp78");
        assert_eq!(info.data_type(), Some(DataType::Sp78));
    }

    #[test]
    fn test_type_tag_prefix_matching() {
        assert_eq!(DataType::from_tag("ui8 "), Some(DataType::Ui8));
        assert_eq!(DataType::from_tag("ui16"), Some(DataType::Ui16));
        assert_eq!(DataType::from_tag("flt "), None);
    }

    #[test]
    fn test_sp78_decode() {
        // 45 + 128/256 = 45.5
        let val = DataType::Sp78.decode(&[45, 128]).unwrap();
        assert!((val - 45.5).abs() < 1.0 / 256.0);
    }

    #[test]
    fn test_fpe2_decode() {
        // 0x0960 = 2400; 2400 / 4 = 600 rpm
        let val = DataType::Fpe2.decode(&[0x09, 0x60]).unwrap();
        assert_eq!(val, 600.0);
    }

    #[test]
    fn test_ui16_decode_is_big_endian() {
        assert_eq!(DataType::Ui16.decode(&[0x01, 0x00]), Some(256.0));
    }

    #[test]
    fn test_decode_rejects_size_mismatch() {
        assert_eq!(DataType::Sp78.decode(&[45]), None);
        assert_eq!(DataType::Ui8.decode(&[1, 2]), None);
    }

    #[test]
    fn test_fpe2_round_trip_within_quarter() {
        for v in [0.0, 1.3, 599.9, 6000.0, 16383.7] {
            let bytes = DataType::Fpe2.encode(v).unwrap();
            let back = DataType::Fpe2.decode(&bytes).unwrap();
            assert!(
                (back - v).abs() <= 0.25,
                "fpe2 round trip {} -> {}",
                v,
                back
            );
        }
    }

    #[test]
    fn test_ui8_encode_clamps() {
        assert_eq!(DataType::Ui8.encode(300.0), Some(vec![255]));
        assert_eq!(DataType::Ui8.encode(-5.0), Some(vec![0]));
        assert_eq!(DataType::Ui8.encode(7.0), Some(vec![7]));
    }

    #[test]
    fn test_sp78_has_no_encoder() {
        assert_eq!(DataType::Sp78.encode(45.0), None);
    }
}

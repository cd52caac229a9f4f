//! Archive record framing.

use crate::error::{CoreError, CoreResult};

/// Flags for archive records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryFlags(u8);

impl EntryFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// Record removes the key (purge).
    pub const TOMBSTONE: Self = Self(0x01);

    /// Creates flags from the raw byte.
    #[must_use]
    pub const fn from_byte(b: u8) -> Self {
        Self(b)
    }

    /// Returns the raw byte value.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self.0
    }

    /// Checks if the tombstone flag is set.
    #[must_use]
    pub const fn is_tombstone(self) -> bool {
        self.0 & 0x01 != 0
    }
}

/// One keyed record in the archive log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRecord {
    /// Key the record belongs to.
    pub key: String,
    /// Record flags.
    pub flags: EntryFlags,
    /// Stored bytes (empty for tombstones).
    pub payload: Vec<u8>,
}

impl EntryRecord {
    /// record_len (4) + flags (1) + key_len (2)
    pub const HEADER_SIZE: usize = 7;
    /// CRC size.
    pub const CRC_SIZE: usize = 4;
    /// Smallest well-formed record (empty key, empty payload).
    pub const MIN_SIZE: usize = Self::HEADER_SIZE + Self::CRC_SIZE;
    /// Longest key the framing can carry.
    pub const MAX_KEY_LEN: usize = u16::MAX as usize;

    /// Creates a record storing `payload` under `key`.
    #[must_use]
    pub fn put(key: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            flags: EntryFlags::NONE,
            payload,
        }
    }

    /// Creates a tombstone for `key`.
    #[must_use]
    pub fn tombstone(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            flags: EntryFlags::TOMBSTONE,
            payload: Vec::new(),
        }
    }

    /// Returns whether this record purges its key.
    #[must_use]
    pub fn is_tombstone(&self) -> bool {
        self.flags.is_tombstone()
    }

    /// Encodes the record.
    ///
    /// ```text
    /// | record_len (4) | flags (1) | key_len (2) | key | payload | crc32 (4) |
    /// ```
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        if self.key.len() > Self::MAX_KEY_LEN {
            return Err(CoreError::invalid_operation(format!(
                "archive key is {} bytes, limit is {}",
                self.key.len(),
                Self::MAX_KEY_LEN
            )));
        }

        let record_len = self.encoded_size();
        let record_len_u32 = u32::try_from(record_len).map_err(|_| {
            CoreError::invalid_operation(format!("archive record of {record_len} bytes is too large"))
        })?;

        let mut buf = Vec::with_capacity(record_len);
        buf.extend_from_slice(&record_len_u32.to_le_bytes());
        buf.push(self.flags.as_byte());
        buf.extend_from_slice(&(self.key.len() as u16).to_le_bytes());
        buf.extend_from_slice(self.key.as_bytes());
        buf.extend_from_slice(&self.payload);

        let crc = crc32fast::hash(&buf);
        buf.extend_from_slice(&crc.to_le_bytes());

        Ok(buf)
    }

    /// Decodes one record from the start of `data`.
    pub fn decode(data: &[u8]) -> CoreResult<Self> {
        if data.len() < Self::MIN_SIZE {
            return Err(CoreError::archive_corruption("record too short"));
        }

        let record_len = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
        if record_len < Self::MIN_SIZE {
            return Err(CoreError::archive_corruption(format!(
                "record length {record_len} below minimum"
            )));
        }
        if data.len() < record_len {
            return Err(CoreError::archive_corruption("incomplete record"));
        }

        let body = &data[..record_len - Self::CRC_SIZE];
        let stored_crc = u32::from_le_bytes([
            data[record_len - 4],
            data[record_len - 3],
            data[record_len - 2],
            data[record_len - 1],
        ]);
        let computed_crc = crc32fast::hash(body);
        if stored_crc != computed_crc {
            return Err(CoreError::ChecksumMismatch {
                expected: stored_crc,
                actual: computed_crc,
            });
        }

        let flags = EntryFlags::from_byte(data[4]);
        let key_len = u16::from_le_bytes([data[5], data[6]]) as usize;
        let key_end = Self::HEADER_SIZE + key_len;
        if key_end > body.len() {
            return Err(CoreError::archive_corruption("key extends past record"));
        }

        let key = std::str::from_utf8(&body[Self::HEADER_SIZE..key_end])
            .map_err(|_| CoreError::archive_corruption("key is not valid UTF-8"))?
            .to_string();
        let payload = body[key_end..].to_vec();

        Ok(Self {
            key,
            flags,
            payload,
        })
    }

    /// Returns the encoded size of this record.
    #[must_use]
    pub fn encoded_size(&self) -> usize {
        Self::HEADER_SIZE + self.key.len() + self.payload.len() + Self::CRC_SIZE
    }
}

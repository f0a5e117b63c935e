use thiserror::Error;

/// Size of the fixed script header: seven little-endian DWORDs.
pub const HEADER_SIZE: usize = 28;

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("buffer too short for script header: {len} bytes")]
    TooShort { len: usize },
    #[error("script has no string pool")]
    EmptyStringPool,
    #[error("string pool [{start:#x}, {end:#x}) out of bounds (buffer is {len:#x} bytes)")]
    PoolOutOfBounds { start: usize, end: usize, len: usize },
}

/// The seven DWORD fields at the start of every script container.
///
/// The two bytecode segments before the string pool determine where the
/// pool starts; the two after it are opaque to these tools and must come
/// through a pack run byte-identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptHeader {
    pub file_size: u32,
    pub header_size: u32,
    pub bytecode_size1: u32,
    pub bytecode_size2: u32,
    pub string_pool_size: u32,
    pub bytecode_size3: u32,
    pub bytecode_size4: u32,
}

fn u32_at(bytes: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([bytes[off], bytes[off + 1], bytes[off + 2], bytes[off + 3]])
}

impl ScriptHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self, ContainerError> {
        if bytes.len() < HEADER_SIZE {
            return Err(ContainerError::TooShort { len: bytes.len() });
        }
        Ok(Self {
            file_size: u32_at(bytes, 0),
            header_size: u32_at(bytes, 4),
            bytecode_size1: u32_at(bytes, 8),
            bytecode_size2: u32_at(bytes, 12),
            string_pool_size: u32_at(bytes, 16),
            bytecode_size3: u32_at(bytes, 20),
            bytecode_size4: u32_at(bytes, 24),
        })
    }

    /// Absolute offset of the first string-pool byte.
    pub fn post_offset(&self) -> usize {
        self.header_size as usize + self.bytecode_size1 as usize + self.bytecode_size2 as usize
    }
}

/// A parsed container: the header plus the whole file buffer.
#[derive(Debug, Clone)]
pub struct ScriptContainer {
    header: ScriptHeader,
    bytes: Vec<u8>,
}

impl ScriptContainer {
    /// Parse and validate a container buffer.
    ///
    /// Every error here means "no translatable text": batch drivers treat
    /// all variants as a skip, not a failure.
    pub fn parse(bytes: Vec<u8>) -> Result<Self, ContainerError> {
        let header = ScriptHeader::parse(&bytes)?;
        if header.string_pool_size == 0 {
            return Err(ContainerError::EmptyStringPool);
        }
        let start = header.post_offset();
        let end = start + header.string_pool_size as usize;
        if end > bytes.len() {
            return Err(ContainerError::PoolOutOfBounds {
                start,
                end,
                len: bytes.len(),
            });
        }
        Ok(Self { header, bytes })
    }

    #[inline]
    pub fn header(&self) -> &ScriptHeader {
        &self.header
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn post_offset(&self) -> usize {
        self.header.post_offset()
    }

    /// The scan window for the string extractor.
    pub fn string_pool(&self) -> &[u8] {
        let start = self.post_offset();
        &self.bytes[start..start + self.header.string_pool_size as usize]
    }
}

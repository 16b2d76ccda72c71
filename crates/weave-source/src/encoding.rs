//! Character encodings for raw-text inclusion.

use std::fmt;

/// Encoding used to decode raw text content.
///
/// ASCII is the default, matching the conservative behavior expected of
/// unlabeled text includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextEncoding {
    /// UTF-8, with an optional byte order mark.
    Utf8,
    /// 7-bit ASCII. Any byte above `0x7f` is rejected.
    #[default]
    Ascii,
}

/// Text could not be decoded with the requested encoding.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Input is not valid UTF-8.
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Input contains a byte outside the ASCII range.
    #[error("non-ASCII byte 0x{byte:02x} at offset {offset}")]
    NonAscii {
        /// The offending byte.
        byte: u8,
        /// Byte offset into the input.
        offset: usize,
    },
}

impl TextEncoding {
    /// Look up an encoding by label, case-insensitively.
    ///
    /// Returns `None` for unknown labels.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Some(Self::Utf8),
            "ascii" | "us-ascii" => Some(Self::Ascii),
            _ => None,
        }
    }

    /// Canonical label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Ascii => "ascii",
        }
    }

    /// Decode `bytes` into a string.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when `bytes` are not valid in this encoding.
    pub fn decode(self, bytes: &[u8]) -> Result<String, DecodeError> {
        match self {
            Self::Utf8 => {
                let bytes = bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes);
                Ok(std::str::from_utf8(bytes)?.to_owned())
            }
            Self::Ascii => {
                if let Some(offset) = bytes.iter().position(|b| !b.is_ascii()) {
                    return Err(DecodeError::NonAscii {
                        byte: bytes[offset],
                        offset,
                    });
                }
                Ok(bytes.iter().map(|&b| char::from(b)).collect())
            }
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

//! Codecs for attachment values.
//!
//! Whether an attachment type has a codec is meaningful in itself: a type
//! without one is treated as derived or session-local state and is never
//! propagated to another holder. Types with a codec can be encoded to bytes
//! and decoded again; when no explicit copy handler is set, that round trip is
//! how the propagation engine produces independent copies.
//!
//! Codecs never touch durable storage. Where the bytes go, if anywhere, is up
//! to the code that owns the holders.

use alloc::vec::Vec;

use rootcause::Report;

/// Encodes and decodes values of an attachment type.
///
/// # Examples
///
/// ```
/// use carryover::{codec::AttachmentCodec, prelude::*};
///
/// struct Level(u8);
/// struct LevelCodec;
///
/// impl AttachmentCodec<Level> for LevelCodec {
///     fn encode(&self, value: &Level) -> Result<Vec<u8>, Report> {
///         Ok(vec![value.0])
///     }
///
///     fn decode(&self, bytes: &[u8]) -> Result<Level, Report> {
///         match bytes {
///             [level] => Ok(Level(*level)),
///             _ => bail!("expected a single byte, got {}", bytes.len()),
///         }
///     }
/// }
/// ```
pub trait AttachmentCodec<T>: Send + Sync + 'static {
    /// Encodes `value` to bytes.
    fn encode(&self, value: &T) -> Result<Vec<u8>, Report>;

    /// Decodes a value from bytes produced by [`encode`](Self::encode).
    fn decode(&self, bytes: &[u8]) -> Result<T, Report>;
}

/// A codec built from a pair of functions.
pub struct FnCodec<T> {
    encode: fn(&T) -> Result<Vec<u8>, Report>,
    decode: fn(&[u8]) -> Result<T, Report>,
}

impl<T> FnCodec<T> {
    /// Creates a codec from an encoding and a decoding function.
    #[must_use]
    pub const fn new(
        encode: fn(&T) -> Result<Vec<u8>, Report>,
        decode: fn(&[u8]) -> Result<T, Report>,
    ) -> Self {
        Self { encode, decode }
    }
}

impl<T: 'static> AttachmentCodec<T> for FnCodec<T> {
    fn encode(&self, value: &T) -> Result<Vec<u8>, Report> {
        (self.encode)(value)
    }

    fn decode(&self, bytes: &[u8]) -> Result<T, Report> {
        (self.decode)(bytes)
    }
}

impl<T> Clone for FnCodec<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FnCodec<T> {}

impl<T> core::fmt::Debug for FnCodec<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FnCodec")
            .field("value_type", &core::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

/// Produces an independent copy of `value` by encoding it and decoding the
/// result.
pub fn round_trip<T: 'static>(codec: &dyn AttachmentCodec<T>, value: &T) -> Result<T, Report> {
    let bytes = codec.encode(value)?;
    codec.decode(&bytes)
}

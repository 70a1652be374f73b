//! Big-endian reading and writing primitives for the JVM class-file format.
//!
//! Every multi-byte quantity in a class file (`u2`, `u4`, the halves of a `CONSTANT_Long`) is
//! stored big-endian. This module provides the [`crate::file::io::ClassIO`] trait and a small set
//! of bounds-checked helpers built on top of it, which the [`crate::file::parser::Parser`] and the
//! remapper's output writer use for all binary access.
//!
//! # Key Components
//!
//! - [`crate::file::io::ClassIO`] - Trait mapping a primitive to its fixed-size byte array
//! - [`crate::file::io::read_be_at`] - Read a value at an offset and advance the offset
//! - [`crate::file::io::push_be`] - Append a value to a growing output buffer
//!
//! # Error Handling
//!
//! Reads return [`crate::Error::OutOfBounds`] when the buffer holds fewer bytes than
//! the value needs. Appending to a `Vec` cannot fail.
//!
//! # Thread Safety
//!
//! All functions are pure and operate on caller-provided buffers; they can be called
//! concurrently from any number of threads.

use crate::Result;

/// Trait for type-specific, endian-aware conversion between primitives and byte arrays.
///
/// Each implementation names the fixed-size array holding its encoded form through the
/// associated [`ClassIO::Bytes`] type (e.g. `[u8; 2]` for `u16`, the class-file `u2`).
///
/// # Examples
///
/// ```rust,ignore
/// use classremap::file::io::ClassIO;
///
/// let bytes = [0xCA, 0xFE, 0xBA, 0xBE];
/// assert_eq!(<u32 as ClassIO>::from_be_bytes(bytes), 0xCAFE_BABE);
/// ```
pub trait ClassIO: Sized {
    /// Associated type representing the byte array type for this numeric type.
    type Bytes: Sized + AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// Read T from a byte buffer in big-endian
    fn from_be_bytes(bytes: Self::Bytes) -> Self;

    /// Write T to a byte buffer in big-endian
    fn to_be_bytes(self) -> Self::Bytes;
}

macro_rules! impl_class_io {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ClassIO for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

                fn from_be_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_be_bytes(bytes)
                }

                fn to_be_bytes(self) -> Self::Bytes {
                    <$ty>::to_be_bytes(self)
                }
            }
        )*
    };
}

impl_class_io!(u8, u16, u32, i32, u64, i64);

/// Safely reads a value of type `T` in big-endian byte order at `offset`, advancing the offset
/// by the size of `T` on success.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes. The offset is left
/// untouched in that case.
pub fn read_be_at<T: ClassIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(out_of_bounds_error!());
    };
    if end > data.len() {
        return Err(out_of_bounds_error!());
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(out_of_bounds_error!());
    };

    *offset = end;

    Ok(T::from_be_bytes(read))
}

/// Appends a value of type `T` in big-endian byte order to `out`.
pub fn push_be<T: ClassIO>(out: &mut Vec<u8>, value: T) {
    out.extend_from_slice(value.to_be_bytes().as_ref());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn read_be_u2_u4() {
        let data = [0x00, 0x2A, 0xCA, 0xFE, 0xBA, 0xBE];
        let mut offset = 0;

        let first: u16 = read_be_at(&data, &mut offset).unwrap();
        let second: u32 = read_be_at(&data, &mut offset).unwrap();

        assert_eq!(first, 42);
        assert_eq!(second, 0xCAFE_BABE);
        assert_eq!(offset, 6);
    }

    #[test]
    fn read_be_signed() {
        let mut offset = 0;
        let value: i32 = read_be_at(&[0xFF, 0xFF, 0xFF, 0xFE], &mut offset).unwrap();
        assert_eq!(value, -2);
    }

    #[test]
    fn read_out_of_bounds_keeps_offset() {
        let data = [0x01, 0x02, 0x03];
        let mut offset = 2;

        let result = read_be_at::<u16>(&data, &mut offset);
        assert!(matches!(result, Err(Error::OutOfBounds)));
        assert_eq!(offset, 2);
    }

    #[test]
    fn read_offset_overflow() {
        let data = [0x01, 0x02];
        let mut offset = usize::MAX;

        assert!(matches!(
            read_be_at::<u32>(&data, &mut offset),
            Err(Error::OutOfBounds)
        ));
    }

    #[test]
    fn push() {
        let mut out = vec![0x01];
        push_be(&mut out, 0xBEEF_u16);
        push_be(&mut out, 7_u8);
        assert_eq!(out, vec![0x01, 0xBE, 0xEF, 0x07]);
    }
}

//! Cursor-based byte stream parser for class-file decoding.
//!
//! This module provides the [`crate::file::parser::Parser`] type, a bounds-checked cursor over a
//! byte slice. Class files are read front to back exactly once: the header, the constant pool,
//! the member tables and every attribute, so the parser only needs sequential reads, skips and
//! borrowed sub-slices.
//!
//! # Usage Examples
//!
//! ```rust
//! use classremap::Parser;
//!
//! let data = [0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00, 0x00, 0x34];
//! let mut parser = Parser::new(&data);
//!
//! let magic = parser.read_be::<u32>()?;
//! let minor = parser.read_be::<u16>()?;
//! let major = parser.read_be::<u16>()?;
//!
//! assert_eq!(magic, 0xCAFE_BABE);
//! assert_eq!((major, minor), (52, 0));
//! assert!(!parser.has_more_data());
//! # Ok::<(), classremap::Error>(())
//! ```

use crate::{
    file::io::{read_be_at, ClassIO},
    Result,
};

/// A sequential big-endian parser over borrowed class-file bytes.
///
/// `Parser` maintains a position cursor and validates every read against the remaining data,
/// returning [`crate::Error::OutOfBounds`] instead of panicking on truncated input.
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`crate::file::parser::Parser`] from a byte slice.
    ///
    /// # Arguments
    /// * `data` - The byte slice to read from
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if there is more data available to parse.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Get the current position of the parser within the data buffer.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Move the position forward by the specified number of bytes.
    ///
    /// # Arguments
    /// * `step` - Amount of bytes to advance
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if advancing by step would exceed the data length.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        match self.position.checked_add(step) {
            Some(end) if end <= self.data.len() => {
                self.position = end;
                Ok(())
            }
            _ => Err(out_of_bounds_error!()),
        }
    }

    /// Read a type `T` from the current position in big-endian format and advance the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use classremap::Parser;
    /// let data = [0x01, 0x02, 0x03, 0x04];
    /// let mut parser = Parser::new(&data);
    ///
    /// let value: u16 = parser.read_be()?;
    /// assert_eq!(value, 0x0102);
    /// assert_eq!(parser.pos(), 2);
    /// # Ok::<(), classremap::Error>(())
    /// ```
    pub fn read_be<T: ClassIO>(&mut self) -> Result<T> {
        read_be_at::<T>(self.data, &mut self.position)
    }

    /// Borrow the next `len` bytes and advance past them.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `len` bytes remain.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use classremap::Parser;
    /// let data = [0x00, 0x02, b'h', b'i'];
    /// let mut parser = Parser::new(&data);
    ///
    /// let len = parser.read_be::<u16>()?;
    /// assert_eq!(parser.read_bytes(len as usize)?, b"hi");
    /// # Ok::<(), classremap::Error>(())
    /// ```
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let start = self.position;
        self.advance_by(len)?;
        Ok(&self.data[start..self.position])
    }

    /// Execute a closure over a bounded window of the next `len` bytes.
    ///
    /// The closure receives a fresh parser over exactly that window, and the outer parser is
    /// advanced past it. The closure must consume the whole window; anything it leaves unread is
    /// reported as a malformed structure, which catches attributes whose declared length does not
    /// match their content.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `len` bytes remain, any error produced
    /// by `f`, or [`crate::Error::Malformed`] if `f` did not consume the window.
    pub fn sub_parse<T, F>(&mut self, len: usize, f: F) -> Result<T>
    where
        F: FnOnce(&mut Parser<'a>) -> Result<T>,
    {
        let window = self.read_bytes(len)?;
        let mut inner = Parser::new(window);
        let result = f(&mut inner)?;
        if inner.has_more_data() {
            return Err(malformed_error!(
                "Structure declares {} bytes but only {} were consumed",
                len,
                inner.pos()
            ));
        }
        Ok(result)
    }
}

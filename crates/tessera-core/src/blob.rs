//! Owned storage for variable-length payloads.
//!
//! Clipboard contents, window titles and similar data are always copied into
//! buffers owned by the view. Setters allocate the replacement first and only
//! swap it in once allocation succeeded, so a failed write leaves the previous
//! contents intact.

use crate::error::{Error, Result};

/// An owned, reallocable byte buffer.
///
/// An empty blob holds no allocation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Blob {
    data: Vec<u8>,
}

impl Blob {
    pub const fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Replaces the contents with a copy of `data`.
    pub fn set(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            self.clear();
            return Ok(());
        }

        let buffer = copy_exact(data)?;
        self.data = buffer;
        Ok(())
    }

    /// Frees the buffer.
    pub fn clear(&mut self) {
        self.data = Vec::new();
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Capacity of the owned allocation, zero when nothing is allocated.
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }
}

impl AsRef<[u8]> for Blob {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

fn copy_exact(data: &[u8]) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(data.len())
        .map_err(|_| Error::OutOfMemory {
            requested: data.len(),
        })?;
    buffer.extend_from_slice(data);
    Ok(buffer)
}

/// Replaces `*dest` with an exactly-sized copy of `string`, or clears it for `None`.
pub fn set_string(dest: &mut Option<Box<str>>, string: Option<&str>) -> Result<()> {
    match string {
        None => {
            *dest = None;
            Ok(())
        }
        Some(string) => {
            let mut owned = String::new();
            owned
                .try_reserve_exact(string.len())
                .map_err(|_| Error::OutOfMemory {
                    requested: string.len(),
                })?;
            owned.push_str(string);
            *dest = Some(owned.into_boxed_str());
            Ok(())
        }
    }
}

/// Internal clipboard: a MIME type and the data stored under it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Clipboard {
    mime_type: Option<Box<str>>,
    data: Blob,
}

impl Clipboard {
    pub const fn new() -> Self {
        Self {
            mime_type: None,
            data: Blob::new(),
        }
    }

    /// Stores `data` under `mime_type`. Either both are replaced or neither is.
    pub fn set(&mut self, mime_type: &str, data: &[u8]) -> Result<()> {
        let mut new_type = None;
        set_string(&mut new_type, Some(mime_type))?;

        let mut new_data = Blob::new();
        new_data.set(data)?;

        self.mime_type = new_type;
        self.data = new_data;
        Ok(())
    }

    /// The stored type and data, if anything has been set.
    pub fn get(&self) -> Option<(&str, &[u8])> {
        self.mime_type
            .as_deref()
            .map(|mime_type| (mime_type, self.data.as_bytes()))
    }

    pub fn clear(&mut self) {
        self.mime_type = None;
        self.data.clear();
    }
}

//! Range splitting for program and erase
//!
//! Both planners are plain iterators so they can be tested without a bus.

/// One page-bounded slice of a program request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageChunk {
    /// Flash address of the first byte
    pub addr: u32,
    /// Offset of the first byte in the caller's buffer
    pub offset: usize,
    /// Number of bytes, never zero
    pub len: usize,
}

/// Splits `[addr, addr + len)` so that no chunk crosses a page boundary
///
/// The first chunk runs up to the end of its page; every later chunk starts
/// page-aligned. An empty range yields nothing.
#[derive(Debug, Clone)]
pub struct PageChunks {
    addr: u32,
    offset: usize,
    remaining: usize,
    page_size: u32,
}

impl PageChunks {
    /// Plan `len` bytes starting at `addr`
    ///
    /// `page_size` must be a power of two.
    pub fn new(addr: u32, len: usize, page_size: u32) -> Self {
        Self {
            addr,
            offset: 0,
            remaining: len,
            page_size,
        }
    }
}

impl Iterator for PageChunks {
    type Item = PageChunk;

    fn next(&mut self) -> Option<PageChunk> {
        if self.remaining == 0 {
            return None;
        }
        let to_page_end = (self.page_size - (self.addr % self.page_size)) as usize;
        let len = to_page_end.min(self.remaining);
        let chunk = PageChunk {
            addr: self.addr,
            offset: self.offset,
            len,
        };
        self.addr = self.addr.wrapping_add(len as u32);
        self.offset += len;
        self.remaining -= len;
        Some(chunk)
    }
}

/// Start addresses of the erase units covering `[start, end]`
///
/// `start` is rounded down to the unit size and `end` is inclusive, so a unit
/// that merely contains `end` is erased. Advancing past `u32::MAX` ends the
/// iteration instead of wrapping.
#[derive(Debug, Clone)]
pub struct EraseUnits {
    next: Option<u32>,
    end: u32,
    unit_size: u32,
}

impl EraseUnits {
    /// Plan the units for an inclusive range
    ///
    /// `unit_size` must be a power of two. `end < start` yields nothing.
    pub fn new(start: u32, end: u32, unit_size: u32) -> Self {
        let first = start - start % unit_size;
        Self {
            next: if end < start { None } else { Some(first) },
            end,
            unit_size,
        }
    }
}

impl Iterator for EraseUnits {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        let current = self.next?;
        if current > self.end {
            self.next = None;
            return None;
        }
        self.next = current.checked_add(self.unit_size);
        Some(current)
    }
}

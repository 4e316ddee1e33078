//! Output buffering for assembled areas.

use crate::area::Area;

/// Byte occupancy at which [`CallbackBuffer::possibly_flush`] hands the
/// buffer to the callback.
pub const DEFAULT_FLUSH_THRESHOLD: usize = 512 * 1024;

/// Append-only collection of assembled areas with byte accounting.
#[derive(Debug, Default)]
pub struct Buffer {
    areas: Vec<Area>,
    bytes: usize,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an area.
    pub fn push(&mut self, area: Area) {
        self.bytes += area.stored_size();
        self.areas.push(area);
    }

    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// Approximate occupancy in bytes.
    pub fn byte_size(&self) -> usize {
        self.bytes
    }

    /// Move the contents out, leaving an empty buffer behind.
    pub fn take(&mut self) -> Buffer {
        std::mem::take(self)
    }

    pub fn into_areas(self) -> Vec<Area> {
        self.areas
    }
}

/// A [`Buffer`] paired with a flush callback.
///
/// The callback receives the buffer contents by move; afterwards the
/// `CallbackBuffer` owns a fresh, empty backing store. Without a
/// registered callback the buffer simply keeps growing and can be
/// drained with [`CallbackBuffer::take`].
pub struct CallbackBuffer {
    buffer: Buffer,
    callback: Option<Box<dyn FnMut(Buffer)>>,
    flush_threshold: usize,
}

impl Default for CallbackBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CallbackBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackBuffer")
            .field("buffer", &self.buffer)
            .field("callback", &self.callback.as_ref().map(|_| "FnMut(Buffer)"))
            .field("flush_threshold", &self.flush_threshold)
            .finish()
    }
}

impl CallbackBuffer {
    pub fn new() -> Self {
        Self {
            buffer: Buffer::new(),
            callback: None,
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
        }
    }

    pub fn with_flush_threshold(flush_threshold: usize) -> Self {
        Self {
            flush_threshold,
            ..Self::new()
        }
    }

    /// Register the callback invoked on flush.
    pub fn set_callback(&mut self, callback: impl FnMut(Buffer) + 'static) {
        self.callback = Some(Box::new(callback));
    }

    /// Mutable access to the underlying buffer for appending.
    pub fn buffer(&mut self) -> &mut Buffer {
        &mut self.buffer
    }

    /// Flush when occupancy has reached the threshold.
    pub fn possibly_flush(&mut self) {
        if self.buffer.byte_size() >= self.flush_threshold {
            self.flush();
        }
    }

    /// Unconditionally hand the contents to the callback; a no-op when
    /// the buffer is empty or no callback is registered.
    pub fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        if let Some(callback) = &mut self.callback {
            callback(self.buffer.take());
        }
    }

    /// Drain the buffered contents without involving the callback.
    pub fn take(&mut self) -> Buffer {
        self.buffer.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::AreaBuilder;
    use crate::entity::Relation;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn area(relation_id: i64) -> Area {
        AreaBuilder::from_relation(&Relation::new(relation_id, vec![])).finish()
    }

    #[test]
    fn possibly_flush_respects_threshold() {
        let flushed = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&flushed);
        let mut output = CallbackBuffer::with_flush_threshold(usize::MAX);
        output.set_callback(move |buffer| sink.borrow_mut().push(buffer.len()));

        output.buffer().push(area(1));
        output.possibly_flush();
        assert!(flushed.borrow().is_empty());

        output.flush();
        assert_eq!(*flushed.borrow(), vec![1]);
        assert!(output.buffer().is_empty());
    }

    #[test]
    fn flush_hands_contents_over_once() {
        let flushed = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&flushed);
        let mut output = CallbackBuffer::new();
        output.set_callback(move |buffer| sink.borrow_mut().push(buffer.len()));

        output.buffer().push(area(1));
        output.buffer().push(area(2));
        output.flush();
        output.flush();
        assert_eq!(*flushed.borrow(), vec![2]);
    }

    #[test]
    fn tiny_threshold_flushes_on_first_area() {
        let flushed = Rc::new(RefCell::new(0_usize));
        let sink = Rc::clone(&flushed);
        let mut output = CallbackBuffer::with_flush_threshold(1);
        output.set_callback(move |buffer| *sink.borrow_mut() += buffer.len());

        output.buffer().push(area(1));
        output.possibly_flush();
        assert_eq!(*flushed.borrow(), 1);
    }
}

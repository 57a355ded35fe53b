use std::mem;

/// Fixed-size accumulator. Hands back a full batch as soon as `size` rows are
/// buffered; `finish` drains whatever is left.
#[derive(Debug)]
pub struct Batcher<T> {
    size: usize,
    buf: Vec<T>,
}

impl<T> Batcher<T> {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            size,
            buf: Vec::with_capacity(size),
        }
    }

    pub fn push(&mut self, item: T) -> Option<Vec<T>> {
        self.buf.push(item);
        if self.buf.len() >= self.size {
            return Some(mem::replace(&mut self.buf, Vec::with_capacity(self.size)));
        }
        None
    }

    pub fn finish(&mut self) -> Option<Vec<T>> {
        if self.buf.is_empty() {
            return None;
        }
        Some(mem::take(&mut self.buf))
    }
}

//! # Recycling Queue
//!
//! Fixed-capacity circular buffer of `Copy` tokens.
//!
//! Used as the free-id pool for entities, component types and processes:
//! every id is preloaded at initialization, popped on allocation and pushed
//! back on release. Capacity never changes, so the queue doubles as a bound
//! on how many ids can be live at once.

use crate::error::QueueError;

/// FIFO ring buffer with a fixed capacity.
///
/// # Example
///
/// ```rust
/// use fzy_core::RecyclingQueue;
///
/// let mut ids = RecyclingQueue::preloaded(0u16..4);
/// assert_eq!(ids.pop(), Ok(0));
/// ids.push(0)?;
/// assert_eq!(ids.peek_front(), Some(&1));
/// # Ok::<(), fzy_core::QueueError>(())
/// ```
#[derive(Clone, Debug)]
pub struct RecyclingQueue<T: Copy> {
    /// Ring storage, `capacity` slots.
    data: Box<[T]>,
    /// Slot of the front item.
    front: usize,
    /// Number of queued items.
    count: usize,
}

impl<T: Copy + Default> RecyclingQueue<T> {
    /// Creates an empty queue holding at most `capacity` items.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![T::default(); capacity].into_boxed_slice(),
            front: 0,
            count: 0,
        }
    }
}

impl<T: Copy> RecyclingQueue<T> {
    /// Creates a full queue from `items`, front first.
    ///
    /// The capacity is exactly the number of items.
    #[must_use]
    pub fn preloaded<I: IntoIterator<Item = T>>(items: I) -> Self {
        let data: Box<[T]> = items.into_iter().collect();
        let count = data.len();
        Self { data, front: 0, count }
    }

    /// Returns the fixed capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Returns the number of queued items.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// Checks if the queue is empty.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Checks if the queue is at capacity.
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.count == self.data.len()
    }

    /// Appends `item` at the rear.
    ///
    /// # Errors
    ///
    /// [`QueueError::Overflow`] if the queue is full; the queue is unchanged.
    pub fn push(&mut self, item: T) -> Result<(), QueueError> {
        if self.is_full() {
            return Err(QueueError::Overflow { capacity: self.capacity() });
        }

        let rear = (self.front + self.count) % self.data.len();
        self.data[rear] = item;
        self.count += 1;
        Ok(())
    }

    /// Removes and returns the front item.
    ///
    /// # Errors
    ///
    /// [`QueueError::Underflow`] if the queue is empty.
    pub fn pop(&mut self) -> Result<T, QueueError> {
        if self.is_empty() {
            return Err(QueueError::Underflow);
        }

        let item = self.data[self.front];
        self.front = (self.front + 1) % self.data.len();
        self.count -= 1;
        Ok(item)
    }

    /// Returns the front item without removing it.
    #[inline]
    #[must_use]
    pub fn peek_front(&self) -> Option<&T> {
        if self.is_empty() {
            None
        } else {
            Some(&self.data[self.front])
        }
    }

    /// Drops all queued items. Capacity is kept.
    pub fn clear(&mut self) {
        self.front = 0;
        self.count = 0;
    }

    /// Iterates front to rear.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.count).map(move |i| &self.data[(self.front + i) % self.data.len()])
    }
}

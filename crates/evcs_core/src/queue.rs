use std::collections::VecDeque;

/// FIFO of waiting events for one kind of service.
///
/// The queue does no locking of its own; the lane that owns it serializes
/// every mutation.
#[derive(Debug, Clone)]
pub struct WaitQueue<T> {
    items: VecDeque<T>,
}

impl<T> Default for WaitQueue<T> {
    fn default() -> Self {
        WaitQueue {
            items: VecDeque::new(),
        }
    }
}

impl<T> WaitQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, item: T) {
        self.items.push_back(item);
    }

    /// Put an item back at the head, ahead of everything queued.
    pub fn requeue_front(&mut self, item: T) {
        self.items.push_front(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item at position `i`, counted from the head.
    pub fn peek(&self, i: usize) -> Option<&T> {
        self.items.get(i)
    }

    pub fn remove_head(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    /// Remove and return the first item, in arrival order, matching `predicate`.
    pub fn remove_first(&mut self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        let idx = self.items.iter().position(predicate)?;
        self.items.remove(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<T: PartialEq> WaitQueue<T> {
    pub fn position(&self, item: &T) -> Option<usize> {
        self.items.iter().position(|queued| queued == item)
    }

    pub fn contains(&self, item: &T) -> bool {
        self.position(item).is_some()
    }

    /// Remove a specific item, returning whether it was queued.
    pub fn remove(&mut self, item: &T) -> bool {
        self.remove_first(|queued| queued == item).is_some()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn queue_of(items: &[u32]) -> WaitQueue<u32> {
        let mut queue = WaitQueue::new();
        for item in items {
            queue.enqueue(*item);
        }
        queue
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = queue_of(&[3, 1, 2]);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.remove_head(), Some(3));
        assert_eq!(queue.remove_head(), Some(1));
        assert_eq!(queue.remove_head(), Some(2));
        assert_eq!(queue.remove_head(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_peek_by_position() {
        let queue = queue_of(&[10, 20, 30]);
        assert_eq!(queue.peek(0), Some(&10));
        assert_eq!(queue.peek(2), Some(&30));
        assert_eq!(queue.peek(3), None);
        // Peeking never consumes
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn test_remove_specific() {
        let mut queue = queue_of(&[1, 2, 3, 2]);
        assert!(queue.remove(&2));
        // Only the first occurrence goes away
        assert_eq!(queue.iter().copied().collect::<Vec<_>>(), vec![1, 3, 2]);
        assert!(!queue.remove(&7));
        assert_eq!(queue.position(&2), Some(2));
        assert!(queue.contains(&3));
    }

    #[test]
    fn test_remove_first_matching() {
        let mut queue = queue_of(&[1, 4, 5, 6]);
        assert_eq!(queue.remove_first(|item| item % 2 == 0), Some(4));
        assert_eq!(queue.remove_first(|item| *item > 100), None);
        assert_eq!(queue.iter().copied().collect::<Vec<_>>(), vec![1, 5, 6]);
    }
}

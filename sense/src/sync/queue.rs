use core::cell::RefCell;

use critical_section::Mutex;

use super::SyncError;

/// Ring storage. `head == tail` is ambiguous on its own; `is_empty` tells
/// the two cases apart so all `N` slots are usable.
struct Ring<const N: usize> {
    buf: [u32; N],
    head: usize,
    tail: usize,
    is_empty: bool,
}

impl<const N: usize> Ring<N> {
    fn len(&self) -> usize {
        if self.is_empty {
            0
        } else if self.tail > self.head {
            self.tail - self.head
        } else {
            N - self.head + self.tail
        }
    }
}

/// Fixed capacity FIFO of 32-bit message codes.
///
/// Safe to share between interrupt handlers and the main loop. Neither side
/// ever waits: a full queue rejects the new element and an empty queue
/// reports that there is nothing to read.
pub struct MsgQueue<const N: usize> {
    ring: Mutex<RefCell<Ring<N>>>,
}

impl<const N: usize> MsgQueue<N> {
    pub const fn new() -> Self {
        assert!(N > 0);
        Self {
            ring: Mutex::new(RefCell::new(Ring {
                buf: [0; N],
                head: 0,
                tail: 0,
                is_empty: true,
            })),
        }
    }

    pub fn enqueue(&self, msg: u32) -> Result<(), SyncError> {
        critical_section::with(|cs| {
            let mut ring = self.ring.borrow_ref_mut(cs);
            if ring.tail == ring.head && !ring.is_empty {
                return Err(SyncError::Full);
            }

            let tail = ring.tail;
            ring.buf[tail] = msg;
            ring.tail = (tail + 1) % N;
            ring.is_empty = false;
            Ok(())
        })
    }

    pub fn dequeue(&self) -> Result<u32, SyncError> {
        critical_section::with(|cs| {
            let mut ring = self.ring.borrow_ref_mut(cs);
            if ring.is_empty {
                return Err(SyncError::Empty);
            }

            let head = ring.head;
            let msg = ring.buf[head];
            ring.head = (head + 1) % N;
            if ring.head == ring.tail {
                ring.is_empty = true;
            }
            Ok(msg)
        })
    }

    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.ring.borrow_ref(cs).len())
    }

    pub fn is_empty(&self) -> bool {
        critical_section::with(|cs| self.ring.borrow_ref(cs).is_empty)
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for MsgQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    fn fifo_order() {
        let q: MsgQueue<4> = MsgQueue::new();
        for msg in [7, 1, 9] {
            q.enqueue(msg).unwrap();
        }
        assert_eq!(q.len(), 3);
        assert_eq!(q.dequeue(), Ok(7));
        assert_eq!(q.dequeue(), Ok(1));
        assert_eq!(q.dequeue(), Ok(9));
        assert!(q.is_empty());
    }

    #[test]
    fn full_rejects_and_keeps_contents() {
        let q: MsgQueue<3> = MsgQueue::new();
        for msg in 10..13 {
            q.enqueue(msg).unwrap();
        }
        assert_eq!(q.len(), 3);
        assert_eq!(q.enqueue(99), Err(SyncError::Full));
        assert_eq!(q.len(), 3);

        assert_eq!(q.dequeue(), Ok(10));
        assert_eq!(q.dequeue(), Ok(11));
        assert_eq!(q.dequeue(), Ok(12));
    }

    #[test]
    fn empty_dequeue_fails() {
        let q: MsgQueue<2> = MsgQueue::new();
        assert_eq!(q.dequeue(), Err(SyncError::Empty));
        q.enqueue(1).unwrap();
        q.dequeue().unwrap();
        assert_eq!(q.dequeue(), Err(SyncError::Empty));
    }

    #[test]
    fn wraps_around() {
        let q: MsgQueue<3> = MsgQueue::new();
        let mut next_in = 0;
        let mut next_out = 0;
        for _ in 0..10 {
            q.enqueue(next_in).unwrap();
            q.enqueue(next_in + 1).unwrap();
            next_in += 2;
            assert_eq!(q.dequeue(), Ok(next_out));
            assert_eq!(q.dequeue(), Ok(next_out + 1));
            next_out += 2;
            assert!(q.is_empty());
        }
    }

    #[test]
    fn single_slot() {
        let q: MsgQueue<1> = MsgQueue::new();
        q.enqueue(5).unwrap();
        assert_eq!(q.enqueue(6), Err(SyncError::Full));
        assert_eq!(q.dequeue(), Ok(5));
        assert_eq!(q.len(), 0);
    }
}

//! Bounded single-producer/single-consumer event queue.
//!
//! The scanner pushes from the main loop while the bus responder pops
//! from a context that may preempt it at any point. Neither side ever
//! blocks: when the queue is full the producer evicts the oldest unread
//! entry to make room.
//!
//! # Layout
//!
//! `head` and `tail` are free-running counters; the slot for a counter
//! value `i` is `i % N`. The producer owns `head`. The consumer owns
//! `tail`, except that the producer may advance it by one with a
//! compare-and-swap to evict. A pop also claims its entry with a
//! compare-and-swap, so an entry is consumed exactly once, either by
//! eviction or by the consumer. Each slot is a single atomic byte, so an
//! entry can never be read half-written.

use keybus_proto::{decode, encode, CommandEvent, SENTINEL};
use portable_atomic::{AtomicU32, AtomicU8, AtomicUsize, Ordering};

/// Lock-free ring of encoded events with drop-oldest overflow.
///
/// `N` must be a power of two so the free-running counters stay
/// consistent across wraparound.
pub struct EventQueue<const N: usize> {
    slots: [AtomicU8; N],
    head: AtomicUsize,
    tail: AtomicUsize,
    dropped: AtomicU32,
}

impl<const N: usize> EventQueue<N> {
    const EMPTY_SLOT: AtomicU8 = AtomicU8::new(SENTINEL);

    /// Create an empty queue.
    ///
    /// # Panics
    ///
    /// Panics if `N` is zero or not a power of two.
    #[must_use]
    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "queue capacity must be a power of two");
        Self {
            slots: [Self::EMPTY_SLOT; N],
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Split into the producer and consumer halves.
    ///
    /// Taking `&mut self` guarantees only one of each exists at a time.
    pub fn split(&mut self) -> (Producer<'_, N>, Consumer<'_, N>) {
        let queue: &Self = self;
        (Producer { queue }, Consumer { queue })
    }

    /// Number of unread entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        head.wrapping_sub(tail).min(N)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Entries evicted by overflow since creation.
    #[must_use]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn push_byte(&self, byte: u8) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        let mut evicted = false;

        loop {
            let tail = self.tail.load(Ordering::Acquire);
            if head.wrapping_sub(tail) < N {
                break;
            }
            // Full. If the consumer moved `tail` first, the CAS fails and
            // the next iteration sees the freed slot.
            if self
                .tail
                .compare_exchange(
                    tail,
                    tail.wrapping_add(1),
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
            {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                evicted = true;
                break;
            }
        }

        self.slots[head % N].store(byte, Ordering::Relaxed);
        self.head.store(head.wrapping_add(1), Ordering::Release);
        evicted
    }

    fn pop_byte(&self) -> Option<u8> {
        loop {
            let tail = self.tail.load(Ordering::Acquire);
            let head = self.head.load(Ordering::Acquire);
            if tail == head {
                return None;
            }

            let byte = self.slots[tail % N].load(Ordering::Relaxed);
            // Losing this CAS means the producer evicted the entry we read.
            if self
                .tail
                .compare_exchange(
                    tail,
                    tail.wrapping_add(1),
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
            {
                return Some(byte);
            }
        }
    }
}

impl<const N: usize> Default for EventQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Writing half of an [`EventQueue`].
pub struct Producer<'a, const N: usize> {
    queue: &'a EventQueue<N>,
}

impl<const N: usize> Producer<'_, N> {
    /// Enqueue an event. Never blocks and never fails.
    ///
    /// Returns `true` if the oldest unread entry was evicted to make room.
    pub fn push(&mut self, event: CommandEvent) -> bool {
        let evicted = self.queue.push_byte(encode(event));
        if evicted {
            warn!("event queue full, dropped oldest entry");
        }
        evicted
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[must_use]
    pub fn dropped(&self) -> u32 {
        self.queue.dropped()
    }
}

/// Reading half of an [`EventQueue`].
pub struct Consumer<'a, const N: usize> {
    queue: &'a EventQueue<N>,
}

impl<const N: usize> Consumer<'_, N> {
    /// Dequeue the oldest event, if any.
    pub fn pop(&mut self) -> Option<CommandEvent> {
        self.queue.pop_byte().and_then(|byte| decode(byte).ok())
    }

    /// Dequeue the oldest event as its wire byte, or [`SENTINEL`] when empty.
    pub fn pop_or_sentinel(&mut self) -> u8 {
        self.queue.pop_byte().unwrap_or(SENTINEL)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::vec::Vec;

    fn press(id: u8) -> CommandEvent {
        CommandEvent::press(id).unwrap()
    }

    #[test]
    fn test_empty_pops_sentinel() {
        let mut queue = EventQueue::<16>::new();
        let (_, mut consumer) = queue.split();
        assert_eq!(consumer.pop_or_sentinel(), SENTINEL);
        assert_eq!(consumer.pop(), None);
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = EventQueue::<16>::new();
        let (mut producer, mut consumer) = queue.split();

        producer.push(press(1));
        producer.push(CommandEvent::release(1).unwrap());
        producer.push(press(9));

        assert_eq!(consumer.pop(), Some(press(1)));
        assert_eq!(consumer.pop_or_sentinel(), 0x81);
        assert_eq!(consumer.pop(), Some(press(9)));
        assert_eq!(consumer.pop_or_sentinel(), SENTINEL);
    }

    #[test]
    fn test_overflow_keeps_newest() {
        let mut queue = EventQueue::<16>::new();
        let (mut producer, mut consumer) = queue.split();

        let evictions = (1..=20u8).filter(|&id| producer.push(press(id))).count();
        assert_eq!(evictions, 4);
        assert_eq!(producer.len(), 16);
        assert_eq!(producer.dropped(), 4);

        for id in 5..=20u8 {
            assert_eq!(consumer.pop_or_sentinel(), encode(press(id)));
        }
        assert_eq!(consumer.pop_or_sentinel(), SENTINEL);
    }

    #[test]
    fn test_interleaved_push_pop_wraps() {
        let mut queue = EventQueue::<4>::new();
        let (mut producer, mut consumer) = queue.split();

        for round in 0..50u8 {
            let id = round % 64;
            producer.push(press(id));
            producer.push(CommandEvent::release(id).unwrap());
            assert_eq!(consumer.pop(), Some(press(id)));
            assert_eq!(consumer.pop(), Some(CommandEvent::release(id).unwrap()));
            assert!(consumer.is_empty());
        }
    }

    #[test]
    fn test_len_tracks_contents() {
        let mut queue = EventQueue::<8>::new();
        {
            let (mut producer, mut consumer) = queue.split();
            producer.push(press(0));
            producer.push(press(1));
            assert_eq!(consumer.len(), 2);
            consumer.pop();
            assert_eq!(producer.len(), 1);
        }
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.capacity(), 8);
        assert_eq!(queue.dropped(), 0);
    }

    #[test]
    fn test_concurrent_producer_consumer_preserve_order() {
        // Ids 0..=63 as presses then releases give 128 distinct, ordered bytes.
        let events: Vec<CommandEvent> = (0..=63u8)
            .map(press)
            .chain((0..=63u8).map(|id| CommandEvent::release(id).unwrap()))
            .collect();
        let last = *events.last().unwrap();

        let mut queue = EventQueue::<16>::new();
        let (mut producer, mut consumer) = queue.split();

        let received = std::thread::scope(|scope| {
            let reader = scope.spawn(move || {
                let mut seen = Vec::new();
                loop {
                    if let Some(event) = consumer.pop() {
                        seen.push(event);
                        if event == last {
                            return seen;
                        }
                    } else {
                        std::thread::yield_now();
                    }
                }
            });

            for event in &events {
                producer.push(*event);
                if event.id() % 8 == 0 {
                    std::thread::yield_now();
                }
            }

            reader.join().unwrap()
        });

        // Whatever survived eviction arrives once each and in push order.
        let positions: Vec<usize> = received
            .iter()
            .map(|event| events.iter().position(|e| e == event).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(*received.last().unwrap(), last);
    }
}

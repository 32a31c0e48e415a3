//! Deadline-sorted task dispatcher over a raw hardware timer.
//!
//! [`SchedulingTimer`] keeps a singly-linked list of pending tasks ordered
//! by a 16-bit wrapping timestamp and re-arms the underlying hardware
//! timer for whichever deadline comes first. The list is threaded through
//! a fixed arena of node slots, so scheduling is allocation free and safe
//! to share between foreground code and the timer interrupt.

/// Capability interface for the raw hardware timer behind a
/// [`SchedulingTimer`].
///
/// `disable_interrupts`/`enable_interrupts` must nest safely: foreground
/// mutations of the pending list are wrapped in them so the interrupt
/// handler never observes a half-updated structure.
pub trait TimerBase {
    /// Frequency of timer ticks in Hz.
    fn frequency(&self) -> u32;

    /// Current hardware timestamp. Wraps at 16 bits.
    fn current_timestamp(&self) -> u16;

    /// Arm the timer to fire its interrupt at `timestamp`.
    fn start_timer(&mut self, timestamp: u16);

    /// Stop the timer.
    fn stop_timer(&mut self);

    /// Disable all interrupts.
    fn disable_interrupts(&mut self);

    /// Enable all interrupts.
    fn enable_interrupts(&mut self);
}

/// True if wrapping timestamp `a` lies after `b`.
///
/// Signed reinterpretation of the 16-bit difference keeps the comparison
/// correct across counter wraparound as long as deadlines stay within
/// half the counter range.
#[inline]
fn is_after(a: u16, b: u16) -> bool {
    (a.wrapping_sub(b) as i16) > 0
}

#[derive(Debug, Clone, Copy)]
struct Node<T> {
    task: T,
    timestamp: u16,
    next: Option<usize>,
}

/// Calls queued tasks at their requested timestamps.
///
/// `T` is a small task token handed back through the dispatch closure of
/// [`on_timer`](Self::on_timer); the owner maps it onto whatever work the
/// deadline stands for. Up to `N` tasks can be pending at once.
#[derive(Debug)]
pub struct SchedulingTimer<B: TimerBase, T: Copy + PartialEq, const N: usize> {
    base: B,
    slots: [Option<Node<T>>; N],
    head: Option<usize>,
}

impl<B: TimerBase, T: Copy + PartialEq, const N: usize> SchedulingTimer<B, T, N> {
    /// Create a scheduler over the given hardware timer.
    pub fn new(base: B) -> Self {
        Self {
            base,
            slots: [None; N],
            head: None,
        }
    }

    /// Frequency of the underlying timer in Hz.
    pub fn frequency(&self) -> u32 {
        self.base.frequency()
    }

    /// Access the underlying hardware timer.
    pub fn base_mut(&mut self) -> &mut B {
        &mut self.base
    }

    /// Schedule `task` to fire at `timestamp`.
    ///
    /// Insertion-sorts the task by deadline under a critical section and
    /// reprograms the hardware timer if the task became the new head.
    /// Returns false if all `N` slots are occupied; the task is not
    /// queued in that case.
    pub fn schedule(&mut self, task: T, timestamp: u16) -> bool {
        self.base.disable_interrupts();

        let Some(slot) = self.slots.iter().position(Option::is_none) else {
            self.base.enable_interrupts();
            return false;
        };

        let mut prev: Option<usize> = None;
        let mut current = self.head;
        while let Some(index) = current {
            let Some(node) = &self.slots[index] else {
                break;
            };
            if !is_after(timestamp, node.timestamp) {
                break;
            }
            prev = Some(index);
            current = node.next;
        }

        self.slots[slot] = Some(Node {
            task,
            timestamp,
            next: current,
        });

        match prev {
            None => {
                self.head = Some(slot);
                self.base.start_timer(timestamp);
            }
            Some(prev_index) => {
                if let Some(prev_node) = self.slots[prev_index].as_mut() {
                    prev_node.next = Some(slot);
                }
            }
        }

        self.base.enable_interrupts();
        true
    }

    /// Remove a pending task.
    ///
    /// Unlinks the first queued entry equal to `task`, re-arming the
    /// hardware timer for the new head if the removed entry was at the
    /// front (or stopping it if the list drained). Removing a task that
    /// is not queued is a no-op.
    pub fn remove(&mut self, task: T) {
        self.base.disable_interrupts();

        let mut prev: Option<usize> = None;
        let mut current = self.head;
        while let Some(index) = current {
            let Some(node) = self.slots[index] else {
                break;
            };
            if node.task == task {
                match prev {
                    None => {
                        self.head = node.next;
                        match node.next.and_then(|head_index| self.slots[head_index]) {
                            Some(head_node) => self.base.start_timer(head_node.timestamp),
                            None => self.base.stop_timer(),
                        }
                    }
                    Some(prev_index) => {
                        if let Some(prev_node) = self.slots[prev_index].as_mut() {
                            prev_node.next = node.next;
                        }
                    }
                }
                self.slots[index] = None;
                break;
            }
            prev = Some(index);
            current = node.next;
        }

        self.base.enable_interrupts();
    }

    /// Hardware interrupt entry point.
    ///
    /// Pops and fires every task whose timestamp has already elapsed, in
    /// deadline order, then stops the timer if the list drained or
    /// re-arms it for the new head.
    pub fn on_timer(&mut self, mut fire: impl FnMut(T)) {
        loop {
            let Some(head_index) = self.head else {
                self.base.stop_timer();
                return;
            };

            let Some(node) = self.slots[head_index] else {
                self.head = None;
                continue;
            };
            if !is_after(node.timestamp, self.base.current_timestamp()) {
                self.head = node.next;
                self.slots[head_index] = None;
                fire(node.task);
            } else {
                self.base.start_timer(node.timestamp);
                return;
            }
        }
    }
}

use crate::backoff::Backoff;
use crate::error::QueueError;
use crate::token_queue::TokenQueue;
use crate::work_queue::{PushMode, WorkQueue};
use logcore::Envelope;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread::ThreadId;

struct TokenSlot {
    queue: TokenQueue,
    /// Only consulted when more producer threads than tokens have
    /// registered (`producer_count > tokens.len()`); guards the otherwise
    /// strictly single-producer `TokenQueue::push`.
    in_use: AtomicBool,
}

/// `C6`: an unbounded queue sharded into `W` producer tokens (`W` = worker
/// count), each a dedicated [`TokenQueue`]. One dedicated sub-queue per
/// producer token eliminates producer-producer contention, and per-token
/// affinity is what lets the pool terminate cleanly — exactly one
/// `Terminate` envelope per token guarantees every worker bound to that
/// token observes it and exits.
///
/// Token assignment (`producer_thread → token_index`) uses the portable
/// `Mutex`-guarded map as a portable fallback; the thread-local
/// fast path it also permits is explicitly "an implementation choice, not
/// a contract" and is not implemented here.
///
/// Ordering: per-token FIFO. Across tokens, unspecified. Unbounded: memory
/// grows under sustained overload, reclaimed only when the queue (and its
/// tokens) drop.
pub struct LockFreeShardedQueue {
    tokens: Vec<TokenSlot>,
    assignment: Mutex<std::collections::HashMap<ThreadId, usize>>,
    next_token: AtomicUsize,
    producer_count: AtomicUsize,
}

impl LockFreeShardedQueue {
    pub fn new(worker_count: usize) -> Result<Self, QueueError> {
        if worker_count == 0 {
            return Err(QueueError::InvalidCapacity(worker_count));
        }
        let tokens = (0..worker_count)
            .map(|_| TokenSlot {
                queue: TokenQueue::new(),
                in_use: AtomicBool::new(false),
            })
            .collect();

        Ok(Self {
            tokens,
            assignment: Mutex::new(std::collections::HashMap::new()),
            next_token: AtomicUsize::new(0),
            producer_count: AtomicUsize::new(0),
        })
    }

    fn token_for_current_thread(&self) -> usize {
        let id = std::thread::current().id();
        {
            let map = self.assignment.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(&token) = map.get(&id) {
                return token;
            }
        }
        let mut map = self.assignment.lock().unwrap_or_else(|e| e.into_inner());
        // Re-check: another thread may have raced us between the unlock
        // above and this lock (impossible for *this* thread's own id, but
        // keeps the function correct if ever called reentrantly).
        if let Some(&token) = map.get(&id) {
            return token;
        }
        let token = self.next_token.fetch_add(1, Ordering::Relaxed) % self.tokens.len();
        map.insert(id, token);
        self.producer_count.fetch_add(1, Ordering::Relaxed);
        token
    }

    fn shared_across_producers(&self) -> bool {
        self.producer_count.load(Ordering::Relaxed) > self.tokens.len()
    }

    fn push_to_token(&self, token: usize, item: Envelope) {
        let slot = &self.tokens[token];
        if self.shared_across_producers() {
            let mut backoff = Backoff::new();
            while slot
                .in_use
                .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
                .is_err()
            {
                backoff.snooze();
            }
            slot.queue.push(item);
            slot.in_use.store(false, Ordering::Release);
        } else {
            slot.queue.push(item);
        }
    }
}

impl WorkQueue for LockFreeShardedQueue {
    fn shard_count(&self) -> usize {
        self.tokens.len()
    }

    fn push(&self, envelope: Envelope, _mode: PushMode) -> Result<(), QueueError> {
        // Unbounded: every push mode succeeds unconditionally.
        let token = self.token_for_current_thread();
        self.push_to_token(token, envelope);
        Ok(())
    }

    fn push_to_shard(&self, shard: usize, envelope: Envelope) {
        self.push_to_token(shard, envelope);
    }

    fn pop(&self, shard: usize) -> Envelope {
        let mut backoff = Backoff::new();
        loop {
            if let Some(envelope) = self.tokens[shard].queue.pop() {
                return envelope;
            }
            backoff.snooze();
        }
    }
}

// Bounded single-producer/single-consumer token queue. The scanner blocks
// when the queue is full, the parser blocks when it is empty. Closing the
// stream unblocks both sides; it is how a dropped parser cancels a scanner
// that is still producing.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

use crate::Token;

/// Default capacity of a [`TokenStream`].
pub const DEFAULT_STREAM_CAPACITY: usize = 5;

/// A bounded FIFO of tokens with blocking push and pop.
///
/// Order preserves the order in which the scanner emits tokens. The stream
/// terminates after a single `Eof` token has been pushed; nothing may be
/// pushed after `Eof`.
pub struct TokenStream {
    state: Mutex<StreamState>,
    capacity: usize,
    /// Signalled when a token is pushed or the stream is closed.
    readable: Condvar,
    /// Signalled when a token is popped or the stream is closed.
    writable: Condvar,
}

struct StreamState {
    queue: VecDeque<Token>,
    closed: bool,
}

impl TokenStream {
    /// Create a stream with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_STREAM_CAPACITY)
    }

    /// Create a stream with the given capacity (must be non-zero).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "token stream capacity must be non-zero");
        Self {
            state: Mutex::new(StreamState {
                queue: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            capacity,
            readable: Condvar::new(),
            writable: Condvar::new(),
        }
    }

    /// Push a token, blocking while the stream is full.
    ///
    /// Returns `false` if the stream has been closed; the token is discarded
    /// in that case.
    pub fn push(&self, token: Token) -> bool {
        let mut state = self.state.lock();
        while state.queue.len() >= self.capacity && !state.closed {
            self.writable.wait(&mut state);
        }
        if state.closed {
            return false;
        }
        state.queue.push_back(token);
        self.readable.notify_one();
        true
    }

    /// Pop the next token, blocking while the stream is empty.
    ///
    /// Returns `None` once the stream is closed and drained.
    pub fn pop(&self) -> Option<Token> {
        let mut state = self.state.lock();
        while state.queue.is_empty() && !state.closed {
            self.readable.wait(&mut state);
        }
        let token = state.queue.pop_front();
        if token.is_some() {
            self.writable.notify_one();
        }
        token
    }

    /// Close the stream, waking any blocked producer or consumer.
    ///
    /// Already-queued tokens remain poppable; further pushes are discarded.
    /// Closing twice is a no-op.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        self.readable.notify_all();
        self.writable.notify_all();
    }

    /// Number of tokens currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Whether the queue is currently empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().queue.is_empty()
    }
}

impl Default for TokenStream {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::TokenKind;

    fn tok(value: &str) -> Token {
        Token::new(TokenKind::Literal, 1, 1, 0, value.chars().count(), value)
    }

    #[test]
    fn push_pop_preserves_order() {
        let stream = TokenStream::new();
        stream.push(tok("a"));
        stream.push(tok("b"));
        stream.push(tok("c"));
        assert_eq!(stream.pop().unwrap().value, "a");
        assert_eq!(stream.pop().unwrap().value, "b");
        assert_eq!(stream.pop().unwrap().value, "c");
    }

    #[test]
    fn push_blocks_at_capacity_until_pop() {
        let stream = Arc::new(TokenStream::with_capacity(2));
        stream.push(tok("a"));
        stream.push(tok("b"));

        let producer = Arc::clone(&stream);
        let handle = thread::spawn(move || producer.push(tok("c")));

        // Give the producer a moment to block on the full queue.
        thread::sleep(Duration::from_millis(50));
        assert_eq!(stream.len(), 2);

        assert_eq!(stream.pop().unwrap().value, "a");
        assert!(handle.join().unwrap());
        assert_eq!(stream.pop().unwrap().value, "b");
        assert_eq!(stream.pop().unwrap().value, "c");
    }

    #[test]
    fn pop_blocks_until_push() {
        let stream = Arc::new(TokenStream::new());
        let consumer = Arc::clone(&stream);
        let handle = thread::spawn(move || consumer.pop());

        thread::sleep(Duration::from_millis(50));
        stream.push(tok("a"));
        assert_eq!(handle.join().unwrap().unwrap().value, "a");
    }

    #[test]
    fn close_unblocks_producer_and_discards() {
        let stream = Arc::new(TokenStream::with_capacity(1));
        stream.push(tok("a"));

        let producer = Arc::clone(&stream);
        let handle = thread::spawn(move || producer.push(tok("b")));

        thread::sleep(Duration::from_millis(50));
        stream.close();
        assert!(!handle.join().unwrap());

        // Queued tokens survive a close, further pushes do not.
        assert_eq!(stream.pop().unwrap().value, "a");
        assert!(stream.pop().is_none());
    }

    #[test]
    fn close_unblocks_consumer() {
        let stream = Arc::new(TokenStream::new());
        let consumer = Arc::clone(&stream);
        let handle = thread::spawn(move || consumer.pop());

        thread::sleep(Duration::from_millis(50));
        stream.close();
        assert!(handle.join().unwrap().is_none());
    }
}

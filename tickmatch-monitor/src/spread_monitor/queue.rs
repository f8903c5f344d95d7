use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use tickmatch_data::model::quote::QuoteEvent;

/*----- */
// Quote queue
/*----- */
// Bounded FIFO buffer of quotes from a single venue, ordered by arrival.
// Capacity is enforced on push rather than stored, so a shrunk
// max_queue_size takes effect on the next append.
#[derive(Debug, Clone, Default)]
pub struct QuoteQueue {
    data: VecDeque<QuoteEvent>,
}

impl QuoteQueue {
    pub fn new() -> Self {
        Self {
            data: VecDeque::new(),
        }
    }

    // Append a quote, dropping entries from the front while the buffer is
    // at capacity. Returns how many entries were dropped to make room.
    pub fn push(&mut self, quote: QuoteEvent, max_size: usize) -> usize {
        let mut dropped = 0;

        while self.data.len() >= max_size {
            self.data.pop_front();
            dropped += 1;
        }

        self.data.push_back(quote);
        dropped
    }

    // Pop entries older than max_age off the front. Entries exactly at the
    // expiration age are evicted too. Returns how many were removed.
    pub fn evict_expired(&mut self, now: DateTime<Utc>, max_age: Duration) -> usize {
        let cut_off = now - max_age;
        let mut evicted = 0;

        while let Some(front) = self.data.front() {
            if front.received_time <= cut_off {
                self.data.pop_front();
                evicted += 1;
            } else {
                break;
            }
        }

        evicted
    }

    pub fn newest(&self) -> Option<&QuoteEvent> {
        self.data.back()
    }

    pub fn oldest(&self) -> Option<&QuoteEvent> {
        self.data.front()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/*----- */
// Test
/*----- */

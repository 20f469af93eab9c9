// Copyright 2020 Kodebox, Inc.
// This file is part of CodeChain.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Latch released once every task of a dispatch has counted down.
#[derive(Debug)]
pub struct CountDownSignal {
    remaining: Mutex<usize>,
    zero: Condvar,
}

impl CountDownSignal {
    pub fn new(count: usize) -> Self {
        CountDownSignal {
            remaining: Mutex::new(count),
            zero: Condvar::new(),
        }
    }

    pub fn count_down(&self) {
        let mut remaining = self.remaining.lock();
        debug_assert!(*remaining > 0, "counted down more times than there are tasks");
        *remaining = remaining.saturating_sub(1);
        if *remaining == 0 {
            self.zero.notify_all();
        }
    }

    pub fn remaining(&self) -> usize {
        *self.remaining.lock()
    }

    pub fn wait(&self) {
        let mut remaining = self.remaining.lock();
        while *remaining > 0 {
            self.zero.wait(&mut remaining);
        }
    }

    /// Returns false if the deadline passed before the count reached zero.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut remaining = self.remaining.lock();
        while *remaining > 0 {
            if self.zero.wait_until(&mut remaining, deadline).timed_out() {
                return *remaining == 0
            }
        }
        true
    }
}

/// Counts down exactly once, when dropped.
pub(crate) struct CompletionGuard {
    signal: Arc<CountDownSignal>,
}

impl CompletionGuard {
    pub(crate) fn new(signal: Arc<CountDownSignal>) -> Self {
        CompletionGuard {
            signal,
        }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.signal.count_down();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn released_after_last_count_down() {
        let signal = Arc::new(CountDownSignal::new(4));
        let workers: Vec<_> = (0..4)
            .map(|i| {
                let signal = Arc::clone(&signal);
                thread::spawn(move || {
                    thread::sleep(Duration::from_millis(10 * i));
                    let _guard = CompletionGuard::new(signal);
                })
            })
            .collect();
        signal.wait();
        assert_eq!(signal.remaining(), 0);
        for w in workers {
            w.join().unwrap();
        }
    }

    #[test]
    fn guard_counts_down_on_panic() {
        let signal = Arc::new(CountDownSignal::new(1));
        let signal_ = Arc::clone(&signal);
        let result = thread::spawn(move || {
            let _guard = CompletionGuard::new(signal_);
            panic!("member failure");
        })
        .join();
        assert!(result.is_err());
        assert!(signal.wait_timeout(Duration::from_secs(5)));
    }

    #[test]
    fn timeout_reports_outstanding() {
        let signal = CountDownSignal::new(2);
        signal.count_down();
        assert!(!signal.wait_timeout(Duration::from_millis(20)));
        assert_eq!(signal.remaining(), 1);
        assert!(CountDownSignal::new(0).wait_timeout(Duration::from_millis(1)));
    }
}

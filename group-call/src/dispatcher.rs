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

pub mod monitor;

use crate::dispatch::plan::{DispatchAnnotation, DispatchMode};
use crate::error::GroupCallError;
use crate::group::member::Invoke;
use crate::task::latch::CountDownSignal;
use crate::task::{Placement, Task};
use crate::GroupConfig;
use crossbeam::channel::bounded;
use monitor::DispatchMonitor;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use threadpool::ThreadPool;

// Tasks of a group call run on the pool of its proxy, and only the caller waits.
//
// Every task is submitted behind a gate that opens once the whole queue is in the pool,
// so no task starts while the dispatch is still being laid out.

/// Worker pool of one group proxy, sized from that proxy's group.
///
/// A member may itself make group calls through other proxies: their tasks never queue
/// behind the ones of the call waiting on them.
pub struct Dispatcher {
    pool: Mutex<ThreadPool>,
    config: GroupConfig,
}

impl Dispatcher {
    pub fn new(config: GroupConfig) -> Self {
        let pool = threadpool::Builder::new()
            .num_threads(config.optimal_pool_size(0))
            .thread_name(config.thread_name.clone())
            .build();
        Dispatcher {
            pool: Mutex::new(pool),
            config,
        }
    }

    pub fn config(&self) -> &GroupConfig {
        &self.config
    }

    pub fn pool_size(&self) -> usize {
        self.pool.lock().max_count()
    }

    fn check_optimal_pool_size(&self, nb_members: usize) {
        let size = self.config.optimal_pool_size(nb_members);
        let mut pool = self.pool.lock();
        if pool.max_count() != size {
            log::debug!("resizing group dispatch pool from {} to {} threads", pool.max_count(), size);
            pool.set_num_threads(size);
        }
    }

    /// Runs every task and returns once all of them have completed or failed.
    ///
    /// With `timeout`, gives up waiting after that long. Tasks still running keep
    /// running, their outcome is dropped.
    pub(crate) fn dispatch_tasks(
        &self,
        tasks: VecDeque<Task>,
        targets: Arc<[Arc<dyn Invoke>]>,
        latch: &CountDownSignal,
        balancing: DispatchAnnotation,
        timeout: Option<Duration>,
    ) -> Result<(), GroupCallError> {
        let total = tasks.len();
        let nb_members = targets.len();
        self.check_optimal_pool_size(nb_members);

        let monitor = match balancing.mode {
            DispatchMode::Dynamic => Some(Arc::new(DispatchMonitor::new(nb_members))),
            DispatchMode::Static => None,
        };
        // Members' buffers are filled statically before any task is placed dynamically.
        let statically_buffered = balancing.buffer_size.saturating_mul(nb_members);

        let (open, gate) = bounded::<()>(0);
        {
            let pool = self.pool.lock();
            for (position, task) in tasks.into_iter().enumerate() {
                let placement = if monitor.is_some() && task.is_dynamic() && position >= statically_buffered {
                    Placement::Dynamic
                } else {
                    Placement::Fixed
                };
                let gate = gate.clone();
                let targets = Arc::clone(&targets);
                let monitor = monitor.clone();
                pool.execute(move || {
                    // Returns as soon as `open` is dropped.
                    gate.recv().ok();
                    task.execute(&targets, placement, monitor.as_deref());
                });
            }
        }
        drop(open);
        log::debug!("dispatched {} tasks over {} members ({:?})", total, nb_members, balancing.mode);

        match timeout {
            Some(timeout) => {
                if !latch.wait_timeout(timeout) {
                    let pending = latch.remaining();
                    log::warn!("group call gave up after {:?} with {} of {} tasks outstanding", timeout, pending, total);
                    return Err(GroupCallError::Timeout {
                        pending,
                        total,
                    })
                }
            }
            None => latch.wait(),
        }
        Ok(())
    }
}

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

pub mod factory;
pub mod latch;
pub mod result;

use crate::call::{MethodCall, Value};
use crate::dispatcher::monitor::DispatchMonitor;
use crate::error::CallError;
use crate::group::member::Invoke;
use latch::{CompletionGuard, CountDownSignal};
use result::{ExceptionCollector, ResultGroup};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// State shared by every task of one dispatch.
#[derive(Debug)]
pub(crate) struct DispatchState {
    pub(crate) latch: Arc<CountDownSignal>,
    pub(crate) exceptions: ExceptionCollector,
}

impl DispatchState {
    pub(crate) fn new(nb_tasks: usize) -> Arc<Self> {
        Arc::new(DispatchState {
            latch: Arc::new(CountDownSignal::new(nb_tasks)),
            exceptions: ExceptionCollector::default(),
        })
    }
}

#[derive(Debug)]
pub enum TaskKind {
    OneWay,
    Async {
        results: Arc<ResultGroup>,
        result_index: usize,
    },
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub(crate) enum Placement {
    /// Run on the member the task was generated for
    Fixed,
    /// Run on whichever member is least loaded when the task starts
    Dynamic,
}

/// One generated call bound to one group member.
///
/// A task counts its dispatch down exactly once: when it finishes executing, or when it
/// is dropped without having run.
pub struct Task {
    index: usize,
    group_index: usize,
    call: MethodCall,
    kind: TaskKind,
    dynamic: bool,
    state: Arc<DispatchState>,
    completion: CompletionGuard,
}

impl Task {
    pub(crate) fn new(
        index: usize,
        group_index: usize,
        call: MethodCall,
        kind: TaskKind,
        dynamic: bool,
        state: &Arc<DispatchState>,
    ) -> Self {
        Task {
            index,
            group_index,
            call,
            kind,
            dynamic,
            state: Arc::clone(state),
            completion: CompletionGuard::new(Arc::clone(&state.latch)),
        }
    }

    /// Index of the generated call, which is also the result index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Member this task is statically bound to.
    pub fn group_index(&self) -> usize {
        self.group_index
    }

    pub fn call(&self) -> &MethodCall {
        &self.call
    }

    pub fn kind(&self) -> &TaskKind {
        &self.kind
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    pub(crate) fn execute(self, targets: &[Arc<dyn Invoke>], placement: Placement, monitor: Option<&DispatchMonitor>) {
        let Task {
            index,
            group_index,
            call,
            kind,
            state,
            completion,
            ..
        } = self;

        let member = match monitor {
            Some(monitor) if placement == Placement::Dynamic => monitor.acquire_least_loaded(),
            Some(monitor) => {
                monitor.acquire(group_index);
                group_index
            }
            None => group_index,
        };
        log::trace!("task #{} runs `{}` on member {}", index, call.method_name(), member);

        let outcome = match targets.get(member) {
            Some(target) => invoke_guarded(target.as_ref(), &call),
            None => Err(CallError::Raised(format!("no group member at index {}", member))),
        };
        if let Some(monitor) = monitor {
            monitor.release(member);
        }

        match outcome {
            Ok(value) => {
                if let TaskKind::Async {
                    results,
                    result_index,
                } = &kind
                {
                    if results.set(*result_index, value).is_err() {
                        log::warn!("result slot {} of `{}` was already written", result_index, call.method_name());
                    }
                }
            }
            Err(error) => {
                log::warn!("`{}` failed on member {} (call #{}): {}", call.method_name(), member, index, error);
                state.exceptions.record(index, error);
            }
        }

        // Release the result group before the dispatcher is woken up.
        drop(kind);
        drop(completion);
    }
}

fn invoke_guarded(target: &dyn Invoke, call: &MethodCall) -> Result<Value, CallError> {
    panic::catch_unwind(AssertUnwindSafe(|| target.invoke(call)))
        .unwrap_or_else(|payload| Err(CallError::Panicked(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::MethodSignature;

    fn call() -> MethodCall {
        MethodCall::new(Arc::new(MethodSignature::new("answer")), vec![])
    }

    #[test]
    fn dropped_task_still_counts_down() {
        let state = DispatchState::new(2);
        let first = Task::new(0, 0, call(), TaskKind::OneWay, false, &state);
        let second = Task::new(1, 1, call(), TaskKind::OneWay, false, &state);
        drop(first);
        assert_eq!(state.latch.remaining(), 1);
        drop(second);
        assert_eq!(state.latch.remaining(), 0);
    }

    #[test]
    fn panicking_member_is_recorded() {
        let state = DispatchState::new(1);
        let results = Arc::new(ResultGroup::new(1));
        let target: Arc<dyn Invoke> = Arc::new(|_: &MethodCall| -> Result<Value, CallError> { panic!("boom") });
        let targets = vec![target];
        let task = Task::new(
            0,
            0,
            call(),
            TaskKind::Async {
                results: Arc::clone(&results),
                result_index: 0,
            },
            false,
            &state,
        );
        task.execute(&targets, Placement::Fixed, None);

        assert_eq!(state.latch.remaining(), 0);
        assert!(!results.is_set(0));
        assert_eq!(state.exceptions.drain().get(0), Some(&CallError::Panicked("boom".to_owned())));
        assert_eq!(Arc::strong_count(&results), 1);
    }
}

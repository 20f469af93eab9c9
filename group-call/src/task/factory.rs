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

use super::result::ResultGroup;
use super::{DispatchState, Task, TaskKind};
use crate::call::MethodCall;
use crate::dispatch;
use crate::dispatch::plan::MethodPlan;
use crate::error::ParameterDispatchError;
use crate::group::multicast::MulticastController;
use std::collections::VecDeque;
use std::sync::Arc;

/// Decides which calls a group invocation turns into.
pub trait TaskFactory: Send + Sync {
    fn generate_method_calls(
        &self,
        plan: &MethodPlan,
        call: &MethodCall,
        nb_members: usize,
    ) -> Result<Vec<MethodCall>, ParameterDispatchError>;
}

/// Generates calls from the plan of the proxy itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicTaskFactory;

impl TaskFactory for BasicTaskFactory {
    fn generate_method_calls(
        &self,
        plan: &MethodPlan,
        call: &MethodCall,
        nb_members: usize,
    ) -> Result<Vec<MethodCall>, ParameterDispatchError> {
        dispatch::generate_method_calls(plan, call, nb_members)
    }
}

/// Generates calls for a collective interface through the controller that owns it.
pub struct CollectiveTaskFactory {
    controller: Arc<MulticastController>,
    interface: String,
}

impl CollectiveTaskFactory {
    pub fn new(controller: Arc<MulticastController>, interface: impl Into<String>) -> Self {
        CollectiveTaskFactory {
            controller,
            interface: interface.into(),
        }
    }
}

impl TaskFactory for CollectiveTaskFactory {
    fn generate_method_calls(
        &self,
        plan: &MethodPlan,
        call: &MethodCall,
        nb_members: usize,
    ) -> Result<Vec<MethodCall>, ParameterDispatchError> {
        match self.controller.generate_method_calls(&self.interface, call, nb_members) {
            Some(calls) => calls,
            None => {
                log::debug!(
                    "`{}` is not managed by the controller of `{}`, generating calls locally",
                    self.interface,
                    self.controller.owner()
                );
                BasicTaskFactory.generate_method_calls(plan, call, nb_members)
            }
        }
    }
}

/// One task per generated call. Call `k` is bound to member `k % nb_members` and, unless
/// `results` is absent, writes its value at index `k`.
pub(crate) fn generate_tasks(
    calls: Vec<MethodCall>,
    nb_members: usize,
    dynamic: bool,
    results: Option<&Arc<ResultGroup>>,
    state: &Arc<DispatchState>,
) -> VecDeque<Task> {
    calls
        .into_iter()
        .enumerate()
        .map(|(index, call)| {
            let kind = match results {
                Some(results) => TaskKind::Async {
                    results: Arc::clone(results),
                    result_index: index,
                },
                None => TaskKind::OneWay,
            };
            Task::new(index, index % nb_members.max(1), call, kind, dynamic, state)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::MethodSignature;

    #[test]
    fn tasks_cycle_over_members() {
        let call = MethodCall::new(Arc::new(MethodSignature::new("work")), vec![]);
        let calls = vec![call; 5];
        let state = DispatchState::new(5);
        let results = Arc::new(ResultGroup::new(5));
        let tasks = generate_tasks(calls, 2, true, Some(&results), &state);

        let members: Vec<_> = tasks.iter().map(Task::group_index).collect();
        assert_eq!(members, vec![0, 1, 0, 1, 0]);
        assert!(tasks.iter().all(Task::is_dynamic));
        match tasks[3].kind() {
            TaskKind::Async {
                result_index,
                ..
            } => assert_eq!(*result_index, 3),
            TaskKind::OneWay => panic!("expected a task with a result"),
        }
        drop(tasks);
        assert_eq!(state.latch.remaining(), 0);
    }
}

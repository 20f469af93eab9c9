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

use super::member::Invoke;
use super::Group;
use crate::call::{InterfaceSignature, MethodCall, Value};
use crate::dispatch::plan::{DispatchAnnotation, DispatchMode, GroupKind, InterfacePlan};
use crate::dispatcher::Dispatcher;
use crate::error::{ExceptionListError, GroupCallError};
use crate::task::factory::{self, BasicTaskFactory, TaskFactory};
use crate::task::result::ResultGroup;
use crate::task::DispatchState;
use crate::GroupConfig;
use parking_lot::RwLock;
use std::sync::Arc;

/// Outcome of a successful group call.
#[derive(Debug)]
pub enum GroupReply {
    OneWay,
    Results(ResultGroup),
}

impl GroupReply {
    pub fn results(&self) -> Option<&ResultGroup> {
        match self {
            GroupReply::Results(results) => Some(results),
            GroupReply::OneWay => None,
        }
    }

    pub fn into_results(self) -> Option<ResultGroup> {
        match self {
            GroupReply::Results(results) => Some(results),
            GroupReply::OneWay => None,
        }
    }
}

/// Calls an interface on every member of a group at once.
///
/// The dispatch plan of the interface is compiled when the proxy is created. Each call
/// works on the members present when it starts. Every proxy runs its calls on a pool of
/// its own.
pub struct GroupProxy {
    plan: Arc<InterfacePlan>,
    group: Arc<Group>,
    factory: Arc<dyn TaskFactory>,
    dispatcher: Dispatcher,
    balancing: RwLock<DispatchAnnotation>,
}

impl GroupProxy {
    pub fn new(signature: &InterfaceSignature, kind: GroupKind, group: Arc<Group>, config: GroupConfig) -> Self {
        Self::with_factory(Arc::new(InterfacePlan::compile(signature, kind)), group, config, Arc::new(BasicTaskFactory))
    }

    pub fn with_factory(
        plan: Arc<InterfacePlan>,
        group: Arc<Group>,
        config: GroupConfig,
        factory: Arc<dyn TaskFactory>,
    ) -> Self {
        let balancing = DispatchAnnotation {
            mode: config.dispatch_mode,
            buffer_size: config.buffer_size,
        };
        GroupProxy {
            plan,
            group,
            factory,
            dispatcher: Dispatcher::new(config),
            balancing: RwLock::new(balancing),
        }
    }

    pub fn plan(&self) -> &Arc<InterfacePlan> {
        &self.plan
    }

    pub fn group(&self) -> &Arc<Group> {
        &self.group
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Balancing used by methods that do not declare their own.
    pub fn set_dispatch_mode(&self, mode: DispatchMode, buffer_size: usize) {
        *self.balancing.write() = DispatchAnnotation {
            mode,
            buffer_size,
        };
    }

    pub fn dispatch_mode(&self) -> DispatchAnnotation {
        *self.balancing.read()
    }

    pub fn method_call(&self, method: &str, arguments: Vec<Value>) -> Result<MethodCall, GroupCallError> {
        let plan = self.plan.method(method).ok_or_else(|| GroupCallError::UnknownMethod(method.to_owned()))?;
        Ok(MethodCall::new(Arc::clone(plan.signature()), arguments))
    }

    pub fn call(&self, method: &str, arguments: Vec<Value>) -> Result<GroupReply, GroupCallError> {
        self.invoke(self.method_call(method, arguments)?)
    }

    /// Runs `call` on the group and waits until every generated call has completed.
    pub fn invoke(&self, call: MethodCall) -> Result<GroupReply, GroupCallError> {
        let plan = self
            .plan
            .method(call.method_name())
            .ok_or_else(|| GroupCallError::UnknownMethod(call.method_name().to_owned()))?;

        let targets = self
            .group
            .snapshot()
            .iter()
            .enumerate()
            .map(|(index, member)| {
                member.resolve().map_err(|reason| {
                    log::warn!("member {} of `{}` cannot be called: {}", index, self.plan.name(), reason);
                    GroupCallError::ContractViolation {
                        index,
                        reason,
                    }
                })
            })
            .collect::<Result<Vec<Arc<dyn Invoke>>, _>>()?;
        let nb_members = targets.len();

        let calls = self.factory.generate_method_calls(plan, &call, nb_members)?;
        let nb_tasks = calls.len();
        let balancing = plan.annotation().unwrap_or_else(|| self.dispatch_mode());
        let state = DispatchState::new(nb_tasks);
        let results = if plan.is_one_way() {
            None
        } else {
            Some(Arc::new(ResultGroup::new(nb_tasks)))
        };
        let tasks = factory::generate_tasks(
            calls,
            nb_members,
            balancing.mode == DispatchMode::Dynamic,
            results.as_ref(),
            &state,
        );
        log::debug!("`{}.{}`: {} calls on {} members", self.plan.name(), call.method_name(), nb_tasks, nb_members);

        self.dispatcher.dispatch_tasks(
            tasks,
            targets.into(),
            &state.latch,
            balancing,
            self.dispatcher.config().call_timeout(),
        )?;

        let exceptions = state.exceptions.drain();
        let results = results.map(|results| Arc::try_unwrap(results).unwrap_or_else(|shared| shared.snapshot()));
        if !exceptions.is_empty() {
            log::debug!("`{}.{}`: {} of {} calls failed", self.plan.name(), call.method_name(), exceptions.len(), nb_tasks);
            return Err(GroupCallError::Failed(ExceptionListError {
                exceptions,
                partial: results.unwrap_or_else(|| ResultGroup::new(nb_tasks)),
            }))
        }
        Ok(match results {
            Some(results) => GroupReply::Results(results),
            None => GroupReply::OneWay,
        })
    }
}

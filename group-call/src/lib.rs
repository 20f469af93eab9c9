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

//! Group method invocation.
//!
//! A single method call against a [`Group`] is split into one call per unit of work
//! according to the [`ParamDispatchMode`] of each parameter, executed concurrently on a
//! shared worker pool, and merged back into a [`ResultGroup`] ordered by generated-call
//! index. Failures of individual members are collected into an [`ExceptionList`] instead of
//! aborting their siblings.
//!
//! [`GroupProxy`] is the entry point for plain groups, [`MulticastController`] manages the
//! collective interfaces of a component.

mod call;
mod dispatch;
mod dispatcher;
mod error;
mod group;
mod task;
#[cfg(test)]
mod tests;

pub use call::{InterfaceSignature, MethodCall, MethodSignature, ParamSignature, ParamType, ReturnKind, Value};
pub use dispatch::binding::check_binding;
pub use dispatch::mode::{round_robin_slices, Broadcast, DispatchSize, OneToOne, ParamDispatch, ParamDispatchMode, RoundRobin};
pub use dispatch::plan::{DispatchAnnotation, DispatchMode, GroupKind, InterfacePlan, MethodPlan};
pub use dispatch::generate_method_calls;
pub use dispatcher::{monitor::DispatchMonitor, Dispatcher};
pub use error::{BindingError, CallError, ExceptionList, ExceptionListError, GroupCallError, ParameterDispatchError};
pub use group::member::{Component, GroupMember, Invoke};
pub use group::multicast::MulticastController;
pub use group::proxy::{GroupProxy, GroupReply};
pub use group::Group;
pub use task::factory::{BasicTaskFactory, CollectiveTaskFactory, TaskFactory};
pub use task::latch::CountDownSignal;
pub use task::result::ResultGroup;
pub use task::{Task, TaskKind};

use std::time::Duration;

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GroupConfig {
    /// Number of group members served by one worker thread
    pub member_to_thread_ratio: usize,
    /// Worker threads added on top of those given by the ratio
    pub additional_threads: usize,
    /// Balancing of methods that do not declare their own
    pub dispatch_mode: DispatchMode,
    /// Tasks statically assigned to each member before dynamic dispatch takes over
    pub buffer_size: usize,
    /// Upper bound on the wait for a group call, in milliseconds. Unbounded if absent.
    pub call_timeout_ms: Option<u64>,
    /// Name given to the worker threads
    pub thread_name: String,
}

impl Default for GroupConfig {
    fn default() -> Self {
        GroupConfig {
            member_to_thread_ratio: 4,
            additional_threads: 3,
            dispatch_mode: DispatchMode::Static,
            buffer_size: 1,
            call_timeout_ms: None,
            thread_name: "group-dispatch".to_owned(),
        }
    }
}

impl GroupConfig {
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, serde_cbor::Error> {
        serde_cbor::from_slice(bytes)
    }

    /// Pool size that serves `nb_members` members.
    pub fn optimal_pool_size(&self, nb_members: usize) -> usize {
        if self.member_to_thread_ratio == 0 {
            return self.additional_threads.max(1)
        }
        let ratio = self.member_to_thread_ratio;
        let threads = nb_members / ratio + (nb_members % ratio != 0) as usize;
        threads.saturating_add(self.additional_threads).max(1)
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }
}

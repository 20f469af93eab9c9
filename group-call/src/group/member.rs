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

use crate::call::{MethodCall, Value};
use crate::error::CallError;
use std::fmt;
use std::sync::Arc;

/// Executes a call against one target, wherever it lives.
pub trait Invoke: Send + Sync {
    fn invoke(&self, call: &MethodCall) -> Result<Value, CallError>;
}

impl<F> Invoke for F
where
    F: Fn(&MethodCall) -> Result<Value, CallError> + Send + Sync,
{
    fn invoke(&self, call: &MethodCall) -> Result<Value, CallError> {
        self(call)
    }
}

/// A component exposing named server interfaces.
pub trait Component: Send + Sync {
    fn name(&self) -> &str;

    fn interface(&self, name: &str) -> Option<Arc<dyn Invoke>>;
}

#[derive(Clone)]
pub enum GroupMember {
    /// Invoked directly
    Plain(Arc<dyn Invoke>),
    /// Invoked through the named server interface of `owner`
    Component {
        owner: Arc<dyn Component>,
        interface: String,
    },
}

impl GroupMember {
    pub fn plain<I: Invoke + 'static>(target: I) -> Self {
        GroupMember::Plain(Arc::new(target))
    }

    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&MethodCall) -> Result<Value, CallError> + Send + Sync + 'static, {
        GroupMember::Plain(Arc::new(f))
    }

    pub fn component(owner: Arc<dyn Component>, interface: impl Into<String>) -> Self {
        GroupMember::Component {
            owner,
            interface: interface.into(),
        }
    }

    /// The target calls are actually sent to.
    pub(crate) fn resolve(&self) -> Result<Arc<dyn Invoke>, String> {
        match self {
            GroupMember::Plain(target) => Ok(Arc::clone(target)),
            GroupMember::Component {
                owner,
                interface,
            } => owner
                .interface(interface)
                .ok_or_else(|| format!("component `{}` has no server interface `{}`", owner.name(), interface)),
        }
    }

    /// Whether both refer to the same target.
    pub fn same_as(&self, other: &GroupMember) -> bool {
        match (self, other) {
            (GroupMember::Plain(a), GroupMember::Plain(b)) => same_object(a, b),
            (
                GroupMember::Component {
                    owner: a,
                    interface: x,
                },
                GroupMember::Component {
                    owner: b,
                    interface: y,
                },
            ) => same_object(a, b) && x == y,
            _ => false,
        }
    }
}

// Compares data pointers only: vtable pointers of the same object may differ.
fn same_object<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    Arc::as_ptr(a) as *const u8 == Arc::as_ptr(b) as *const u8
}

impl fmt::Debug for GroupMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupMember::Plain(_) => write!(f, "Plain"),
            GroupMember::Component {
                owner,
                interface,
            } => write!(f, "Component({}.{})", owner.name(), interface),
        }
    }
}

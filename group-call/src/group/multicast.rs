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

use super::member::GroupMember;
use super::proxy::GroupProxy;
use super::Group;
use crate::call::{InterfaceSignature, MethodCall};
use crate::dispatch;
use crate::dispatch::binding::check_binding;
use crate::dispatch::plan::{GroupKind, InterfacePlan};
use crate::error::{BindingError, ParameterDispatchError};
use crate::task::factory::CollectiveTaskFactory;
use crate::GroupConfig;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

struct CollectiveInterface {
    signature: InterfaceSignature,
    plan: Arc<InterfacePlan>,
    group: Arc<Group>,
}

/// Manages the collective client interfaces of one component.
///
/// Every bound server is checked against the client signature when it is bound, so a
/// call on the interface never fails on a signature mismatch.
pub struct MulticastController {
    owner: String,
    config: GroupConfig,
    interfaces: RwLock<HashMap<String, CollectiveInterface>>,
}

impl MulticastController {
    /// `config` is given to every proxy created by [`MulticastController::proxy`].
    pub fn new(owner: impl Into<String>, config: GroupConfig) -> Self {
        MulticastController {
            owner: owner.into(),
            config,
            interfaces: Default::default(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn add_interface(&self, signature: InterfaceSignature) -> Result<(), BindingError> {
        let mut interfaces = self.interfaces.write();
        if interfaces.contains_key(signature.name()) {
            return Err(BindingError::AlreadyManaged(signature.name().to_owned()))
        }
        let plan = Arc::new(InterfacePlan::compile(&signature, GroupKind::Collective));
        log::debug!("`{}` manages collective interface `{}`", self.owner, signature.name());
        interfaces.insert(signature.name().to_owned(), CollectiveInterface {
            signature,
            plan,
            group: Arc::new(Group::new()),
        });
        Ok(())
    }

    pub fn interfaces(&self) -> Vec<String> {
        let mut names: Vec<_> = self.interfaces.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Binds `member`, which serves `server`, to the collective interface `itf`.
    pub fn bind(&self, itf: &str, member: GroupMember, server: &InterfaceSignature) -> Result<(), BindingError> {
        let interfaces = self.interfaces.read();
        let collective = interfaces.get(itf).ok_or_else(|| BindingError::NoSuchInterface(itf.to_owned()))?;
        check_binding(&collective.plan, &collective.signature, server)?;
        let index = collective.group.add(member);
        log::debug!("`{}.{}` bound to `{}` as member {}", self.owner, itf, server.name(), index);
        Ok(())
    }

    pub fn unbind(&self, itf: &str, member: &GroupMember) -> Result<(), BindingError> {
        let interfaces = self.interfaces.read();
        let collective = interfaces.get(itf).ok_or_else(|| BindingError::NoSuchInterface(itf.to_owned()))?;
        if !collective.group.remove_member(member) {
            return Err(BindingError::NotBound(itf.to_owned()))
        }
        log::debug!("`{}.{}` unbound {:?}", self.owner, itf, member);
        Ok(())
    }

    /// Members currently bound to `itf`, in dispatch order.
    pub fn lookup(&self, itf: &str) -> Result<Vec<GroupMember>, BindingError> {
        self.interfaces
            .read()
            .get(itf)
            .map(|collective| collective.group.snapshot())
            .ok_or_else(|| BindingError::NoSuchInterface(itf.to_owned()))
    }

    /// A proxy calling every server bound to `itf`, with a pool of its own.
    pub fn proxy(self: &Arc<Self>, itf: &str) -> Result<GroupProxy, BindingError> {
        let interfaces = self.interfaces.read();
        let collective = interfaces.get(itf).ok_or_else(|| BindingError::NoSuchInterface(itf.to_owned()))?;
        Ok(GroupProxy::with_factory(
            Arc::clone(&collective.plan),
            Arc::clone(&collective.group),
            self.config.clone(),
            Arc::new(CollectiveTaskFactory::new(Arc::clone(self), itf)),
        ))
    }

    /// Generates the calls of `call` with the plan of `itf`, or `None` if `itf` is not
    /// managed here.
    pub fn generate_method_calls(
        &self,
        itf: &str,
        call: &MethodCall,
        nb_receivers: usize,
    ) -> Option<Result<Vec<MethodCall>, ParameterDispatchError>> {
        let interfaces = self.interfaces.read();
        let plan = &interfaces.get(itf)?.plan;
        Some(match plan.method(call.method_name()) {
            Some(method) => dispatch::generate_method_calls(method, call, nb_receivers),
            None => Err(ParameterDispatchError::Custom(format!(
                "`{}` has no method `{}`",
                itf,
                call.method_name()
            ))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::{MethodSignature, ParamType, Value};
    use crate::dispatch::mode::ParamDispatchMode;

    fn collective() -> InterfaceSignature {
        InterfaceSignature::new("workers")
            .method(MethodSignature::new("sum").dispatched_param(
                "values",
                ParamType::list_of(ParamType::Integer),
                ParamDispatchMode::RoundRobin,
            ))
    }

    fn server() -> InterfaceSignature {
        InterfaceSignature::new("worker").method(MethodSignature::new("sum").param("value", ParamType::Integer))
    }

    fn member() -> GroupMember {
        GroupMember::from_fn(|call| Ok(call.arguments()[0].clone()))
    }

    #[test]
    fn interface_is_managed_once() {
        let controller = MulticastController::new("master", GroupConfig::default());
        controller.add_interface(collective()).unwrap();
        assert!(matches!(controller.add_interface(collective()), Err(BindingError::AlreadyManaged(_))));
        assert_eq!(controller.interfaces(), vec!["workers".to_owned()]);
    }

    #[test]
    fn bind_checks_signatures() {
        let controller = MulticastController::new("master", GroupConfig::default());
        controller.add_interface(collective()).unwrap();

        let wrong = InterfaceSignature::new("worker").method(MethodSignature::new("sum").param("value", ParamType::Text));
        assert!(matches!(
            controller.bind("workers", member(), &wrong),
            Err(BindingError::IncompatibleParameter { .. })
        ));
        assert!(matches!(controller.bind("nothing", member(), &server()), Err(BindingError::NoSuchInterface(_))));
        assert!(controller.lookup("workers").unwrap().is_empty());

        let bound = member();
        controller.bind("workers", bound.clone(), &server()).unwrap();
        assert_eq!(controller.lookup("workers").unwrap().len(), 1);

        controller.unbind("workers", &bound).unwrap();
        assert!(matches!(controller.unbind("workers", &bound), Err(BindingError::NotBound(_))));
        assert!(controller.lookup("workers").unwrap().is_empty());
    }

    #[test]
    fn calls_are_generated_for_managed_interfaces_only() {
        let controller = MulticastController::new("master", GroupConfig::default());
        controller.add_interface(collective()).unwrap();
        let signature = Arc::clone(collective().find("sum").unwrap());
        let call = MethodCall::new(signature, vec![Value::Array(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)])]);

        let calls = controller.generate_method_calls("workers", &call, 2).unwrap().unwrap();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[2].arguments(), [Value::Integer(3)]);
        assert!(controller.generate_method_calls("others", &call, 2).is_none());
    }
}

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

use super::mode::ParamDispatchMode;
use crate::call::{InterfaceSignature, MethodSignature};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// How tasks are assigned to members.
#[derive(PartialEq, Eq, Serialize, Deserialize, Debug, Clone, Copy)]
pub enum DispatchMode {
    /// Task `k` always runs on member `k % N`
    Static,
    /// Once every member's buffer is filled, remaining tasks go to the least loaded member
    Dynamic,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct DispatchAnnotation {
    pub mode: DispatchMode,
    /// Tasks statically assigned to each member before dynamic assignment starts
    pub buffer_size: usize,
}

impl DispatchAnnotation {
    pub fn dynamic(buffer_size: usize) -> Self {
        DispatchAnnotation {
            mode: DispatchMode::Dynamic,
            buffer_size,
        }
    }

    pub fn fixed() -> Self {
        DispatchAnnotation {
            mode: DispatchMode::Static,
            buffer_size: 1,
        }
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum GroupKind {
    /// A plain group of objects behind a proxy
    Plain,
    /// A multicast interface of a component
    Collective,
}

impl GroupKind {
    pub fn default_param_mode(self) -> ParamDispatchMode {
        match self {
            GroupKind::Plain => ParamDispatchMode::OneToOne,
            GroupKind::Collective => ParamDispatchMode::Broadcast,
        }
    }
}

/// Dispatch decisions for one method, resolved once when the interface is bound.
#[derive(Debug)]
pub struct MethodPlan {
    signature: Arc<MethodSignature>,
    modes: Vec<ParamDispatchMode>,
}

impl MethodPlan {
    pub fn resolve(signature: Arc<MethodSignature>, kind: GroupKind) -> Self {
        let fallback = signature.declared_method_mode().cloned().unwrap_or_else(|| kind.default_param_mode());
        let modes = signature.params().iter().map(|p| p.mode.clone().unwrap_or_else(|| fallback.clone())).collect();
        MethodPlan {
            signature,
            modes,
        }
    }

    pub fn signature(&self) -> &Arc<MethodSignature> {
        &self.signature
    }

    pub fn modes(&self) -> &[ParamDispatchMode] {
        &self.modes
    }

    pub fn is_one_way(&self) -> bool {
        self.signature.is_one_way()
    }

    pub fn is_dynamic(&self) -> bool {
        self.signature.dispatch_annotation().map_or(false, |a| a.mode == DispatchMode::Dynamic)
    }

    pub fn annotation(&self) -> Option<DispatchAnnotation> {
        self.signature.dispatch_annotation()
    }
}

/// Plans of every method of a bound interface.
#[derive(Debug)]
pub struct InterfacePlan {
    name: String,
    kind: GroupKind,
    methods: HashMap<String, Arc<MethodPlan>>,
}

impl InterfacePlan {
    pub fn compile(signature: &InterfaceSignature, kind: GroupKind) -> Self {
        let methods = signature
            .methods()
            .iter()
            .map(|m| (m.name().to_owned(), Arc::new(MethodPlan::resolve(Arc::clone(m), kind))))
            .collect();
        InterfacePlan {
            name: signature.name().to_owned(),
            kind,
            methods,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    pub fn method(&self, name: &str) -> Option<&Arc<MethodPlan>> {
        self.methods.get(name)
    }
}

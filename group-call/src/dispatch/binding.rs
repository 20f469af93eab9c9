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

use super::mode::ParamDispatch;
use super::plan::InterfacePlan;
use crate::call::InterfaceSignature;
use crate::error::BindingError;

/// Checks, before any call is made, that every method of a collective client interface
/// can be dispatched to `server`.
pub fn check_binding(client: &InterfacePlan, client_signature: &InterfaceSignature, server: &InterfaceSignature) -> Result<(), BindingError> {
    for method in client_signature.methods() {
        let no_match = || BindingError::NoMatchingMethod {
            server: server.name().to_owned(),
            method: method.name().to_owned(),
        };
        let server_method = server.find(method.name()).filter(|m| m.arity() == method.arity()).ok_or_else(no_match)?;
        let plan = client.method(method.name()).ok_or_else(no_match)?;

        for (param, ((client_param, server_param), mode)) in
            method.params().iter().zip(server_method.params()).zip(plan.modes()).enumerate()
        {
            if !mode.match_types(&client_param.ty, &server_param.ty) {
                return Err(BindingError::IncompatibleParameter {
                    method: method.name().to_owned(),
                    param,
                })
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::{MethodSignature, ParamType};
    use crate::dispatch::mode::ParamDispatchMode;
    use crate::dispatch::plan::GroupKind;

    fn client() -> InterfaceSignature {
        InterfaceSignature::new("Workers")
            .method(
                MethodSignature::new("compute")
                    .dispatched_param("jobs", ParamType::list_of(ParamType::Integer), ParamDispatchMode::RoundRobin)
                    .param("factor", ParamType::Integer),
            )
            .method(MethodSignature::one_way("reset"))
    }

    #[test]
    fn matching_server_is_accepted() {
        let client = client();
        let plan = InterfacePlan::compile(&client, GroupKind::Collective);
        let server = InterfaceSignature::new("Worker")
            .method(MethodSignature::new("compute").param("job", ParamType::Integer).param("factor", ParamType::Integer))
            .method(MethodSignature::one_way("reset"))
            .method(MethodSignature::new("status"));
        assert_eq!(check_binding(&plan, &client, &server), Ok(()));
    }

    #[test]
    fn element_type_must_match() {
        let client = client();
        let plan = InterfacePlan::compile(&client, GroupKind::Collective);
        let server = InterfaceSignature::new("Worker")
            .method(MethodSignature::new("compute").param("job", ParamType::Text).param("factor", ParamType::Integer))
            .method(MethodSignature::one_way("reset"));
        assert_eq!(
            check_binding(&plan, &client, &server).unwrap_err(),
            BindingError::IncompatibleParameter {
                method: "compute".to_owned(),
                param: 0
            }
        );
    }

    #[test]
    fn missing_or_wrong_arity_method() {
        let client = client();
        let plan = InterfacePlan::compile(&client, GroupKind::Collective);
        let server = InterfaceSignature::new("Worker").method(MethodSignature::one_way("reset"));
        assert!(matches!(check_binding(&plan, &client, &server), Err(BindingError::NoMatchingMethod { .. })));

        let server = InterfaceSignature::new("Worker")
            .method(MethodSignature::new("compute").param("job", ParamType::Integer))
            .method(MethodSignature::one_way("reset"));
        assert!(matches!(check_binding(&plan, &client, &server), Err(BindingError::NoMatchingMethod { .. })));
    }
}

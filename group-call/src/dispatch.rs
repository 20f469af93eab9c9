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

pub mod binding;
pub mod mode;
pub mod plan;

use crate::call::{MethodCall, Value};
use crate::error::ParameterDispatchError;
use mode::{DispatchSize, ParamDispatch};
use plan::MethodPlan;

// Number of calls every parameter agrees on.
//
// Fixed sizes must all be equal. Flexible parameters (broadcast) follow them,
// and without any fixed size the largest flexible size wins.
fn reconcile(plan: &MethodPlan, sizes: &[DispatchSize], nb_receivers: usize) -> Result<usize, ParameterDispatchError> {
    let mut fixed = sizes.iter().enumerate().filter(|(_, s)| s.is_fixed());
    match fixed.next() {
        Some((_, first)) => {
            let expected = first.size();
            for (param, size) in fixed {
                if size.size() != expected {
                    return Err(ParameterDispatchError::SizeMismatch {
                        method: plan.signature().name().to_owned(),
                        param,
                        expected,
                        found: size.size(),
                    })
                }
            }
            Ok(expected)
        }
        None => Ok(sizes.iter().map(|s| s.size()).max().unwrap_or(nb_receivers)),
    }
}

/// Splits `call` into the ordered list of calls to run against a group of `nb_receivers`.
///
/// Call `k` of the result is meant for member `k % nb_receivers`.
pub fn generate_method_calls(
    plan: &MethodPlan,
    call: &MethodCall,
    nb_receivers: usize,
) -> Result<Vec<MethodCall>, ParameterDispatchError> {
    let modes = plan.modes();
    let arguments = call.arguments();
    if arguments.len() != modes.len() {
        return Err(ParameterDispatchError::Arity {
            method: plan.signature().name().to_owned(),
            expected: modes.len(),
            found: arguments.len(),
        })
    }

    let sizes = modes
        .iter()
        .zip(arguments)
        .enumerate()
        .map(|(i, (mode, argument))| mode.expected_dispatch_size(argument, nb_receivers).map_err(|e| e.at(i)))
        .collect::<Result<Vec<_>, _>>()?;
    let nb_calls = reconcile(plan, &sizes, nb_receivers)?;
    if nb_calls > 0 && nb_receivers == 0 {
        return Err(ParameterDispatchError::NoReceivers {
            calls: nb_calls,
        })
    }

    let mut dispatched: Vec<std::vec::IntoIter<Value>> = Vec::with_capacity(modes.len());
    for (i, (mode, argument)) in modes.iter().zip(arguments).enumerate() {
        let parts = mode.partition(argument, nb_calls).map_err(|e| e.at(i))?;
        if parts.len() != nb_calls {
            return Err(ParameterDispatchError::PartitionLength {
                param: i,
                expected: nb_calls,
                found: parts.len(),
            })
        }
        dispatched.push(parts.into_iter());
    }

    let mut calls = Vec::with_capacity(nb_calls);
    for _ in 0..nb_calls {
        let individual = dispatched.iter_mut().filter_map(|parts| parts.next()).collect();
        calls.push(call.with_arguments(individual));
    }
    Ok(calls)
}

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

use crate::call::{ParamType, Value};
use crate::error::ParameterDispatchError;
use std::fmt;
use std::sync::Arc;

/// Number of calls a parameter wants to be split into.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum DispatchSize {
    /// The parameter cannot be split any other way
    Fixed(usize),
    /// The parameter follows the fixed size of the other parameters, if any
    Flexible(usize),
}

impl DispatchSize {
    pub fn size(self) -> usize {
        match self {
            DispatchSize::Fixed(n) | DispatchSize::Flexible(n) => n,
        }
    }

    pub fn is_fixed(self) -> bool {
        matches!(self, DispatchSize::Fixed(_))
    }
}

/// Partitioning policy of one parameter of a group call.
///
/// `partition(input, n)` must return exactly `expected_dispatch_size(input, n).size()`
/// values when `n` is the number of receivers. During call generation `partition` is
/// given the reconciled number of calls instead, which differs from the number of
/// receivers only for flexible parameters.
pub trait ParamDispatch: Send + Sync + fmt::Debug {
    fn expected_dispatch_size(&self, input: &Value, nb_receivers: usize) -> Result<DispatchSize, ParameterDispatchError>;

    fn partition(&self, input: &Value, nb_receivers: usize) -> Result<Vec<Value>, ParameterDispatchError>;

    /// Whether a client parameter of type `client` can be dispatched to a server
    /// parameter of type `server`.
    fn match_types(&self, client: &ParamType, server: &ParamType) -> bool;
}

fn sequence(input: &Value) -> Result<&[Value], ParameterDispatchError> {
    match input {
        Value::Array(items) => Ok(items),
        _ => Err(ParameterDispatchError::NotASequence {
            param: 0,
        }),
    }
}

fn element_matches(client: &ParamType, server: &ParamType) -> bool {
    match client {
        ParamType::Any => true,
        ParamType::List(element) => server.accepts(element),
        _ => false,
    }
}

/// Same value to every receiver.
#[derive(Debug, Clone, Copy, Default)]
pub struct Broadcast;

impl ParamDispatch for Broadcast {
    fn expected_dispatch_size(&self, _input: &Value, nb_receivers: usize) -> Result<DispatchSize, ParameterDispatchError> {
        Ok(DispatchSize::Flexible(nb_receivers))
    }

    fn partition(&self, input: &Value, nb_receivers: usize) -> Result<Vec<Value>, ParameterDispatchError> {
        Ok(vec![input.clone(); nb_receivers])
    }

    fn match_types(&self, client: &ParamType, server: &ParamType) -> bool {
        server.accepts(client)
    }
}

/// Element `i` of a sequence to receiver `i`. The sequence must be as long as the group.
#[derive(Debug, Clone, Copy, Default)]
pub struct OneToOne;

impl ParamDispatch for OneToOne {
    fn expected_dispatch_size(&self, input: &Value, nb_receivers: usize) -> Result<DispatchSize, ParameterDispatchError> {
        let items = sequence(input)?;
        if items.len() != nb_receivers {
            return Err(ParameterDispatchError::LengthMismatch {
                param: 0,
                expected: nb_receivers,
                found: items.len(),
            })
        }
        Ok(DispatchSize::Fixed(nb_receivers))
    }

    fn partition(&self, input: &Value, nb_receivers: usize) -> Result<Vec<Value>, ParameterDispatchError> {
        let items = sequence(input)?;
        if items.len() != nb_receivers {
            return Err(ParameterDispatchError::LengthMismatch {
                param: 0,
                expected: nb_receivers,
                found: items.len(),
            })
        }
        Ok(items.to_vec())
    }

    fn match_types(&self, client: &ParamType, server: &ParamType) -> bool {
        element_matches(client, server)
    }
}

/// One call per element of a sequence of any length; call `k` goes to receiver `k % N`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundRobin;

impl ParamDispatch for RoundRobin {
    fn expected_dispatch_size(&self, input: &Value, _nb_receivers: usize) -> Result<DispatchSize, ParameterDispatchError> {
        Ok(DispatchSize::Fixed(sequence(input)?.len()))
    }

    fn partition(&self, input: &Value, _nb_receivers: usize) -> Result<Vec<Value>, ParameterDispatchError> {
        Ok(sequence(input)?.to_vec())
    }

    fn match_types(&self, client: &ParamType, server: &ParamType) -> bool {
        element_matches(client, server)
    }
}

/// What each receiver gets from a round-robin parameter, in call order.
pub fn round_robin_slices(input: &Value, nb_receivers: usize) -> Result<Vec<Vec<Value>>, ParameterDispatchError> {
    let items = sequence(input)?;
    if nb_receivers == 0 {
        return Err(ParameterDispatchError::NoReceivers {
            calls: items.len(),
        })
    }
    let mut slices = vec![Vec::new(); nb_receivers];
    for (k, item) in items.iter().enumerate() {
        slices[k % nb_receivers].push(item.clone());
    }
    Ok(slices)
}

/// Dispatch mode attached to a parameter or a method.
#[derive(Debug, Clone)]
pub enum ParamDispatchMode {
    Broadcast,
    OneToOne,
    RoundRobin,
    Custom(Arc<dyn ParamDispatch>),
}

impl ParamDispatchMode {
    pub fn custom<P: ParamDispatch + 'static>(policy: P) -> Self {
        ParamDispatchMode::Custom(Arc::new(policy))
    }

    fn policy(&self) -> &dyn ParamDispatch {
        match self {
            ParamDispatchMode::Broadcast => &Broadcast,
            ParamDispatchMode::OneToOne => &OneToOne,
            ParamDispatchMode::RoundRobin => &RoundRobin,
            ParamDispatchMode::Custom(policy) => policy.as_ref(),
        }
    }
}

impl ParamDispatch for ParamDispatchMode {
    fn expected_dispatch_size(&self, input: &Value, nb_receivers: usize) -> Result<DispatchSize, ParameterDispatchError> {
        self.policy().expected_dispatch_size(input, nb_receivers)
    }

    fn partition(&self, input: &Value, nb_receivers: usize) -> Result<Vec<Value>, ParameterDispatchError> {
        self.policy().partition(input, nb_receivers)
    }

    fn match_types(&self, client: &ParamType, server: &ParamType) -> bool {
        self.policy().match_types(client, server)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i128]) -> Value {
        Value::Array(values.iter().map(|v| Value::Integer(*v)).collect())
    }

    #[test]
    fn broadcast_copies_value() {
        let v = Value::Text("payload".to_owned());
        for n in 1..=8 {
            let parts = Broadcast.partition(&v, n).unwrap();
            assert_eq!(parts.len(), n);
            assert!(parts.iter().all(|p| *p == v));
            assert_eq!(Broadcast.expected_dispatch_size(&v, n).unwrap(), DispatchSize::Flexible(n));
        }
    }

    #[test]
    fn one_to_one_checks_length() {
        let input = ints(&[10, 20, 30]);
        assert_eq!(OneToOne.partition(&input, 3).unwrap(), vec![Value::Integer(10), Value::Integer(20), Value::Integer(30)]);
        assert_eq!(OneToOne.expected_dispatch_size(&input, 3).unwrap(), DispatchSize::Fixed(3));

        for n in [0, 1, 2, 4, 7].iter() {
            assert_eq!(
                OneToOne.partition(&input, *n),
                Err(ParameterDispatchError::LengthMismatch {
                    param: 0,
                    expected: *n,
                    found: 3
                })
            );
            assert!(OneToOne.expected_dispatch_size(&input, *n).is_err());
        }
        assert!(OneToOne.partition(&Value::Integer(1), 1).is_err());
    }

    #[test]
    fn round_robin_covers_every_element_once() {
        for len in 0..12 {
            let values: Vec<i128> = (0..len).collect();
            let input = ints(&values);
            assert_eq!(RoundRobin.expected_dispatch_size(&input, 3).unwrap(), DispatchSize::Fixed(len as usize));
            assert_eq!(RoundRobin.partition(&input, 3).unwrap().len(), len as usize);

            for n in 1..5 {
                let slices = round_robin_slices(&input, n).unwrap();
                assert_eq!(slices.len(), n);
                let mut seen = Vec::new();
                for (receiver, slice) in slices.iter().enumerate() {
                    for element in slice {
                        match element {
                            Value::Integer(i) => {
                                assert_eq!(*i as usize % n, receiver);
                                seen.push(*i);
                            }
                            other => panic!("unexpected {:?}", other),
                        }
                    }
                }
                seen.sort();
                assert_eq!(seen, values);
            }
        }
    }

    #[test]
    fn round_robin_example() {
        let input = Value::Array(["a", "b", "c", "d", "e"].iter().map(|s| Value::Text(s.to_string())).collect());
        let slices = round_robin_slices(&input, 2).unwrap();
        let text = |slice: &Vec<Value>| -> Vec<String> {
            slice
                .iter()
                .map(|v| match v {
                    Value::Text(s) => s.clone(),
                    _ => unreachable!(),
                })
                .collect()
        };
        assert_eq!(text(&slices[0]), vec!["a", "c", "e"]);
        assert_eq!(text(&slices[1]), vec!["b", "d"]);
        assert!(round_robin_slices(&input, 0).is_err());
    }

    /// Splits an integer into `n` nearly equal shares.
    #[derive(Debug)]
    struct Shares;

    impl ParamDispatch for Shares {
        fn expected_dispatch_size(&self, input: &Value, nb_receivers: usize) -> Result<DispatchSize, ParameterDispatchError> {
            match input {
                Value::Integer(_) => Ok(DispatchSize::Flexible(nb_receivers)),
                _ => Err(ParameterDispatchError::Custom("not an integer".to_owned())),
            }
        }

        fn partition(&self, input: &Value, nb_receivers: usize) -> Result<Vec<Value>, ParameterDispatchError> {
            let total = match input {
                Value::Integer(total) => *total,
                _ => return Err(ParameterDispatchError::Custom("not an integer".to_owned())),
            };
            let n = nb_receivers as i128;
            Ok((0..n).map(|i| Value::Integer(total / n + if i < total % n { 1 } else { 0 })).collect())
        }

        fn match_types(&self, client: &ParamType, server: &ParamType) -> bool {
            *client == ParamType::Integer && *server == ParamType::Integer
        }
    }

    #[test]
    fn custom_mode_delegates() {
        let mode = ParamDispatchMode::custom(Shares);
        assert_eq!(mode.partition(&Value::Integer(10), 3).unwrap(), vec![Value::Integer(4), Value::Integer(3), Value::Integer(3)]);
        assert_eq!(mode.expected_dispatch_size(&Value::Integer(10), 3).unwrap(), DispatchSize::Flexible(3));
        assert!(mode.partition(&Value::Null, 3).is_err());
        assert!(mode.match_types(&ParamType::Integer, &ParamType::Integer));
        assert!(!mode.match_types(&ParamType::Text, &ParamType::Integer));
    }

    #[test]
    fn builtin_type_matching() {
        let ints = ParamType::list_of(ParamType::Integer);
        assert!(ParamDispatchMode::Broadcast.match_types(&ints, &ints));
        assert!(!ParamDispatchMode::Broadcast.match_types(&ints, &ParamType::Integer));
        assert!(ParamDispatchMode::OneToOne.match_types(&ints, &ParamType::Integer));
        assert!(ParamDispatchMode::RoundRobin.match_types(&ints, &ParamType::Any));
        assert!(!ParamDispatchMode::RoundRobin.match_types(&ParamType::Integer, &ParamType::Integer));
    }
}

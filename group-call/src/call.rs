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

use crate::dispatch::mode::ParamDispatchMode;
use crate::dispatch::plan::DispatchAnnotation;
use crate::error::CallError;
use serde::Serialize;
use std::sync::Arc;

/// Dynamically typed argument and return value. Sequences are `Value::Array`.
pub use serde_cbor::Value;

/// Shape of a parameter, used to check bindings before any call is made.
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum ParamType {
    Any,
    Null,
    Bool,
    Integer,
    Float,
    Bytes,
    Text,
    List(Box<ParamType>),
    Map,
}

impl ParamType {
    pub fn list_of(element: ParamType) -> Self {
        ParamType::List(Box::new(element))
    }

    /// Whether a value declared as `other` can be received where `self` is declared.
    pub fn accepts(&self, other: &ParamType) -> bool {
        match (self, other) {
            (ParamType::Any, _) | (_, ParamType::Any) => true,
            (ParamType::List(mine), ParamType::List(theirs)) => mine.accepts(theirs),
            (mine, theirs) => mine == theirs,
        }
    }

    pub fn element(&self) -> Option<&ParamType> {
        match self {
            ParamType::List(element) => Some(element),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParamSignature {
    pub name: String,
    pub ty: ParamType,
    /// Parameter-level dispatch mode. Takes priority over the method-level one.
    pub mode: Option<ParamDispatchMode>,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum ReturnKind {
    /// Fire and forget: no result group is built
    OneWay,
    /// One value per generated call, gathered in a `ResultGroup`
    Value,
}

#[derive(Debug, Clone)]
pub struct MethodSignature {
    name: String,
    params: Vec<ParamSignature>,
    returns: ReturnKind,
    method_mode: Option<ParamDispatchMode>,
    dispatch: Option<DispatchAnnotation>,
}

impl MethodSignature {
    pub fn new(name: impl Into<String>) -> Self {
        MethodSignature {
            name: name.into(),
            params: Vec::new(),
            returns: ReturnKind::Value,
            method_mode: None,
            dispatch: None,
        }
    }

    pub fn one_way(name: impl Into<String>) -> Self {
        MethodSignature {
            returns: ReturnKind::OneWay,
            ..Self::new(name)
        }
    }

    pub fn param(mut self, name: impl Into<String>, ty: ParamType) -> Self {
        self.params.push(ParamSignature {
            name: name.into(),
            ty,
            mode: None,
        });
        self
    }

    pub fn dispatched_param(mut self, name: impl Into<String>, ty: ParamType, mode: ParamDispatchMode) -> Self {
        self.params.push(ParamSignature {
            name: name.into(),
            ty,
            mode: Some(mode),
        });
        self
    }

    /// Mode applied to every parameter that does not declare its own.
    pub fn method_mode(mut self, mode: ParamDispatchMode) -> Self {
        self.method_mode = Some(mode);
        self
    }

    pub fn dispatch(mut self, annotation: DispatchAnnotation) -> Self {
        self.dispatch = Some(annotation);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParamSignature] {
        &self.params
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn returns(&self) -> ReturnKind {
        self.returns
    }

    pub fn is_one_way(&self) -> bool {
        self.returns == ReturnKind::OneWay
    }

    pub fn declared_method_mode(&self) -> Option<&ParamDispatchMode> {
        self.method_mode.as_ref()
    }

    pub fn dispatch_annotation(&self) -> Option<DispatchAnnotation> {
        self.dispatch
    }
}

#[derive(Debug, Clone)]
pub struct InterfaceSignature {
    name: String,
    methods: Vec<Arc<MethodSignature>>,
}

impl InterfaceSignature {
    pub fn new(name: impl Into<String>) -> Self {
        InterfaceSignature {
            name: name.into(),
            methods: Vec::new(),
        }
    }

    pub fn method(mut self, method: MethodSignature) -> Self {
        self.methods.push(Arc::new(method));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn methods(&self) -> &[Arc<MethodSignature>] {
        &self.methods
    }

    pub fn find(&self, name: &str) -> Option<&Arc<MethodSignature>> {
        self.methods.iter().find(|m| m.name() == name)
    }
}

/// A method signature with concrete argument values.
///
/// Generated calls share the signature of the call they were derived from and only differ
/// in their arguments.
#[derive(Debug, Clone)]
pub struct MethodCall {
    signature: Arc<MethodSignature>,
    arguments: Vec<Value>,
}

impl MethodCall {
    pub fn new(signature: Arc<MethodSignature>, arguments: Vec<Value>) -> Self {
        MethodCall {
            signature,
            arguments,
        }
    }

    /// Builds a call from a tuple of serializable arguments.
    pub fn encode<S: Serialize>(signature: Arc<MethodSignature>, args: &S) -> Result<Self, serde_cbor::Error> {
        let arguments = match serde_cbor::value::to_value(args)? {
            Value::Array(arguments) => arguments,
            Value::Null => Vec::new(),
            single => vec![single],
        };
        Ok(Self::new(signature, arguments))
    }

    pub fn signature(&self) -> &Arc<MethodSignature> {
        &self.signature
    }

    pub fn method_name(&self) -> &str {
        self.signature.name()
    }

    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    pub fn argument(&self, index: usize) -> Option<&Value> {
        self.arguments.get(index)
    }

    pub fn decode_argument<D: serde::de::DeserializeOwned>(&self, index: usize) -> Result<D, CallError> {
        let value = self.arguments.get(index).cloned().ok_or_else(|| CallError::BadArgument {
            index,
            reason: "missing".to_owned(),
        })?;
        serde_cbor::value::from_value(value).map_err(|e| CallError::BadArgument {
            index,
            reason: e.to_string(),
        })
    }

    pub fn is_one_way(&self) -> bool {
        self.signature.is_one_way()
    }

    pub(crate) fn with_arguments(&self, arguments: Vec<Value>) -> Self {
        MethodCall {
            signature: Arc::clone(&self.signature),
            arguments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_tuple_arguments() {
        let signature = Arc::new(MethodSignature::new("put").param("key", ParamType::Text).param("value", ParamType::Integer));
        let call = MethodCall::encode(signature, &("alpha", 3)).unwrap();
        assert_eq!(call.arguments(), &[Value::Text("alpha".to_owned()), Value::Integer(3)]);
        assert_eq!(call.decode_argument::<i64>(1).unwrap(), 3);
        assert!(call.decode_argument::<i64>(0).is_err());
        assert!(call.decode_argument::<i64>(2).is_err());
    }

    #[test]
    fn list_types_accept_by_element() {
        let ints = ParamType::list_of(ParamType::Integer);
        assert!(ints.accepts(&ParamType::list_of(ParamType::Integer)));
        assert!(ints.accepts(&ParamType::list_of(ParamType::Any)));
        assert!(!ints.accepts(&ParamType::list_of(ParamType::Text)));
        assert!(!ints.accepts(&ParamType::Integer));
        assert_eq!(ints.element(), Some(&ParamType::Integer));
    }
}

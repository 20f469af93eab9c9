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

use crate::task::result::ResultGroup;
use std::fmt;
use thiserror::Error;

/// A parameter could not be split the way its dispatch mode requires.
///
/// Always raised while generating calls, so no member has been invoked yet.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterDispatchError {
    #[error("parameter {param} must be a sequence to be dispatched")]
    NotASequence {
        param: usize,
    },
    #[error("parameter {param} holds {found} elements but {expected} receivers are expected")]
    LengthMismatch {
        param: usize,
        expected: usize,
        found: usize,
    },
    #[error("parameter {param} of `{method}` expects {found} method calls instead of {expected}")]
    SizeMismatch {
        method: String,
        param: usize,
        expected: usize,
        found: usize,
    },
    #[error("`{method}` takes {expected} arguments but {found} were given")]
    Arity {
        method: String,
        expected: usize,
        found: usize,
    },
    #[error("parameter {param} was partitioned into {found} values instead of {expected}")]
    PartitionLength {
        param: usize,
        expected: usize,
        found: usize,
    },
    #[error("cannot route {calls} calls to an empty group")]
    NoReceivers {
        calls: usize,
    },
    #[error("custom dispatch rejected parameter: {0}")]
    Custom(String),
}

impl ParameterDispatchError {
    /// Parameter index attached by the dispatch policy, which only sees the value.
    pub(crate) fn at(self, index: usize) -> Self {
        match self {
            ParameterDispatchError::NotASequence {
                ..
            } => ParameterDispatchError::NotASequence {
                param: index,
            },
            ParameterDispatchError::LengthMismatch {
                expected,
                found,
                ..
            } => ParameterDispatchError::LengthMismatch {
                param: index,
                expected,
                found,
            },
            other => other,
        }
    }
}

/// Failure of one generated call against one member.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CallError {
    #[error("member raised: {0}")]
    Raised(String),
    #[error("member panicked: {0}")]
    Panicked(String),
    #[error("member has no method `{0}`")]
    NoSuchMethod(String),
    #[error("argument {index} cannot be decoded: {reason}")]
    BadArgument {
        index: usize,
        reason: String,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BindingError {
    #[error("no collective interface named `{0}`")]
    NoSuchInterface(String),
    #[error("interface `{0}` is already managed")]
    AlreadyManaged(String),
    #[error("server interface `{server}` has no method matching `{method}`")]
    NoMatchingMethod {
        server: String,
        method: String,
    },
    #[error("parameter {param} of `{method}` cannot be dispatched to the server parameter type")]
    IncompatibleParameter {
        method: String,
        param: usize,
    },
    #[error("member is not bound to `{0}`")]
    NotBound(String),
}

/// Failures of a group call, ordered by generated-call index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExceptionList {
    entries: Vec<(usize, CallError)>,
}

impl ExceptionList {
    pub(crate) fn from_unordered(mut entries: Vec<(usize, CallError)>) -> Self {
        entries.sort_by_key(|(index, _)| *index);
        ExceptionList {
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CallError> {
        self.entries.binary_search_by_key(&index, |(i, _)| *i).ok().map(|position| &self.entries[position].1)
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|(index, _)| *index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(usize, CallError)> {
        self.entries.iter()
    }
}

impl fmt::Display for ExceptionList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (n, (index, error)) in self.entries.iter().enumerate() {
            if n > 0 {
                write!(f, "; ")?;
            }
            write!(f, "#{}: {}", index, error)?;
        }
        Ok(())
    }
}

/// Aggregate failure of a group call: what failed, and what the others returned.
#[derive(Debug)]
pub struct ExceptionListError {
    pub exceptions: ExceptionList,
    /// Results of the call, unset at every failed index
    pub partial: ResultGroup,
}

impl fmt::Display for ExceptionListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} calls failed ({})", self.exceptions.len(), self.partial.len(), self.exceptions)
    }
}

impl std::error::Error for ExceptionListError {}

#[derive(Error, Debug)]
pub enum GroupCallError {
    #[error(transparent)]
    ParameterDispatch(#[from] ParameterDispatchError),
    #[error("no method `{0}` on the group interface")]
    UnknownMethod(String),
    /// A member cannot serve the group interface. Never retried.
    #[error("group member {index} violates its contract: {reason}")]
    ContractViolation {
        index: usize,
        reason: String,
    },
    #[error(transparent)]
    Failed(ExceptionListError),
    #[error("group call timed out with {pending} of {total} tasks outstanding")]
    Timeout {
        pending: usize,
        total: usize,
    },
}

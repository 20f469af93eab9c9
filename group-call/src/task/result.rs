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

use crate::call::Value;
use crate::error::{CallError, ExceptionList};
use crossbeam::queue::SegQueue;
use once_cell::sync::OnceCell;

/// Results of a group call in generated-call order.
///
/// Each slot is written at most once, by the task owning that index, so tasks never
/// contend on it. A slot stays empty when its task failed.
#[derive(Debug)]
pub struct ResultGroup {
    slots: Vec<OnceCell<Value>>,
}

impl ResultGroup {
    pub fn new(size: usize) -> Self {
        ResultGroup {
            slots: (0..size).map(|_| OnceCell::new()).collect(),
        }
    }

    pub(crate) fn set(&self, index: usize, value: Value) -> Result<(), Value> {
        match self.slots.get(index) {
            Some(slot) => slot.set(value),
            None => Err(value),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.slots.get(index).and_then(OnceCell::get)
    }

    pub fn is_set(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Number of slots holding a value.
    pub fn populated(&self) -> usize {
        self.slots.iter().filter(|s| s.get().is_some()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&Value>> {
        self.slots.iter().map(OnceCell::get)
    }

    pub fn decode<D: serde::de::DeserializeOwned>(&self, index: usize) -> Option<Result<D, serde_cbor::Error>> {
        self.get(index).map(|v| serde_cbor::value::from_value(v.clone()))
    }

    pub fn into_values(self) -> Vec<Option<Value>> {
        self.slots.into_iter().map(OnceCell::into_inner).collect()
    }

    pub(crate) fn snapshot(&self) -> Self {
        ResultGroup {
            slots: self
                .slots
                .iter()
                .map(|slot| {
                    let copy = OnceCell::new();
                    if let Some(value) = slot.get() {
                        let _ = copy.set(value.clone());
                    }
                    copy
                })
                .collect(),
        }
    }
}

/// Failures reported concurrently by the tasks of one dispatch.
#[derive(Debug, Default)]
pub(crate) struct ExceptionCollector {
    queue: SegQueue<(usize, CallError)>,
}

impl ExceptionCollector {
    pub(crate) fn record(&self, index: usize, error: CallError) {
        self.queue.push((index, error));
    }

    pub(crate) fn drain(&self) -> ExceptionList {
        let mut entries = Vec::with_capacity(self.queue.len());
        while let Some(entry) = self.queue.pop() {
            entries.push(entry);
        }
        ExceptionList::from_unordered(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_are_write_once() {
        let results = ResultGroup::new(3);
        results.set(2, Value::Integer(2)).unwrap();
        results.set(0, Value::Integer(0)).unwrap();
        assert_eq!(results.set(0, Value::Integer(9)), Err(Value::Integer(9)));
        assert_eq!(results.set(3, Value::Null), Err(Value::Null));

        assert_eq!(results.populated(), 2);
        assert!(!results.is_set(1));
        assert_eq!(results.decode::<i64>(2).unwrap().unwrap(), 2);
        assert!(results.decode::<i64>(1).is_none());
        assert_eq!(results.into_values(), vec![Some(Value::Integer(0)), None, Some(Value::Integer(2))]);
    }

    #[test]
    fn collector_orders_by_index() {
        let collector = ExceptionCollector::default();
        collector.record(4, CallError::Raised("d".to_owned()));
        collector.record(1, CallError::Raised("a".to_owned()));
        let list = collector.drain();
        assert_eq!(list.indices().collect::<Vec<_>>(), vec![1, 4]);
        assert_eq!(list.get(4), Some(&CallError::Raised("d".to_owned())));
        assert!(list.get(2).is_none());
        assert!(collector.drain().is_empty());
    }
}

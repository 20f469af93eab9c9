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

pub mod member;
pub mod multicast;
pub mod proxy;

use member::GroupMember;
use parking_lot::RwLock;

/// Ordered, mutable set of members addressed as one target.
///
/// Membership may change between calls. A call works on the snapshot taken when it
/// starts, so indices are stable for its whole duration.
#[derive(Debug, Default)]
pub struct Group {
    members: RwLock<Vec<GroupMember>>,
}

impl Group {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn from_members(members: Vec<GroupMember>) -> Self {
        Group {
            members: RwLock::new(members),
        }
    }

    pub fn add(&self, member: GroupMember) -> usize {
        let mut members = self.members.write();
        members.push(member);
        members.len() - 1
    }

    /// Returns false if `index` is past the end.
    pub fn insert(&self, index: usize, member: GroupMember) -> bool {
        let mut members = self.members.write();
        if index > members.len() {
            return false
        }
        members.insert(index, member);
        true
    }

    pub fn remove(&self, index: usize) -> Option<GroupMember> {
        let mut members = self.members.write();
        if index < members.len() {
            Some(members.remove(index))
        } else {
            None
        }
    }

    /// Removes the first member referring to the same target as `member`.
    pub fn remove_member(&self, member: &GroupMember) -> bool {
        let mut members = self.members.write();
        match members.iter().position(|m| m.same_as(member)) {
            Some(index) => {
                members.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, index: usize) -> Option<GroupMember> {
        self.members.read().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.members.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.read().is_empty()
    }

    pub fn clear(&self) {
        self.members.write().clear();
    }

    pub fn snapshot(&self) -> Vec<GroupMember> {
        self.members.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::Value;

    fn member(n: i128) -> GroupMember {
        GroupMember::from_fn(move |_| Ok(Value::Integer(n)))
    }

    #[test]
    fn membership_changes() {
        let group = Group::new();
        let first = member(0);
        assert_eq!(group.add(first.clone()), 0);
        assert_eq!(group.add(member(1)), 1);
        assert!(group.insert(1, member(2)));
        assert!(!group.insert(4, member(3)));
        assert_eq!(group.len(), 3);

        let snapshot = group.snapshot();
        assert!(group.remove_member(&first));
        assert!(!group.remove_member(&first));
        assert_eq!(group.len(), 2);
        assert_eq!(snapshot.len(), 3);

        assert!(group.remove(5).is_none());
        assert!(group.remove(0).is_some());
        group.clear();
        assert!(group.is_empty());
    }
}

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

use parking_lot::Mutex;

#[derive(Debug, Default, Clone, Copy)]
struct MemberLoad {
    in_flight: usize,
    served: usize,
}

/// Load of each member during one dynamic dispatch.
#[derive(Debug)]
pub struct DispatchMonitor {
    loads: Mutex<Vec<MemberLoad>>,
}

impl DispatchMonitor {
    pub fn new(nb_members: usize) -> Self {
        DispatchMonitor {
            loads: Mutex::new(vec![MemberLoad::default(); nb_members]),
        }
    }

    pub fn acquire(&self, member: usize) {
        if let Some(load) = self.loads.lock().get_mut(member) {
            load.in_flight += 1;
        }
    }

    /// Picks the member with the fewest calls in flight, then the fewest served, then the
    /// lowest index, and marks it busy.
    pub fn acquire_least_loaded(&self) -> usize {
        let mut loads = self.loads.lock();
        let chosen = loads
            .iter()
            .enumerate()
            .min_by_key(|(index, load)| (load.in_flight, load.served, *index))
            .map(|(index, _)| index)
            .unwrap_or(0);
        if let Some(load) = loads.get_mut(chosen) {
            load.in_flight += 1;
        }
        chosen
    }

    pub fn release(&self, member: usize) {
        if let Some(load) = self.loads.lock().get_mut(member) {
            load.in_flight = load.in_flight.saturating_sub(1);
            load.served += 1;
        }
    }

    /// Calls completed by each member so far.
    pub fn served(&self) -> Vec<usize> {
        self.loads.lock().iter().map(|l| l.served).collect()
    }
}

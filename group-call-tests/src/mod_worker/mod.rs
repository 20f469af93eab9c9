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

mod impls;

use crate::module_library::Config;
use crate::services::WORK;
use group_call::{Component, Invoke};
use impls::WorkService;
use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
struct WorkerArgs {
    factor: u64,
    /// Heavier jobs are refused
    max_weight: Option<u32>,
}

pub struct WorkerContext {
    name: String,
    factor: u64,
    max_weight: Option<u32>,
    served: Mutex<Vec<u32>>,
}

/// A component serving the work interface.
pub struct Worker {
    ctx: Arc<WorkerContext>,
    work: Arc<dyn Invoke>,
}

impl Worker {
    pub fn new(config: &Config) -> Result<Arc<Self>, serde_cbor::Error> {
        let args: WorkerArgs = serde_cbor::from_slice(&config.args)?;
        let ctx = Arc::new(WorkerContext {
            name: config.id.clone(),
            factor: args.factor,
            max_weight: args.max_weight,
            served: Mutex::new(Vec::new()),
        });
        let work: Arc<dyn Invoke> = Arc::new(WorkService {
            ctx: Arc::clone(&ctx),
        });
        Ok(Arc::new(Worker {
            ctx,
            work,
        }))
    }

    /// Jobs served since the last reset, sorted by id.
    pub fn served(&self) -> Vec<u32> {
        let mut served = self.ctx.served.lock().clone();
        served.sort_unstable();
        served
    }
}

impl Component for Worker {
    fn name(&self) -> &str {
        &self.ctx.name
    }

    fn interface(&self, name: &str) -> Option<Arc<dyn Invoke>> {
        if name == WORK {
            Some(Arc::clone(&self.work))
        } else {
            None
        }
    }
}

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

use crate::module_library::Config;
use crate::services::{work_collective, work_server, Job, Report, WORK};
use crate::Worker;
use group_call::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MasterError {
    #[error(transparent)]
    Call(#[from] GroupCallError),
    #[error(transparent)]
    Binding(#[from] BindingError),
    #[error("malformed work message: {0}")]
    Encoding(#[from] serde_cbor::Error),
}

/// A component distributing jobs over every worker bound to its work interface.
pub struct Master {
    controller: Arc<MulticastController>,
    work: GroupProxy,
}

impl Master {
    /// `config.args` is the CBOR-encoded `GroupConfig` of the master.
    pub fn new(config: &Config) -> Result<Self, MasterError> {
        let group_config = GroupConfig::from_cbor(&config.args)?;
        let controller = Arc::new(MulticastController::new(config.id.clone(), group_config));
        controller.add_interface(work_collective())?;
        let work = controller.proxy(WORK)?;
        Ok(Master {
            controller,
            work,
        })
    }

    pub fn attach(&self, worker: &Arc<Worker>) -> Result<(), MasterError> {
        self.attach_serving(Arc::clone(worker) as Arc<dyn Component>, &work_server())
    }

    /// Binds a component whose work interface has the given signature.
    pub fn attach_serving(&self, component: Arc<dyn Component>, server: &InterfaceSignature) -> Result<(), MasterError> {
        let name = component.name().to_owned();
        self.controller.bind(WORK, GroupMember::component(component, WORK), server)?;
        log::debug!("{} attached, {} workers", name, self.workers());
        Ok(())
    }

    pub fn detach(&self, worker: &Arc<Worker>) -> Result<(), MasterError> {
        let member = GroupMember::component(Arc::clone(worker) as Arc<dyn Component>, WORK);
        self.controller.unbind(WORK, &member)?;
        Ok(())
    }

    pub fn workers(&self) -> usize {
        self.work.group().len()
    }

    pub fn set_dispatch_mode(&self, mode: DispatchMode, buffer_size: usize) {
        self.work.set_dispatch_mode(mode, buffer_size);
    }

    /// Spreads `jobs` over the workers, one job per call.
    pub fn compute(&self, jobs: &[Job]) -> Result<Vec<Report>, MasterError> {
        self.call("compute", &(jobs,))
    }

    /// Gives job `i` to worker `i`. There must be exactly one job per worker.
    pub fn assign(&self, jobs: &[Job], round: u64) -> Result<Vec<Report>, MasterError> {
        self.call("assign", &(jobs, round))
    }

    pub fn reset(&self) -> Result<(), MasterError> {
        let call = self.work.method_call("reset", Vec::new())?;
        self.work.invoke(call)?;
        Ok(())
    }

    /// Number of jobs each worker has served since its last reset.
    pub fn served(&self) -> Result<Vec<u64>, MasterError> {
        self.call("served", &())
    }

    fn call<A: Serialize, R: DeserializeOwned>(&self, method: &str, args: &A) -> Result<Vec<R>, MasterError> {
        let signature = Arc::clone(self.work.method_call(method, Vec::new())?.signature());
        let reply = self.work.invoke(MethodCall::encode(signature, args)?)?;
        let results = match reply.into_results() {
            Some(results) => results,
            None => return Ok(Vec::new()),
        };
        let mut decoded = Vec::with_capacity(results.len());
        for value in results.into_values().into_iter().flatten() {
            decoded.push(serde_cbor::value::from_value(value)?);
        }
        Ok(decoded)
    }
}

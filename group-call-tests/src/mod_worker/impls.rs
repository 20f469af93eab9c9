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

use super::WorkerContext;
use crate::services::{Job, Report};
use group_call::{CallError, Invoke, MethodCall, Value};
use std::sync::Arc;

pub struct WorkService {
    pub ctx: Arc<WorkerContext>,
}

impl WorkService {
    fn run(&self, job: Job, round: u64) -> Result<Value, CallError> {
        if let Some(max_weight) = self.ctx.max_weight {
            if job.weight > max_weight {
                return Err(CallError::Raised(format!(
                    "{} cannot take job {} of weight {}",
                    self.ctx.name, job.id, job.weight
                )))
            }
        }
        self.ctx.served.lock().push(job.id);
        let report = Report {
            worker: self.ctx.name.clone(),
            job: job.id,
            output: u64::from(job.weight) * self.ctx.factor + round,
        };
        serde_cbor::value::to_value(&report).map_err(|e| CallError::Raised(e.to_string()))
    }
}

impl Invoke for WorkService {
    fn invoke(&self, call: &MethodCall) -> Result<Value, CallError> {
        match call.method_name() {
            "compute" => self.run(call.decode_argument(0)?, 0),
            "assign" => self.run(call.decode_argument(0)?, call.decode_argument(1)?),
            "reset" => {
                self.ctx.served.lock().clear();
                Ok(Value::Null)
            }
            "served" => Ok(Value::Integer(self.ctx.served.lock().len() as i128)),
            other => Err(CallError::NoSuchMethod(other.to_owned())),
        }
    }
}

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

use group_call::{InterfaceSignature, MethodSignature, ParamDispatchMode, ParamType};
use serde::{Deserialize, Serialize};

pub const WORK: &str = "work";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Job {
    pub id: u32,
    pub weight: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Report {
    pub worker: String,
    pub job: u32,
    pub output: u64,
}

fn job() -> ParamType {
    ParamType::Map
}

/// The work interface as the master calls it
pub fn work_collective() -> InterfaceSignature {
    InterfaceSignature::new(WORK)
        .method(MethodSignature::new("compute").dispatched_param(
            "jobs",
            ParamType::list_of(job()),
            ParamDispatchMode::RoundRobin,
        ))
        .method(
            MethodSignature::new("assign")
                .dispatched_param("jobs", ParamType::list_of(job()), ParamDispatchMode::OneToOne)
                .param("round", ParamType::Integer),
        )
        .method(MethodSignature::one_way("reset"))
        .method(MethodSignature::new("served"))
}

/// The work interface as each worker serves it
pub fn work_server() -> InterfaceSignature {
    InterfaceSignature::new(WORK)
        .method(MethodSignature::new("compute").param("job", job()))
        .method(MethodSignature::new("assign").param("job", job()).param("round", ParamType::Integer))
        .method(MethodSignature::one_way("reset"))
        .method(MethodSignature::new("served"))
}

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

use serde::Serialize;

pub struct Config {
    /// Name of this instance of the component
    pub id: String,
    /// CBOR-encoded arguments given to the component
    pub args: Vec<u8>,
}

impl Config {
    pub fn encode<A: Serialize>(id: &str, args: &A) -> Result<Self, serde_cbor::Error> {
        Ok(Config {
            id: id.to_owned(),
            args: serde_cbor::to_vec(args)?,
        })
    }
}

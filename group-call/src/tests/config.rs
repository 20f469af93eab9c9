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

use crate::{DispatchMode, GroupConfig, GroupKind, GroupProxy, InterfaceSignature};
use std::sync::Arc;

#[test]
fn config_fields_default_when_absent() {
    let config: GroupConfig = serde_json::from_str(r#"{"member_to_thread_ratio": 2, "call_timeout_ms": 150}"#).unwrap();
    assert_eq!(config.member_to_thread_ratio, 2);
    assert_eq!(config.additional_threads, 3);
    assert_eq!(config.buffer_size, 1);
    assert_eq!(config.call_timeout(), Some(std::time::Duration::from_millis(150)));
    assert_eq!(config.thread_name, "group-dispatch");
    assert_eq!(config.dispatch_mode, DispatchMode::Static);
    assert_eq!(config.optimal_pool_size(5), 6);
}

#[test]
fn config_from_cbor() {
    let config = GroupConfig {
        buffer_size: 4,
        thread_name: "workers".to_owned(),
        ..Default::default()
    };
    let encoded = serde_cbor::to_vec(&config).unwrap();
    assert_eq!(GroupConfig::from_cbor(&encoded).unwrap(), config);
    assert!(GroupConfig::from_cbor(b"\xff").is_err());
}

#[test]
fn pool_size_follows_member_ratio() {
    let config = GroupConfig::default();
    assert_eq!(config.optimal_pool_size(0), 3);
    assert_eq!(config.optimal_pool_size(1), 4);
    assert_eq!(config.optimal_pool_size(8), 5);
    assert_eq!(config.optimal_pool_size(9), 6);

    let config = GroupConfig {
        member_to_thread_ratio: 0,
        ..Default::default()
    };
    assert_eq!(config.optimal_pool_size(100), 3);
}

#[test]
fn huge_ratio_from_config() {
    let config: GroupConfig = serde_json::from_str(&format!(r#"{{"member_to_thread_ratio": {}}}"#, usize::MAX)).unwrap();
    assert_eq!(config.optimal_pool_size(0), 3);
    assert_eq!(config.optimal_pool_size(5), 4);
    assert_eq!(config.optimal_pool_size(usize::MAX), 4);

    let config = GroupConfig {
        additional_threads: usize::MAX,
        ..Default::default()
    };
    assert_eq!(config.optimal_pool_size(8), usize::MAX);
}

#[test]
fn dispatch_mode_from_config() {
    let config: GroupConfig = serde_json::from_str(r#"{"dispatch_mode": "Dynamic", "buffer_size": 3}"#).unwrap();
    let proxy = GroupProxy::new(&InterfaceSignature::new("empty"), GroupKind::Plain, Arc::default(), config);
    assert_eq!(proxy.dispatch_mode().mode, DispatchMode::Dynamic);
    assert_eq!(proxy.dispatch_mode().buffer_size, 3);
}

/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

pub mod atomic;
pub mod domain;

pub const CHANNEL_PROTOCOL_REGISTER_SUCCEEDED: &str = "registry.protocol.register_succeeded";
pub const CHANNEL_PROTOCOL_REGISTER_REJECTED: &str = "registry.protocol.register_rejected";
pub const CHANNEL_PROTOCOL_UNREGISTER_SUCCEEDED: &str = "registry.protocol.unregister_succeeded";
pub const CHANNEL_PROTOCOL_UNREGISTER_REJECTED: &str = "registry.protocol.unregister_rejected";
pub const CHANNEL_PROTOCOL_INTERCEPT_SUCCEEDED: &str = "registry.protocol.intercept_succeeded";
pub const CHANNEL_PROTOCOL_INTERCEPT_REJECTED: &str = "registry.protocol.intercept_rejected";
pub const CHANNEL_PROTOCOL_UNINTERCEPT_SUCCEEDED: &str = "registry.protocol.unintercept_succeeded";
pub const CHANNEL_PROTOCOL_UNINTERCEPT_REJECTED: &str = "registry.protocol.unintercept_rejected";
pub const CHANNEL_LOADER_FACTORIES_BUILT: &str = "registry.loader.factories_built";
pub const CHANNEL_LOADER_INTERCEPT_OVERRIDE: &str = "registry.loader.intercept_override";
pub const CHANNEL_PRIVILEGE_TABLE_FROZEN: &str = "registry.privilege.table_frozen";

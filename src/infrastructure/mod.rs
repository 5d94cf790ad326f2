// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod memory_store;
pub mod sqlite_store;
pub mod webhook_notifier;

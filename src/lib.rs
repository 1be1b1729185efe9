// Copyright (c) 2024-present, arana-db Community.  All rights reserved.
//
// Licensed to the Apache Software Foundation (ASF) under one or more
// contributor license agreements.  See the NOTICE file distributed with
// this work for additional information regarding copyright ownership.
// The ASF licenses this file to You under the Apache License, Version 2.0
// (the "License"); you may not use this file except in compliance with
// the License.  You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Redis-compatible sorted set engine on top of RocksDB.
//!
//! A sorted set is spread over three column families: one meta row per set
//! (generation, cardinality, expiry), one member-to-score row per element,
//! and one score-ordered row per element kept sorted by a custom comparator
//! so score ranges are native seeks. Logical deletes bump the generation and
//! leave the element rows for the compaction filters to reap.

mod coding;
mod custom_comparator;
mod data_compaction_filter;
mod error;
mod lock_mgr;
mod meta_compaction_filter;
mod options;
mod redis;
mod redis_zsets;
mod score_compaction_filter;
mod storage_define;
mod types;
mod util;
mod zscan_cursor_store;
mod zsets_member_key_format;
mod zsets_meta_value_format;
mod zsets_score_key_format;

pub use error::{Error, Result};
pub use lock_mgr::{LockMgr, ScopeRecordLock};
pub use options::StorageOptions;
pub use redis::{ColumnFamilyIndex, ZSets};
pub use types::{Aggregate, KeyScanResult, KeyVersion, ScoreMember};

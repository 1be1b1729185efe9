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

use bytes::BytesMut;
use chrono::Utc;
use rocksdb::{
    CompactionDecision, compaction_filter::CompactionFilter,
    compaction_filter_factory::CompactionFilterFactory,
};

use crate::zsets_meta_value_format::ParsedZSetsMetaValue;

const META_FILTER_NAME: &std::ffi::CStr = c"ZSetsMetaCompactionFilter";
const META_FILTER_FACTORY_NAME: &std::ffi::CStr = c"ZSetsMetaCompactionFilterFactory";

/// Reaps meta rows of sorted sets that are gone: TTL passed, or the set was
/// logically deleted (count zeroed) in an earlier version tick.
#[derive(Debug, Default)]
pub struct ZSetsMetaFilter;

impl CompactionFilter for ZSetsMetaFilter {
    fn name(&self) -> &std::ffi::CStr {
        META_FILTER_NAME
    }

    fn filter(&mut self, _level: u32, key: &[u8], value: &[u8]) -> CompactionDecision {
        if value.is_empty() {
            log::warn!("Empty meta value for key {key:?}, remove.");
            return CompactionDecision::Remove;
        }

        let parsed = match ParsedZSetsMetaValue::new(BytesMut::from(value)) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("Failed to parse meta value for key {key:?}: {e}, remove.");
                return CompactionDecision::Remove;
            }
        };

        if parsed.is_stale() {
            return CompactionDecision::Remove;
        }

        // An emptied set keeps its meta row until the version tick has
        // passed, so a writer racing in the same tick still sees it.
        let now_tick = Utc::now().timestamp() as u32;
        if parsed.count() == 0 && parsed.version() < now_tick {
            return CompactionDecision::Remove;
        }

        CompactionDecision::Keep
    }
}

#[derive(Debug, Default)]
pub struct ZSetsMetaFilterFactory;

impl CompactionFilterFactory for ZSetsMetaFilterFactory {
    type Filter = ZSetsMetaFilter;

    fn create(
        &mut self,
        _context: rocksdb::compaction_filter_factory::CompactionFilterContext,
    ) -> Self::Filter {
        ZSetsMetaFilter
    }

    fn name(&self) -> &std::ffi::CStr {
        META_FILTER_FACTORY_NAME
    }
}

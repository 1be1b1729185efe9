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

use std::sync::{Arc, Weak};

use bytes::BytesMut;
use chrono::Utc;
use once_cell::sync::OnceCell;
use rocksdb::{
    CompactionDecision, DB, DEFAULT_COLUMN_FAMILY_NAME, compaction_filter::CompactionFilter,
    compaction_filter_factory::CompactionFilterFactory,
};

use crate::zsets_member_key_format::ParsedZSetsMemberKey;
use crate::zsets_meta_value_format::ParsedZSetsMetaValue;

const DATA_FILTER_NAME: &std::ffi::CStr = c"ZSetsDataCompactionFilter";
const DATA_FILTER_FACTORY_NAME: &std::ffi::CStr = c"ZSetsDataCompactionFilterFactory";

#[derive(Debug)]
pub(crate) enum MetaLookup {
    Valid,
    NotFound,
    Unavailable,
}

/// Meta-row lookup shared by the data and score filters. Caches the result
/// for the user key currently being compacted, since rows of one set arrive
/// in runs.
pub(crate) struct MetaLookupCache {
    db: Option<Arc<DB>>,
    cur_key: BytesMut,
    primed: bool,
    meta_not_found: bool,
    cur_meta_version: u32,
    cur_meta_timestamp: i32,
}

impl MetaLookupCache {
    pub(crate) fn new(db: Option<Arc<DB>>) -> Self {
        Self {
            db,
            cur_key: BytesMut::new(),
            primed: false,
            meta_not_found: false,
            cur_meta_version: 0,
            cur_meta_timestamp: 0,
        }
    }

    fn ensure_meta_state(&mut self, user_key: &[u8]) -> MetaLookup {
        if !self.primed || self.cur_key.as_ref() != user_key {
            self.primed = true;
            self.cur_key = BytesMut::from(user_key);
            self.meta_not_found = false;
            self.cur_meta_version = 0;
            self.cur_meta_timestamp = 0;

            let Some(db) = &self.db else {
                return MetaLookup::Unavailable;
            };
            let Some(cf) = db.cf_handle(DEFAULT_COLUMN_FAMILY_NAME) else {
                return MetaLookup::Unavailable;
            };

            match db.get_cf(&cf, user_key) {
                Ok(Some(v)) => match ParsedZSetsMetaValue::new(BytesMut::from(&v[..])) {
                    Ok(meta) => {
                        self.cur_meta_version = meta.version();
                        self.cur_meta_timestamp = meta.timestamp();
                    }
                    Err(e) => {
                        log::debug!("meta parse failed for key {user_key:?}: {e}");
                        self.meta_not_found = true;
                    }
                },
                Ok(None) => self.meta_not_found = true,
                Err(e) => {
                    log::warn!("failed to read meta for key {user_key:?}: {e}");
                    return MetaLookup::Unavailable;
                }
            }
        }

        if self.meta_not_found {
            MetaLookup::NotFound
        } else {
            MetaLookup::Valid
        }
    }

    /// Decide the fate of a data/score row carrying `row_version`. A row
    /// newer than the visible meta means this view is behind the writer, so
    /// the row must be kept.
    pub(crate) fn decide(&mut self, user_key: &[u8], row_version: u32) -> CompactionDecision {
        match self.ensure_meta_state(user_key) {
            MetaLookup::Unavailable => CompactionDecision::Keep,
            MetaLookup::NotFound => CompactionDecision::Remove,
            MetaLookup::Valid => {
                let now = Utc::now().timestamp();
                if self.cur_meta_timestamp != 0 && (self.cur_meta_timestamp as i64) <= now {
                    return CompactionDecision::Remove;
                }
                if self.cur_meta_version > row_version {
                    return CompactionDecision::Remove;
                }
                CompactionDecision::Keep
            }
        }
    }
}

/// Reaps member-to-score rows whose generation was superseded or whose set
/// is gone.
pub struct ZSetsDataFilter {
    meta: MetaLookupCache,
}

impl ZSetsDataFilter {
    pub fn new(db: Option<Arc<DB>>) -> Self {
        Self {
            meta: MetaLookupCache::new(db),
        }
    }
}

impl CompactionFilter for ZSetsDataFilter {
    fn name(&self) -> &std::ffi::CStr {
        DATA_FILTER_NAME
    }

    fn filter(&mut self, _level: u32, key: &[u8], _value: &[u8]) -> CompactionDecision {
        let Ok(parsed) = ParsedZSetsMemberKey::new(key) else {
            // not one of ours; leave it alone
            return CompactionDecision::Keep;
        };
        self.meta.decide(parsed.key(), parsed.version())
    }
}

pub struct ZSetsDataFilterFactory {
    db: Arc<OnceCell<Weak<DB>>>,
}

impl ZSetsDataFilterFactory {
    pub fn new(db: Arc<OnceCell<Weak<DB>>>) -> Self {
        Self { db }
    }
}

impl CompactionFilterFactory for ZSetsDataFilterFactory {
    type Filter = ZSetsDataFilter;

    fn create(
        &mut self,
        _context: rocksdb::compaction_filter_factory::CompactionFilterContext,
    ) -> Self::Filter {
        let db = self.db.get().and_then(Weak::upgrade);
        ZSetsDataFilter::new(db)
    }

    fn name(&self) -> &std::ffi::CStr {
        DATA_FILTER_FACTORY_NAME
    }
}

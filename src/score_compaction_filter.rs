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

use once_cell::sync::OnceCell;
use rocksdb::{
    CompactionDecision, DB, compaction_filter::CompactionFilter,
    compaction_filter_factory::CompactionFilterFactory,
};

use crate::data_compaction_filter::MetaLookupCache;
use crate::zsets_score_key_format::ParsedZSetsScoreKey;

const SCORE_FILTER_NAME: &std::ffi::CStr = c"ZSetsScoreCompactionFilter";
const SCORE_FILTER_FACTORY_NAME: &std::ffi::CStr = c"ZSetsScoreCompactionFilterFactory";

/// Reaps score-ordered rows, symmetric to the data filter but parsing the
/// score key layout.
pub struct ZSetsScoreFilter {
    meta: MetaLookupCache,
}

impl ZSetsScoreFilter {
    pub fn new(db: Option<Arc<DB>>) -> Self {
        Self {
            meta: MetaLookupCache::new(db),
        }
    }
}

impl CompactionFilter for ZSetsScoreFilter {
    fn name(&self) -> &std::ffi::CStr {
        SCORE_FILTER_NAME
    }

    fn filter(&mut self, _level: u32, key: &[u8], _value: &[u8]) -> CompactionDecision {
        let Ok(parsed) = ParsedZSetsScoreKey::new(key) else {
            return CompactionDecision::Keep;
        };
        self.meta.decide(parsed.key(), parsed.version())
    }
}

pub struct ZSetsScoreFilterFactory {
    db: Arc<OnceCell<Weak<DB>>>,
}

impl ZSetsScoreFilterFactory {
    pub fn new(db: Arc<OnceCell<Weak<DB>>>) -> Self {
        Self { db }
    }
}

impl CompactionFilterFactory for ZSetsScoreFilterFactory {
    type Filter = ZSetsScoreFilter;

    fn create(
        &mut self,
        _context: rocksdb::compaction_filter_factory::CompactionFilterContext,
    ) -> Self::Filter {
        let db = self.db.get().and_then(Weak::upgrade);
        ZSetsScoreFilter::new(db)
    }

    fn name(&self) -> &std::ffi::CStr {
        SCORE_FILTER_FACTORY_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zsets_score_key_format::ZSetsScoreKey;

    #[test]
    fn test_detached_filter_keeps_everything() {
        let mut filter = ZSetsScoreFilter::new(None);
        let key = ZSetsScoreKey::new(b"k", 3, 1.5, b"member").encode();
        let decision = filter.filter(0, &key, b"");
        assert!(matches!(decision, CompactionDecision::Keep));
    }

    #[test]
    fn test_short_key_is_kept() {
        let mut filter = ZSetsScoreFilter::new(None);
        let decision = filter.filter(0, b"tiny", b"");
        assert!(matches!(decision, CompactionDecision::Keep));
    }
}

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
    BlockBasedOptions, BoundColumnFamily, ColumnFamilyDescriptor, CompactOptions, DB, Options,
    WriteOptions,
};
use snafu::{OptionExt, ResultExt};

use crate::custom_comparator::{zsets_score_key_compare, zsets_score_key_comparator_name};
use crate::data_compaction_filter::ZSetsDataFilterFactory;
use crate::error::{OptionNoneSnafu, Result, RocksSnafu, UnknownSnafu};
use crate::lock_mgr::LockMgr;
use crate::meta_compaction_filter::ZSetsMetaFilterFactory;
use crate::options::StorageOptions;
use crate::score_compaction_filter::ZSetsScoreFilterFactory;
use crate::zscan_cursor_store::ZScanCursorStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnFamilyIndex {
    MetaCF = 0,  // one row per live sorted set
    DataCF = 1,  // member -> score
    ScoreCF = 2, // (score, member) ordered by the custom comparator
}

impl ColumnFamilyIndex {
    pub fn name(&self) -> &'static str {
        match self {
            ColumnFamilyIndex::MetaCF => "default",
            ColumnFamilyIndex::DataCF => "data_cf",
            ColumnFamilyIndex::ScoreCF => "score_cf",
        }
    }
}

/// Sorted set engine over three column families of one RocksDB instance.
pub struct ZSets {
    pub(crate) db: Option<Arc<DB>>,
    pub(crate) lock_mgr: Arc<LockMgr>,
    pub(crate) write_options: WriteOptions,
    pub(crate) compact_options: CompactOptions,
    pub(crate) zscan_cursors_store: ZScanCursorStore,

    storage: Arc<StorageOptions>,
    // handed to the data/score filter factories; Weak so the factories kept
    // alive inside the DB cannot keep the DB alive in turn
    filter_db: Arc<OnceCell<Weak<DB>>>,
}

impl ZSets {
    pub fn new(storage: Arc<StorageOptions>, lock_mgr: Arc<LockMgr>) -> Self {
        let mut compact_options = CompactOptions::default();
        compact_options.set_change_level(true);
        compact_options.set_exclusive_manual_compaction(false);

        let zscan_cursors_store = ZScanCursorStore::new(storage.zscan_cursors_capacity);

        Self {
            db: None,
            lock_mgr,
            write_options: WriteOptions::default(),
            compact_options,
            zscan_cursors_store,
            storage,
            filter_db: Arc::new(OnceCell::new()),
        }
    }

    /// Open the database at `db_path`.
    ///
    /// A fresh path is bootstrapped in two phases: the first open creates
    /// `data_cf` and `score_cf` (the score family already carries the custom
    /// comparator, which RocksDB persists as part of the family identity) and
    /// closes again. The real open then attaches the compaction filters, the
    /// comparator and the Bloom-filter table options to all three families.
    pub fn open(&mut self, db_path: &str) -> Result<()> {
        if let Ok(db) = DB::open(&self.storage.options, db_path) {
            db.create_cf(ColumnFamilyIndex::DataCF.name(), &Options::default())
                .context(RocksSnafu)?;
            let mut score_cf_opts = Options::default();
            score_cf_opts.set_comparator(
                zsets_score_key_comparator_name(),
                Box::new(zsets_score_key_compare),
            );
            db.create_cf(ColumnFamilyIndex::ScoreCF.name(), &score_cf_opts)
                .context(RocksSnafu)?;
        }

        let mut meta_cf_opts = Self::create_cf_options(&self.storage);
        meta_cf_opts.set_compaction_filter_factory(ZSetsMetaFilterFactory);

        let mut data_cf_opts = Self::create_cf_options(&self.storage);
        data_cf_opts
            .set_compaction_filter_factory(ZSetsDataFilterFactory::new(self.filter_db.clone()));

        let mut score_cf_opts = Self::create_cf_options(&self.storage);
        score_cf_opts
            .set_compaction_filter_factory(ZSetsScoreFilterFactory::new(self.filter_db.clone()));
        score_cf_opts.set_comparator(
            zsets_score_key_comparator_name(),
            Box::new(zsets_score_key_compare),
        );

        let column_families = vec![
            ColumnFamilyDescriptor::new(ColumnFamilyIndex::MetaCF.name(), meta_cf_opts),
            ColumnFamilyDescriptor::new(ColumnFamilyIndex::DataCF.name(), data_cf_opts),
            ColumnFamilyDescriptor::new(ColumnFamilyIndex::ScoreCF.name(), score_cf_opts),
        ];

        let db = Arc::new(
            DB::open_cf_descriptors(&self.storage.options, db_path, column_families)
                .context(RocksSnafu)?,
        );

        self.filter_db.set(Arc::downgrade(&db)).ok();
        self.db = Some(db);
        log::debug!("opened sorted set db at {db_path}");

        Ok(())
    }

    fn create_cf_options(storage: &StorageOptions) -> Options {
        let mut cf_opts = storage.options.clone();
        let mut table_opts = BlockBasedOptions::default();

        // 10 bits/key, whole-key filtering
        table_opts.set_bloom_filter(10.0, true);

        if !storage.share_block_cache && storage.block_cache_size > 0 {
            let cache = rocksdb::Cache::new_lru_cache(storage.block_cache_size);
            table_opts.set_block_cache(&cache);
        }

        cf_opts.set_block_based_table_factory(&table_opts);
        cf_opts
    }

    /// Manual compaction over all three column families, meta first so the
    /// data/score filters observe the freshest meta state.
    pub fn compact_range(&self, begin: Option<&[u8]>, end: Option<&[u8]>) -> Result<()> {
        let db = self.db_ref()?;
        for index in [
            ColumnFamilyIndex::MetaCF,
            ColumnFamilyIndex::DataCF,
            ColumnFamilyIndex::ScoreCF,
        ] {
            let cf = self.cf_handle(index)?;
            db.compact_range_cf_opt(&cf, begin, end, &self.compact_options);
        }
        Ok(())
    }

    pub fn get_property(&self, property: &str) -> Result<u64> {
        let db = self.db_ref()?;
        if let Some(value) = db.property_int_value(property).context(RocksSnafu)? {
            return Ok(value);
        }

        UnknownSnafu {
            message: format!("Property {property} not found"),
        }
        .fail()
    }

    pub fn get_cf_handle(&self, cf_index: ColumnFamilyIndex) -> Option<Arc<BoundColumnFamily>> {
        self.db
            .as_ref()
            .and_then(|db| db.cf_handle(cf_index.name()))
    }

    pub(crate) fn db_ref(&self) -> Result<&Arc<DB>> {
        self.db.as_ref().context(OptionNoneSnafu {
            message: "db is not initialized".to_string(),
        })
    }

    pub(crate) fn cf_handle(&self, cf_index: ColumnFamilyIndex) -> Result<Arc<BoundColumnFamily>> {
        self.get_cf_handle(cf_index).context(OptionNoneSnafu {
            message: format!("column family {} is not initialized", cf_index.name()),
        })
    }
}

impl Drop for ZSets {
    fn drop(&mut self) {
        if let Some(db) = self.db.take() {
            db.cancel_all_background_work(true);
        }
    }
}

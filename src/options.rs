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

//! Storage engine options

use rocksdb::Options;

pub struct StorageOptions {
    /// Base RocksDB options, cloned into every column family.
    pub options: Options,
    /// Block cache size in bytes; 0 leaves the RocksDB default in place.
    pub block_cache_size: usize,
    /// Whether all column families share one block cache.
    pub share_block_cache: bool,
    /// Capacity of the ZSCAN cursor side table.
    pub zscan_cursors_capacity: usize,
    /// Shard count of the record-lock table.
    pub lock_shard_num: usize,
}

impl Default for StorageOptions {
    fn default() -> Self {
        let mut options = Options::default();
        options.create_if_missing(true);
        options.set_max_open_files(10000);
        options.set_write_buffer_size(64 << 20); // 64MB
        options.set_max_write_buffer_number(3);
        options.set_target_file_size_base(64 << 20); // 64MB
        options.set_level_compaction_dynamic_level_bytes(true);

        Self {
            options,
            block_cache_size: 0,
            share_block_cache: true,
            zscan_cursors_capacity: 5000,
            lock_shard_num: 1000,
        }
    }
}

impl StorageOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_block_cache_size(&mut self, size: usize) -> &mut Self {
        self.block_cache_size = size;
        self
    }

    pub fn set_share_block_cache(&mut self, share: bool) -> &mut Self {
        self.share_block_cache = share;
        self
    }

    pub fn set_zscan_cursors_capacity(&mut self, capacity: usize) -> &mut Self {
        self.zscan_cursors_capacity = capacity;
        self
    }
}

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

//! Per-record lock manager. Writers to the same user key serialize here;
//! distinct keys map to independent shard slots and proceed in parallel.

use std::{
    collections::{HashSet, hash_map::DefaultHasher},
    hash::{Hash, Hasher},
    sync::Arc,
};

use parking_lot::{Condvar, Mutex};

struct LockMapShard {
    mutex: Mutex<HashSet<Vec<u8>>>,
    condvar: Condvar,
}

impl LockMapShard {
    fn new() -> Self {
        Self {
            mutex: Mutex::new(HashSet::new()),
            condvar: Condvar::new(),
        }
    }
}

pub struct LockMgr {
    shards: Vec<Arc<LockMapShard>>,
}

impl LockMgr {
    pub fn new(num_shards: usize) -> Self {
        Self {
            shards: (0..num_shards.max(1))
                .map(|_| Arc::new(LockMapShard::new()))
                .collect(),
        }
    }

    #[inline]
    fn shard_for(&self, key: &[u8]) -> &Arc<LockMapShard> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.shards[hasher.finish() as usize % self.shards.len()]
    }

    /// Block until the key is free, then take it.
    pub fn lock(&self, key: &[u8]) {
        let shard = self.shard_for(key);
        let mut keys = shard.mutex.lock();
        while keys.contains(key) {
            shard.condvar.wait(&mut keys);
        }
        keys.insert(key.to_vec());
    }

    pub fn unlock(&self, key: &[u8]) {
        let shard = self.shard_for(key);
        let mut keys = shard.mutex.lock();
        keys.remove(key);
        drop(keys);

        shard.condvar.notify_all();
    }

    pub fn try_lock(&self, key: &[u8]) -> bool {
        let shard = self.shard_for(key);
        let mut keys = shard.mutex.lock();
        if keys.contains(key) {
            return false;
        }
        keys.insert(key.to_vec());
        true
    }
}

/// RAII record lock guard
pub struct ScopeRecordLock<'a> {
    mgr: &'a LockMgr,
    key: Vec<u8>,
}

impl<'a> ScopeRecordLock<'a> {
    pub fn new(mgr: &'a LockMgr, key: &[u8]) -> Self {
        mgr.lock(key);
        Self {
            mgr,
            key: key.to_vec(),
        }
    }
}

impl Drop for ScopeRecordLock<'_> {
    fn drop(&mut self) {
        self.mgr.unlock(&self.key);
    }
}

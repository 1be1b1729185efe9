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

//! Bounded LRU from `(key, pattern, cursor)` to the member a ZSCAN resumes
//! from. Eviction is acceptable: a caller whose cursor fell out simply
//! restarts from cursor 0.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

pub struct ZScanCursorStore {
    inner: Mutex<LruCache<Vec<u8>, Vec<u8>>>,
}

impl ZScanCursorStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Resume member for `(key, pattern, cursor)`, promoting the entry to
    /// most-recently-used. None means the caller restarts from cursor 0.
    pub fn start_member(&self, key: &[u8], pattern: &str, cursor: i64) -> Option<Vec<u8>> {
        let index_key = Self::index_key(key, pattern, cursor);
        self.inner.lock().get(&index_key).cloned()
    }

    pub fn store_next_member(&self, key: &[u8], pattern: &str, cursor: i64, next_member: &[u8]) {
        let index_key = Self::index_key(key, pattern, cursor);
        self.inner.lock().put(index_key, next_member.to_vec());
    }

    fn index_key(key: &[u8], pattern: &str, cursor: i64) -> Vec<u8> {
        let cursor = cursor.to_string();
        let mut index_key =
            Vec::with_capacity(key.len() + pattern.len() + cursor.len() + 2);
        index_key.extend_from_slice(key);
        index_key.push(b'_');
        index_key.extend_from_slice(pattern.as_bytes());
        index_key.push(b'_');
        index_key.extend_from_slice(cursor.as_bytes());
        index_key
    }
}

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

use bytes::{BufMut, BytesMut};
use chrono::Utc;
use snafu::{OptionExt, ensure};

use crate::error::{CorruptionSnafu, InvalidArgumentSnafu, Result};
use crate::storage_define::{COUNT_LENGTH, META_VALUE_LENGTH, VERSION_LENGTH};

/*
 * zset meta value format:
 * | version | count | timestamp |
 * |   4B    |  4B   |    4B     |
 *
 * `timestamp` is an absolute unix-epoch expiry in seconds, 0 meaning the key
 * never expires. `version` is the generation counter that logically
 * invalidates data/score rows without touching them.
 */
#[derive(Debug, Clone)]
pub struct ZSetsMetaValue {
    pub version: u32,
    pub count: u32,
    pub timestamp: i32,
}

impl ZSetsMetaValue {
    pub fn new(count: u32) -> Self {
        ZSetsMetaValue {
            version: 0,
            count,
            timestamp: 0,
        }
    }

    /// Advance the version to a fresh tick. Two updates within the same
    /// second still advance because the previous version wins the max.
    pub fn update_version(&mut self) -> u32 {
        let now = Utc::now().timestamp() as u32;
        self.version = match self.version >= now {
            true => self.version + 1,
            false => now,
        };
        self.version
    }

    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(META_VALUE_LENGTH);
        buf.put_u32_le(self.version);
        buf.put_u32_le(self.count);
        buf.put_i32_le(self.timestamp);
        buf
    }
}

pub struct ParsedZSetsMetaValue {
    value: BytesMut,
    version: u32,
    count: u32,
    timestamp: i32,
}

impl ParsedZSetsMetaValue {
    pub fn new<T>(meta_value: T) -> Result<Self>
    where
        T: Into<BytesMut>,
    {
        let value: BytesMut = meta_value.into();
        ensure!(
            value.len() >= META_VALUE_LENGTH,
            CorruptionSnafu {
                message: format!(
                    "invalid zset meta value length: {} < {}",
                    value.len(),
                    META_VALUE_LENGTH,
                )
            }
        );

        let version = u32::from_le_bytes(value[..VERSION_LENGTH].try_into().unwrap());
        let count = u32::from_le_bytes(
            value[VERSION_LENGTH..VERSION_LENGTH + COUNT_LENGTH]
                .try_into()
                .unwrap(),
        );
        let timestamp = i32::from_le_bytes(
            value[VERSION_LENGTH + COUNT_LENGTH..META_VALUE_LENGTH]
                .try_into()
                .unwrap(),
        );

        Ok(Self {
            value,
            version,
            count,
            timestamp,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn timestamp(&self) -> i32 {
        self.timestamp
    }

    /// The encoded form with all in-place edits applied.
    pub fn encoded(&self) -> &[u8] {
        &self.value
    }

    pub fn is_stale(&self) -> bool {
        if self.timestamp == 0 {
            return false;
        }
        self.timestamp as i64 <= Utc::now().timestamp()
    }

    pub fn is_valid(&self) -> bool {
        !self.is_stale() && self.count != 0
    }

    pub fn set_count(&mut self, count: u32) {
        self.count = count;
        self.sync_count();
    }

    pub fn modify_count(&mut self, delta: i32) {
        self.count = if delta >= 0 {
            self.count.saturating_add(delta as u32)
        } else {
            self.count.saturating_sub(delta.unsigned_abs())
        };
        self.sync_count();
    }

    pub fn check_modify_count(&self, delta: i32) -> bool {
        if delta >= 0 {
            self.count.checked_add(delta as u32).is_some()
        } else {
            self.count.checked_sub(delta.unsigned_abs()).is_some()
        }
    }

    pub fn set_timestamp(&mut self, timestamp: i32) {
        self.timestamp = timestamp;
        self.sync_timestamp();
    }

    pub fn set_relative_timestamp(&mut self, ttl: i64) -> Result<()> {
        let deadline = Utc::now()
            .timestamp()
            .checked_add(ttl)
            .context(InvalidArgumentSnafu {
                message: "timestamp overflow when applying relative ttl".to_string(),
            })?;
        let deadline = i32::try_from(deadline).ok().context(InvalidArgumentSnafu {
            message: format!("expiry {deadline} does not fit the timestamp field"),
        })?;
        self.set_timestamp(deadline);
        Ok(())
    }

    /// Logical delete: zero count and expiry, advance the generation. Old
    /// data/score rows become unreachable and wait for compaction.
    pub fn initial_meta_value(&mut self) -> u32 {
        self.set_count(0);
        self.set_timestamp(0);
        self.update_version()
    }

    pub fn update_version(&mut self) -> u32 {
        let now = Utc::now().timestamp() as u32;
        self.version = match self.version >= now {
            true => self.version + 1,
            false => now,
        };
        self.sync_version();
        self.version
    }

    fn sync_version(&mut self) {
        let dst = &mut self.value[..VERSION_LENGTH];
        dst.copy_from_slice(&self.version.to_le_bytes());
    }

    fn sync_count(&mut self) {
        let dst = &mut self.value[VERSION_LENGTH..VERSION_LENGTH + COUNT_LENGTH];
        dst.copy_from_slice(&self.count.to_le_bytes());
    }

    fn sync_timestamp(&mut self) {
        let dst = &mut self.value[VERSION_LENGTH + COUNT_LENGTH..META_VALUE_LENGTH];
        dst.copy_from_slice(&self.timestamp.to_le_bytes());
    }
}

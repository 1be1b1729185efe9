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

//! Sorted set command implementations.
//!
//! Mutations take the per-key record lock and commit as one atomic batch
//! across the meta/data/score column families; iterating reads pin a
//! snapshot so concurrent writers cannot tear a scan.

use std::collections::{BTreeMap, HashSet};

use bytes::BytesMut;
use chrono::Utc;
use rocksdb::{DB, Direction, IteratorMode, ReadOptions, WriteBatch};
use snafu::{ResultExt, ensure};

use crate::error::{CorruptionSnafu, KeyNotFoundSnafu, Result, RocksSnafu, STALE_TAG};
use crate::lock_mgr::ScopeRecordLock;
use crate::redis::{ColumnFamilyIndex, ZSets};
use crate::storage_define::SCORE_LENGTH;
use crate::types::{Aggregate, KeyScanResult, KeyVersion, ScoreMember};
use crate::util::string_match;
use crate::zsets_member_key_format::{ParsedZSetsMemberKey, ZSetsMemberKey};
use crate::zsets_meta_value_format::{ParsedZSetsMetaValue, ZSetsMetaValue};
use crate::zsets_score_key_format::{ParsedZSetsScoreKey, ZSetsScoreKey};

impl ZSets {
    /// Add members to a sorted set, updating scores of members already
    /// present. Returns how many members were newly inserted.
    ///
    /// A member repeated in one call counts once; the first occurrence wins.
    pub fn zadd(&self, key: &[u8], score_members: &[ScoreMember]) -> Result<i32> {
        let mut unique = HashSet::new();
        let mut filtered_score_members = Vec::with_capacity(score_members.len());
        for sm in score_members {
            if unique.insert(sm.member.clone()) {
                filtered_score_members.push(sm);
            }
        }
        if filtered_score_members.is_empty() {
            return Ok(0);
        }

        let db = self.db_ref()?;
        let meta_cf = self.cf_handle(ColumnFamilyIndex::MetaCF)?;
        let data_cf = self.cf_handle(ColumnFamilyIndex::DataCF)?;
        let score_cf = self.cf_handle(ColumnFamilyIndex::ScoreCF)?;

        let _lock = ScopeRecordLock::new(&self.lock_mgr, key);
        let mut batch = WriteBatch::default();

        let added = match db.get_cf(&meta_cf, key).context(RocksSnafu)? {
            Some(meta_value) => {
                let mut parsed_meta = ParsedZSetsMetaValue::new(BytesMut::from(&meta_value[..]))?;
                let is_stale = parsed_meta.is_stale();
                let version = if is_stale {
                    parsed_meta.initial_meta_value()
                } else {
                    parsed_meta.version()
                };

                let mut cnt: i32 = 0;
                for sm in &filtered_score_members {
                    let mut not_found = true;
                    let member_key = ZSetsMemberKey::new(key, version, &sm.member).encode();
                    if !is_stale {
                        if let Some(data_value) =
                            db.get_cf(&data_cf, &member_key).context(RocksSnafu)?
                        {
                            not_found = false;
                            let old_score = decode_score(&data_value)?;
                            if old_score == sm.score {
                                continue;
                            }
                            let old_score_key =
                                ZSetsScoreKey::new(key, version, old_score, &sm.member).encode();
                            batch.delete_cf(&score_cf, &old_score_key);
                        }
                    }

                    batch.put_cf(&data_cf, &member_key, encode_score(sm.score));
                    let score_key = ZSetsScoreKey::new(key, version, sm.score, &sm.member).encode();
                    batch.put_cf(&score_cf, &score_key, b"");
                    if not_found {
                        cnt += 1;
                    }
                }

                parsed_meta.modify_count(cnt);
                batch.put_cf(&meta_cf, key, parsed_meta.encoded());
                cnt
            }
            None => {
                let mut meta = ZSetsMetaValue::new(filtered_score_members.len() as u32);
                let version = meta.update_version();
                batch.put_cf(&meta_cf, key, &meta.encode());

                for sm in &filtered_score_members {
                    let member_key = ZSetsMemberKey::new(key, version, &sm.member).encode();
                    batch.put_cf(&data_cf, &member_key, encode_score(sm.score));
                    let score_key = ZSetsScoreKey::new(key, version, sm.score, &sm.member).encode();
                    batch.put_cf(&score_cf, &score_key, b"");
                }
                filtered_score_members.len() as i32
            }
        };

        db.write_opt(batch, &self.write_options).context(RocksSnafu)?;
        Ok(added)
    }

    /// Number of members in the set.
    pub fn zcard(&self, key: &[u8]) -> Result<i32> {
        let db = self.db_ref()?;
        let read_options = ReadOptions::default();
        let meta = self.load_valid_meta(db, &read_options, key)?;
        Ok(meta.count() as i32)
    }

    /// Count members with score inside the `[min, max]` window, each bound
    /// open or closed.
    pub fn zcount(
        &self,
        key: &[u8],
        min: f64,
        max: f64,
        left_close: bool,
        right_close: bool,
    ) -> Result<i32> {
        let db = self.db_ref()?;
        let score_cf = self.cf_handle(ColumnFamilyIndex::ScoreCF)?;

        let snapshot = db.snapshot();
        let mut read_options = ReadOptions::default();
        read_options.set_snapshot(&snapshot);
        let meta = self.load_valid_meta(db, &read_options, key)?;

        let version = meta.version();
        let stop_index = meta.count() as i32 - 1;
        let mut cur_index: i32 = 0;
        let mut cnt: i32 = 0;

        let seek_key = ZSetsScoreKey::new(key, version, f64::NEG_INFINITY, b"").encode();
        let mut iter_options = ReadOptions::default();
        iter_options.set_snapshot(&snapshot);
        let iter = db.iterator_cf_opt(
            &score_cf,
            iter_options,
            IteratorMode::From(&seek_key, Direction::Forward),
        );
        for item in iter {
            if cur_index > stop_index {
                break;
            }
            let (raw_key, _) = item.context(RocksSnafu)?;
            let parsed_score_key = ParsedZSetsScoreKey::new(&raw_key)?;
            let score = parsed_score_key.score();
            let right_pass = right_pass(max, right_close, score);
            if left_pass(min, left_close, score) && right_pass {
                cnt += 1;
            }
            if !right_pass {
                break;
            }
            cur_index += 1;
        }

        Ok(cnt)
    }

    /// Add `increment` to the member's score, creating key and member as
    /// needed. Returns the new score.
    pub fn zincrby(&self, key: &[u8], member: &[u8], increment: f64) -> Result<f64> {
        let db = self.db_ref()?;
        let meta_cf = self.cf_handle(ColumnFamilyIndex::MetaCF)?;
        let data_cf = self.cf_handle(ColumnFamilyIndex::DataCF)?;
        let score_cf = self.cf_handle(ColumnFamilyIndex::ScoreCF)?;

        let _lock = ScopeRecordLock::new(&self.lock_mgr, key);
        let mut batch = WriteBatch::default();

        let score;
        let version;
        match db.get_cf(&meta_cf, key).context(RocksSnafu)? {
            Some(meta_value) => {
                let mut parsed_meta = ParsedZSetsMetaValue::new(BytesMut::from(&meta_value[..]))?;
                version = if parsed_meta.is_stale() {
                    parsed_meta.initial_meta_value()
                } else {
                    parsed_meta.version()
                };

                let member_key = ZSetsMemberKey::new(key, version, member).encode();
                match db.get_cf(&data_cf, &member_key).context(RocksSnafu)? {
                    Some(data_value) => {
                        let old_score = decode_score(&data_value)?;
                        score = old_score + increment;
                        let old_score_key =
                            ZSetsScoreKey::new(key, version, old_score, member).encode();
                        batch.delete_cf(&score_cf, &old_score_key);
                    }
                    None => {
                        score = increment;
                        parsed_meta.modify_count(1);
                        batch.put_cf(&meta_cf, key, parsed_meta.encoded());
                    }
                }
            }
            None => {
                let mut meta = ZSetsMetaValue::new(1);
                version = meta.update_version();
                batch.put_cf(&meta_cf, key, &meta.encode());
                score = increment;
            }
        }

        let member_key = ZSetsMemberKey::new(key, version, member).encode();
        batch.put_cf(&data_cf, &member_key, encode_score(score));
        let score_key = ZSetsScoreKey::new(key, version, score, member).encode();
        batch.put_cf(&score_cf, &score_key, b"");

        db.write_opt(batch, &self.write_options).context(RocksSnafu)?;
        Ok(score)
    }

    /// Members with rank in `[start, stop]`, lowest score first. Negative
    /// indices count from the end.
    pub fn zrange(&self, key: &[u8], start: i32, stop: i32) -> Result<Vec<ScoreMember>> {
        let db = self.db_ref()?;
        let score_cf = self.cf_handle(ColumnFamilyIndex::ScoreCF)?;

        let snapshot = db.snapshot();
        let mut read_options = ReadOptions::default();
        read_options.set_snapshot(&snapshot);
        let meta = self.load_valid_meta(db, &read_options, key)?;

        let count = meta.count() as i32;
        let version = meta.version();
        let (start_index, stop_index) = resolve_rank_range(start, stop, count);
        if start_index > stop_index || start_index >= count || stop_index < 0 {
            return Ok(Vec::new());
        }

        let mut score_members = Vec::new();
        let mut cur_index: i32 = 0;
        let seek_key = ZSetsScoreKey::new(key, version, f64::NEG_INFINITY, b"").encode();
        let mut iter_options = ReadOptions::default();
        iter_options.set_snapshot(&snapshot);
        let iter = db.iterator_cf_opt(
            &score_cf,
            iter_options,
            IteratorMode::From(&seek_key, Direction::Forward),
        );
        for item in iter {
            if cur_index > stop_index {
                break;
            }
            let (raw_key, _) = item.context(RocksSnafu)?;
            if cur_index >= start_index {
                let parsed_score_key = ParsedZSetsScoreKey::new(&raw_key)?;
                score_members.push(ScoreMember::new(
                    parsed_score_key.score(),
                    parsed_score_key.member().to_vec(),
                ));
            }
            cur_index += 1;
        }

        Ok(score_members)
    }

    /// Members with score inside the window, lowest first.
    pub fn zrangebyscore(
        &self,
        key: &[u8],
        min: f64,
        max: f64,
        left_close: bool,
        right_close: bool,
    ) -> Result<Vec<ScoreMember>> {
        let db = self.db_ref()?;
        let score_cf = self.cf_handle(ColumnFamilyIndex::ScoreCF)?;

        let snapshot = db.snapshot();
        let mut read_options = ReadOptions::default();
        read_options.set_snapshot(&snapshot);
        let meta = self.load_valid_meta(db, &read_options, key)?;

        let version = meta.version();
        let stop_index = meta.count() as i32 - 1;
        let mut cur_index: i32 = 0;
        let mut score_members = Vec::new();

        let seek_key = ZSetsScoreKey::new(key, version, f64::NEG_INFINITY, b"").encode();
        let mut iter_options = ReadOptions::default();
        iter_options.set_snapshot(&snapshot);
        let iter = db.iterator_cf_opt(
            &score_cf,
            iter_options,
            IteratorMode::From(&seek_key, Direction::Forward),
        );
        for item in iter {
            if cur_index > stop_index {
                break;
            }
            let (raw_key, _) = item.context(RocksSnafu)?;
            let parsed_score_key = ParsedZSetsScoreKey::new(&raw_key)?;
            let score = parsed_score_key.score();
            let right_pass = right_pass(max, right_close, score);
            if left_pass(min, left_close, score) && right_pass {
                score_members.push(ScoreMember::new(score, parsed_score_key.member().to_vec()));
            }
            if !right_pass {
                break;
            }
            cur_index += 1;
        }

        Ok(score_members)
    }

    /// 0-based rank of a member under (score asc, member asc).
    pub fn zrank(&self, key: &[u8], member: &[u8]) -> Result<i32> {
        let db = self.db_ref()?;
        let score_cf = self.cf_handle(ColumnFamilyIndex::ScoreCF)?;

        let snapshot = db.snapshot();
        let mut read_options = ReadOptions::default();
        read_options.set_snapshot(&snapshot);
        let meta = self.load_valid_meta(db, &read_options, key)?;

        let version = meta.version();
        let stop_index = meta.count() as i32 - 1;
        let mut index: i32 = 0;

        let seek_key = ZSetsScoreKey::new(key, version, f64::NEG_INFINITY, b"").encode();
        let mut iter_options = ReadOptions::default();
        iter_options.set_snapshot(&snapshot);
        let iter = db.iterator_cf_opt(
            &score_cf,
            iter_options,
            IteratorMode::From(&seek_key, Direction::Forward),
        );
        for item in iter {
            if index > stop_index {
                break;
            }
            let (raw_key, _) = item.context(RocksSnafu)?;
            let parsed_score_key = ParsedZSetsScoreKey::new(&raw_key)?;
            if parsed_score_key.member() == member {
                return Ok(index);
            }
            index += 1;
        }

        KeyNotFoundSnafu {
            message: String::from_utf8_lossy(member).to_string(),
        }
        .fail()
    }

    /// Remove members; returns how many were actually present.
    pub fn zrem(&self, key: &[u8], members: &[&[u8]]) -> Result<i32> {
        let mut unique = HashSet::new();
        let mut filtered_members = Vec::with_capacity(members.len());
        for &member in members {
            if unique.insert(member.to_vec()) {
                filtered_members.push(member);
            }
        }

        let db = self.db_ref()?;
        let meta_cf = self.cf_handle(ColumnFamilyIndex::MetaCF)?;
        let data_cf = self.cf_handle(ColumnFamilyIndex::DataCF)?;
        let score_cf = self.cf_handle(ColumnFamilyIndex::ScoreCF)?;

        let _lock = ScopeRecordLock::new(&self.lock_mgr, key);
        let read_options = ReadOptions::default();
        let mut meta = self.load_valid_meta(db, &read_options, key)?;
        let version = meta.version();

        let mut batch = WriteBatch::default();
        let mut del_cnt: i32 = 0;
        for member in &filtered_members {
            let member_key = ZSetsMemberKey::new(key, version, member).encode();
            if let Some(data_value) = db.get_cf(&data_cf, &member_key).context(RocksSnafu)? {
                del_cnt += 1;
                let score = decode_score(&data_value)?;
                batch.delete_cf(&data_cf, &member_key);
                let score_key = ZSetsScoreKey::new(key, version, score, member).encode();
                batch.delete_cf(&score_cf, &score_key);
            }
        }

        meta.modify_count(-del_cnt);
        batch.put_cf(&meta_cf, key, meta.encoded());
        db.write_opt(batch, &self.write_options).context(RocksSnafu)?;
        Ok(del_cnt)
    }

    /// Remove members with rank in `[start, stop]`.
    pub fn zremrangebyrank(&self, key: &[u8], start: i32, stop: i32) -> Result<i32> {
        let db = self.db_ref()?;
        let meta_cf = self.cf_handle(ColumnFamilyIndex::MetaCF)?;
        let data_cf = self.cf_handle(ColumnFamilyIndex::DataCF)?;
        let score_cf = self.cf_handle(ColumnFamilyIndex::ScoreCF)?;

        let _lock = ScopeRecordLock::new(&self.lock_mgr, key);
        let read_options = ReadOptions::default();
        let mut meta = self.load_valid_meta(db, &read_options, key)?;

        let count = meta.count() as i32;
        let version = meta.version();
        let (start_index, stop_index) = resolve_rank_range(start, stop, count);

        let mut batch = WriteBatch::default();
        let mut del_cnt: i32 = 0;
        let mut cur_index: i32 = 0;
        let seek_key = ZSetsScoreKey::new(key, version, f64::NEG_INFINITY, b"").encode();
        let iter = db.iterator_cf_opt(
            &score_cf,
            ReadOptions::default(),
            IteratorMode::From(&seek_key, Direction::Forward),
        );
        for item in iter {
            if cur_index > stop_index {
                break;
            }
            let (raw_key, _) = item.context(RocksSnafu)?;
            if cur_index >= start_index {
                let parsed_score_key = ParsedZSetsScoreKey::new(&raw_key)?;
                let member_key =
                    ZSetsMemberKey::new(key, version, parsed_score_key.member()).encode();
                batch.delete_cf(&data_cf, &member_key);
                batch.delete_cf(&score_cf, &raw_key);
                del_cnt += 1;
            }
            cur_index += 1;
        }

        meta.modify_count(-del_cnt);
        batch.put_cf(&meta_cf, key, meta.encoded());
        db.write_opt(batch, &self.write_options).context(RocksSnafu)?;
        Ok(del_cnt)
    }

    /// Remove members with score inside the window.
    pub fn zremrangebyscore(
        &self,
        key: &[u8],
        min: f64,
        max: f64,
        left_close: bool,
        right_close: bool,
    ) -> Result<i32> {
        let db = self.db_ref()?;
        let meta_cf = self.cf_handle(ColumnFamilyIndex::MetaCF)?;
        let data_cf = self.cf_handle(ColumnFamilyIndex::DataCF)?;
        let score_cf = self.cf_handle(ColumnFamilyIndex::ScoreCF)?;

        let _lock = ScopeRecordLock::new(&self.lock_mgr, key);
        let read_options = ReadOptions::default();
        let mut meta = self.load_valid_meta(db, &read_options, key)?;

        let version = meta.version();
        let stop_index = meta.count() as i32 - 1;
        let mut cur_index: i32 = 0;
        let mut del_cnt: i32 = 0;
        let mut batch = WriteBatch::default();

        let seek_key = ZSetsScoreKey::new(key, version, f64::NEG_INFINITY, b"").encode();
        let iter = db.iterator_cf_opt(
            &score_cf,
            ReadOptions::default(),
            IteratorMode::From(&seek_key, Direction::Forward),
        );
        for item in iter {
            if cur_index > stop_index {
                break;
            }
            let (raw_key, _) = item.context(RocksSnafu)?;
            let parsed_score_key = ParsedZSetsScoreKey::new(&raw_key)?;
            let score = parsed_score_key.score();
            let right_pass = right_pass(max, right_close, score);
            if left_pass(min, left_close, score) && right_pass {
                let member_key =
                    ZSetsMemberKey::new(key, version, parsed_score_key.member()).encode();
                batch.delete_cf(&data_cf, &member_key);
                batch.delete_cf(&score_cf, &raw_key);
                del_cnt += 1;
            }
            if !right_pass {
                break;
            }
            cur_index += 1;
        }

        meta.modify_count(-del_cnt);
        batch.put_cf(&meta_cf, key, meta.encoded());
        db.write_opt(batch, &self.write_options).context(RocksSnafu)?;
        Ok(del_cnt)
    }

    /// Members with rank in `[start, stop]` counted from the highest score.
    pub fn zrevrange(&self, key: &[u8], start: i32, stop: i32) -> Result<Vec<ScoreMember>> {
        let db = self.db_ref()?;
        let score_cf = self.cf_handle(ColumnFamilyIndex::ScoreCF)?;

        let snapshot = db.snapshot();
        let mut read_options = ReadOptions::default();
        read_options.set_snapshot(&snapshot);
        let meta = self.load_valid_meta(db, &read_options, key)?;

        let count = meta.count() as i32;
        let version = meta.version();
        let (start_index, stop_index) = resolve_rank_range(start, stop, count);
        if start_index > stop_index || start_index >= count || stop_index < 0 {
            return Ok(Vec::new());
        }

        let mut window = Vec::new();
        let mut cur_index: i32 = 0;
        let seek_key = ZSetsScoreKey::new(key, version, f64::NEG_INFINITY, b"").encode();
        let mut iter_options = ReadOptions::default();
        iter_options.set_snapshot(&snapshot);
        let iter = db.iterator_cf_opt(
            &score_cf,
            iter_options,
            IteratorMode::From(&seek_key, Direction::Forward),
        );
        for item in iter {
            if cur_index > stop_index {
                break;
            }
            let (raw_key, _) = item.context(RocksSnafu)?;
            if cur_index >= start_index {
                let parsed_score_key = ParsedZSetsScoreKey::new(&raw_key)?;
                window.push(ScoreMember::new(
                    parsed_score_key.score(),
                    parsed_score_key.member().to_vec(),
                ));
            }
            cur_index += 1;
        }

        window.reverse();
        Ok(window)
    }

    /// Members with score inside the window, highest first.
    pub fn zrevrangebyscore(
        &self,
        key: &[u8],
        min: f64,
        max: f64,
        left_close: bool,
        right_close: bool,
    ) -> Result<Vec<ScoreMember>> {
        let db = self.db_ref()?;
        let score_cf = self.cf_handle(ColumnFamilyIndex::ScoreCF)?;

        let snapshot = db.snapshot();
        let mut read_options = ReadOptions::default();
        read_options.set_snapshot(&snapshot);
        let meta = self.load_valid_meta(db, &read_options, key)?;

        let version = meta.version();
        let mut left = meta.count() as i32;
        let mut score_members = Vec::new();

        let seek_key = ZSetsScoreKey::new(key, version, f64::INFINITY, b"").encode();
        let mut iter_options = ReadOptions::default();
        iter_options.set_snapshot(&snapshot);
        let iter = db.iterator_cf_opt(
            &score_cf,
            iter_options,
            IteratorMode::From(&seek_key, Direction::Reverse),
        );
        for item in iter {
            if left <= 0 {
                break;
            }
            let (raw_key, _) = item.context(RocksSnafu)?;
            let parsed_score_key = ParsedZSetsScoreKey::new(&raw_key)?;
            if parsed_score_key.key() != key || parsed_score_key.version() != version {
                break;
            }
            let score = parsed_score_key.score();
            let left_pass = left_pass(min, left_close, score);
            if left_pass && right_pass(max, right_close, score) {
                score_members.push(ScoreMember::new(score, parsed_score_key.member().to_vec()));
            }
            if !left_pass {
                break;
            }
            left -= 1;
        }

        Ok(score_members)
    }

    /// 0-based rank of a member counted from the highest score.
    pub fn zrevrank(&self, key: &[u8], member: &[u8]) -> Result<i32> {
        let db = self.db_ref()?;
        let score_cf = self.cf_handle(ColumnFamilyIndex::ScoreCF)?;

        let snapshot = db.snapshot();
        let mut read_options = ReadOptions::default();
        read_options.set_snapshot(&snapshot);
        let meta = self.load_valid_meta(db, &read_options, key)?;

        let version = meta.version();
        let mut left = meta.count() as i32;
        let mut rev_index: i32 = 0;

        let seek_key = ZSetsScoreKey::new(key, version, f64::INFINITY, b"").encode();
        let mut iter_options = ReadOptions::default();
        iter_options.set_snapshot(&snapshot);
        let iter = db.iterator_cf_opt(
            &score_cf,
            iter_options,
            IteratorMode::From(&seek_key, Direction::Reverse),
        );
        for item in iter {
            if left <= 0 {
                break;
            }
            let (raw_key, _) = item.context(RocksSnafu)?;
            let parsed_score_key = ParsedZSetsScoreKey::new(&raw_key)?;
            if parsed_score_key.key() != key || parsed_score_key.version() != version {
                break;
            }
            if parsed_score_key.member() == member {
                return Ok(rev_index);
            }
            left -= 1;
            rev_index += 1;
        }

        KeyNotFoundSnafu {
            message: String::from_utf8_lossy(member).to_string(),
        }
        .fail()
    }

    /// Score of one member.
    pub fn zscore(&self, key: &[u8], member: &[u8]) -> Result<f64> {
        let db = self.db_ref()?;
        let data_cf = self.cf_handle(ColumnFamilyIndex::DataCF)?;

        let snapshot = db.snapshot();
        let mut read_options = ReadOptions::default();
        read_options.set_snapshot(&snapshot);
        let meta = self.load_valid_meta(db, &read_options, key)?;

        let member_key = ZSetsMemberKey::new(key, meta.version(), member).encode();
        match db
            .get_cf_opt(&data_cf, &member_key, &read_options)
            .context(RocksSnafu)?
        {
            Some(data_value) => decode_score(&data_value),
            None => KeyNotFoundSnafu {
                message: String::from_utf8_lossy(member).to_string(),
            }
            .fail(),
        }
    }

    /// Store the weighted union of `keys` into `destination`, overwriting it.
    /// Returns the destination cardinality.
    pub fn zunionstore(
        &self,
        destination: &[u8],
        keys: &[&[u8]],
        weights: &[f64],
        agg: Aggregate,
    ) -> Result<i32> {
        let db = self.db_ref()?;
        let meta_cf = self.cf_handle(ColumnFamilyIndex::MetaCF)?;
        let data_cf = self.cf_handle(ColumnFamilyIndex::DataCF)?;
        let score_cf = self.cf_handle(ColumnFamilyIndex::ScoreCF)?;

        let snapshot = db.snapshot();
        let mut read_options = ReadOptions::default();
        read_options.set_snapshot(&snapshot);
        let _lock = ScopeRecordLock::new(&self.lock_mgr, destination);

        let mut member_score_map: BTreeMap<Vec<u8>, f64> = BTreeMap::new();
        for (idx, source) in keys.iter().enumerate() {
            let Some(meta_value) = db
                .get_cf_opt(&meta_cf, source, &read_options)
                .context(RocksSnafu)?
            else {
                continue;
            };
            let parsed_meta = ParsedZSetsMetaValue::new(BytesMut::from(&meta_value[..]))?;
            if parsed_meta.is_stale() || parsed_meta.count() == 0 {
                continue;
            }

            let weight = weights.get(idx).copied().unwrap_or(1.0);
            let version = parsed_meta.version();
            let stop_index = parsed_meta.count() as i32 - 1;
            let mut cur_index: i32 = 0;

            let seek_key = ZSetsScoreKey::new(source, version, f64::NEG_INFINITY, b"").encode();
            let mut iter_options = ReadOptions::default();
            iter_options.set_snapshot(&snapshot);
            let iter = db.iterator_cf_opt(
                &score_cf,
                iter_options,
                IteratorMode::From(&seek_key, Direction::Forward),
            );
            for item in iter {
                if cur_index > stop_index {
                    break;
                }
                let (raw_key, _) = item.context(RocksSnafu)?;
                let parsed_score_key = ParsedZSetsScoreKey::new(&raw_key)?;
                let weighted = weight * parsed_score_key.score();
                let combined = match member_score_map.get(parsed_score_key.member()) {
                    Some(&existing) => match agg {
                        Aggregate::Sum => existing + weighted,
                        Aggregate::Min => existing.min(weighted),
                        Aggregate::Max => existing.max(weighted),
                    },
                    None => weighted,
                };
                member_score_map.insert(parsed_score_key.member().to_vec(), normalized(combined));
                cur_index += 1;
            }
        }

        let mut batch = WriteBatch::default();
        let version = self.overwrite_destination_meta(
            db,
            &read_options,
            destination,
            member_score_map.len() as u32,
            &mut batch,
        )?;

        for (member, score) in &member_score_map {
            let member_key = ZSetsMemberKey::new(destination, version, member).encode();
            batch.put_cf(&data_cf, &member_key, encode_score(*score));
            let score_key = ZSetsScoreKey::new(destination, version, *score, member).encode();
            batch.put_cf(&score_cf, &score_key, b"");
        }

        db.write_opt(batch, &self.write_options).context(RocksSnafu)?;
        Ok(member_score_map.len() as i32)
    }

    /// Store the weighted intersection of `keys` into `destination`,
    /// overwriting it. An absent, stale or empty source empties the result.
    pub fn zinterstore(
        &self,
        destination: &[u8],
        keys: &[&[u8]],
        weights: &[f64],
        agg: Aggregate,
    ) -> Result<i32> {
        ensure!(
            !keys.is_empty(),
            CorruptionSnafu {
                message: "ZInterstore invalid parameter, no keys".to_string(),
            }
        );

        let db = self.db_ref()?;
        let meta_cf = self.cf_handle(ColumnFamilyIndex::MetaCF)?;
        let data_cf = self.cf_handle(ColumnFamilyIndex::DataCF)?;
        let score_cf = self.cf_handle(ColumnFamilyIndex::ScoreCF)?;

        let snapshot = db.snapshot();
        let mut read_options = ReadOptions::default();
        read_options.set_snapshot(&snapshot);
        let _lock = ScopeRecordLock::new(&self.lock_mgr, destination);

        let mut have_invalid_zsets = false;
        let mut valid_zsets: Vec<KeyVersion> = Vec::new();
        let mut stop_index: i32 = 0;
        for (idx, source) in keys.iter().enumerate() {
            match db
                .get_cf_opt(&meta_cf, source, &read_options)
                .context(RocksSnafu)?
            {
                Some(meta_value) => {
                    let parsed_meta = ParsedZSetsMetaValue::new(BytesMut::from(&meta_value[..]))?;
                    if parsed_meta.is_stale() || parsed_meta.count() == 0 {
                        have_invalid_zsets = true;
                    } else {
                        valid_zsets.push(KeyVersion::new(source.to_vec(), parsed_meta.version()));
                        if idx == 0 {
                            stop_index = parsed_meta.count() as i32 - 1;
                        }
                    }
                }
                None => have_invalid_zsets = true,
            }
        }

        let mut final_score_members: Vec<ScoreMember> = Vec::new();
        if !have_invalid_zsets {
            let first = &valid_zsets[0];
            let mut candidates: Vec<ScoreMember> = Vec::new();
            let mut cur_index: i32 = 0;

            let seek_key =
                ZSetsScoreKey::new(&first.key, first.version, f64::NEG_INFINITY, b"").encode();
            let mut iter_options = ReadOptions::default();
            iter_options.set_snapshot(&snapshot);
            let iter = db.iterator_cf_opt(
                &score_cf,
                iter_options,
                IteratorMode::From(&seek_key, Direction::Forward),
            );
            for item in iter {
                if cur_index > stop_index {
                    break;
                }
                let (raw_key, _) = item.context(RocksSnafu)?;
                let parsed_score_key = ParsedZSetsScoreKey::new(&raw_key)?;
                candidates.push(ScoreMember::new(
                    parsed_score_key.score(),
                    parsed_score_key.member().to_vec(),
                ));
                cur_index += 1;
            }

            for candidate in &candidates {
                let mut reliable = true;
                let mut score = candidate.score * weights.first().copied().unwrap_or(1.0);
                for (idx, source) in valid_zsets.iter().enumerate().skip(1) {
                    let weight = weights.get(idx).copied().unwrap_or(1.0);
                    let member_key =
                        ZSetsMemberKey::new(&source.key, source.version, &candidate.member)
                            .encode();
                    match db
                        .get_cf_opt(&data_cf, &member_key, &read_options)
                        .context(RocksSnafu)?
                    {
                        Some(data_value) => {
                            let other = decode_score(&data_value)?;
                            score = match agg {
                                Aggregate::Sum => score + weight * other,
                                Aggregate::Min => score.min(weight * other),
                                Aggregate::Max => score.max(weight * other),
                            };
                        }
                        None => {
                            reliable = false;
                            break;
                        }
                    }
                }
                if reliable {
                    final_score_members
                        .push(ScoreMember::new(normalized(score), candidate.member.clone()));
                }
            }
        }

        let mut batch = WriteBatch::default();
        let version = self.overwrite_destination_meta(
            db,
            &read_options,
            destination,
            final_score_members.len() as u32,
            &mut batch,
        )?;

        for sm in &final_score_members {
            let member_key = ZSetsMemberKey::new(destination, version, &sm.member).encode();
            batch.put_cf(&data_cf, &member_key, encode_score(sm.score));
            let score_key = ZSetsScoreKey::new(destination, version, sm.score, &sm.member).encode();
            batch.put_cf(&score_cf, &score_key, b"");
        }

        db.write_opt(batch, &self.write_options).context(RocksSnafu)?;
        Ok(final_score_members.len() as i32)
    }

    /// Members between `min` and `max` in member-lexicographic order. The
    /// tokens `-` and `+` stand for the unbounded ends.
    pub fn zrangebylex(
        &self,
        key: &[u8],
        min: &[u8],
        max: &[u8],
        left_close: bool,
        right_close: bool,
    ) -> Result<Vec<Vec<u8>>> {
        let db = self.db_ref()?;
        let data_cf = self.cf_handle(ColumnFamilyIndex::DataCF)?;

        let snapshot = db.snapshot();
        let mut read_options = ReadOptions::default();
        read_options.set_snapshot(&snapshot);
        let meta = self.load_valid_meta(db, &read_options, key)?;

        let left_no_limit = min == b"-";
        let right_no_limit = max == b"+";
        let version = meta.version();
        let stop_index = meta.count() as i32 - 1;
        let mut cur_index: i32 = 0;
        let mut members = Vec::new();

        let seek_key = ZSetsMemberKey::new(key, version, b"").encode();
        let mut iter_options = ReadOptions::default();
        iter_options.set_snapshot(&snapshot);
        let iter = db.iterator_cf_opt(
            &data_cf,
            iter_options,
            IteratorMode::From(&seek_key, Direction::Forward),
        );
        for item in iter {
            if cur_index > stop_index {
                break;
            }
            let (raw_key, _) = item.context(RocksSnafu)?;
            let parsed_member_key = ParsedZSetsMemberKey::new(&raw_key)?;
            let member = parsed_member_key.member();
            let left_pass =
                left_no_limit || (left_close && min <= member) || (!left_close && min < member);
            let right_pass =
                right_no_limit || (right_close && member <= max) || (!right_close && member < max);
            if left_pass && right_pass {
                members.push(member.to_vec());
            }
            if !right_pass {
                break;
            }
            cur_index += 1;
        }

        Ok(members)
    }

    /// Count members between `min` and `max` in lexicographic order.
    pub fn zlexcount(
        &self,
        key: &[u8],
        min: &[u8],
        max: &[u8],
        left_close: bool,
        right_close: bool,
    ) -> Result<i32> {
        let members = self.zrangebylex(key, min, max, left_close, right_close)?;
        Ok(members.len() as i32)
    }

    /// Remove members between `min` and `max` in lexicographic order.
    pub fn zremrangebylex(
        &self,
        key: &[u8],
        min: &[u8],
        max: &[u8],
        left_close: bool,
        right_close: bool,
    ) -> Result<i32> {
        let db = self.db_ref()?;
        let meta_cf = self.cf_handle(ColumnFamilyIndex::MetaCF)?;
        let data_cf = self.cf_handle(ColumnFamilyIndex::DataCF)?;
        let score_cf = self.cf_handle(ColumnFamilyIndex::ScoreCF)?;

        let snapshot = db.snapshot();
        let mut read_options = ReadOptions::default();
        read_options.set_snapshot(&snapshot);
        let _lock = ScopeRecordLock::new(&self.lock_mgr, key);
        let mut meta = self.load_valid_meta(db, &read_options, key)?;

        let left_no_limit = min == b"-";
        let right_no_limit = max == b"+";
        let version = meta.version();
        let stop_index = meta.count() as i32 - 1;
        let mut cur_index: i32 = 0;
        let mut del_cnt: i32 = 0;
        let mut batch = WriteBatch::default();

        let seek_key = ZSetsMemberKey::new(key, version, b"").encode();
        let mut iter_options = ReadOptions::default();
        iter_options.set_snapshot(&snapshot);
        let iter = db.iterator_cf_opt(
            &data_cf,
            iter_options,
            IteratorMode::From(&seek_key, Direction::Forward),
        );
        for item in iter {
            if cur_index > stop_index {
                break;
            }
            let (raw_key, raw_value) = item.context(RocksSnafu)?;
            let parsed_member_key = ParsedZSetsMemberKey::new(&raw_key)?;
            let member = parsed_member_key.member();
            let left_pass =
                left_no_limit || (left_close && min <= member) || (!left_close && min < member);
            let right_pass =
                right_no_limit || (right_close && member <= max) || (!right_close && member < max);
            if left_pass && right_pass {
                batch.delete_cf(&data_cf, &raw_key);
                let score = decode_score(&raw_value)?;
                let score_key = ZSetsScoreKey::new(key, version, score, member).encode();
                batch.delete_cf(&score_cf, &score_key);
                del_cnt += 1;
            }
            if !right_pass {
                break;
            }
            cur_index += 1;
        }

        if del_cnt > 0 {
            meta.modify_count(-del_cnt);
            batch.put_cf(&meta_cf, key, meta.encoded());
        }
        db.write_opt(batch, &self.write_options).context(RocksSnafu)?;
        Ok(del_cnt)
    }

    /// Incremental member iteration. Returns matching members plus the
    /// cursor for the next call; 0 means the set is exhausted. A cursor whose
    /// side-table entry was evicted restarts from the beginning.
    pub fn zscan(
        &self,
        key: &[u8],
        cursor: i64,
        pattern: &str,
        count: i64,
    ) -> Result<(Vec<ScoreMember>, i64)> {
        if cursor < 0 {
            return Ok((Vec::new(), 0));
        }

        let db = self.db_ref()?;
        let data_cf = self.cf_handle(ColumnFamilyIndex::DataCF)?;

        let snapshot = db.snapshot();
        let mut read_options = ReadOptions::default();
        read_options.set_snapshot(&snapshot);
        let meta = self.load_valid_meta(db, &read_options, key)?;

        let version = meta.version();
        let mut cursor = cursor;
        let start_member = match self.zscan_cursors_store.start_member(key, pattern, cursor) {
            Some(member) => member,
            None => {
                cursor = 0;
                Vec::new()
            }
        };

        let prefix = ZSetsMemberKey::new(key, version, b"").encode();
        let seek_key = ZSetsMemberKey::new(key, version, &start_member).encode();
        let mut rest = count;
        let mut next_cursor = 0;
        let mut score_members = Vec::new();

        let mut iter_options = ReadOptions::default();
        iter_options.set_snapshot(&snapshot);
        let iter = db.iterator_cf_opt(
            &data_cf,
            iter_options,
            IteratorMode::From(&seek_key, Direction::Forward),
        );
        for item in iter {
            let (raw_key, raw_value) = item.context(RocksSnafu)?;
            if !raw_key.starts_with(&prefix) {
                break;
            }
            let parsed_member_key = ParsedZSetsMemberKey::new(&raw_key)?;
            if rest <= 0 {
                // stopped inside the set: remember where to pick up
                next_cursor = cursor + count;
                self.zscan_cursors_store.store_next_member(
                    key,
                    pattern,
                    next_cursor,
                    parsed_member_key.member(),
                );
                break;
            }
            let member = parsed_member_key.member();
            if string_match(pattern.as_bytes(), member) {
                score_members.push(ScoreMember::new(decode_score(&raw_value)?, member.to_vec()));
            }
            rest -= 1;
        }

        Ok((score_members, next_cursor))
    }

    /// Set a relative TTL. `ttl <= 0` deletes the key logically.
    pub fn expire(&self, key: &[u8], ttl: i64) -> Result<()> {
        let db = self.db_ref()?;
        let meta_cf = self.cf_handle(ColumnFamilyIndex::MetaCF)?;

        let _lock = ScopeRecordLock::new(&self.lock_mgr, key);
        match db.get_cf(&meta_cf, key).context(RocksSnafu)? {
            Some(meta_value) => {
                let mut parsed_meta = ParsedZSetsMetaValue::new(BytesMut::from(&meta_value[..]))?;
                if parsed_meta.is_stale() {
                    return KeyNotFoundSnafu {
                        message: STALE_TAG.to_string(),
                    }
                    .fail();
                }
                if ttl > 0 {
                    parsed_meta.set_relative_timestamp(ttl)?;
                } else {
                    parsed_meta.initial_meta_value();
                }
                db.put_cf_opt(&meta_cf, key, parsed_meta.encoded(), &self.write_options)
                    .context(RocksSnafu)?;
                Ok(())
            }
            None => KeyNotFoundSnafu {
                message: String::from_utf8_lossy(key).to_string(),
            }
            .fail(),
        }
    }

    /// Set the absolute expiry timestamp.
    pub fn expireat(&self, key: &[u8], timestamp: i32) -> Result<()> {
        let db = self.db_ref()?;
        let meta_cf = self.cf_handle(ColumnFamilyIndex::MetaCF)?;

        let _lock = ScopeRecordLock::new(&self.lock_mgr, key);
        match db.get_cf(&meta_cf, key).context(RocksSnafu)? {
            Some(meta_value) => {
                let mut parsed_meta = ParsedZSetsMetaValue::new(BytesMut::from(&meta_value[..]))?;
                if parsed_meta.is_stale() {
                    return KeyNotFoundSnafu {
                        message: STALE_TAG.to_string(),
                    }
                    .fail();
                }
                parsed_meta.set_timestamp(timestamp);
                db.put_cf_opt(&meta_cf, key, parsed_meta.encoded(), &self.write_options)
                    .context(RocksSnafu)?;
                Ok(())
            }
            None => KeyNotFoundSnafu {
                message: String::from_utf8_lossy(key).to_string(),
            }
            .fail(),
        }
    }

    /// Drop the TTL. NotFound when the key has no TTL to drop.
    pub fn persist(&self, key: &[u8]) -> Result<()> {
        let db = self.db_ref()?;
        let meta_cf = self.cf_handle(ColumnFamilyIndex::MetaCF)?;

        let _lock = ScopeRecordLock::new(&self.lock_mgr, key);
        match db.get_cf(&meta_cf, key).context(RocksSnafu)? {
            Some(meta_value) => {
                let mut parsed_meta = ParsedZSetsMetaValue::new(BytesMut::from(&meta_value[..]))?;
                if parsed_meta.is_stale() {
                    return KeyNotFoundSnafu {
                        message: STALE_TAG.to_string(),
                    }
                    .fail();
                }
                if parsed_meta.timestamp() == 0 {
                    return KeyNotFoundSnafu {
                        message: "Not have an associated timeout".to_string(),
                    }
                    .fail();
                }
                parsed_meta.set_timestamp(0);
                db.put_cf_opt(&meta_cf, key, parsed_meta.encoded(), &self.write_options)
                    .context(RocksSnafu)?;
                Ok(())
            }
            None => KeyNotFoundSnafu {
                message: String::from_utf8_lossy(key).to_string(),
            }
            .fail(),
        }
    }

    /// Remaining TTL in seconds: -2 when absent or stale, -1 when no expiry.
    pub fn ttl(&self, key: &[u8]) -> Result<i64> {
        let db = self.db_ref()?;
        let meta_cf = self.cf_handle(ColumnFamilyIndex::MetaCF)?;

        match db.get_cf(&meta_cf, key).context(RocksSnafu)? {
            Some(meta_value) => {
                let parsed_meta = ParsedZSetsMetaValue::new(BytesMut::from(&meta_value[..]))?;
                if parsed_meta.is_stale() {
                    return Ok(-2);
                }
                if parsed_meta.timestamp() == 0 {
                    return Ok(-1);
                }
                Ok(parsed_meta.timestamp() as i64 - Utc::now().timestamp())
            }
            None => Ok(-2),
        }
    }

    /// Logical delete: one meta write bumps the version; data/score rows
    /// linger until compaction reaps them.
    pub fn del(&self, key: &[u8]) -> Result<()> {
        let db = self.db_ref()?;
        let meta_cf = self.cf_handle(ColumnFamilyIndex::MetaCF)?;

        let _lock = ScopeRecordLock::new(&self.lock_mgr, key);
        let read_options = ReadOptions::default();
        let mut meta = self.load_valid_meta(db, &read_options, key)?;
        meta.initial_meta_value();
        db.put_cf_opt(&meta_cf, key, meta.encoded(), &self.write_options)
            .context(RocksSnafu)?;
        Ok(())
    }

    /// Key-space iteration over live sorted sets, resuming at `start_key`.
    /// `count` budgets how many live keys are visited, matching or not.
    pub fn scan(&self, start_key: &[u8], pattern: &str, count: i64) -> Result<KeyScanResult> {
        let db = self.db_ref()?;
        let meta_cf = self.cf_handle(ColumnFamilyIndex::MetaCF)?;

        let snapshot = db.snapshot();
        let mut iter_options = ReadOptions::default();
        iter_options.set_snapshot(&snapshot);
        iter_options.fill_cache(false);

        let mut result = KeyScanResult {
            is_finish: true,
            ..Default::default()
        };
        let mut remain = count;
        let iter = db.iterator_cf_opt(
            &meta_cf,
            iter_options,
            IteratorMode::From(start_key, Direction::Forward),
        );
        for item in iter {
            let (raw_key, raw_value) = item.context(RocksSnafu)?;
            if remain <= 0 {
                result.next_key = raw_key.to_vec();
                result.is_finish = false;
                break;
            }
            let parsed_meta = ParsedZSetsMetaValue::new(BytesMut::from(&raw_value[..]))?;
            if parsed_meta.is_stale() {
                continue;
            }
            if string_match(pattern.as_bytes(), &raw_key) {
                result.keys.push(raw_key.to_vec());
            }
            remain -= 1;
        }

        Ok(result)
    }

    /// Number of live sorted sets.
    pub fn scan_key_num(&self) -> Result<u64> {
        let db = self.db_ref()?;
        let meta_cf = self.cf_handle(ColumnFamilyIndex::MetaCF)?;

        let snapshot = db.snapshot();
        let mut iter_options = ReadOptions::default();
        iter_options.set_snapshot(&snapshot);
        iter_options.fill_cache(false);

        let mut num = 0;
        let iter = db.iterator_cf_opt(&meta_cf, iter_options, IteratorMode::Start);
        for item in iter {
            let (_, raw_value) = item.context(RocksSnafu)?;
            let parsed_meta = ParsedZSetsMetaValue::new(BytesMut::from(&raw_value[..]))?;
            if parsed_meta.is_valid() {
                num += 1;
            }
        }

        Ok(num)
    }

    /// All live sorted set keys matching `pattern`.
    pub fn scan_keys(&self, pattern: &str) -> Result<Vec<Vec<u8>>> {
        let db = self.db_ref()?;
        let meta_cf = self.cf_handle(ColumnFamilyIndex::MetaCF)?;

        let snapshot = db.snapshot();
        let mut iter_options = ReadOptions::default();
        iter_options.set_snapshot(&snapshot);
        iter_options.fill_cache(false);

        let mut keys = Vec::new();
        let iter = db.iterator_cf_opt(&meta_cf, iter_options, IteratorMode::Start);
        for item in iter {
            let (raw_key, raw_value) = item.context(RocksSnafu)?;
            let parsed_meta = ParsedZSetsMetaValue::new(BytesMut::from(&raw_value[..]))?;
            if parsed_meta.is_valid() && string_match(pattern.as_bytes(), &raw_key) {
                keys.push(raw_key.to_vec());
            }
        }

        Ok(keys)
    }

    /// Fetch the meta row and fail with NotFound when the set is absent,
    /// expired (tagged "Stale") or empty.
    fn load_valid_meta(
        &self,
        db: &DB,
        read_options: &ReadOptions,
        key: &[u8],
    ) -> Result<ParsedZSetsMetaValue> {
        let meta_cf = self.cf_handle(ColumnFamilyIndex::MetaCF)?;
        let Some(meta_value) = db
            .get_cf_opt(&meta_cf, key, read_options)
            .context(RocksSnafu)?
        else {
            return KeyNotFoundSnafu {
                message: String::from_utf8_lossy(key).to_string(),
            }
            .fail();
        };

        let parsed_meta = ParsedZSetsMetaValue::new(BytesMut::from(&meta_value[..]))?;
        if parsed_meta.is_stale() {
            return KeyNotFoundSnafu {
                message: STALE_TAG.to_string(),
            }
            .fail();
        }
        if parsed_meta.count() == 0 {
            return KeyNotFoundSnafu {
                message: String::from_utf8_lossy(key).to_string(),
            }
            .fail();
        }
        Ok(parsed_meta)
    }

    /// Re-point `destination` at a fresh generation holding `count` members
    /// and stage the meta write; the caller stages the member rows.
    fn overwrite_destination_meta(
        &self,
        db: &DB,
        read_options: &ReadOptions,
        destination: &[u8],
        count: u32,
        batch: &mut WriteBatch,
    ) -> Result<u32> {
        let meta_cf = self.cf_handle(ColumnFamilyIndex::MetaCF)?;
        match db
            .get_cf_opt(&meta_cf, destination, read_options)
            .context(RocksSnafu)?
        {
            Some(meta_value) => {
                let mut parsed_meta = ParsedZSetsMetaValue::new(BytesMut::from(&meta_value[..]))?;
                let version = parsed_meta.initial_meta_value();
                parsed_meta.set_count(count);
                batch.put_cf(&meta_cf, destination, parsed_meta.encoded());
                Ok(version)
            }
            None => {
                let mut meta = ZSetsMetaValue::new(count);
                let version = meta.update_version();
                batch.put_cf(&meta_cf, destination, &meta.encode());
                Ok(version)
            }
        }
    }
}

#[inline]
fn encode_score(score: f64) -> [u8; SCORE_LENGTH] {
    score.to_bits().to_le_bytes()
}

fn decode_score(data_value: &[u8]) -> Result<f64> {
    ensure!(
        data_value.len() == SCORE_LENGTH,
        CorruptionSnafu {
            message: format!("score value has wrong width: {} bytes", data_value.len()),
        }
    );
    let bits = u64::from_le_bytes(data_value.try_into().unwrap());
    Ok(f64::from_bits(bits))
}

#[inline]
fn left_pass(min: f64, left_close: bool, score: f64) -> bool {
    (left_close && min <= score) || (!left_close && min < score)
}

#[inline]
fn right_pass(max: f64, right_close: bool, score: f64) -> bool {
    (right_close && score <= max) || (!right_close && score < max)
}

/// Aggregated `-0.0` collapses to `+0.0`; stored bits stay raw otherwise.
#[inline]
fn normalized(score: f64) -> f64 {
    if score == 0.0 { 0.0 } else { score }
}

/// Resolve possibly-negative rank bounds against `count` and clamp.
fn resolve_rank_range(start: i32, stop: i32, count: i32) -> (i32, i32) {
    let start_index = if start >= 0 { start } else { count + start };
    let stop_index = if stop >= 0 { stop } else { count + stop };
    let start_index = start_index.max(0);
    let stop_index = stop_index.min(count - 1);
    (start_index, stop_index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_rank_range() {
        assert_eq!(resolve_rank_range(0, -1, 5), (0, 4));
        assert_eq!(resolve_rank_range(-2, -1, 5), (3, 4));
        assert_eq!(resolve_rank_range(1, 100, 5), (1, 4));
        assert_eq!(resolve_rank_range(-100, 2, 5), (0, 2));
        let (start, stop) = resolve_rank_range(3, 1, 5);
        assert!(start > stop);
    }

    #[test]
    fn test_score_codec_roundtrip() {
        for score in [0.0, -0.0, 1.5, -2.25, f64::MAX, f64::NEG_INFINITY] {
            let decoded = decode_score(&encode_score(score)).unwrap();
            assert_eq!(decoded.to_bits(), score.to_bits());
        }
        assert!(decode_score(b"short").is_err());
    }

    #[test]
    fn test_bound_checks() {
        assert!(left_pass(1.0, true, 1.0));
        assert!(!left_pass(1.0, false, 1.0));
        assert!(right_pass(3.0, true, 3.0));
        assert!(!right_pass(3.0, false, 3.0));
    }

    #[test]
    fn test_normalized_zero() {
        assert!(normalized(-0.0).is_sign_positive());
        assert_eq!(normalized(2.5), 2.5);
    }
}

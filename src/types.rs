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

//! Type definitions for the sorted set engine

/// Score-Member pair of a sorted set element
#[derive(Debug, Clone)]
pub struct ScoreMember {
    pub score: f64,
    pub member: Vec<u8>,
}

impl ScoreMember {
    pub fn new(score: f64, member: Vec<u8>) -> Self {
        Self { score, member }
    }
}

impl PartialEq for ScoreMember {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.member == other.member
    }
}

/// Key with the generation it was observed at
#[derive(Debug, Clone, PartialEq)]
pub struct KeyVersion {
    pub key: Vec<u8>,
    pub version: u32,
}

impl KeyVersion {
    pub fn new(key: Vec<u8>, version: u32) -> Self {
        Self { key, version }
    }
}

/// Aggregation mode for ZUNIONSTORE / ZINTERSTORE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Sum,
    Min,
    Max,
}

/// Result of one key-space SCAN step over the meta column family
#[derive(Debug, Clone, Default)]
pub struct KeyScanResult {
    pub keys: Vec<Vec<u8>>,
    /// Where the next SCAN call should resume; empty when finished.
    pub next_key: Vec<u8>,
    /// True when the iterator ran out before `count` did.
    pub is_finish: bool,
}

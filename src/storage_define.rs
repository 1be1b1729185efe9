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

//! Shared byte-layout constants for the three column families.
//!
//! Every data/score row key starts with a `u32` length prefix of the user
//! key, so parsers can recover the key boundary without a delimiter:
//!
//! ```text
//! member key: | ksize | key | version | member |
//!             |  4B   | ... |   4B    |  ...   |
//!
//! score key:  | ksize | key | version | score | member |
//!             |  4B   | ... |   4B    |  8B   |  ...   |
//! ```

/// Length of the `ksize` prefix on data/score row keys.
pub const KEY_SIZE_LENGTH: usize = 4;
/// Length of the per-key generation counter.
pub const VERSION_LENGTH: usize = 4;
/// Length of a score stored as raw IEEE-754 bits.
pub const SCORE_LENGTH: usize = 8;
/// Length of the expiry timestamp in the meta value.
pub const TIMESTAMP_LENGTH: usize = 4;
/// Length of the member count in the meta value.
pub const COUNT_LENGTH: usize = 4;

/// version(4B) + count(4B) + timestamp(4B)
pub const META_VALUE_LENGTH: usize = VERSION_LENGTH + COUNT_LENGTH + TIMESTAMP_LENGTH;

/// Shortest well-formed member key: ksize prefix plus version, empty key and
/// empty member.
pub const MEMBER_KEY_MIN_LENGTH: usize = KEY_SIZE_LENGTH + VERSION_LENGTH;
/// Shortest well-formed score key.
pub const SCORE_KEY_MIN_LENGTH: usize = KEY_SIZE_LENGTH + VERSION_LENGTH + SCORE_LENGTH;

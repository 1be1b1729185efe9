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
use snafu::ensure;

use crate::coding::decode_fixed;
use crate::error::{CorruptionSnafu, Result};
use crate::storage_define::{KEY_SIZE_LENGTH, SCORE_KEY_MIN_LENGTH, SCORE_LENGTH, VERSION_LENGTH};

/* score-to-member row key in the score column family. format:
 * | ksize | key | version | score | member |
 * |  4B   |     |    4B   |  8B   |        |
 *
 * The score is the raw IEEE-754 bit pattern (so -0.0 and NaN survive the
 * round trip); numeric ordering comes from the column family's custom
 * comparator, not from the byte encoding.
 */
#[derive(Debug, Clone)]
pub struct ZSetsScoreKey<'a> {
    key: &'a [u8],
    version: u32,
    score: f64,
    member: &'a [u8],
}

impl<'a> ZSetsScoreKey<'a> {
    pub fn new(key: &'a [u8], version: u32, score: f64, member: &'a [u8]) -> Self {
        ZSetsScoreKey {
            key,
            version,
            score,
            member,
        }
    }

    pub fn encode(&self) -> BytesMut {
        let needed =
            KEY_SIZE_LENGTH + self.key.len() + VERSION_LENGTH + SCORE_LENGTH + self.member.len();
        let mut dst = BytesMut::with_capacity(needed);

        dst.put_u32_le(self.key.len() as u32);
        dst.put_slice(self.key);
        dst.put_u32_le(self.version);
        dst.put_u64_le(self.score.to_bits());
        dst.put_slice(self.member);
        dst
    }
}

/// Borrowed view over an encoded score key; never allocates.
pub struct ParsedZSetsScoreKey<'a> {
    key: &'a [u8],
    version: u32,
    score: f64,
    member: &'a [u8],
}

impl<'a> ParsedZSetsScoreKey<'a> {
    pub fn new(encoded_key: &'a [u8]) -> Result<Self> {
        ensure!(
            encoded_key.len() >= SCORE_KEY_MIN_LENGTH,
            CorruptionSnafu {
                message: format!("score key too short: {} bytes", encoded_key.len()),
            }
        );

        let ksize = decode_fixed::<u32>(encoded_key) as usize;
        ensure!(
            encoded_key.len() >= SCORE_KEY_MIN_LENGTH + ksize,
            CorruptionSnafu {
                message: format!(
                    "score key truncated: ksize {} but only {} bytes",
                    ksize,
                    encoded_key.len(),
                ),
            }
        );

        let key = &encoded_key[KEY_SIZE_LENGTH..KEY_SIZE_LENGTH + ksize];
        let version_start = KEY_SIZE_LENGTH + ksize;
        let version = decode_fixed::<u32>(&encoded_key[version_start..]);
        let score_start = version_start + VERSION_LENGTH;
        let score = f64::from_bits(decode_fixed::<u64>(&encoded_key[score_start..]));
        let member = &encoded_key[score_start + SCORE_LENGTH..];

        Ok(ParsedZSetsScoreKey {
            key,
            version,
            score,
            member,
        })
    }

    pub fn key(&self) -> &[u8] {
        self.key
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn member(&self) -> &[u8] {
        self.member
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_key_encode_and_parse() {
        let encoded = ZSetsScoreKey::new(b"board", 9, 3.25, b"bob").encode();
        assert_eq!(
            encoded.len(),
            KEY_SIZE_LENGTH + b"board".len() + VERSION_LENGTH + SCORE_LENGTH + b"bob".len()
        );

        let parsed = ParsedZSetsScoreKey::new(&encoded).unwrap();
        assert_eq!(parsed.key(), b"board");
        assert_eq!(parsed.version(), 9);
        assert_eq!(parsed.score(), 3.25);
        assert_eq!(parsed.member(), b"bob");
    }

    #[test]
    fn test_score_key_preserves_raw_bits() {
        let neg_zero = ZSetsScoreKey::new(b"k", 1, -0.0, b"m").encode();
        let parsed = ParsedZSetsScoreKey::new(&neg_zero).unwrap();
        assert!(parsed.score().is_sign_negative());
        assert_eq!(parsed.score(), 0.0);

        let nan = ZSetsScoreKey::new(b"k", 1, f64::NAN, b"m").encode();
        let parsed = ParsedZSetsScoreKey::new(&nan).unwrap();
        assert!(parsed.score().is_nan());
    }

    #[test]
    fn test_score_key_truncated_fails() {
        let encoded = ZSetsScoreKey::new(b"key", 1, 1.0, b"").encode();
        assert!(ParsedZSetsScoreKey::new(&encoded[..encoded.len() - 1]).is_err());
    }
}

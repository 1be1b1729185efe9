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
use crate::storage_define::{KEY_SIZE_LENGTH, MEMBER_KEY_MIN_LENGTH, VERSION_LENGTH};

// member-to-score row key in the data column family. format:
// | ksize | key | version | member |
// |  4B   |     |    4B   |        |
//
// Encoding with an empty member yields the seek prefix for a whole
// (key, version) generation.

#[derive(Debug, Clone)]
pub struct ZSetsMemberKey<'a> {
    key: &'a [u8],
    version: u32,
    member: &'a [u8],
}

impl<'a> ZSetsMemberKey<'a> {
    pub fn new(key: &'a [u8], version: u32, member: &'a [u8]) -> Self {
        ZSetsMemberKey {
            key,
            version,
            member,
        }
    }

    pub fn encode(&self) -> BytesMut {
        let needed = KEY_SIZE_LENGTH + self.key.len() + VERSION_LENGTH + self.member.len();
        let mut dst = BytesMut::with_capacity(needed);

        dst.put_u32_le(self.key.len() as u32);
        dst.put_slice(self.key);
        dst.put_u32_le(self.version);
        dst.put_slice(self.member);
        dst
    }
}

/// Borrowed view over an encoded member key; never allocates.
pub struct ParsedZSetsMemberKey<'a> {
    key: &'a [u8],
    version: u32,
    member: &'a [u8],
}

impl<'a> ParsedZSetsMemberKey<'a> {
    pub fn new(encoded_key: &'a [u8]) -> Result<Self> {
        ensure!(
            encoded_key.len() >= MEMBER_KEY_MIN_LENGTH,
            CorruptionSnafu {
                message: format!("member key too short: {} bytes", encoded_key.len()),
            }
        );

        let ksize = decode_fixed::<u32>(encoded_key) as usize;
        ensure!(
            encoded_key.len() >= MEMBER_KEY_MIN_LENGTH + ksize,
            CorruptionSnafu {
                message: format!(
                    "member key truncated: ksize {} but only {} bytes",
                    ksize,
                    encoded_key.len(),
                ),
            }
        );

        let key = &encoded_key[KEY_SIZE_LENGTH..KEY_SIZE_LENGTH + ksize];
        let version = decode_fixed::<u32>(&encoded_key[KEY_SIZE_LENGTH + ksize..]);
        let member = &encoded_key[KEY_SIZE_LENGTH + ksize + VERSION_LENGTH..];

        Ok(ParsedZSetsMemberKey {
            key,
            version,
            member,
        })
    }

    pub fn key(&self) -> &[u8] {
        self.key
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn member(&self) -> &[u8] {
        self.member
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_key_encode_and_parse() {
        let encoded = ZSetsMemberKey::new(b"gamescores", 42, b"alice").encode();
        assert_eq!(
            encoded.len(),
            KEY_SIZE_LENGTH + b"gamescores".len() + VERSION_LENGTH + b"alice".len()
        );

        let parsed = ParsedZSetsMemberKey::new(&encoded).unwrap();
        assert_eq!(parsed.key(), b"gamescores");
        assert_eq!(parsed.version(), 42);
        assert_eq!(parsed.member(), b"alice");
    }

    #[test]
    fn test_member_key_with_zero_bytes_in_key() {
        // the ksize prefix makes embedded NULs unambiguous
        let encoded = ZSetsMemberKey::new(b"a\x00b", 7, b"m\x00n").encode();
        let parsed = ParsedZSetsMemberKey::new(&encoded).unwrap();
        assert_eq!(parsed.key(), b"a\x00b");
        assert_eq!(parsed.member(), b"m\x00n");
    }

    #[test]
    fn test_member_key_empty_member_is_generation_prefix() {
        let prefix = ZSetsMemberKey::new(b"k", 3, b"").encode();
        let full = ZSetsMemberKey::new(b"k", 3, b"member").encode();
        assert!(full.starts_with(&prefix));

        let other_version = ZSetsMemberKey::new(b"k", 4, b"member").encode();
        assert!(!other_version.starts_with(&prefix));
    }

    #[test]
    fn test_member_key_truncated_fails() {
        let encoded = ZSetsMemberKey::new(b"key", 1, b"").encode();
        assert!(ParsedZSetsMemberKey::new(&encoded[..encoded.len() - 1]).is_err());
        assert!(ParsedZSetsMemberKey::new(&[0u8; 2]).is_err());
    }
}

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

use std::{cmp::Ordering, ffi::CString};

use crate::{
    coding::decode_fixed,
    storage_define::{KEY_SIZE_LENGTH, SCORE_LENGTH, VERSION_LENGTH},
};

pub fn zsets_score_key_comparator_name() -> CString {
    CString::new("zsets-storage.ZSetsScoreKeyComparator").unwrap()
}

/// ## ZSetsScoreKey format
/// ```text
/// | ksize | key | version | score | member |
/// |  4B   | ... |   4B    |  8B   |  ...   |
/// ```
///
/// ## Order
/// - Compare by `key` (bytewise asc)
/// - If equal, compare `version` (numeric asc)
/// - If equal, compare `score` (numeric asc, f64)
/// - If equal, compare `member` (bytewise asc)
///
/// ## Notes
/// - `version` and `score` are little-endian; this comparator, not the byte
///   encoding, enforces numeric order.
/// - NaN sorts after every ordered double; two NaNs fall back to their raw
///   bit patterns so the order stays total.
#[inline(always)]
pub fn zsets_score_key_compare(a: &[u8], b: &[u8]) -> Ordering {
    let a_size = a.len();
    let b_size = b.len();

    if a_size < KEY_SIZE_LENGTH || b_size < KEY_SIZE_LENGTH {
        return a.cmp(b);
    }

    let a_ksize = decode_fixed::<u32>(a) as usize;
    let b_ksize = decode_fixed::<u32>(b) as usize;

    let a_version_start = KEY_SIZE_LENGTH + a_ksize;
    let b_version_start = KEY_SIZE_LENGTH + b_ksize;

    if a_version_start > a_size || b_version_start > b_size {
        return a.cmp(b);
    }

    // compare user key
    let a_key = &a[KEY_SIZE_LENGTH..a_version_start];
    let b_key = &b[KEY_SIZE_LENGTH..b_version_start];
    match a_key.cmp(b_key) {
        Ordering::Equal => {}
        other => return other,
    }

    // compare version
    if a_version_start + VERSION_LENGTH > a_size || b_version_start + VERSION_LENGTH > b_size {
        return a.cmp(b);
    }

    let version_a = decode_fixed::<u32>(&a[a_version_start..]);
    let version_b = decode_fixed::<u32>(&b[b_version_start..]);
    match version_a.cmp(&version_b) {
        Ordering::Equal => {}
        other => return other,
    }

    // compare score, numerically as doubles
    let a_score_start = a_version_start + VERSION_LENGTH;
    let b_score_start = b_version_start + VERSION_LENGTH;

    if a_score_start + SCORE_LENGTH > a_size || b_score_start + SCORE_LENGTH > b_size {
        return a.cmp(b);
    }

    let bits_a = decode_fixed::<u64>(&a[a_score_start..]);
    let bits_b = decode_fixed::<u64>(&b[b_score_start..]);
    let score_a = f64::from_bits(bits_a);
    let score_b = f64::from_bits(bits_b);

    let score_order = match score_a.partial_cmp(&score_b) {
        Some(ordering) => ordering,
        None => match (score_a.is_nan(), score_b.is_nan()) {
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            _ => bits_a.cmp(&bits_b),
        },
    };
    match score_order {
        Ordering::Equal => {}
        other => return other,
    }

    // compare member
    let a_member = &a[a_score_start + SCORE_LENGTH..];
    let b_member = &b[b_score_start + SCORE_LENGTH..];
    a_member.cmp(b_member)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zsets_score_key_format::ZSetsScoreKey;

    fn compare(a: &ZSetsScoreKey, b: &ZSetsScoreKey) -> Ordering {
        zsets_score_key_compare(&a.encode(), &b.encode())
    }

    #[test]
    fn test_compare_key_first() {
        let a = ZSetsScoreKey::new(b"alpha", 1, 9.0, b"m");
        let b = ZSetsScoreKey::new(b"beta", 1, 1.0, b"m");
        assert_eq!(compare(&a, &b), Ordering::Less);
    }

    #[test]
    fn test_compare_version_numeric() {
        let a = ZSetsScoreKey::new(b"k", 2, 9.0, b"m");
        let b = ZSetsScoreKey::new(b"k", 10, 1.0, b"m");
        assert_eq!(compare(&a, &b), Ordering::Less);
    }

    #[test]
    fn test_compare_score_numeric_not_bytewise() {
        // negative scores have a larger raw bit pattern but must sort first
        let a = ZSetsScoreKey::new(b"k", 1, -5.0, b"m");
        let b = ZSetsScoreKey::new(b"k", 1, 2.0, b"m");
        assert_eq!(compare(&a, &b), Ordering::Less);

        let a = ZSetsScoreKey::new(b"k", 1, 1.5, b"m");
        let b = ZSetsScoreKey::new(b"k", 1, 1.25, b"m");
        assert_eq!(compare(&a, &b), Ordering::Greater);
    }

    #[test]
    fn test_compare_member_breaks_score_ties() {
        let a = ZSetsScoreKey::new(b"k", 1, 3.0, b"apple");
        let b = ZSetsScoreKey::new(b"k", 1, 3.0, b"banana");
        assert_eq!(compare(&a, &b), Ordering::Less);
        assert_eq!(compare(&a, &a), Ordering::Equal);
    }

    #[test]
    fn test_seek_prefix_sorts_before_all_members() {
        // the empty-member seek key at -inf lands before every row of the set
        let seek = ZSetsScoreKey::new(b"k", 1, f64::NEG_INFINITY, b"");
        let lowest = ZSetsScoreKey::new(b"k", 1, f64::MIN, b"a");
        assert_eq!(compare(&seek, &lowest), Ordering::Less);

        let prev_key = ZSetsScoreKey::new(b"j", 1, f64::MAX, b"zzz");
        assert_eq!(compare(&prev_key, &seek), Ordering::Less);
    }

    #[test]
    fn test_nan_sorts_last() {
        let nan = ZSetsScoreKey::new(b"k", 1, f64::NAN, b"m");
        let inf = ZSetsScoreKey::new(b"k", 1, f64::INFINITY, b"m");
        assert_eq!(compare(&inf, &nan), Ordering::Less);
        assert_eq!(compare(&nan, &inf), Ordering::Greater);
    }
}

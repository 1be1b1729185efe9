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

mod zsets_test {
    use std::sync::Arc;

    use tempfile::TempDir;
    use zsets_storage::{Aggregate, LockMgr, ScoreMember, StorageOptions, ZSets};

    fn open_zsets() -> (ZSets, TempDir) {
        let dir = TempDir::new().expect("create temp dir");
        let storage = Arc::new(StorageOptions::default());
        let lock_mgr = Arc::new(LockMgr::new(storage.lock_shard_num));
        let mut zsets = ZSets::new(storage, lock_mgr);
        zsets
            .open(dir.path().to_str().unwrap())
            .expect("open zsets db");
        (zsets, dir)
    }

    fn sm(score: f64, member: &str) -> ScoreMember {
        ScoreMember::new(score, member.as_bytes().to_vec())
    }

    fn members_of(score_members: &[ScoreMember]) -> Vec<&str> {
        score_members
            .iter()
            .map(|sm| std::str::from_utf8(&sm.member).unwrap())
            .collect()
    }

    #[test]
    fn test_zadd_and_zrange_roundtrip() {
        let (zsets, _dir) = open_zsets();

        let added = zsets
            .zadd(b"k", &[sm(1.0, "a"), sm(2.0, "b"), sm(3.0, "c")])
            .unwrap();
        assert_eq!(added, 3);
        assert_eq!(zsets.zcard(b"k").unwrap(), 3);

        let range = zsets.zrange(b"k", 0, -1).unwrap();
        assert_eq!(
            range,
            vec![sm(1.0, "a"), sm(2.0, "b"), sm(3.0, "c")]
        );
    }

    #[test]
    fn test_zrange_sorted_by_score_then_member() {
        let (zsets, _dir) = open_zsets();

        zsets
            .zadd(
                b"k",
                &[sm(2.0, "delta"), sm(1.0, "b"), sm(1.0, "a"), sm(-3.5, "z")],
            )
            .unwrap();

        let range = zsets.zrange(b"k", 0, -1).unwrap();
        assert_eq!(members_of(&range), vec!["z", "a", "b", "delta"]);

        let middle = zsets.zrange(b"k", 1, 2).unwrap();
        assert_eq!(members_of(&middle), vec!["a", "b"]);

        assert!(zsets.zrange(b"k", 3, 1).unwrap().is_empty());
        assert!(zsets.zrange(b"missing", 0, -1).unwrap_err().is_not_found());
    }

    #[test]
    fn test_zadd_updates_existing_score() {
        let (zsets, _dir) = open_zsets();

        zsets
            .zadd(b"k", &[sm(1.0, "a"), sm(2.0, "b"), sm(3.0, "c")])
            .unwrap();
        let added = zsets.zadd(b"k", &[sm(2.0, "a")]).unwrap();
        assert_eq!(added, 0);

        assert_eq!(zsets.zscore(b"k", b"a").unwrap(), 2.0);
        assert_eq!(zsets.zcard(b"k").unwrap(), 3);

        let range = zsets.zrangebyscore(b"k", 2.0, 3.0, true, true).unwrap();
        assert_eq!(
            range,
            vec![sm(2.0, "a"), sm(2.0, "b"), sm(3.0, "c")]
        );
    }

    #[test]
    fn test_zadd_duplicate_member_keeps_first() {
        let (zsets, _dir) = open_zsets();

        let added = zsets.zadd(b"k", &[sm(1.0, "m"), sm(9.0, "m")]).unwrap();
        assert_eq!(added, 1);
        assert_eq!(zsets.zscore(b"k", b"m").unwrap(), 1.0);
    }

    #[test]
    fn test_zcard_missing_key() {
        let (zsets, _dir) = open_zsets();
        assert!(zsets.zcard(b"nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_zcount_bounds() {
        let (zsets, _dir) = open_zsets();
        zsets
            .zadd(b"k", &[sm(1.0, "a"), sm(2.0, "b"), sm(3.0, "c"), sm(4.0, "d")])
            .unwrap();

        assert_eq!(zsets.zcount(b"k", 1.0, 4.0, true, true).unwrap(), 4);
        assert_eq!(zsets.zcount(b"k", 1.0, 4.0, false, true).unwrap(), 3);
        assert_eq!(zsets.zcount(b"k", 1.0, 4.0, true, false).unwrap(), 3);
        assert_eq!(zsets.zcount(b"k", 1.0, 4.0, false, false).unwrap(), 2);
        assert_eq!(zsets.zcount(b"k", 9.0, 10.0, true, true).unwrap(), 0);
        assert_eq!(
            zsets
                .zcount(b"k", f64::NEG_INFINITY, f64::INFINITY, true, true)
                .unwrap(),
            4
        );
    }

    #[test]
    fn test_zincrby_and_ranks() {
        let (zsets, _dir) = open_zsets();

        zsets
            .zadd(b"k", &[sm(1.0, "a"), sm(2.0, "b"), sm(3.0, "c")])
            .unwrap();
        zsets.zadd(b"k", &[sm(2.0, "a")]).unwrap();

        let new_score = zsets.zincrby(b"k", b"b", -0.5).unwrap();
        assert_eq!(new_score, 1.5);

        // order is now b(1.5), a(2.0), c(3.0)
        assert_eq!(zsets.zrank(b"k", b"b").unwrap(), 0);
        assert_eq!(zsets.zrank(b"k", b"a").unwrap(), 1);
        assert_eq!(zsets.zrank(b"k", b"c").unwrap(), 2);
        assert_eq!(zsets.zrevrank(b"k", b"c").unwrap(), 0);
        assert_eq!(zsets.zrevrank(b"k", b"a").unwrap(), 1);
        assert_eq!(zsets.zrevrank(b"k", b"b").unwrap(), 2);
        assert!(zsets.zrank(b"k", b"ghost").unwrap_err().is_not_found());
    }

    #[test]
    fn test_zincrby_creates_key_and_member() {
        let (zsets, _dir) = open_zsets();

        assert_eq!(zsets.zincrby(b"fresh", b"m", 2.5).unwrap(), 2.5);
        assert_eq!(zsets.zcard(b"fresh").unwrap(), 1);

        assert_eq!(zsets.zincrby(b"fresh", b"other", 1.0).unwrap(), 1.0);
        assert_eq!(zsets.zcard(b"fresh").unwrap(), 2);

        assert_eq!(zsets.zincrby(b"fresh", b"m", -0.5).unwrap(), 2.0);
        assert_eq!(zsets.zcard(b"fresh").unwrap(), 2);
    }

    #[test]
    fn test_zrem() {
        let (zsets, _dir) = open_zsets();
        zsets
            .zadd(b"k", &[sm(1.0, "a"), sm(2.0, "b"), sm(3.0, "c")])
            .unwrap();

        let removed = zsets.zrem(b"k", &[b"a", b"ghost", b"c", b"a"]).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(zsets.zcard(b"k").unwrap(), 1);
        assert_eq!(members_of(&zsets.zrange(b"k", 0, -1).unwrap()), vec!["b"]);
        assert!(zsets.zscore(b"k", b"a").unwrap_err().is_not_found());
    }

    #[test]
    fn test_zremrangebyrank() {
        let (zsets, _dir) = open_zsets();
        zsets
            .zadd(
                b"k",
                &[sm(1.0, "a"), sm(2.0, "b"), sm(3.0, "c"), sm(4.0, "d")],
            )
            .unwrap();

        let removed = zsets.zremrangebyrank(b"k", 1, 2).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(members_of(&zsets.zrange(b"k", 0, -1).unwrap()), vec!["a", "d"]);

        let removed = zsets.zremrangebyrank(b"k", -1, -1).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(members_of(&zsets.zrange(b"k", 0, -1).unwrap()), vec!["a"]);
    }

    #[test]
    fn test_zremrangebyscore_open_left_closed_right() {
        let (zsets, _dir) = open_zsets();
        zsets
            .zadd(b"k", &[sm(1.5, "b"), sm(2.0, "a"), sm(3.0, "c")])
            .unwrap();

        // (1.5, 3]: removes a(2.0) and c(3.0)
        let removed = zsets.zremrangebyscore(b"k", 1.5, 3.0, false, true).unwrap();
        assert_eq!(removed, 2);

        let rest = zsets.zrange(b"k", 0, -1).unwrap();
        assert_eq!(rest, vec![sm(1.5, "b")]);
        assert_eq!(zsets.zcard(b"k").unwrap(), 1);
    }

    #[test]
    fn test_zrevrange() {
        let (zsets, _dir) = open_zsets();
        zsets
            .zadd(
                b"k",
                &[sm(1.0, "a"), sm(2.0, "b"), sm(3.0, "c"), sm(4.0, "d")],
            )
            .unwrap();

        let all = zsets.zrevrange(b"k", 0, -1).unwrap();
        assert_eq!(members_of(&all), vec!["d", "c", "b", "a"]);

        let window = zsets.zrevrange(b"k", 1, 2).unwrap();
        assert_eq!(members_of(&window), vec!["c", "b"]);
    }

    #[test]
    fn test_zrevrangebyscore() {
        let (zsets, _dir) = open_zsets();
        zsets
            .zadd(b"k", &[sm(1.0, "a"), sm(2.0, "b"), sm(3.0, "c")])
            .unwrap();

        let all = zsets
            .zrevrangebyscore(b"k", f64::NEG_INFINITY, f64::INFINITY, true, true)
            .unwrap();
        assert_eq!(members_of(&all), vec!["c", "b", "a"]);

        let some = zsets.zrevrangebyscore(b"k", 1.0, 3.0, false, false).unwrap();
        assert_eq!(members_of(&some), vec!["b"]);
    }

    #[test]
    fn test_zscore_missing_member() {
        let (zsets, _dir) = open_zsets();
        zsets.zadd(b"k", &[sm(1.0, "a")]).unwrap();
        assert!(zsets.zscore(b"k", b"nope").unwrap_err().is_not_found());
        assert!(zsets.zscore(b"missing", b"a").unwrap_err().is_not_found());
    }

    #[test]
    fn test_zrangebylex_and_zlexcount() {
        let (zsets, _dir) = open_zsets();
        zsets
            .zadd(
                b"k",
                &[sm(0.0, "a"), sm(0.0, "b"), sm(0.0, "c"), sm(0.0, "d")],
            )
            .unwrap();

        let all = zsets.zrangebylex(b"k", b"-", b"+", true, true).unwrap();
        assert_eq!(all, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec(), b"d".to_vec()]);

        let closed = zsets.zrangebylex(b"k", b"b", b"c", true, true).unwrap();
        assert_eq!(closed, vec![b"b".to_vec(), b"c".to_vec()]);

        let open = zsets.zrangebylex(b"k", b"b", b"d", false, false).unwrap();
        assert_eq!(open, vec![b"c".to_vec()]);

        assert_eq!(zsets.zlexcount(b"k", b"-", b"+", true, true).unwrap(), 4);
        assert_eq!(zsets.zlexcount(b"k", b"a", b"c", false, true).unwrap(), 2);
    }

    #[test]
    fn test_zremrangebylex() {
        let (zsets, _dir) = open_zsets();
        zsets
            .zadd(
                b"k",
                &[sm(0.0, "a"), sm(0.0, "b"), sm(0.0, "c"), sm(0.0, "d")],
            )
            .unwrap();

        let removed = zsets.zremrangebylex(b"k", b"b", b"c", true, true).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(zsets.zcard(b"k").unwrap(), 2);
        assert_eq!(
            zsets.zrangebylex(b"k", b"-", b"+", true, true).unwrap(),
            vec![b"a".to_vec(), b"d".to_vec()]
        );
    }

    #[test]
    fn test_zunionstore_weights_and_max() {
        let (zsets, _dir) = open_zsets();
        zsets.zadd(b"s1", &[sm(1.0, "x"), sm(2.0, "y")]).unwrap();
        zsets.zadd(b"s2", &[sm(1.0, "y"), sm(4.0, "z")]).unwrap();

        let card = zsets
            .zunionstore(b"dst", &[b"s1", b"s2"], &[2.0, 3.0], Aggregate::Max)
            .unwrap();
        assert_eq!(card, 3);
        assert_eq!(zsets.zcard(b"dst").unwrap(), 3);

        assert_eq!(zsets.zscore(b"dst", b"x").unwrap(), 2.0);
        assert_eq!(zsets.zscore(b"dst", b"y").unwrap(), 4.0);
        assert_eq!(zsets.zscore(b"dst", b"z").unwrap(), 12.0);
    }

    #[test]
    fn test_zunionstore_sum_overwrites_destination() {
        let (zsets, _dir) = open_zsets();
        zsets.zadd(b"s1", &[sm(1.0, "x")]).unwrap();
        zsets.zadd(b"s2", &[sm(2.0, "x"), sm(5.0, "y")]).unwrap();
        zsets.zadd(b"dst", &[sm(100.0, "stale_member")]).unwrap();

        let card = zsets
            .zunionstore(b"dst", &[b"s1", b"s2"], &[], Aggregate::Sum)
            .unwrap();
        assert_eq!(card, 2);

        assert_eq!(zsets.zscore(b"dst", b"x").unwrap(), 3.0);
        assert_eq!(zsets.zscore(b"dst", b"y").unwrap(), 5.0);
        assert!(
            zsets
                .zscore(b"dst", b"stale_member")
                .unwrap_err()
                .is_not_found()
        );
    }

    #[test]
    fn test_zunionstore_normalizes_negative_zero() {
        let (zsets, _dir) = open_zsets();
        zsets.zadd(b"s1", &[sm(-1.0, "x")]).unwrap();

        zsets
            .zunionstore(b"dst", &[b"s1"], &[0.0], Aggregate::Sum)
            .unwrap();
        let score = zsets.zscore(b"dst", b"x").unwrap();
        assert_eq!(score, 0.0);
        assert!(score.is_sign_positive());
    }

    #[test]
    fn test_zinterstore() {
        let (zsets, _dir) = open_zsets();
        zsets.zadd(b"s1", &[sm(1.0, "x"), sm(2.0, "y")]).unwrap();
        zsets.zadd(b"s2", &[sm(1.0, "y"), sm(4.0, "z")]).unwrap();

        let card = zsets
            .zinterstore(b"dst", &[b"s1", b"s2"], &[2.0, 3.0], Aggregate::Max)
            .unwrap();
        assert_eq!(card, 1);
        assert_eq!(zsets.zscore(b"dst", b"y").unwrap(), 4.0);
    }

    #[test]
    fn test_zinterstore_no_keys_is_an_error() {
        let (zsets, _dir) = open_zsets();
        let err = zsets
            .zinterstore(b"dst", &[], &[], Aggregate::Sum)
            .unwrap_err();
        assert!(matches!(err, zsets_storage::Error::Corruption { .. }));
    }

    #[test]
    fn test_zinterstore_with_missing_source_empties_destination() {
        let (zsets, _dir) = open_zsets();
        zsets.zadd(b"s1", &[sm(1.0, "x")]).unwrap();
        zsets.zadd(b"dst", &[sm(9.0, "old")]).unwrap();

        let card = zsets
            .zinterstore(b"dst", &[b"s1", b"missing"], &[], Aggregate::Sum)
            .unwrap();
        assert_eq!(card, 0);
        assert!(zsets.zcard(b"dst").unwrap_err().is_not_found());
    }

    #[test]
    fn test_del_then_zadd_starts_fresh_version() {
        let (zsets, _dir) = open_zsets();
        zsets.zadd(b"k", &[sm(1.0, "a")]).unwrap();

        zsets.expire(b"k", 0).unwrap();
        assert!(zsets.zcard(b"k").unwrap_err().is_not_found());

        let added = zsets.zadd(b"k", &[sm(5.0, "a")]).unwrap();
        assert_eq!(added, 1);
        let range = zsets.zrange(b"k", 0, -1).unwrap();
        assert_eq!(range, vec![sm(5.0, "a")]);
    }

    #[test]
    fn test_del() {
        let (zsets, _dir) = open_zsets();
        zsets.zadd(b"k", &[sm(1.0, "a"), sm(2.0, "b")]).unwrap();

        zsets.del(b"k").unwrap();
        assert!(zsets.zcard(b"k").unwrap_err().is_not_found());
        assert!(zsets.zrange(b"k", 0, -1).unwrap_err().is_not_found());
        assert!(zsets.del(b"k").unwrap_err().is_not_found());
        assert!(zsets.del(b"never_existed").unwrap_err().is_not_found());
    }

    #[test]
    fn test_expire_ttl_persist() {
        let (zsets, _dir) = open_zsets();
        zsets.zadd(b"k", &[sm(1.0, "a")]).unwrap();

        assert_eq!(zsets.ttl(b"k").unwrap(), -1);

        zsets.expire(b"k", 100).unwrap();
        let ttl = zsets.ttl(b"k").unwrap();
        assert!(ttl > 0 && ttl <= 100, "unexpected ttl {ttl}");

        zsets.persist(b"k").unwrap();
        assert_eq!(zsets.ttl(b"k").unwrap(), -1);
        assert!(zsets.persist(b"k").unwrap_err().is_not_found());

        assert_eq!(zsets.ttl(b"missing").unwrap(), -2);
    }

    #[test]
    fn test_expireat_past_makes_key_stale() {
        let (zsets, _dir) = open_zsets();
        zsets.zadd(b"k", &[sm(1.0, "a")]).unwrap();

        zsets.expireat(b"k", 1).unwrap();
        assert!(zsets.zcard(b"k").unwrap_err().is_stale());
        assert_eq!(zsets.ttl(b"k").unwrap(), -2);

        // a write to the stale key starts over
        assert_eq!(zsets.zadd(b"k", &[sm(7.0, "b")]).unwrap(), 1);
        assert_eq!(members_of(&zsets.zrange(b"k", 0, -1).unwrap()), vec!["b"]);
    }

    #[test]
    fn test_scan_keys_with_pattern_and_budget() {
        let (zsets, _dir) = open_zsets();
        zsets.zadd(b"data1", &[sm(1.0, "m")]).unwrap();
        zsets.zadd(b"data2", &[sm(1.0, "m")]).unwrap();
        zsets.zadd(b"info1", &[sm(1.0, "m")]).unwrap();
        zsets.zadd(b"zz_gone", &[sm(1.0, "m")]).unwrap();
        zsets.del(b"zz_gone").unwrap();

        let result = zsets.scan(b"", "data*", 10).unwrap();
        assert!(result.is_finish);
        assert_eq!(result.keys, vec![b"data1".to_vec(), b"data2".to_vec()]);

        // a budget of 2 live keys stops before info1
        let result = zsets.scan(b"", "*", 2).unwrap();
        assert!(!result.is_finish);
        assert_eq!(result.keys.len(), 2);
        assert_eq!(result.next_key, b"info1".to_vec());

        let result = zsets.scan(&result.next_key, "*", 2).unwrap();
        assert!(result.is_finish);
        assert_eq!(result.keys, vec![b"info1".to_vec()]);
    }

    #[test]
    fn test_scan_key_num_and_scan_keys() {
        let (zsets, _dir) = open_zsets();
        zsets.zadd(b"one", &[sm(1.0, "m")]).unwrap();
        zsets.zadd(b"two", &[sm(1.0, "m")]).unwrap();
        zsets.zadd(b"dead", &[sm(1.0, "m")]).unwrap();
        zsets.del(b"dead").unwrap();

        assert_eq!(zsets.scan_key_num().unwrap(), 2);
        let keys = zsets.scan_keys("*").unwrap();
        assert_eq!(keys, vec![b"one".to_vec(), b"two".to_vec()]);
        assert_eq!(zsets.scan_keys("t*").unwrap(), vec![b"two".to_vec()]);
    }

    #[test]
    fn test_zscan_pagination() {
        let (zsets, _dir) = open_zsets();
        let score_members: Vec<ScoreMember> = (0..26)
            .map(|i| sm(i as f64, &format!("m{i:02}")))
            .collect();
        assert_eq!(zsets.zadd(b"k", &score_members).unwrap(), 26);

        let mut seen = Vec::new();
        let (page, cursor) = zsets.zscan(b"k", 0, "*", 10).unwrap();
        assert_eq!(page.len(), 10);
        assert_eq!(cursor, 10);
        seen.extend(page);

        let (page, cursor) = zsets.zscan(b"k", cursor, "*", 10).unwrap();
        assert_eq!(page.len(), 10);
        assert_eq!(cursor, 20);
        seen.extend(page);

        let (page, cursor) = zsets.zscan(b"k", cursor, "*", 10).unwrap();
        assert_eq!(page.len(), 6);
        assert_eq!(cursor, 0);
        seen.extend(page);

        let mut members = members_of(&seen);
        members.sort_unstable();
        members.dedup();
        assert_eq!(members.len(), 26);
    }

    #[test]
    fn test_zscan_pattern_and_edge_cursors() {
        let (zsets, _dir) = open_zsets();
        zsets
            .zadd(
                b"k",
                &[sm(1.0, "apple"), sm(2.0, "apricot"), sm(3.0, "banana")],
            )
            .unwrap();

        let (page, cursor) = zsets.zscan(b"k", 0, "ap*", 10).unwrap();
        assert_eq!(cursor, 0);
        assert_eq!(members_of(&page), vec!["apple", "apricot"]);

        // negative cursor yields nothing
        let (page, cursor) = zsets.zscan(b"k", -3, "*", 10).unwrap();
        assert!(page.is_empty());
        assert_eq!(cursor, 0);

        // an evicted/unknown cursor restarts from the beginning
        let (page, cursor) = zsets.zscan(b"k", 777, "*", 2).unwrap();
        assert_eq!(members_of(&page), vec!["apple", "apricot"]);
        assert_eq!(cursor, 2);

        assert!(zsets.zscan(b"missing", 0, "*", 10).unwrap_err().is_not_found());
    }

    #[test]
    fn test_compact_range_keeps_live_data() {
        let (zsets, _dir) = open_zsets();
        zsets.zadd(b"k", &[sm(1.0, "old_a"), sm(2.0, "old_b")]).unwrap();
        zsets.del(b"k").unwrap();
        zsets.zadd(b"k", &[sm(5.0, "new_a")]).unwrap();

        zsets.compact_range(None, None).unwrap();

        // the fresh generation survives compaction, the old one stays hidden
        assert_eq!(zsets.zcard(b"k").unwrap(), 1);
        assert_eq!(members_of(&zsets.zrange(b"k", 0, -1).unwrap()), vec!["new_a"]);
        assert!(zsets.zscore(b"k", b"old_a").unwrap_err().is_not_found());
    }

    #[test]
    fn test_counts_stay_consistent_across_mutations() {
        let (zsets, _dir) = open_zsets();
        zsets
            .zadd(
                b"k",
                &[sm(1.0, "a"), sm(2.0, "b"), sm(3.0, "c"), sm(4.0, "d"), sm(5.0, "e")],
            )
            .unwrap();
        zsets.zrem(b"k", &[b"b"]).unwrap();
        zsets.zincrby(b"k", b"f", 6.0).unwrap();
        zsets.zremrangebyscore(b"k", 4.0, 5.0, true, true).unwrap();

        let card = zsets.zcard(b"k").unwrap() as usize;
        let forward = zsets.zrange(b"k", 0, -1).unwrap();
        let reverse = zsets.zrevrange(b"k", 0, -1).unwrap();
        assert_eq!(card, forward.len());
        assert_eq!(card, reverse.len());

        let mut flipped = reverse.clone();
        flipped.reverse();
        assert_eq!(forward, flipped);

        // score order is nondecreasing with member tie-break
        for pair in forward.windows(2) {
            assert!(
                pair[0].score < pair[1].score
                    || (pair[0].score == pair[1].score && pair[0].member < pair[1].member)
            );
        }
    }
}

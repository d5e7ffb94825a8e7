// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn system_clock_does_not_go_backwards() {
    let clock = SystemClock;
    let t1 = clock.now();
    let t2 = clock.now();
    assert!(t2 >= t1);
}

#[test]
fn fake_clock_starts_at_fixed_instant() {
    let clock = FakeClock::new();
    assert_eq!(clock.now().timestamp(), FAKE_EPOCH_SECS);
}

#[test]
fn fake_clock_is_cloneable_and_shared() {
    let clock1 = FakeClock::new();
    let clock2 = clock1.clone();
    let t1 = clock1.now();
    clock2.advance(Duration::from_secs(30));
    assert_eq!((clock1.now() - t1).num_seconds(), 30);
}

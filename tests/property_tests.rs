//! Property-based tests for the bulk apportionment and pagination invariants.

use proptest::prelude::*;
use uniform_issue::services::{apportion, Page};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn shares_always_sum_to_the_total(total in 1i64..10_000, recipients in 1usize..200) {
        let shares = apportion(total, recipients);
        prop_assert_eq!(shares.len(), recipients);
        prop_assert_eq!(shares.iter().sum::<i64>(), total);
        prop_assert!(shares.iter().all(|share| *share >= 0));
    }

    #[test]
    fn leading_shares_are_the_ceiling_until_stock_runs_out(total in 1i64..10_000, recipients in 1usize..200) {
        let shares = apportion(total, recipients);
        let ceiling = (total + recipients as i64 - 1) / recipients as i64;
        let mut remaining = total;
        for share in &shares[..recipients - 1] {
            prop_assert_eq!(*share, ceiling.min(remaining));
            remaining -= share;
        }
        prop_assert_eq!(shares[recipients - 1], remaining);
    }

    #[test]
    fn last_recipient_absorbs_the_remainder(per in 1i64..500, recipients in 2usize..50, short in 0i64..500) {
        let full = per * recipients as i64;
        let short = short % per.min(recipients as i64);
        let shares = apportion(full - short, recipients);
        prop_assert!(shares[..recipients - 1].iter().all(|s| *s == per));
        prop_assert_eq!(shares[recipients - 1], per - short);
    }

    #[test]
    fn totals_near_the_integer_limit_still_split_exactly(offset in 0i64..1_000, recipients in 1usize..50) {
        let total = i64::MAX - offset;
        let shares = apportion(total, recipients);
        prop_assert_eq!(shares.iter().sum::<i64>(), total);
        prop_assert!(shares.iter().all(|share| *share >= 0));
    }

    #[test]
    fn non_positive_totals_never_hand_out_stock(total in -1_000i64..=0, recipients in 1usize..50) {
        let shares = apportion(total, recipients);
        prop_assert!(shares.iter().all(|share| *share <= 0));
    }

    #[test]
    fn pages_cover_every_row_once(rows in 0usize..300, page_size in 1usize..40) {
        let data: Vec<usize> = (0..rows).collect();
        let first = Page::slice(&data, 1, page_size);
        let mut seen = Vec::new();
        for page in 1..=first.total_pages.max(1) {
            seen.extend(Page::slice(&data, page, page_size).items);
        }
        prop_assert_eq!(seen, data.clone());
        prop_assert!(Page::slice(&data, first.total_pages + 1, page_size).items.is_empty());
    }
}

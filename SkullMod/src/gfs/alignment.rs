//! Padding arithmetic shared by the GFS reader and writer
//!
//! Both sides must agree byte for byte on where each payload starts, so the
//! only padding formula lives here.

/// How the distance to the next alignment boundary is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaddingRule {
    /// `(alignment - offset % alignment) % alignment`: the distance to the
    /// next multiple of `alignment`. This is what readers (including the
    /// game) assume.
    #[default]
    Canonical,
    /// `offset % alignment`: the formula used by the historical packer.
    /// It only lands on a boundary when `offset` is already aligned or sits
    /// exactly halfway between two boundaries.
    Legacy,
}

impl PaddingRule {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PaddingRule::Canonical => "canonical",
            PaddingRule::Legacy => "legacy",
        }
    }
}

/// Number of zero bytes to insert at `offset` for the given alignment.
///
/// An alignment of 0 is treated as 1.
#[must_use]
pub fn padding_for(offset: u64, alignment: u32, rule: PaddingRule) -> u64 {
    let alignment = u64::from(alignment.max(1));
    let remainder = offset % alignment;
    match rule {
        PaddingRule::Canonical => (alignment - remainder) % alignment,
        PaddingRule::Legacy => remainder,
    }
}

/// `offset` advanced by its padding, or `None` on overflow.
#[must_use]
pub fn align_offset(offset: u64, alignment: u32, rule: PaddingRule) -> Option<u64> {
    offset.checked_add(padding_for(offset, alignment, rule))
}

/// Alignment the writer uses for every entry.
#[must_use]
pub fn alignment_for(aligned: bool) -> u32 {
    if aligned {
        super::ALIGNED
    } else {
        super::UNALIGNED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    const ALIGNMENTS: [u32; 7] = [1, 2, 3, 16, 512, 4096, 65536];

    fn alignment() -> impl Strategy<Value = u32> {
        prop::sample::select(ALIGNMENTS.to_vec())
    }

    /// Offsets near page boundaries as well as anywhere in a 48-bit range
    fn offset() -> impl Strategy<Value = u64> {
        prop_oneof![
            0u64..(1u64 << 48),
            (0u64..1024, -2i64..=2).prop_map(|(page, delta)| {
                (page * 4096).saturating_add_signed(delta)
            }),
        ]
    }

    proptest! {
        #[test]
        fn canonical_reaches_next_boundary(offset in offset(), alignment in alignment()) {
            let padding = padding_for(offset, alignment, PaddingRule::Canonical);
            prop_assert!(padding < u64::from(alignment));
            prop_assert_eq!((offset + padding) % u64::from(alignment), 0);
        }

        #[test]
        fn legacy_matches_canonical_only_when_aligned_or_halfway(
            offset in offset(),
            alignment in alignment(),
        ) {
            let a = u64::from(alignment);
            let canonical = padding_for(offset, alignment, PaddingRule::Canonical);
            let legacy = padding_for(offset, alignment, PaddingRule::Legacy);
            let remainder = offset % a;
            prop_assert_eq!(canonical == legacy, remainder == 0 || 2 * remainder == a);
        }

        #[test]
        fn unaligned_never_pads(offset in any::<u64>()) {
            prop_assert_eq!(padding_for(offset, 1, PaddingRule::Canonical), 0);
            prop_assert_eq!(padding_for(offset, 1, PaddingRule::Legacy), 0);
        }
    }

    #[test]
    fn test_legacy_agreement_cases() {
        for alignment in ALIGNMENTS {
            let a = u64::from(alignment);
            assert_eq!(
                padding_for(3 * a, alignment, PaddingRule::Legacy),
                padding_for(3 * a, alignment, PaddingRule::Canonical)
            );
            if a % 2 == 0 {
                let halfway = 5 * a + a / 2;
                assert_eq!(
                    padding_for(halfway, alignment, PaddingRule::Legacy),
                    padding_for(halfway, alignment, PaddingRule::Canonical)
                );
            }
        }
    }

    #[test]
    fn test_zero_alignment_treated_as_one() {
        assert_eq!(padding_for(123, 0, PaddingRule::Canonical), 0);
    }

    #[test]
    fn test_known_values() {
        assert_eq!(padding_for(51, 4096, PaddingRule::Canonical), 4045);
        assert_eq!(padding_for(51, 4096, PaddingRule::Legacy), 51);
        assert_eq!(padding_for(2048, 4096, PaddingRule::Legacy), 2048);
        assert_eq!(padding_for(4096, 4096, PaddingRule::Canonical), 0);
    }

    #[test]
    fn test_align_offset_overflow() {
        assert_eq!(align_offset(u64::MAX, 4096, PaddingRule::Canonical), None);
        assert_eq!(align_offset(u64::MAX, 1, PaddingRule::Canonical), Some(u64::MAX));
    }

    #[test]
    fn test_alignment_for() {
        assert_eq!(alignment_for(true), 4096);
        assert_eq!(alignment_for(false), 1);
    }
}

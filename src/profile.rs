//! Block profiles and the per-profile model-bank configuration they select.

use crate::reorder::ReorderKind;

/// A tiny bitflags-like macro so this crate doesn't need to pull in the
/// `bitflags` crate for one internal enum; kept minimal on purpose.
macro_rules! bitflags_lite {
    (
        pub struct $Name:ident: $T:ty {
            $(const $Flag:ident = $val:expr;)*
        }
    ) => {
        #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
        pub struct $Name($T);

        impl $Name {
            $(pub const $Flag: $Name = $Name($val);)*

            pub const fn empty() -> Self {
                $Name(0)
            }

            #[inline]
            pub fn contains(self, other: $Name) -> bool {
                (self.0 & other.0) == other.0
            }

            #[inline]
            pub fn bits(self) -> $T {
                self.0
            }
        }

        impl std::ops::BitOr for $Name {
            type Output = $Name;
            fn bitor(self, rhs: $Name) -> $Name {
                $Name(self.0 | rhs.0)
            }
        }
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Profile {
    Text,
    Binary,
    Wave16,
    Simple,
    Skip,
    Eof,
}

impl Profile {
    pub fn to_wire(self) -> u8 {
        match self {
            Profile::Text => 0,
            Profile::Binary => 1,
            Profile::Wave16 => 2,
            Profile::Simple => 3,
            Profile::Skip => 4,
            Profile::Eof => 5,
        }
    }

    /// Unrecognized bytes are treated as Binary, not an error — per
    /// spec.md §7's `ProfileMismatch` policy.
    pub fn from_wire(b: u8) -> Profile {
        match b {
            0 => Profile::Text,
            2 => Profile::Wave16,
            3 => Profile::Simple,
            4 => Profile::Skip,
            5 => Profile::Eof,
            _ => Profile::Binary,
        }
    }

    pub fn reorder_kind(self) -> ReorderKind {
        match self {
            Profile::Text => ReorderKind::Text,
            _ => ReorderKind::Identity,
        }
    }
}

bitflags_lite! {
    pub struct ModelSet: u32 {
        const ORDER0      = 1 << 0;
        const ORDER1      = 1 << 1;
        const ORDER2      = 1 << 2;
        const ORDER3      = 1 << 3;
        const ORDER4      = 1 << 4;
        const ORDER6      = 1 << 5;
        const ORDER8      = 1 << 6;
        const ORDER12     = 1 << 7;
        const SPARSE2     = 1 << 8;
        const SPARSE3     = 1 << 9;
        const SPARSE4     = 1 << 10;
        const SPARSE_2_3  = 1 << 11;
        const SPARSE_3_4  = 1 << 12;
        const WORD1       = 1 << 13;
        const WORD2       = 1 << 14;
        const WORD12      = 1 << 15;
        const BRACKET     = 1 << 16;
        const INTERVAL    = 1 << 17;
        const INTERVAL2   = 1 << 18;
        const SPECIAL_CHAR= 1 << 19;
    }
}

/// Declarative bundle of model selections, reorder table, and match-model
/// tuning for one profile. Generalizes the teacher's fixed 7-model lpaq1
/// bank (`aufdj-prisirv/src/predictor.rs`) into the profile-driven bank
/// spec.md §4.11 requires.
#[derive(Clone, Copy)]
pub struct ProfileConfig {
    pub profile: Profile,
    pub models: ModelSet,
    pub match_model_order: u32,
    pub min_lzp_len: u32,
    pub interval_mask_bits: u32,
}

impl ProfileConfig {
    pub fn text() -> Self {
        ProfileConfig {
            profile: Profile::Text,
            models: ModelSet::ORDER0
                | ModelSet::ORDER1
                | ModelSet::ORDER2
                | ModelSet::ORDER3
                | ModelSet::ORDER4
                | ModelSet::ORDER6
                | ModelSet::SPARSE2
                | ModelSet::SPARSE3
                | ModelSet::SPARSE_2_3
                | ModelSet::WORD1
                | ModelSet::WORD2
                | ModelSet::WORD12
                | ModelSet::BRACKET
                | ModelSet::SPECIAL_CHAR
                | ModelSet::INTERVAL,
            match_model_order: 6,
            min_lzp_len: 24,
            interval_mask_bits: 49,
        }
    }

    pub fn binary() -> Self {
        ProfileConfig {
            profile: Profile::Binary,
            models: ModelSet::ORDER0
                | ModelSet::ORDER1
                | ModelSet::ORDER2
                | ModelSet::ORDER3
                | ModelSet::ORDER4
                | ModelSet::ORDER6
                | ModelSet::ORDER8
                | ModelSet::ORDER12
                | ModelSet::SPARSE2
                | ModelSet::SPARSE4
                | ModelSet::SPARSE_3_4
                | ModelSet::INTERVAL
                | ModelSet::INTERVAL2,
            match_model_order: 8,
            min_lzp_len: 32,
            interval_mask_bits: 32,
        }
    }

    pub fn simple() -> Self {
        ProfileConfig {
            profile: Profile::Simple,
            models: ModelSet::ORDER0 | ModelSet::ORDER1 | ModelSet::ORDER2,
            match_model_order: 5,
            min_lzp_len: 16,
            interval_mask_bits: 16,
        }
    }

    /// When a match model goes active, the byte is coded under the
    /// corresponding match profile instead of the base, per spec.md §4.11.
    pub fn match_variant(self) -> Self {
        let mut m = self;
        m.min_lzp_len = m.min_lzp_len.saturating_sub(8).max(4);
        m
    }

    pub fn for_profile(profile: Profile) -> Self {
        match profile {
            Profile::Text => ProfileConfig::text(),
            Profile::Simple => ProfileConfig::simple(),
            // Wave16 is detected/segmented but compressed under the Binary
            // bank (see DESIGN.md's open-question resolution on Wave16).
            Profile::Binary | Profile::Wave16 => ProfileConfig::binary(),
            Profile::Skip | Profile::Eof => ProfileConfig::simple(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_wire_round_trips_for_known_values() {
        for p in [
            Profile::Text,
            Profile::Binary,
            Profile::Wave16,
            Profile::Simple,
            Profile::Skip,
            Profile::Eof,
        ] {
            assert_eq!(Profile::from_wire(p.to_wire()), p);
        }
    }

    #[test]
    fn unknown_wire_byte_is_binary() {
        assert_eq!(Profile::from_wire(200), Profile::Binary);
    }

    #[test]
    fn model_set_contains() {
        let cfg = ProfileConfig::text();
        assert!(cfg.models.contains(ModelSet::WORD1));
        assert!(!cfg.models.contains(ModelSet::ORDER12));
    }
}

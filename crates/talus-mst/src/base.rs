// Copyright (c) Talus Contributors
// SPDX-License-Identifier: Apache-2.0

//! The fanout base of a tree, and the leading-zero-group count that turns a
//! key's digest into a level.

use serde::{Deserialize, Serialize};

/// `R`: the number of bits grouped together when counting leading
/// zero-groups of a key's digest. Larger bases produce shallower, bushier
/// trees; smaller bases produce taller, narrower ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Base {
    Base2 = 1,
    Base4 = 2,
    Base8 = 3,
    Base16 = 4,
    Base32 = 5,
}

impl Base {
    /// Number of bits per group, i.e. `log2(R)`.
    fn group_bits(self) -> u32 {
        self as u32
    }

    /// Scans `digest` bit by bit from the most significant end. Every
    /// `group_bits()` consecutive zero bits increments the level; the scan
    /// stops at the first `1` bit within a group.
    pub fn leading_zeros(self, digest: &[u8]) -> u32 {
        let group_bits = self.group_bits();
        let mut level = 0;
        let mut bits_in_group = 0;
        for byte in digest {
            for i in 0..8 {
                if byte & (1 << (7 - i)) != 0 {
                    return level;
                }
                bits_in_group += 1;
                if bits_in_group == group_bits {
                    level += 1;
                    bits_in_group = 0;
                }
            }
        }
        level
    }
}

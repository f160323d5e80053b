// Copyright (c) Talus Contributors
// SPDX-License-Identifier: Apache-2.0

//! The canonical node serialization, used both to compute a node's
//! content address and as its wire representation.

use byteorder::{LittleEndian, WriteBytesExt};

use crate::hash::Digest;
use crate::kv::{Key, Value, Writable};
use crate::node::Node;

/// Encodes `node` the same way regardless of caller: hashing and wire
/// transport both consume this exact byte string.
///
/// Layout:
/// `level (u32 LE) ∥ child_count (u32 LE) ∥ (key ∥ value)* ∥ [low ∥ high*]`
///
/// The pointer section (`low` and each child's `high`) is omitted entirely
/// when every pointer in the node is null — a node at the lowest level of a
/// tree otherwise pays for a block of zero bytes it will never use.
pub fn serialize<K: Key, V: Value>(node: &Node<K, V>) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.write_u32::<LittleEndian>(node.level).expect("write to Vec cannot fail");
    buf.write_u32::<LittleEndian>(node.children.len() as u32)
        .expect("write to Vec cannot fail");

    for child in &node.children {
        child.key.write(&mut buf).expect("write to Vec cannot fail");
        child.value.write(&mut buf).expect("write to Vec cannot fail");
    }

    let has_pointers = node.low.is_some() || node.children.iter().any(|c| c.high.is_some());
    if has_pointers {
        write_hash_slot(&mut buf, node.low);
        for child in &node.children {
            write_hash_slot(&mut buf, child.high);
        }
    }

    buf
}

fn write_hash_slot(buf: &mut Vec<u8>, hash: Option<Digest>) {
    match hash {
        Some(h) => buf.extend_from_slice(h.as_bytes()),
        None => buf.extend_from_slice(&[0u8; Digest::LEN]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::U32;
    use crate::node::Child;

    #[test]
    fn omits_pointer_section_when_all_null() {
        let node = Node::new(
            0,
            None,
            vec![Child { key: U32(1), value: U32(10), high: None }],
        );
        let bytes = serialize(&node);
        // level(4) + child_count(4) + key(4) + value(4), no pointer section.
        assert_eq!(bytes.len(), 16);
    }

    #[test]
    fn includes_pointer_section_when_any_hash_present() {
        let d = Digest::from_bytes(&[1u8; 32]);
        let node = Node::new(
            1,
            Some(d),
            vec![Child { key: U32(1), value: U32(10), high: None }],
        );
        let bytes = serialize(&node);
        // header(8) + child(8) + low(32) + high(32)
        assert_eq!(bytes.len(), 8 + 8 + 32 + 32);
    }

    #[test]
    fn serialization_is_deterministic() {
        let node = Node::new(
            0,
            None,
            vec![Child { key: U32(1), value: U32(10), high: None }],
        );
        assert_eq!(serialize(&node), serialize(&node));
    }

    proptest::proptest! {
        /// Two leaves at the same level but with different values never
        /// collide: the serialization is determined by every field, not
        /// just the key.
        #[test]
        fn differing_values_serialize_differently(k in proptest::prelude::any::<u32>(), v1 in proptest::prelude::any::<u32>(), v2 in proptest::prelude::any::<u32>()) {
            proptest::prop_assume!(v1 != v2);
            let a = Node::new(0, None, vec![Child { key: U32(k), value: U32(v1), high: None }]);
            let b = Node::new(0, None, vec![Child { key: U32(k), value: U32(v2), high: None }]);
            proptest::prop_assert_ne!(serialize(&a), serialize(&b));
        }

        /// Serialization is a pure function of the node's fields: calling
        /// it twice on equivalent, independently-built nodes always agrees.
        #[test]
        fn serialization_is_deterministic_for_arbitrary_leaves(k in proptest::prelude::any::<u32>(), v in proptest::prelude::any::<u32>()) {
            let a = Node::new(0, None, vec![Child { key: U32(k), value: U32(v), high: None }]);
            let b = Node::new(0, None, vec![Child { key: U32(k), value: U32(v), high: None }]);
            proptest::prop_assert_eq!(serialize(&a), serialize(&b));
        }
    }
}

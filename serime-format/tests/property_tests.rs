//! Property-based tests for Serime format primitives

use proptest::prelude::*;
use serime_format::constants::RESERVED;
use serime_format::escape::{escape, unescape};
use serime_format::flags::{AccessFlag, BitFlag, FlagSet, PropertyFlag};
use serime_format::TypeTag;

proptest! {
    #[test]
    fn escape_roundtrip_property(s in "\\PC*") {
        prop_assert_eq!(unescape(&escape(&s)), s);
    }

    #[test]
    fn escape_roundtrip_reserved_heavy(s in "[a-z&;!@#%\\[\\]{}|,=$:~]*") {
        prop_assert_eq!(unescape(&escape(&s)), s);
    }

    #[test]
    fn escaped_output_has_no_raw_reserved_chars(s in "\\PC*") {
        // the only reserved characters in escaped output belong to the
        // &digits; frames themselves
        let escaped = escape(&s);
        let mut rest = escaped.as_str();
        while let Some(pos) = rest.find(|c| RESERVED.contains(&c)) {
            let tail = &rest[pos..];
            prop_assert!(tail.starts_with('&'), "stray reserved char in {escaped:?}");
            let close = tail.find(';').expect("escape frame must close");
            prop_assert!(tail[1..close].bytes().all(|b| b.is_ascii_digit()));
            rest = &tail[close + 1..];
        }
    }

    #[test]
    fn property_flag_bits_roundtrip(bits in 0u32..32) {
        let set = FlagSet::<PropertyFlag>::from_bits(bits).unwrap();
        prop_assert_eq!(set.bits(), bits);
    }

    #[test]
    fn access_flag_toggle_is_involutive(bits in 0u32..16, flag_idx in 0usize..4) {
        let flag = AccessFlag::members()[flag_idx].0;
        let mut set = FlagSet::<AccessFlag>::from_bits(bits).unwrap();
        let before = set.bits();
        set.toggle(&[flag]).toggle(&[flag]);
        prop_assert_eq!(set.bits(), before);
    }

    #[test]
    fn custom_tag_roundtrip(id in 0u32..10_000) {
        let tag = TypeTag::Custom(id);
        prop_assert_eq!(TypeTag::parse(&tag.render()).unwrap(), tag);
    }
}

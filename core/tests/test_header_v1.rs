// Legacy version 1 headers: fixed 76-byte record, always an app, no flags.

#[cfg(test)]
mod tests {
    use tbf_core::constants::V1_HEADER_LEN;
    use tbf_core::diagnostics::Diagnostic;
    use tbf_core::headers::{
        decode_with, encode, encode_v1, AppName, Flag, Mutation, Permission, TbfHeader,
    };

    /// Version word, 17 distinct field values, then the checksum word.
    fn v1_wire() -> Vec<u8> {
        let mut words: Vec<u32> = vec![1];
        words.extend((0..17).map(|i| 0x100 + i as u32));
        let checksum = words.iter().fold(0, |acc, w| acc ^ w);
        words.push(checksum);
        words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    fn decode_quiet(buf: &[u8]) -> (TbfHeader, Vec<Diagnostic>) {
        let mut diags = Vec::new();
        let h = decode_with(buf, &mut diags);
        (h, diags)
    }

// ## 1️⃣ Decode

    #[test]
    fn decodes_all_fields_in_order() {
        let (h, diags) = decode_quiet(&v1_wire());
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");

        let TbfHeader::V1(v1) = &h else { panic!("expected v1, got {h:?}") };
        assert!(v1.valid);
        assert_eq!(v1.total_size, 0x100);
        assert_eq!(v1.entry_offset, 0x101);
        assert_eq!(v1.relocation_data_offset, 0x102);
        assert_eq!(v1.relocation_data_size, 0x103);
        assert_eq!(v1.text_offset, 0x104);
        assert_eq!(v1.text_size, 0x105);
        assert_eq!(v1.got_offset, 0x106);
        assert_eq!(v1.got_size, 0x107);
        assert_eq!(v1.data_offset, 0x108);
        assert_eq!(v1.data_size, 0x109);
        assert_eq!(v1.bss_memory_offset, 0x10a);
        assert_eq!(v1.bss_memory_size, 0x10b);
        assert_eq!(v1.minimum_stack_length, 0x10c);
        assert_eq!(v1.minimum_app_heap_length, 0x10d);
        assert_eq!(v1.minimum_kernel_heap_length, 0x10e);
        assert_eq!(v1.package_name_offset, 0x10f);
        assert_eq!(v1.package_name_size, 0x110);
    }

    #[test]
    fn common_accessors() {
        let (h, _) = decode_quiet(&v1_wire());
        assert_eq!(h.version(), Some(1));
        assert!(h.is_valid());
        assert!(h.is_app());
        assert_eq!(h.app_size(), Some(0x100));
        assert_eq!(h.header_size(), Some(V1_HEADER_LEN));
        assert_eq!(h.app_name(), AppName::Location { offset: 0x10f, size: 0x110 });
        assert_eq!(h.package_name(), None);
        assert_eq!(h.permissions(), None);
        assert!(h.main().is_none());
    }

    #[test]
    fn extra_bytes_after_header_are_ignored() {
        let mut wire = v1_wire();
        wire.extend_from_slice(&[0xFF; 32]);
        let (h, _) = decode_quiet(&wire);
        assert!(h.is_valid());
    }

    #[test]
    fn short_buffer_is_unparsed() {
        let wire = v1_wire();
        let (h, diags) = decode_quiet(&wire[..V1_HEADER_LEN - 1]);
        assert!(matches!(h, TbfHeader::Unparsed(_)));
        assert_eq!(h.version(), Some(1));
        assert!(!h.is_valid());
        assert!(!h.is_app());
        assert_eq!(diags, vec![Diagnostic::BufferTooShort { have: 75, need: 76 }]);
    }

    #[test]
    fn corrupted_field_fails_checksum() {
        let mut wire = v1_wire();
        wire[20] ^= 0x01;
        let (h, diags) = decode_quiet(&wire);
        assert!(!h.is_valid());
        assert!(matches!(diags[..], [Diagnostic::ChecksumMismatch { .. }]));
    }

// ## 2️⃣ Flag and permission defaults

    #[test]
    fn always_enabled_never_sticky() {
        let (h, _) = decode_quiet(&v1_wire());
        assert!(h.is_enabled());
        assert!(!h.is_sticky());
    }

    #[test]
    fn invalid_v1_reports_neither_flag() {
        let mut wire = v1_wire();
        wire[8] ^= 0xFF;
        let (h, _) = decode_quiet(&wire);
        assert!(!h.is_enabled());
        assert!(!h.is_sticky());
    }

    #[test]
    fn flag_changes_are_skipped() {
        let (mut h, _) = decode_quiet(&v1_wire());
        let before = h.clone();

        assert_eq!(
            h.set_flag(Flag::Sticky, true),
            Mutation::Skipped(Diagnostic::UnsupportedVersion { version: 1 })
        );
        assert_eq!(
            h.set_enabled(false),
            Mutation::Skipped(Diagnostic::UnsupportedVersion { version: 1 })
        );
        assert_eq!(h, before);
        assert!(h.is_enabled());
    }

    #[test]
    fn permission_changes_are_skipped_but_names_still_checked() {
        let (mut h, _) = decode_quiet(&v1_wire());

        let m = h.set_permission(Permission::Led, true);
        assert!(!m.is_applied());
        assert!(!h.permission(Permission::Led));

        assert!(h.set_permission_by_name("not_a_driver", true).is_err());
        assert!(!h.set_permission_by_name("console", true).unwrap().is_applied());
    }

// ## 3️⃣ Encode

    #[test]
    fn encode_reproduces_wire_bytes() {
        let wire = v1_wire();
        let (h, _) = decode_quiet(&wire);
        assert_eq!(encode(&h).unwrap(), wire);
    }

    #[test]
    fn encode_recomputes_stale_checksum() {
        let (h, _) = decode_quiet(&v1_wire());
        let TbfHeader::V1(mut v1) = h else { unreachable!() };
        v1.minimum_stack_length = 0x2000;
        v1.checksum = 0xDEAD_BEEF;

        let bytes = encode_v1(&v1);
        let (again, diags) = decode_quiet(&bytes);
        assert!(diags.is_empty());
        assert!(again.is_valid());
        let TbfHeader::V1(again) = again else { unreachable!() };
        assert_eq!(again.minimum_stack_length, 0x2000);
        assert_ne!(again.checksum, 0xDEAD_BEEF);
    }

    #[test]
    fn reserved_version_half_is_written_as_zero() {
        let mut wire = v1_wire();
        wire[2] = 0xAB;
        let (h, _) = decode_quiet(&wire);
        // Checksum covered the reserved bytes, so the stored one no longer matches.
        assert!(!h.is_valid());

        let bytes = encode(&h).unwrap();
        assert_eq!(&bytes[0..4], &[1, 0, 0, 0]);
        let (again, _) = decode_quiet(&bytes);
        assert!(again.is_valid());
    }
}

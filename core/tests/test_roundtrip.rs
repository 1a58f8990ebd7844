// decode(encode(h)) over arbitrary headers of both versions.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use tbf_core::config::EncodeOptions;
    use tbf_core::diagnostics::{Diagnostic, NullSink};
    use tbf_core::headers::{
        decode_with, encode, encode_v1, encode_with, MainBlock, PicOption1, RawTlvBlock,
        TbfFlags, TbfHeader, TbfHeaderV1, TbfHeaderV2, WriteableFlashRegion,
    };
    use tbf_core::utils::compute_checksum;

    prop_compose! {
        fn arb_main()(w in any::<[u32; 3]>()) -> MainBlock {
            MainBlock { init_fn_offset: w[0], protected_region_size: w[1], minimum_ram_size: w[2] }
        }
    }

    prop_compose! {
        fn arb_pic()(w in any::<[u32; 10]>()) -> PicOption1 {
            PicOption1 {
                text_offset: w[0],
                data_offset: w[1],
                data_size: w[2],
                bss_memory_offset: w[3],
                bss_size: w[4],
                relocation_data_offset: w[5],
                relocation_data_size: w[6],
                got_offset: w[7],
                got_size: w[8],
                minimum_stack_length: w[9],
            }
        }
    }

    prop_compose! {
        fn arb_raw()(kind in 7u16..0x100, payload in proptest::collection::vec(any::<u8>(), 0..24)) -> RawTlvBlock {
            RawTlvBlock { kind, payload }
        }
    }

    prop_compose! {
        /// An app header as a builder would hand it over: MAIN always present,
        /// every other block optional, sizes and checksum left for the encoder.
        fn arb_app()(
            total_size in any::<u32>(),
            flags in any::<u32>(),
            main in arb_main(),
            regions in proptest::option::of(proptest::collection::vec(any::<(u32, u32)>(), 0..4)),
            package_name in proptest::option::of("[a-z0-9_]{0,24}"),
            pic_option_1 in proptest::option::of(arb_pic()),
            permissions in proptest::option::of(any::<u64>()),
            unparsed_blocks in proptest::collection::vec(arb_raw(), 0..3),
        ) -> TbfHeaderV2 {
            TbfHeaderV2 {
                header_size: 0,
                total_size,
                flags: TbfFlags::from_bits_retain(flags),
                checksum: 0,
                valid: true,
                is_app: true,
                main: Some(main),
                writeable_flash_regions: regions.map(|rs| {
                    rs.into_iter().map(|(offset, length)| WriteableFlashRegion { offset, length }).collect()
                }),
                package_name,
                pic_option_1,
                permissions,
                unparsed_blocks,
            }
        }
    }

    prop_compose! {
        fn arb_v1()(w in any::<[u32; 17]>()) -> TbfHeaderV1 {
            TbfHeaderV1 {
                total_size: w[0],
                entry_offset: w[1],
                relocation_data_offset: w[2],
                relocation_data_size: w[3],
                text_offset: w[4],
                text_size: w[5],
                got_offset: w[6],
                got_size: w[7],
                data_offset: w[8],
                data_size: w[9],
                bss_memory_offset: w[10],
                bss_memory_size: w[11],
                minimum_stack_length: w[12],
                minimum_app_heap_length: w[13],
                minimum_kernel_heap_length: w[14],
                package_name_offset: w[15],
                package_name_size: w[16],
                checksum: 0,
                valid: true,
            }
        }
    }

    proptest! {
        #[test]
        fn prop_v2_fields_survive(h in arb_app()) {
            let bytes = encode(&TbfHeader::V2(h.clone())).unwrap();
            let mut diags = Vec::new();
            let back = decode_with(&bytes, &mut diags);

            // Preserved raw blocks are still unknown to the decoder; nothing else may complain.
            prop_assert!(
                diags.iter().all(|d| matches!(d, Diagnostic::UnknownBlock { .. })),
                "diagnostics: {:?}", diags
            );
            prop_assert!(back.is_valid());
            prop_assert!(back.is_app());
            prop_assert_eq!(back.header_size(), Some(bytes.len()));

            let mut zeroed = bytes.clone();
            zeroed[12..16].fill(0);
            let expected = TbfHeaderV2 {
                header_size: bytes.len() as u16,
                checksum: compute_checksum(&zeroed),
                ..h
            };
            prop_assert_eq!(back, TbfHeader::V2(expected));
        }

        #[test]
        fn prop_v2_encoding_is_stable(h in arb_app()) {
            let first = encode(&TbfHeader::V2(h)).unwrap();
            let again = encode(&decode_with(&first, &mut NullSink)).unwrap();
            prop_assert_eq!(first, again);
        }

        #[test]
        fn prop_v2_legacy_encoding_is_valid(h in arb_app()) {
            let bytes = encode_with(&TbfHeader::V2(h.clone()), &EncodeOptions::legacy()).unwrap();
            let back = decode_with(&bytes, &mut NullSink);
            prop_assert!(back.is_valid());
            prop_assert_eq!(back.permissions(), None);
            prop_assert_eq!(back.package_name(), h.package_name.as_deref());
        }

        #[test]
        fn prop_v1_fields_survive(h in arb_v1()) {
            let bytes = encode_v1(&h);
            let back = decode_with(&bytes, &mut NullSink);
            prop_assert!(back.is_valid());

            let expected = TbfHeaderV1 { checksum: compute_checksum(&bytes[..72]), ..h };
            prop_assert_eq!(back, TbfHeader::V1(expected));
        }

        #[test]
        fn prop_decode_is_total(buf in proptest::collection::vec(any::<u8>(), 0..256)) {
            // Whatever the bytes, decoding returns and never claims more than it read.
            let h = decode_with(&buf, &mut NullSink);
            if let Some(size) = h.header_size() {
                if h.is_valid() {
                    prop_assert!(size <= buf.len());
                }
            }
        }
    }
}

// Diagnostic sinks, messages and encoder options.

#[cfg(test)]
mod tests {
    use log::Level;
    use tbf_core::config::{EncodeOptions, PermissionsBlock, UnparsedBlocks};
    use tbf_core::constants::tlv_ids;
    use tbf_core::diagnostics::{Diagnostic, DiagnosticSink, LogSink, NullSink};
    use tbf_core::headers::{decode, decode_with};

    struct Counter(usize);

    impl DiagnosticSink for Counter {
        fn report(&mut self, _diagnostic: Diagnostic) {
            self.0 += 1;
        }
    }

// ## 1️⃣ Sinks

    #[test]
    fn custom_sink_sees_every_report() {
        let mut counter = Counter(0);
        let _ = decode_with(&[9, 0, 0, 0], &mut counter);
        assert_eq!(counter.0, 1);

        // Through a trait object as well.
        let sink: &mut dyn DiagnosticSink = &mut counter;
        let _ = decode_with(&[2, 0], sink);
        assert_eq!(counter.0, 2);
    }

    #[test]
    fn log_sink_without_logger_is_silent() {
        let h = decode(&[1, 0, 0]);
        assert!(!h.is_valid());
        LogSink.report(Diagnostic::InvalidHeader);
        NullSink.report(Diagnostic::InvalidHeader);
    }

// ## 2️⃣ Messages

    #[test]
    fn messages_name_known_block_types() {
        let d = Diagnostic::BlockLengthMismatch { kind: tlv_ids::MAIN, have: 8, need: 12 };
        assert_eq!(d.to_string(), "Main block has length 8, expected 12");

        let d = Diagnostic::BlockOverrun { kind: 0x77, length: 40, remaining: 4 };
        assert_eq!(d.to_string(), "0x77 block of length 40 overruns header (4 bytes left)");
    }

    #[test]
    fn checksum_message_shows_both_values() {
        let d = Diagnostic::ChecksumMismatch { stored: 0x10, computed: 0x20 };
        assert_eq!(d.to_string(), "checksum mismatch: in header 0x10, calculated 0x20");
    }

    #[test]
    fn invalid_name_is_rendered_as_hex() {
        let d = Diagnostic::InvalidPackageName { raw: vec![0xC3, 0x28] };
        assert_eq!(d.to_string(), "package name is not UTF-8: 0xc328");
    }

    #[test]
    fn levels() {
        assert_eq!(Diagnostic::ChecksumMismatch { stored: 0, computed: 1 }.level(), Level::Warn);
        assert_eq!(Diagnostic::UnknownBlock { kind: 9, length: 0 }.level(), Level::Warn);
        assert_eq!(Diagnostic::TrailingBytes { count: 2 }.level(), Level::Info);
        assert_eq!(Diagnostic::InvalidHeader.level(), Level::Debug);
    }

    #[test]
    fn diagnostics_serialize() {
        let d = Diagnostic::UnknownBlock { kind: 9, length: 3 };
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, r#"{"UnknownBlock":{"kind":9,"length":3}}"#);
        assert_eq!(serde_json::from_str::<Diagnostic>(&json).unwrap(), d);
    }

// ## 3️⃣ Encoder options

    #[test]
    fn default_options_are_lossless() {
        let opts = EncodeOptions::default();
        assert_eq!(opts.permissions_block, PermissionsBlock::Emit);
        assert_eq!(opts.unparsed_blocks, UnparsedBlocks::Preserve);
    }

    #[test]
    fn options_from_json() {
        let opts: EncodeOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, EncodeOptions::default());

        let opts: EncodeOptions =
            serde_json::from_str(r#"{"permissions_block":"omit","unparsed_blocks":"drop"}"#).unwrap();
        assert_eq!(opts, EncodeOptions::legacy());
    }
}

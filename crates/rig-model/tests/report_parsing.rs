use proptest::prelude::*;

use mimic_common::MimicError;
use mimic_rig_model::parse_realized_durations;

fn symbol() -> impl Strategy<Value = String> {
    "[a-zA-Z@{=_]{1,3}"
}

proptest! {
    #[test]
    fn well_formed_reports_keep_every_phoneme(
        lines in prop::collection::vec((0.0f32..10.0, symbol()), 0..40),
        comment_every in 1usize..8,
    ) {
        let mut report = String::new();
        for (i, (time, phoneme)) in lines.iter().enumerate() {
            if i % comment_every == 0 {
                report.push_str("# comment\n\n");
            }
            report.push_str(&format!("  {time}\t125   {phoneme}\n"));
        }

        let segments = parse_realized_durations(&report).unwrap();
        prop_assert_eq!(segments.len(), lines.len());
        for (segment, (time, phoneme)) in segments.iter().zip(&lines) {
            prop_assert_eq!(segment.time_secs, *time);
            prop_assert_eq!(&segment.phoneme, phoneme);
        }
    }

    #[test]
    fn a_short_line_fails_at_its_line_number(
        good_before in 0usize..10,
        good_after in 0usize..10,
    ) {
        let mut report = String::new();
        for i in 0..good_before {
            report.push_str(&format!("{}.0 x a\n", i));
        }
        report.push_str("0.5 b\n");
        for i in 0..good_after {
            report.push_str(&format!("{}.0 x a\n", i));
        }

        match parse_realized_durations(&report) {
            Err(MimicError::Parse { line, .. }) => prop_assert_eq!(line, good_before + 1),
            other => prop_assert!(false, "expected a parse error, got {:?}", other),
        }
    }
}

#![no_main]

use libfuzzer_sys::fuzz_target;
use stat_guardian::{Dataset, Guardian};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Parsing must reject or accept without panicking
        if let Ok(dataset) = Dataset::from_json_str(input) {
            assert!(!dataset.is_empty());
            assert!(dataset.groups().iter().flatten().all(|v| v.is_finite()));

            if dataset.len() <= 256 {
                if let Ok(guardian) = Guardian::standard() {
                    let report = guardian.evaluate_json(input, "t_test", None).unwrap();
                    assert_eq!(report.can_proceed, report.critical_violations.is_empty());
                }
            }
        }
    }
});

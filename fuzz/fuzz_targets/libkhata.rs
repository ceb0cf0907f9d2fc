#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(ledger) = libkhata::parse(input, None) {
            let last = ledger.list_journal_entries().iter().map(|e| e.date).max();
            if let Some(as_of) = last {
                assert!(ledger.trial_balance(as_of).is_balanced());
            }
        }
    }
});

#![no_main]

use libfuzzer_sys::fuzz_target;
use march_core::{ErrorSummary, FaultKind, Report, TestProgram, TestRunner, Vram};

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    let words = usize::from(data[0] % 64) + 1;
    let address = usize::from(data[1]) % words;
    let bit = usize::from(data[2] % 16);
    let kind = FaultKind::from_u8(data[3] % 11).unwrap_or_default();

    let Ok(text) = std::str::from_utf8(&data[4..]) else {
        return;
    };
    let Ok(program) = TestProgram::parse(text) else {
        return;
    };
    assert_eq!(TestProgram::parse(&program.to_string()).as_ref(), Ok(&program));

    let Ok(mut memory) = Vram::new(words) else {
        return;
    };
    let _ = memory.set_error(address, bit, kind);

    let mut runner = TestRunner::new(&program, &mut memory);
    let summary = runner.run_to_end();
    assert_eq!(summary.steps, program.operation_count(words));

    let errors = runner.detected_errors();
    let _ = Report::new("fuzz", &ErrorSummary::from_errors(errors)).render();
});

#![allow(clippy::missing_errors_doc)]

use march_core::{
    Cursor, ErrorSummary, FaultConfig, FaultKind, Report, RunnerState, TestProgram, Vram,
};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

macro_rules! console_log {
    ($($t:tt)*) => (web_sys::console::log_1(&JsValue::from_str(&format!($($t)*))))
}

/// JS-compatible cursor snapshot for row highlighting.
#[derive(Serialize, Deserialize)]
pub struct WasmCursor {
    pub state: RunnerState,
    pub phase: Option<usize>,
    pub address: Option<u16>,
    pub operation: Option<usize>,
}

/// Memory, loaded program and cursor driven from the page.
///
/// Replacing the memory (`resize`, `load_config`) discards the cursor, so a
/// run never continues against a memory it was not started on.
#[wasm_bindgen]
pub struct WasmSession {
    memory: Vram,
    program: TestProgram,
    cursor: Cursor,
}

#[wasm_bindgen]
impl WasmSession {
    #[wasm_bindgen(constructor)]
    pub fn new(words: usize) -> Result<Self, JsError> {
        console_error_panic_hook::set_once();
        let memory = Vram::new(words)?;
        Ok(Self {
            cursor: Cursor::new(memory.word_count()),
            memory,
            program: TestProgram::default(),
        })
    }

    #[must_use]
    pub fn word_count(&self) -> usize {
        self.memory.word_count()
    }

    /// Replaces the memory with a fresh fault-free one.
    pub fn resize(&mut self, words: usize) -> Result<(), JsError> {
        self.memory = Vram::new(words)?;
        self.restart();
        console_log!("Memory resized to {words} words");
        Ok(())
    }

    pub fn read(&mut self, address: usize) -> Result<u16, JsError> {
        Ok(self.memory.read(address)?)
    }

    pub fn write(&mut self, address: usize, word: u16) -> Result<(), JsError> {
        Ok(self.memory.write(address, word)?)
    }

    /// Assigns a fault by wire name (`STUCK_AT_0`, ...). `NONE` clears it.
    pub fn set_error(&mut self, address: usize, bit: usize, kind: &str) -> Result<(), JsError> {
        let kind: FaultKind = kind.parse()?;
        Ok(self.memory.set_error(address, bit, kind)?)
    }

    /// Returns the wire name of the fault at `(address, bit)`.
    pub fn get_error(&self, address: usize, bit: usize) -> Result<String, JsError> {
        Ok(self.memory.get_error(address, bit)?.name().to_string())
    }

    pub fn clear_errors(&mut self) {
        self.memory.clear_errors();
    }

    /// Parses and installs a test program, rewinding the cursor. On error
    /// the previous program stays loaded.
    pub fn load_program(&mut self, text: &str) -> Result<(), JsError> {
        self.program = TestProgram::parse(text)?;
        self.restart();
        console_log!(
            "Loaded test program with {} phases",
            self.program.phases.len()
        );
        Ok(())
    }

    /// Rewinds the cursor to the first operation and forgets detected errors.
    pub fn restart(&mut self) {
        self.cursor = Cursor::new(self.memory.word_count());
    }

    /// Executes one primitive operation.
    /// Returns the step result as a JSON object tagged by `type`.
    pub fn step(&mut self) -> Result<JsValue, JsError> {
        let result = self.cursor.step(&self.program, &mut self.memory);
        Ok(serde_wasm_bindgen::to_value(&result)?)
    }

    /// Returns the cursor state and next position as a JSON object.
    pub fn cursor(&self) -> Result<JsValue, JsError> {
        let position = self.cursor.position(&self.program);
        let snapshot = WasmCursor {
            state: self.cursor.state(),
            phase: position.map(|p| p.phase),
            address: position.map(|p| p.address),
            operation: position.map(|p| p.operation),
        };
        Ok(serde_wasm_bindgen::to_value(&snapshot)?)
    }

    /// Failing addresses in detection order, duplicates included.
    #[must_use]
    pub fn detected_errors(&self) -> js_sys::Uint16Array {
        js_sys::Uint16Array::from(self.cursor.detected_errors())
    }

    /// Renders the text report for the errors detected so far.
    #[must_use]
    pub fn report(&self, test_name: &str) -> String {
        let summary = ErrorSummary::from_errors(self.cursor.detected_errors());
        Report::new(test_name, &summary).render()
    }

    /// Replaces the memory from a JSON fault configuration.
    pub fn load_config(&mut self, json: &str) -> Result<(), JsError> {
        self.memory = FaultConfig::from_json(json)?.build_vram()?;
        self.restart();
        console_log!(
            "Loaded fault configuration: {} words, {} faults",
            self.memory.word_count(),
            self.memory.fault_count()
        );
        Ok(())
    }

    /// Serializes the memory size and faults as JSON.
    pub fn save_config(&self) -> Result<String, JsError> {
        Ok(FaultConfig::from_vram(&self.memory).to_json()?)
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use wasm_bindgen_test::wasm_bindgen_test;

    use super::WasmSession;

    #[wasm_bindgen_test]
    fn injected_fault_is_detected() {
        let mut session = WasmSession::new(8).unwrap();
        session.set_error(4, 0, "STUCK_AT_1").unwrap();
        session.load_program("up(w0); up(r0)").unwrap();
        for _ in 0..17 {
            session.step().unwrap();
        }
        assert_eq!(session.detected_errors().to_vec(), vec![4]);
        assert!(session.report("tiny").contains("Status      : FAIL"));
    }

    #[wasm_bindgen_test]
    fn step_result_is_a_tagged_object() {
        let mut session = WasmSession::new(2).unwrap();
        session.load_program("up(w1)").unwrap();
        let value: serde_json::Value =
            serde_wasm_bindgen::from_value(session.step().unwrap()).unwrap();
        assert_eq!(value["type"], "WRITE");
        assert_eq!(value["address"], 0);
    }

    #[wasm_bindgen_test]
    fn config_round_trips_through_json() {
        let mut session = WasmSession::new(4).unwrap();
        session.set_error(1, 2, "DECEPTIVE_READ_0").unwrap();
        let saved = session.save_config().unwrap();
        let value: serde_json::Value = serde_json::from_str(&saved).unwrap();
        assert_eq!(value["ram_size_words"], 4);
        assert_eq!(value["faults"][0]["type"], "DECEPTIVE_READ_0");

        let mut restored = WasmSession::new(16).unwrap();
        restored.load_config(&saved).unwrap();
        assert_eq!(restored.word_count(), 4);
        assert_eq!(restored.get_error(1, 2).unwrap(), "DECEPTIVE_READ_0");
    }
}

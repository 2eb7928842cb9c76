use std::time::Duration;

/// Resource limits applied to script and WASM converters.
///
/// These bound the VM itself. The harness deadline is separate: when it
/// fires the harness stops waiting, and these limits are what eventually
/// stop the abandoned VM call.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Wall-clock limit for one script call
    pub timeout: Duration,

    /// Maximum memory usage in bytes (Lua only)
    pub memory_limit: usize,

    /// Maximum number of instructions per call (Lua only)
    pub instruction_limit: Option<u64>,

    /// Maximum fuel per call (WASM only)
    pub wasm_fuel: u64,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            memory_limit: 8 * 1024 * 1024, // 8MB
            instruction_limit: Some(50_000_000),
            wasm_fuel: 100_000_000,
        }
    }
}

impl SandboxConfig {
    /// Default limits with a custom wall-clock timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Default::default()
        }
    }

    #[cfg(test)]
    pub fn unlimited() -> Self {
        Self {
            instruction_limit: None,
            wasm_fuel: u64::MAX,
            ..Default::default()
        }
    }
}

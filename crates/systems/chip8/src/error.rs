use thiserror::Error;

/// Faults raised by the virtual machine itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    /// Program does not fit between 0x200 and the end of memory. Nothing was written.
    #[error("program is {size} bytes but only {capacity} bytes are available")]
    CapacityExceeded { size: usize, capacity: usize },
    /// 00EE executed with an empty call stack. The machine is halted.
    #[error("return at {pc:#05X} with an empty call stack")]
    StackUnderflow { pc: u16 },
}

/// A persisted snapshot whose arrays do not match the machine's dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("snapshot memory is {len} bytes, expected {expected}")]
    MemorySize { len: usize, expected: usize },
    #[error("snapshot framebuffer has {len} pixels, expected {expected}")]
    FramebufferSize { len: usize, expected: usize },
}

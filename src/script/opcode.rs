//! VM opcodes emitted by the script builder.

/// The subset of VM opcodes this client needs to emit or recognise.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    /// Pushes an empty byte array (also `false` and integer zero).
    Push0 = 0x00,
    /// Lowest of the `PUSHBYTES1..=75` range; the opcode is the length.
    PushBytes1 = 0x01,
    PushBytes75 = 0x4b,
    PushData1 = 0x4c,
    PushData2 = 0x4d,
    PushData4 = 0x4e,
    PushM1 = 0x4f,
    /// `PUSH1`, also `PUSHT`. `PUSHn` is `0x50 + n` for `n` in `1..=16`.
    Push1 = 0x51,
    Push16 = 0x60,
    Syscall = 0x68,
    DupFromAltStack = 0x6a,
    ToAltStack = 0x6b,
    FromAltStack = 0x6c,
    Swap = 0x7c,
    CheckSig = 0xac,
    CheckMultiSig = 0xae,
    Pack = 0xc1,
    NewStruct = 0xc6,
    Append = 0xc8,
}

impl OpCode {
    pub const PUSH_FALSE: OpCode = OpCode::Push0;
    pub const PUSH_TRUE: OpCode = OpCode::Push1;
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> Self {
        op as u8
    }
}

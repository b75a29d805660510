use crate::{define_peripheral_error_enum, impl_error_conversion};
// ========================
// Ring Buffer Error Domain
// ========================

define_peripheral_error_enum!(
    RingBufferError,
    BufferOverflow => "Ring buffer overflow occurred",
    InsufficientSpace => "Insufficient space in ring buffer",
    BufferEmpty => "Ring buffer is empty"
);

// =================
// LED Error Domain
// =================

define_peripheral_error_enum!(
    LedError,
    SetStateError => "Failed to set LED state",
    ReadStateError => "Failed to read LED state"
);

// ==================
// USART Error Domain
// ==================

define_peripheral_error_enum!(
    UsartError,
    DmaError => "DMA error occurred in USART",
    TransferError => "Transfer error in USART",
    Timeout => "USART operation timed out",
    NotInitialized => "USART not initialized",
    BufferOverflow => "USART buffer overflow",
    FlagNotSet => "USART flag not set",
);

// ================
// USB Error Domain
// ================

define_peripheral_error_enum!(
    UsbError,
    NotInitialized => "USB device is not initialized",
    ReadError => "Failed to read from USB",
    WriteError => "Failed to write to USB",
    BufferOverflow => "USB buffer overflow",
    InitError => "Failed to initialize USB",
    PollError => "Failed to poll USB"
);

// =================
// DMA Error Domain
// =================

define_peripheral_error_enum!(
    DmaError,
    InitError => "Failed to initialize DMA",
    TransferError => "DMA transfer error",
    RetryLimitExceeded => "DMA retry limit exceeded",
    BufferOverflow => "DMA buffer overflow",
    BufferUnderflow => "DMA buffer underflow",
    WriteError => "Failed to write using DMA",
    ReadError => "Failed to read using DMA"
);

// ========================
// Framing / Codec Error Domain
// ========================

define_peripheral_error_enum!(
    CrcError,
    Mismatch => "Packet checksum mismatch"
);

define_peripheral_error_enum!(
    SyncError,
    SearchExhausted => "No valid frame found within the search window",
    ForcedResync => "Forced resync discarded bytes after repeated CRC failures"
);

// ======================
// LED Command Error Domain
// ======================

define_peripheral_error_enum!(
    LedCommandError,
    QueueFull => "LED command queue is full",
    InvalidMode => "LED command encodes an unsupported mode",
    StrandWriteFailed => "Failed to write the addressable LED strand"
);

// ======================
// Display Error Domain
// ======================

define_peripheral_error_enum!(
    DisplayError,
    AssetMissing => "Boot animation frame asset is missing",
    BusContention => "Display bus requested while already Host-owned",
    SpiWriteFailed => "Failed to write the e-ink SPI bus"
);

// ======================
// Power Error Domain
// ======================

define_peripheral_error_enum!(
    PowerError,
    SensorTimeout => "Fuel gauge read timed out",
    SensorUnavailable => "Fuel gauge is not initialized",
    I2cError => "I2C transaction with the fuel gauge failed"
);

// ======================
// Debug Channel Error Domain
// ======================

define_peripheral_error_enum!(
    DebugError,
    RingFull => "Debug record ring is full",
    MessageTooLong => "Debug text message exceeds the chunking limit"
);

// ======================
// Scheduler Error Domain
// ======================

define_peripheral_error_enum!(
    SchedulerError,
    QueueFull => "Task queue at this priority is full",
    InvalidTransition => "Task state transition is not permitted"
);

// ======================
// Device Error Domain
// ======================

define_peripheral_error_enum!(
    DeviceError,
    UsbError => "USB device error occurred",
    DmaError => "DMA error occurred",
    BufferOverflow => "Device buffer overflow",
    Timeout => "Operation timed out",
    LedError => "LED error occurred",
    ProtocolError => "Protocol framing error occurred",
    DisplayError => "Display bus error occurred",
    PowerError => "Power reporter error occurred",
    SchedulerError => "Scheduler error occurred"
);

// ========================
// Initialization Errors
// ========================

define_peripheral_error_enum!(
    InitError,
    UsartError => "USART initialization error",
    UsbError => "USB initialization error",
    RccError => "RCC initialization error",
    LutError => "LUT initialization error",
    LedStrandError => "LED strand initialization error",
    I2cError => "I2C initialization error"
);

// ==============================
// Error Conversion Implementations
// ==============================

impl_error_conversion!(UsbError, DeviceError, { UsbError });

impl_error_conversion!(DmaError, DeviceError, { DmaError });

impl_error_conversion!(UsartError, DeviceError, { DmaError });

impl_error_conversion!(LedError, DeviceError, { LedError });

impl_error_conversion!(RingBufferError, DeviceError, { BufferOverflow });

impl_error_conversion!(CrcError, DeviceError, { ProtocolError });

impl_error_conversion!(SyncError, DeviceError, { ProtocolError });

impl_error_conversion!(LedCommandError, DeviceError, { LedError });

impl_error_conversion!(DisplayError, DeviceError, { DisplayError });

impl_error_conversion!(PowerError, DeviceError, { PowerError });

impl_error_conversion!(SchedulerError, DeviceError, { SchedulerError });
//! System-wide constants: buffer sizes, timing, and the wire protocol's
//! fixed layout parameters. Grouped here so a single review pass catches
//! every magic number in the firmware.

/// Length of the DMA buffer (Direct Memory Access buffer size).
pub const DMA_BUFFER_LEN: usize = 128;

/// Length of the USB OTG FS buffer (secondary host debug bridge).
pub const OTG_FS_BUFFER_LEN: usize = 1024;

/// Capacity of the UART receive ring, in bytes. Fixed by the protocol's
/// Receive Ring invariant (C2): `0 <= count <= RING_BUFFER_LEN`.
pub const RING_BUFFER_LEN: usize = 1024;

/// Size of each USB data packet forwarded to/from the debug bridge.
pub const DATA_PACKET_SIZE: usize = 128;

/// USART6 baud rate for the Host-facing framed protocol.
pub const USART6_BAUD_RATE: u32 = 115_200;

/// High-Speed External clock frequency (HSE).
pub const HSE: u32 = 8_000_000;

/// System clock frequency (SYSCLK).
pub const SYSCLK: u32 = 180_000_000;

/// Peripheral clock 1 frequency (PCLK1).
pub const PCLK1: u32 = 45_000_000;

/// Peripheral clock 2 frequency (PCLK2).
pub const PCLK2: u32 = 90_000_000;

/// Maximum Morse code sequence length for the diagnostic pixel's
/// error-code visualization.
pub const MAX_MORSE_LENGTH: usize = 100;

// ---------------------------------------------------------------------
// Protocol (C1-C4)
// ---------------------------------------------------------------------

/// Size of one protocol frame on the wire: type_flags, data0, data1, crc8.
pub const PACKET_LEN: usize = 4;

/// CRC8 polynomial used for packet checksums (no reflection, no final XOR).
pub const CRC8_POLY: u8 = 0x07;

/// Maximum number of bytes the Frame Synchronizer scans ahead while
/// SEARCHING for a valid frame boundary.
pub const SYNC_SEARCH_LIMIT: usize = 64;

/// Number of consecutive invalid frames before a forced resync discards
/// bytes and returns to SEARCHING.
pub const SYNC_INVALID_LIMIT: u8 = 3;

/// Number of consecutive valid frames required to leave RECOVERING.
pub const SYNC_RECOVER_LIMIT: u8 = 2;

/// Bytes discarded by a forced resync when no valid boundary is found.
pub const SYNC_FORCED_DISCARD: usize = 16;

// ---------------------------------------------------------------------
// Task scheduler (C5)
// ---------------------------------------------------------------------

/// Depth of each of the scheduler's four priority queues.
pub const SCHEDULER_QUEUE_DEPTH: usize = 16;

// ---------------------------------------------------------------------
// LED engine (C6)
// ---------------------------------------------------------------------

/// Physical pixel count of the addressable RGB strip (excludes the
/// diagnostic pixel, which is driven separately).
pub const LED_STRIP_LEN: usize = 7;

/// Reserved LED id that broadcasts a command to every strip pixel.
pub const LED_BROADCAST_ID: u8 = 15;

/// Depth of the pending LED command queue (one queued sequence at a time
/// plus headroom for back-to-back Host bursts before an execute trigger).
pub const LED_QUEUE_DEPTH: usize = 16;

/// Delay table indexed by the LED command's 2-bit `time` field, in ms.
pub const LED_TIME_TABLE_MS: [u32; 4] = [100, 200, 500, 1000];

// ---------------------------------------------------------------------
// Display ownership FSM (C7)
// ---------------------------------------------------------------------

/// Panel width in pixels.
pub const EINK_WIDTH: usize = 128;

/// Panel height in pixels.
pub const EINK_HEIGHT: usize = 250;

/// Packed 1-bit frame size in bytes: 128 * 250 / 8.
pub const EINK_FRAME_BYTES: usize = EINK_WIDTH * EINK_HEIGHT / 8;

/// Boot-animation frame cadence, in milliseconds.
pub const BOOT_ANIM_FRAME_MS: u32 = 100;

/// Boot animation yields to the scheduler every this many frames.
pub const BOOT_ANIM_YIELD_EVERY: u32 = 5;

/// Total frame count of the boot animation loop before the bus is
/// released to the host on its own (absent an earlier host-requested
/// release).
pub const BOOT_ANIM_FRAME_COUNT: u32 = 20;

// ---------------------------------------------------------------------
// Power reporter (C8)
// ---------------------------------------------------------------------

/// I2C transaction timeout for fuel-gauge reads, in milliseconds.
pub const POWER_I2C_TIMEOUT_MS: u32 = 50;

// ---------------------------------------------------------------------
// Button input (C9)
// ---------------------------------------------------------------------

/// Debounce settle delay after an edge interrupt, in milliseconds.
pub const BUTTON_SETTLE_MS: u32 = 1;

/// Long-press threshold for the reserved UP+SELECT combo, in milliseconds.
pub const BUTTON_LONG_PRESS_MS: u32 = 2_000;

/// Hold duration that triggers the host-initiated USB-mux switch.
pub const BUTTON_MUX_SWITCH_HOLD_MS: u32 = 10_000;

// ---------------------------------------------------------------------
// Debug channel (C10)
// ---------------------------------------------------------------------

/// Number of retained records in the debug channel's local dump ring.
pub const DEBUG_RING_LEN: usize = 100;

/// Longest `DEBUG_TEXT` message accepted before chunking, in bytes.
pub const DEBUG_MESSAGE_MAX_LEN: usize = 64;

/// Maximum number of 2-byte `DEBUG_TEXT` wire chunks one message can
/// expand into (`DEBUG_MESSAGE_MAX_LEN / 2`).
pub const DEBUG_TEXT_MAX_CHUNKS: usize = DEBUG_MESSAGE_MAX_LEN / 2;

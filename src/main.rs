//! # STM32F469 Companion Controller Firmware
//!
//! Bridges a Linux host to the handheld's local peripherals over a
//! framed USART6 protocol: buttons, a 7-pixel RGB strip, a diagnostic
//! pixel, an e-ink panel (handed off to the host after boot), a fuel
//! gauge, and a USB data mux the host can toggle by holding UP+SELECT.
//!
//! ## Architecture Overview
//! - RTIC framework for concurrency management
//! - The protocol's four priority levels are realized as two "cores":
//!   Core 1 (Critical, link-health pings) runs at a priority just under
//!   the hardware ISRs; Core 0 (High/Normal/Low) runs cooperatively
//!   below it. Both drain the same [`sam_fw::scheduler::Scheduler`]
//!   through its split handles.
//! - Non-blocking DMA-driven USART6 transfers, as in the base firmware
//! - An independent watchdog is fed once per Core-1 and Core-0 service
//!   cycle; starvation of either resets the MCU
//!
//! ## Hardware Requirements
//! - STM32F469NI-Discovery board
//! - USART6: TX PG14, RX PG9 (host link)
//! - USB OTG FS port (secondary debug bridge)
//! - SPI1/SPI2/SPI3: diagnostic pixel, LED strip, e-ink panel
//! - I2C1: BQ27441 fuel gauge
//! - GPIOB0-3: buttons; GPIOE0-2: display mux + USB switch
//!
//! ## Safety Considerations
//! - All shared resources use RTIC's mutex protection
//! - DMA transfers use hardware-verified buffer boundaries
//! - Error states trigger failsafe LED patterns

#![no_main]
#![no_std]

#[cfg(feature = "debug")]
use defmt_rtt as _; // Global logger for RTT-based debugging

#[cfg(feature = "debug")]
mod debug; // Debug utilities (RTT initialization, formatted logging)

#[cfg(feature = "debug")]
use debug::{init as debug_init, log_error};

#[cfg(feature = "debug")]
use panic_probe as _; // Panic handler with defmt integration

#[cfg(not(feature = "debug"))]
use panic_halt as _; // Production panic handler (system freeze)

mod config; // System constants and clock configuration
mod data_structures; // Circular buffers and data containers
mod errors; // Error type definitions and conversions
mod macros; // Procedural macros for code generation
mod peripherals; // Hardware abstraction layer implementation
mod task_handlers; // RTIC task implementations
mod utils; // Helper functions and utilities

use crate::errors::errors::{DeviceError, UsbError};
use crate::task_handlers::error_handlers::add_error_code;
use rtic::app;
use rtic_monotonics::systick::prelude::*;

// System timer configuration: 1ms timebase using SysTick
systick_monotonic!(Mono, 1000);

#[app(device = stm32f4xx_hal::pac, peripherals = true, dispatchers = [EXTI0, EXTI1, EXTI2, EXTI3, EXTI4])]
mod app {
    use super::*;
    use crate::config::SYSCLK;
    use crate::peripherals::buttons::ButtonPins;
    use crate::peripherals::diagnostic_led::DiagnosticLed;
    use crate::peripherals::fuel_gauge::FuelGaugeBq27441;
    use crate::peripherals::led_strip::LedStrip;
    use crate::peripherals::lines::UsbSwitch;
    use crate::peripherals::stm32f469_init::{
        init_peripherals, ButtonDown, ButtonPower, ButtonSelect, ButtonUp, DiagnosticSpi,
        EinkPanelBus, EinkPanelMux, StripSpi, UsbSwitchPin,
    };
    use crate::task_handlers::dma2::{handle_dma_rx, handle_dma_tx, handle_usart_error};
    use crate::task_handlers::error_handlers::has_errors;
    use crate::task_handlers::protocol_task::{
        apply_mux_switch_hold, drain_frames, feed_protocol_ring, service_core0, service_critical,
    };
    use sam_fw::button::ButtonInput;
    use sam_fw::config::EINK_FRAME_BYTES;
    use sam_fw::debug_channel::DebugChannel;
    use sam_fw::display::{self, DisplayAction, DisplayFsm};
    use sam_fw::led::LedEngine;
    use sam_fw::power::PowerReporter;
    use sam_fw::protocol::ring::RxRing;
    use sam_fw::protocol::router::RoutedEvent;
    use sam_fw::protocol::sync::FrameSync;
    use sam_fw::scheduler::Scheduler;
    use stm32f4xx_hal::i2c::I2c;
    use stm32f4xx_hal::pac::I2C1;
    use stm32f4xx_hal::watchdog::IndependentWatchdog;

    type Gauge = FuelGaugeBq27441<I2c<I2C1>>;
    type FrontPanelButtons = ButtonPins<ButtonUp, ButtonDown, ButtonSelect, ButtonPower>;

    /// Shared system resources protected by RTIC mutexes
    #[shared]
    struct Shared {
        usart_6: peripherals::usart_6::Usart6Controller,
        otg_fs: peripherals::otg_fs::OtgFsController<'static>,
        ring_buffer_rx: data_structures::ring_buffer::RingBuffer, // host -> MCU, raw bytes
        ring_buffer_tx: data_structures::ring_buffer::RingBuffer, // MCU -> host, raw bytes

        proto_ring: RxRing,
        frame_sync: FrameSync,
        scheduler: Scheduler<RoutedEvent>,

        led_engine: LedEngine,
        led_strip: LedStrip<StripSpi>,
        diagnostic_led: DiagnosticLed<DiagnosticSpi>,

        display_fsm: DisplayFsm,
        power_reporter: PowerReporter,
        fuel_gauge: Gauge,
        debug_channel: DebugChannel,
        button_input: ButtonInput,

        watchdog: IndependentWatchdog,
    }

    /// Local task-specific resources (unshared state)
    #[local]
    struct Local {
        retry_count: u8,
        buttons: FrontPanelButtons,
        usb_switch: UsbSwitch<UsbSwitchPin>,
        eink_bus: EinkPanelBus,
        display_mux: EinkPanelMux,
    }

    /// System initialization routine
    ///
    /// # Safety
    /// - Must be first function executed after reset
    /// - Configures all critical hardware peripherals
    #[init]
    fn init(ctx: init::Context) -> (Shared, Local) {
        #[cfg(feature = "debug")]
        debug_init(); // Initialize debug channel if enabled

        let peripherals = init_peripherals(ctx.device)
            .expect("Peripheral initialization failed - check hardware configuration");

        // Configure monotonic timer for async delays
        Mono::start(ctx.core.SYST, SYSCLK);

        // The boot animation runs for real: the executor below drives it
        // frame by frame and only releases the bus once it (or an early
        // host release request) completes.
        let display_fsm = DisplayFsm::new(crate::config::BOOT_ANIM_FRAME_COUNT);

        // Spawn persistent background tasks
        display_boot_anim::spawn().ok();
        animation_tick::spawn().ok();
        button_poll::spawn().ok();
        task_display_error_codes::spawn().ok();

        #[cfg(feature = "debug")]
        defmt::info!("System initialized at {} Hz", SYSCLK);

        (
            Shared {
                usart_6: peripherals.usart_6,
                otg_fs: peripherals.otg_fs,
                ring_buffer_rx: data_structures::ring_buffer::RingBuffer::new(),
                ring_buffer_tx: data_structures::ring_buffer::RingBuffer::new(),
                proto_ring: RxRing::new(),
                frame_sync: FrameSync::new(),
                scheduler: Scheduler::new(),
                led_engine: LedEngine::new(),
                led_strip: peripherals.led_strip,
                diagnostic_led: peripherals.diagnostic_led,
                display_fsm,
                power_reporter: PowerReporter::new(),
                fuel_gauge: peripherals.fuel_gauge,
                debug_channel: DebugChannel::new(),
                button_input: ButtonInput::new(),
                watchdog: peripherals.watchdog,
            },
            Local {
                retry_count: 0,
                buttons: peripherals.buttons,
                usb_switch: peripherals.usb_switch,
                eink_bus: peripherals.eink_bus,
                display_mux: peripherals.display_mux,
            },
        )
    }

    /// Idle task - enters low-power sleep mode
    #[idle]
    fn idle(_ctx: idle::Context) -> ! {
        #[cfg(feature = "debug")]
        defmt::info!("Entering low-power idle mode");

        loop {
            cortex_m::asm::wfi();
        }
    }

    /// USART6 interrupt handler: services DMA RX/error state, then
    /// hands off to the protocol pipeline.
    #[task(binds = USART6, shared = [usart_6, ring_buffer_rx], local = [retry_count], priority = 6)]
    fn usart6(mut ctx: usart6::Context) {
        ctx.shared.usart_6.lock(|usart| {
            ctx.shared.ring_buffer_rx.lock(|rx| {
                match usart.is_dma_rx_is_idle() {
                    Ok(true) => match handle_dma_rx(usart, rx) {
                        Err(e) => handle_error(e.into()),
                        Ok(()) => {
                            protocol_rx::spawn().ok();
                        }
                    },
                    Ok(false) => {}
                    Err(e) => handle_error(e.into()),
                }

                if let Err(e) = handle_usart_error(usart, ctx.local.retry_count) {
                    handle_error(e.into());
                }
            });
        });
    }

    /// DMA2 Stream6 (TX) interrupt handler: clears the transfer-complete
    /// flag. Restart is driven explicitly by `tx_flush`.
    #[task(binds = DMA2_STREAM6, shared = [usart_6], priority = 6)]
    fn dma2_stream6(mut ctx: dma2_stream6::Context) {
        ctx.shared.usart_6.lock(|usart| {
            usart.clear_dma_tx_complete_flag();
        });
    }

    /// DMA2 Stream1 (RX) interrupt handler.
    #[task(binds = DMA2_STREAM1, shared = [usart_6, ring_buffer_rx], priority = 6)]
    fn dma2_stream1(mut ctx: dma2_stream1::Context) {
        ctx.shared.usart_6.lock(|usart| {
            ctx.shared.ring_buffer_rx.lock(|rx| {
                if let Err(e) = handle_dma_rx(usart, rx) {
                    handle_error(e.into());
                }
                protocol_rx::spawn().ok();
            });
        });
    }

    /// USB OTG FS interrupt handler. USB is a secondary debug bridge in
    /// this firmware, not the host protocol link, so it is only polled
    /// here to keep enumeration and the CDC endpoint alive.
    #[task(binds = OTG_FS, shared = [otg_fs], priority = 4)]
    fn otg_fs(mut ctx: otg_fs::Context) {
        ctx.shared.otg_fs.lock(|usb| {
            if !usb.poll() {
                handle_error(UsbError::PollError.into());
            }
        });
    }

    /// Moves newly arrived USART bytes into the protocol ring, extracts
    /// every complete frame, and routes each onto the scheduler. Always
    /// wakes both drain tasks afterward since either queue may now hold
    /// work.
    #[task(shared = [ring_buffer_rx, proto_ring, frame_sync, scheduler], priority = 5)]
    async fn protocol_rx(mut ctx: protocol_rx::Context) {
        let routed = ctx.shared.ring_buffer_rx.lock(|rx| {
            ctx.shared.proto_ring.lock(|proto_ring| {
                feed_protocol_ring(rx, proto_ring);
                ctx.shared.frame_sync.lock(|sync| {
                    ctx.shared
                        .scheduler
                        .lock(|scheduler| drain_frames(proto_ring, sync, scheduler))
                })
            })
        });

        if routed > 0 {
            core1_critical::spawn().ok();
            core0_dispatch::spawn().ok();
        }
    }

    /// Core 1: answers every queued link-health ping immediately, ahead
    /// of any cooperative Core-0 work, and feeds the watchdog once per
    /// service iteration.
    #[task(shared = [scheduler, ring_buffer_tx, watchdog], priority = 5)]
    async fn core1_critical(mut ctx: core1_critical::Context) {
        let handled = ctx.shared.scheduler.lock(|scheduler| {
            let (mut core1, _core0) = scheduler.split();
            ctx.shared
                .ring_buffer_tx
                .lock(|tx| service_critical(&mut core1, tx))
        });

        ctx.shared.watchdog.lock(|wdg| wdg.feed());

        if handled > 0 {
            tx_flush::spawn().ok();
        }
    }

    /// Core 0: drains High/Normal/Low in priority order, dispatching
    /// each event to its owning subsystem, then feeds the watchdog.
    #[task(
        shared = [
            scheduler, led_engine, display_fsm, power_reporter, fuel_gauge,
            debug_channel, button_input, ring_buffer_tx, watchdog,
        ],
        priority = 2
    )]
    async fn core0_dispatch(mut ctx: core0_dispatch::Context) {
        let now_ms = Mono::now().ticks() as u32;

        let handled = ctx.shared.scheduler.lock(|scheduler| {
            let (_core1, mut core0) = scheduler.split();
            ctx.shared.led_engine.lock(|led_engine| {
                ctx.shared.display_fsm.lock(|display_fsm| {
                    ctx.shared.power_reporter.lock(|power_reporter| {
                        ctx.shared.fuel_gauge.lock(|gauge| {
                            ctx.shared.debug_channel.lock(|debug_channel| {
                                ctx.shared.button_input.lock(|button_input| {
                                    ctx.shared.ring_buffer_tx.lock(|tx| {
                                        service_core0(
                                            &mut core0,
                                            led_engine,
                                            display_fsm,
                                            power_reporter,
                                            gauge,
                                            debug_channel,
                                            button_input,
                                            tx,
                                            now_ms,
                                        )
                                    })
                                })
                            })
                        })
                    })
                })
            })
        });

        ctx.shared.watchdog.lock(|wdg| wdg.feed());

        if handled > 0 {
            tx_flush::spawn().ok();
        }
    }

    /// Flushes whatever reply frames `core1_critical`/`core0_dispatch`
    /// queued onto `ring_buffer_tx` out over the USART6 DMA.
    #[task(shared = [usart_6, ring_buffer_tx], priority = 3)]
    async fn tx_flush(mut ctx: tx_flush::Context) {
        let bytes_processed = ctx.shared.ring_buffer_tx.lock(|tx| tx.len());
        if bytes_processed == 0 {
            return;
        }
        ctx.shared.usart_6.lock(|usart| {
            ctx.shared.ring_buffer_tx.lock(|tx| {
                if let Err(e) = handle_dma_tx(usart, tx, bytes_processed) {
                    handle_error(e.into());
                }
            });
        });
    }

    /// Polls the four button GPIOs on a fixed cadence, debounces them,
    /// and applies the long UP+SELECT hold directly to the USB mux.
    #[task(shared = [button_input], local = [buttons, usb_switch], priority = 2)]
    async fn button_poll(mut ctx: button_poll::Context) {
        loop {
            let now_ms = Mono::now().ticks() as u32;
            let raw = ctx.local.buttons.read();
            let event = ctx
                .shared
                .button_input
                .lock(|input| input.sample(raw, now_ms));

            if let Some(event) = event {
                match apply_mux_switch_hold(event, ctx.local.usb_switch) {
                    Ok(true) => {
                        #[cfg(feature = "debug")]
                        defmt::info!("USB mux switched by long hold");
                    }
                    Ok(false) => {}
                    Err(e) => handle_error(e.into()),
                }
            }

            Mono::delay(1.millis()).await;
        }
    }

    /// Drives the boot-animation state machine frame by frame, releasing
    /// the e-ink bus to the host either when the animation runs to
    /// completion on its own or when a host release request lands
    /// first, and acking the host once the handoff is actually done.
    #[task(
        shared = [display_fsm, ring_buffer_tx],
        local = [eink_bus, display_mux],
        priority = 1
    )]
    async fn display_boot_anim(mut ctx: display_boot_anim::Context) {
        const BLANK_FRAME: [u8; EINK_FRAME_BYTES] = [0u8; EINK_FRAME_BYTES];

        loop {
            let action = ctx.shared.display_fsm.lock(|fsm| fsm.tick());
            match action {
                DisplayAction::RenderFrame(_) | DisplayAction::YieldToScheduler => {
                    if let Err(e) = ctx.local.eink_bus.write_frame(&BLANK_FRAME) {
                        handle_error(e.into());
                    }
                }
                DisplayAction::BeginRelease => {}
                DisplayAction::CompleteRelease => {
                    ctx.local.eink_bus.release();
                    if let Err(e) = ctx.local.display_mux.switch_to_host() {
                        handle_error(e.into());
                    }
                    ctx.shared.ring_buffer_tx.lock(|tx| {
                        let _ = tx.push(&display::completion_packet());
                    });
                    tx_flush::spawn().ok();
                    break;
                }
                DisplayAction::None => break,
            }

            Mono::delay(crate::config::BOOT_ANIM_FRAME_MS.millis()).await;
        }
    }

    /// Renders the LED strip and diagnostic pixel once per animation
    /// tick.
    #[task(shared = [led_engine, led_strip, diagnostic_led], priority = 1)]
    async fn animation_tick(mut ctx: animation_tick::Context) {
        const TICK_MS: u32 = 20;
        let mut heartbeat_counter: u32 = 0;

        loop {
            let now_ms = Mono::now().ticks() as u32;

            let frame = ctx.shared.led_engine.lock(|engine| engine.render(now_ms));
            ctx.shared.led_strip.lock(|strip| {
                if let Err(e) = strip.push_frame(frame) {
                    handle_error(e.into());
                }
            });

            heartbeat_counter += TICK_MS;
            if heartbeat_counter >= 500 {
                heartbeat_counter = 0;
                ctx.shared.diagnostic_led.lock(|pixel| {
                    if let Err(e) = pixel.push_frame() {
                        handle_error(e.into());
                    }
                });
            }

            Mono::delay(TICK_MS.millis()).await;
        }
    }

    /// Error code visualization task: replays the persistent error
    /// queue as a Morse sequence on the diagnostic pixel.
    #[task(shared = [diagnostic_led], priority = 1)]
    async fn task_display_error_codes(mut ctx: task_display_error_codes::Context) {
        let mut buffer = [0u8; crate::config::MAX_MORSE_LENGTH];

        loop {
            if !has_errors() {
                Mono::delay(500.millis()).await;
                continue;
            }

            if let Some(code) = crate::task_handlers::error_handlers::get_first_error_code() {
                let started = ctx.shared.diagnostic_led.lock(|pixel| {
                    pixel.start_morse_sequence(code, &mut buffer).is_ok()
                });
                if !started {
                    continue;
                }

                loop {
                    let active = ctx.shared.diagnostic_led.lock(|pixel| {
                        let _ = pixel.push_frame();
                        pixel.advance_morse();
                        pixel.morse_active()
                    });
                    Mono::delay(200.millis()).await;
                    if !active {
                        break;
                    }
                }
            }
        }
    }
}

/// Central error handling facility, reserved for genuinely
/// unexpected/fatal conditions: recoverable, component-local errors
/// (framing, unknown packets, sensor failure, LED command failure) are
/// handled where they occur and never reach this sink.
///
/// # Error Handling Flow
/// 1. Log error to debug output (if enabled)
/// 2. Add error code to persistent queue
/// 3. The diagnostic pixel's Morse task picks it up on its next pass
fn handle_error(error: DeviceError) {
    #[cfg(feature = "debug")]
    log_error(error.description());

    if add_error_code(error.code()).is_err() {
        #[cfg(feature = "debug")]
        defmt::error!("Error queue overflow - code: {}", error.code());
    }
}

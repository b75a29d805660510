//! # STM32F469 Peripheral Initialization
//!
//! This module handles the initialization of critical peripherals for the STM32F469 microcontroller.
//! It configures:
//! - Clock tree through RCC
//! - GPIO pins for the diagnostic pixel, LED strip, buttons, display mux and communication interfaces
//! - USART6 for serial communication
//! - USB OTG FS for USB device functionality
//! - SPI1/SPI2/SPI3 for the diagnostic pixel, LED strip and e-ink panel
//! - I2C1 for the BQ27441 fuel gauge
//! - Interrupt configuration for peripherals
//!
//! ## Safety Considerations
//! - Must be called only once during system startup
//! - Direct hardware access requires proper sequencing
//! - Interrupt masks should match actual peripheral usage

use crate::config::{HSE, PCLK1, PCLK2, SYSCLK};
use crate::errors::errors::InitError;
use crate::peripherals::buttons::ButtonPins;
use crate::peripherals::diagnostic_led::DiagnosticLed;
use crate::peripherals::eink_bus::EinkBus;
use crate::peripherals::fuel_gauge::FuelGaugeBq27441;
use crate::peripherals::led_strip::LedStrip;
use crate::peripherals::lines::{DisplayMux, UsbSwitch};
use crate::peripherals::otg_fs::OtgFsController;
use crate::peripherals::rcc::RccConfig;
use crate::peripherals::usart_6::Usart6Controller;
use cortex_m::singleton;
use stm32f4xx_hal::gpio::{Output, Pin};
use stm32f4xx_hal::i2c::I2c;
use stm32f4xx_hal::pac::Interrupt;
use stm32f4xx_hal::spi::Spi;
use stm32f4xx_hal::watchdog::IndependentWatchdog;
use stm32f4xx_hal::{pac, prelude::*};

/// Watchdog window: must be fed more often than this by both the
/// Core-1 UART service loop and the Core-0 dispatch loop, or the MCU
/// resets.
const WATCHDOG_TIMEOUT_MS: u32 = 2_000;

pub(crate) type DiagnosticSpi = Spi<pac::SPI1>;
pub(crate) type StripSpi = Spi<pac::SPI2>;
type EinkSpi = Spi<pac::SPI3>;
type EinkDc = Pin<'C', 6, Output>;
type EinkRst = Pin<'C', 7, Output>;
type EinkBusy = stm32f4xx_hal::gpio::Pin<'C', 8>;
type EinkCs = Pin<'C', 9, Output>;
type MuxSelect = Pin<'E', 0, Output>;
type MuxPower = Pin<'E', 1, Output>;

/// Concrete e-ink bus type, named so the RTIC app can hold it in `Local`.
pub(crate) type EinkPanelBus = EinkBus<EinkSpi, EinkDc, EinkRst, EinkBusy, EinkCs>;
/// Concrete display mux type, named so the RTIC app can hold it in `Local`.
pub(crate) type EinkPanelMux = DisplayMux<MuxSelect, MuxPower>;
pub(crate) type UsbSwitchPin = Pin<'E', 2, Output>;
pub(crate) type ButtonUp = stm32f4xx_hal::gpio::Pin<'B', 0>;
pub(crate) type ButtonDown = stm32f4xx_hal::gpio::Pin<'B', 1>;
pub(crate) type ButtonSelect = stm32f4xx_hal::gpio::Pin<'B', 2>;
pub(crate) type ButtonPower = stm32f4xx_hal::gpio::Pin<'B', 3>;

/// Container for initialized hardware peripherals
pub struct InitializedPeripherals {
    /// Single diagnostic WS2812 pixel (heartbeat / Morse error codes)
    pub diagnostic_led: DiagnosticLed<DiagnosticSpi>,
    /// 7-pixel addressable front-panel LED strip
    pub led_strip: LedStrip<StripSpi>,
    /// BQ27441 fuel gauge over I2C1
    pub fuel_gauge: FuelGaugeBq27441<I2c<pac::I2C1>>,
    /// E-ink panel SPI3 bus, handed off to the host once the boot
    /// animation completes
    pub eink_bus: EinkPanelBus,
    /// E-ink mux select + panel power enable pair
    pub display_mux: EinkPanelMux,
    /// USB data-mux line the button combo can toggle
    pub usb_switch: UsbSwitch<UsbSwitchPin>,
    /// Front-panel button inputs
    pub buttons: ButtonPins<ButtonUp, ButtonDown, ButtonSelect, ButtonPower>,
    /// USART6 controller with DMA capabilities
    pub usart_6: Usart6Controller,
    /// USB OTG FS device controller
    pub otg_fs: OtgFsController<'static>,
    /// Independent watchdog, fed by both the Core-1 and Core-0 service
    /// loops; starvation of either resets the MCU
    pub watchdog: IndependentWatchdog,
}

/// Initializes all critical system peripherals
///
/// # Parameters
/// * `device` - Peripheral access crate structure
///
/// # Errors
/// Returns `InitError` if:
/// - Clock configuration fails
/// - USART6 initialization fails
/// - USB initialization fails
///
/// # Safety
/// - Must maintain exclusive access to hardware resources
/// - Interrupt configuration must match actual usage
pub fn init_peripherals(device: pac::Peripherals) -> Result<InitializedPeripherals, InitError> {
    #[allow(non_snake_case)]
    let pac::Peripherals {
        RCC,
        GPIOA,
        GPIOB,
        GPIOC,
        GPIOE,
        GPIOG,
        USART6,
        DMA2,
        SPI1,
        SPI2,
        SPI3,
        I2C1,
        IWDG,
        OTG_FS_DEVICE,
        OTG_FS_GLOBAL,
        OTG_FS_PWRCLK,
        ..
    } = device;

    // ===================== Clock Configuration =====================
    let rcc_config: &'static mut RccConfig = singleton!(
        : RccConfig = RccConfig::new(RCC, HSE, SYSCLK, PCLK1, PCLK2)
    )
    .ok_or(InitError::RccError)?;

    let gpioa = GPIOA.split();
    let gpiob = GPIOB.split();
    let gpioc = GPIOC.split();
    let gpioe = GPIOE.split();
    let gpiog = GPIOG.split();

    // ===================== Diagnostic pixel (SPI1) =====================
    let diagnostic_spi = Spi::new(
        SPI1,
        (gpioa.pa5.into_alternate(), gpioa.pa6.into_alternate(), gpioa.pa7.into_alternate()),
        ws2812_spi::MODE,
        3_000_000.Hz(),
        &rcc_config.clocks,
    );
    let diagnostic_led = DiagnosticLed::new(diagnostic_spi);

    // ===================== LED strip (SPI2) =====================
    let strip_spi = Spi::new(
        SPI2,
        (gpiob.pb13.into_alternate(), gpiob.pb14.into_alternate(), gpiob.pb15.into_alternate()),
        ws2812_spi::MODE,
        3_000_000.Hz(),
        &rcc_config.clocks,
    );
    let led_strip = LedStrip::new(strip_spi);

    // ===================== Fuel gauge (I2C1) =====================
    let i2c1 = I2c::new(
        I2C1,
        (gpiob.pb6.into_alternate_open_drain(), gpiob.pb7.into_alternate_open_drain()),
        stm32f4xx_hal::i2c::Mode::Standard { frequency: 100_000.Hz() },
        &rcc_config.clocks,
    );
    let fuel_gauge = FuelGaugeBq27441::new(i2c1);

    // ===================== E-ink bus (SPI3) =====================
    let eink_spi = Spi::new(
        SPI3,
        (gpioc.pc10.into_alternate(), gpioc.pc11.into_alternate(), gpioc.pc12.into_alternate()),
        stm32f4xx_hal::spi::Mode {
            polarity: stm32f4xx_hal::spi::Polarity::IdleLow,
            phase: stm32f4xx_hal::spi::Phase::CaptureOnFirstTransition,
        },
        4_000_000.Hz(),
        &rcc_config.clocks,
    );
    let eink_bus = EinkBus::new(
        eink_spi,
        gpioc.pc6.into_push_pull_output(),
        gpioc.pc7.into_push_pull_output(),
        gpioc.pc8.into_floating_input(),
        gpioc.pc9.into_push_pull_output(),
    );

    // ===================== Display mux + USB switch =====================
    let display_mux = DisplayMux::new(
        gpioe.pe0.into_push_pull_output(),
        gpioe.pe1.into_push_pull_output(),
    );
    let usb_switch = UsbSwitch::new(gpioe.pe2.into_push_pull_output());

    // ===================== Buttons =====================
    let buttons = ButtonPins::new(
        gpiob.pb0.into_floating_input(),
        gpiob.pb1.into_floating_input(),
        gpiob.pb2.into_floating_input(),
        gpiob.pb3.into_floating_input(),
    );

    // ===================== USART6 Configuration =====================
    let usart6 = Usart6Controller::init(
        USART6,
        DMA2,
        gpiog.pg14.into_alternate::<8>(), // TX pin
        gpiog.pg9.into_alternate::<8>(),  // RX pin
        rcc_config,
    )
    .map_err(|_| InitError::UsartError)?;

    // ===================== USB OTG FS Configuration =====================
    let otg_fs = OtgFsController::new(
        OTG_FS_GLOBAL,
        OTG_FS_DEVICE,
        OTG_FS_PWRCLK,
        gpioa.pa11.into_alternate::<10>(), // DM pin
        gpioa.pa12.into_alternate::<10>(), // DP pin
        rcc_config,
    )
    .map_err(|_| InitError::UsbError)?;

    // ===================== Independent watchdog =====================
    let mut watchdog = IndependentWatchdog::new(IWDG);
    watchdog.start(WATCHDOG_TIMEOUT_MS.millis());

    // ===================== Interrupt Configuration =====================
    // SAFETY: Single unmask operations during initialization
    unsafe {
        cortex_m::peripheral::NVIC::unmask(Interrupt::OTG_FS);
        cortex_m::peripheral::NVIC::unmask(Interrupt::USART6);
        cortex_m::peripheral::NVIC::unmask(Interrupt::DMA2_STREAM1);
        cortex_m::peripheral::NVIC::unmask(Interrupt::DMA2_STREAM6);
    }

    Ok(InitializedPeripherals {
        diagnostic_led,
        led_strip,
        fuel_gauge,
        eink_bus,
        display_mux,
        usb_switch,
        buttons,
        usart_6: usart6,
        otg_fs,
        watchdog,
    })
}

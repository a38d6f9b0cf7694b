//! The DS1302 3-wire serial bus.
//!
//! Every register access is one transaction: CE asserted, a command byte
//! clocked out LSB first, then data bytes written or read LSB first, then CE
//! deasserted. The [`ThreeWire`] trait captures exactly that so the driver
//! stays independent of how the bus is wired up; the `rp2040`/`rp2350`
//! features provide `SoftThreeWire`, a bit-banged implementation over SIO
//! pins.

/// Or-ed into the command byte to open a read transaction.
pub const READ_FLAG: u8 = 0x01;

/// One 3-wire bus transaction at a time.
///
/// The driver issues strictly `begin_transmission`, then any number of
/// `write`/`read` calls, then `end_transmission`. Interleaving transactions
/// from several owners would corrupt the framing, so implementations can
/// assume exclusive, serialized access.
pub trait ThreeWire {
    type Error;

    /// Asserts CE and clocks out the command byte.
    fn begin_transmission(&mut self, command: u8) -> Result<(), Self::Error>;

    /// Clocks one data byte out, LSB first.
    fn write(&mut self, byte: u8) -> Result<(), Self::Error>;

    /// Clocks one data byte in, LSB first.
    fn read(&mut self) -> Result<u8, Self::Error>;

    /// Deasserts CE, honoring the chip's CE inactive time.
    fn end_transmission(&mut self) -> Result<(), Self::Error>;
}

/// For timing the bus uses the [fugit](https://lib.rs/crates/fugit) crate which
/// only provides `Duration` and `Instant` types. It does not provide any clock
/// or timer traits. Therefore the crate has its own `Delay` trait that provides
/// all timing capabilities that are needed for the library.
/// User must implement this trait for the timer by itself.
pub trait Delay<const TIMER_HZ: u32> {
    /// An error that might happen during waiting
    type Error;

    /// Return current time `Instant`
    fn now(&mut self) -> fugit::TimerInstantU32<TIMER_HZ>;

    /// Start countdown with a `duration`
    fn start(&mut self, duration: fugit::TimerDurationU32<TIMER_HZ>) -> Result<(), Self::Error>;

    /// Wait until countdown `duration` has expired.
    /// Must return `nb::Error::WouldBlock` if countdown `duration` is not yet over.
    /// Must return `OK(())` as soon as countdown `duration` has expired.
    fn wait(&mut self) -> nb::Result<(), Self::Error>;
}

/// Bit-banged bus error.
#[cfg(any(feature = "rp2040", feature = "rp2350"))]
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WireError {
    Clock,
    ChipSelect,
    Read,
}

#[cfg(any(feature = "rp2040", feature = "rp2350"))]
mod soft {
    use embedded_hal::digital::{InputPin, OutputPin};
    use fugit::ExtU32;

    #[cfg(feature = "rp2350")]
    use rp235x_hal as hal;

    #[cfg(feature = "rp2040")]
    use rp2040_hal as hal;

    use hal::gpio::{
        FunctionSio, FunctionSioOutput, Pin, PinId, PullDown, SioInput, SioOutput, ValidFunction,
    };

    use super::{Delay, ThreeWire, WireError};

    /// Bit-banged 3-wire bus over SIO pins.
    ///
    /// CE must be asserted high for the whole transaction. The IO pin is
    /// driven push-pull while writing and flipped to a pull-up input while
    /// reading. All delays follow the 2 V timing column of the datasheet.
    pub struct SoftThreeWire<I1, I2, I3, D, const TIMER_HZ: u32>
    where
        I1: PinId + ValidFunction<FunctionSio<SioInput>> + ValidFunction<FunctionSio<SioOutput>>,
        I2: PinId + ValidFunction<FunctionSio<SioInput>> + ValidFunction<FunctionSio<SioOutput>>,
        I3: PinId + ValidFunction<FunctionSio<SioInput>> + ValidFunction<FunctionSio<SioOutput>>,
    {
        io: Option<Pin<I1, FunctionSioOutput, PullDown>>,
        ce: Pin<I2, FunctionSioOutput, PullDown>,
        sclk: Pin<I3, FunctionSioOutput, PullDown>,
        delay: D,
    }

    impl<I1, I2, I3, D, const TIMER_HZ: u32> SoftThreeWire<I1, I2, I3, D, TIMER_HZ>
    where
        I1: PinId + ValidFunction<FunctionSio<SioInput>> + ValidFunction<FunctionSio<SioOutput>>,
        I2: PinId + ValidFunction<FunctionSio<SioInput>> + ValidFunction<FunctionSio<SioOutput>>,
        I3: PinId + ValidFunction<FunctionSio<SioInput>> + ValidFunction<FunctionSio<SioOutput>>,
        D: Delay<TIMER_HZ>,
    {
        pub fn new(
            ce: Pin<I2, FunctionSioOutput, PullDown>,
            io: Pin<I1, FunctionSioOutput, PullDown>,
            sclk: Pin<I3, FunctionSioOutput, PullDown>,
            delay: D,
        ) -> Self {
            SoftThreeWire {
                io: Some(io),
                ce,
                sclk,
                delay,
            }
        }

        /// Release the pins and the timer.
        pub fn free(
            self,
        ) -> (
            Pin<I2, FunctionSioOutput, PullDown>,
            Pin<I1, FunctionSioOutput, PullDown>,
            Pin<I3, FunctionSioOutput, PullDown>,
            D,
        ) {
            (self.ce, self.io.unwrap(), self.sclk, self.delay)
        }

        fn write_byte(&mut self, byte: u8) -> Result<(), WireError> {
            self.sclk.set_low().map_err(|_| WireError::Clock)?;
            let mut pin = self.io.take().unwrap();
            for i in 0..8 {
                self.write_bit(&mut pin, ((byte >> i) & 1) == 1)?;
            }
            self.io = Some(pin);
            Ok(())
        }

        fn write_bit(&mut self, pin: &mut impl OutputPin, bit: bool) -> Result<(), WireError> {
            let _ = pin.set_state(bit.into());
            self.delay.start(350.nanos()).ok(); // tDC = 200ns for 2V
            self.sclk.set_high().map_err(|_| WireError::Clock)?;
            self.delay.start(2000.nanos()).ok(); // tCH = 1000ns for 2V
            self.sclk.set_low().map_err(|_| WireError::Clock)?;
            self.delay.start(1700.nanos()).ok(); // tCL = 1000ns for 2V
            Ok(())
        }

        fn read_byte(&mut self) -> Result<u8, WireError> {
            let mut data = 0;
            self.sclk.set_low().map_err(|_| WireError::Clock)?;
            let mut pin = self.io.take().unwrap().into_pull_up_input();
            for i in 0..8 {
                let bit = self.read_bit(&mut pin)?;
                data |= (bit as u8) << i;
            }

            let io: Pin<_, FunctionSioOutput, PullDown> = pin.reconfigure();
            self.io = Some(io);
            Ok(data)
        }

        fn read_bit(&mut self, pin: &mut impl InputPin) -> Result<bool, WireError> {
            self.delay.start(300.nanos()).ok(); // tCCZ = 280ns for 2V
            self.sclk.set_high().map_err(|_| WireError::Clock)?;
            let bit = pin.is_high().map_err(|_| WireError::Read)?;
            self.delay.start(2000.nanos()).ok(); // tCH = 1000ns for 2V
            self.sclk.set_low().map_err(|_| WireError::Clock)?;
            self.delay.start(1700.nanos()).ok(); // tCL = 1000ns for 2V
            Ok(bit)
        }
    }

    impl<I1, I2, I3, D, const TIMER_HZ: u32> ThreeWire for SoftThreeWire<I1, I2, I3, D, TIMER_HZ>
    where
        I1: PinId + ValidFunction<FunctionSio<SioInput>> + ValidFunction<FunctionSio<SioOutput>>,
        I2: PinId + ValidFunction<FunctionSio<SioInput>> + ValidFunction<FunctionSio<SioOutput>>,
        I3: PinId + ValidFunction<FunctionSio<SioInput>> + ValidFunction<FunctionSio<SioOutput>>,
        D: Delay<TIMER_HZ>,
    {
        type Error = WireError;

        fn begin_transmission(&mut self, command: u8) -> Result<(), Self::Error> {
            self.sclk.set_low().map_err(|_| WireError::Clock)?;
            self.ce.set_high().map_err(|_| WireError::ChipSelect)?;
            self.delay.start(4.micros()).ok(); // tCC = 4us for 2V
            self.write_byte(command)
        }

        fn write(&mut self, byte: u8) -> Result<(), Self::Error> {
            self.write_byte(byte)
        }

        fn read(&mut self) -> Result<u8, Self::Error> {
            self.read_byte()
        }

        fn end_transmission(&mut self) -> Result<(), Self::Error> {
            self.delay.start(300.nanos()).ok(); // tCCH = 240ns for 2V
            self.ce.set_low().map_err(|_| WireError::ChipSelect)?;
            self.delay.start(4.micros()).ok(); // tCWH = 4us for 2V
            Ok(())
        }
    }
}

#[cfg(any(feature = "rp2040", feature = "rp2350"))]
pub use soft::SoftThreeWire;

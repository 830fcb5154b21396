//! Quadrature encoder decoding
//!
//! Counts every edge of both channels (x4 decoding), which is how motor
//! catalogues quote ticks per revolution. Sample the pins faster than the
//! edge rate at full speed; a skipped state is counted as no movement.

use embedded_hal::digital::InputPin;

/// Source of a signed encoder count
pub trait EncoderCounter {
    /// Accumulated count since power-on
    fn count(&mut self) -> i32;
}

impl<E: EncoderCounter + ?Sized> EncoderCounter for &mut E {
    fn count(&mut self) -> i32 {
        (**self).count()
    }
}

/// Count change for a transition from `prev` to `next`
///
/// States are `(a << 1) | b` in Gray order 00 -> 01 -> 11 -> 10 for
/// forward rotation. Invalid double-edge transitions count as zero.
const TRANSITIONS: [i8; 16] = [
    0, 1, -1, 0, //
    -1, 0, 0, 1, //
    1, 0, 0, -1, //
    0, -1, 1, 0, //
];

fn state(a: bool, b: bool) -> u8 {
    (u8::from(a) << 1) | u8::from(b)
}

/// Polled two-channel quadrature decoder
pub struct QuadratureEncoder<A, B> {
    a: A,
    b: B,
    last: u8,
    count: i32,
    /// Double-edge transitions seen since creation
    missed: u32,
    /// Pin reads that failed while counting
    read_errors: u32,
}

impl<A, B, E> QuadratureEncoder<A, B>
where
    A: InputPin<Error = E>,
    B: InputPin<Error = E>,
{
    /// Create a decoder, latching the current pin state
    pub fn new(mut a: A, mut b: B) -> Result<Self, E> {
        let last = state(a.is_high()?, b.is_high()?);
        Ok(Self {
            a,
            b,
            last,
            count: 0,
            missed: 0,
            read_errors: 0,
        })
    }

    /// Sample both pins once and update the count
    pub fn sample(&mut self) -> Result<i32, E> {
        let next = state(self.a.is_high()?, self.b.is_high()?);
        if next != self.last {
            let delta = TRANSITIONS[usize::from((self.last << 2) | next)];
            if delta == 0 {
                self.missed = self.missed.saturating_add(1);
            }
            self.count = self.count.wrapping_add(i32::from(delta));
            self.last = next;
        }
        Ok(self.count)
    }

    /// Transitions that skipped a state
    pub fn missed(&self) -> u32 {
        self.missed
    }

    /// Failed samples taken through [`EncoderCounter::count`]
    pub fn read_errors(&self) -> u32 {
        self.read_errors
    }

    /// Zero the count
    pub fn reset(&mut self) {
        self.count = 0;
    }
}

impl<A, B, E> EncoderCounter for QuadratureEncoder<A, B>
where
    A: InputPin<Error = E>,
    B: InputPin<Error = E>,
{
    fn count(&mut self) -> i32 {
        // A failed read keeps the last good count
        if self.sample().is_err() {
            self.read_errors = self.read_errors.saturating_add(1);
        }
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use core::convert::Infallible;
    use embedded_hal::digital::{ErrorKind, ErrorType};

    /// Input pin backed by a shared level
    struct MockPin<'a>(&'a Cell<bool>);

    impl ErrorType for MockPin<'_> {
        type Error = Infallible;
    }

    impl InputPin for MockPin<'_> {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(self.0.get())
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.0.get())
        }
    }

    const FORWARD: [(bool, bool); 4] = [(false, true), (true, true), (true, false), (false, false)];

    #[test]
    fn test_forward_counts_every_edge() {
        let a = Cell::new(false);
        let b = Cell::new(false);
        let mut enc = QuadratureEncoder::new(MockPin(&a), MockPin(&b)).unwrap();

        for _ in 0..3 {
            for (la, lb) in FORWARD {
                a.set(la);
                b.set(lb);
                enc.sample().unwrap();
            }
        }
        assert_eq!(enc.count(), 12);
        assert_eq!(enc.missed(), 0);
    }

    #[test]
    fn test_reverse_counts_down() {
        let a = Cell::new(false);
        let b = Cell::new(false);
        let mut enc = QuadratureEncoder::new(MockPin(&a), MockPin(&b)).unwrap();

        let reverse = [(true, false), (true, true), (false, true), (false, false)];
        for (la, lb) in reverse {
            a.set(la);
            b.set(lb);
            enc.sample().unwrap();
        }
        assert_eq!(enc.count(), -4);
    }

    #[test]
    fn test_skipped_state_is_not_counted() {
        let a = Cell::new(false);
        let b = Cell::new(false);
        let mut enc = QuadratureEncoder::new(MockPin(&a), MockPin(&b)).unwrap();

        // 00 -> 11 skips a state
        a.set(true);
        b.set(true);
        assert_eq!(enc.sample().unwrap(), 0);
        assert_eq!(enc.missed(), 1);
    }

    /// Input pin whose reads fail while `fail` is set
    struct FlakyPin<'a> {
        level: &'a Cell<bool>,
        fail: &'a Cell<bool>,
    }

    impl ErrorType for FlakyPin<'_> {
        type Error = ErrorKind;
    }

    impl InputPin for FlakyPin<'_> {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            if self.fail.get() {
                return Err(ErrorKind::Other);
            }
            Ok(self.level.get())
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            self.is_high().map(|high| !high)
        }
    }

    #[test]
    fn test_failed_reads_are_counted() {
        let a = Cell::new(false);
        let b = Cell::new(false);
        let fail = Cell::new(false);
        let mut enc = QuadratureEncoder::new(
            FlakyPin {
                level: &a,
                fail: &fail,
            },
            FlakyPin {
                level: &b,
                fail: &fail,
            },
        )
        .unwrap();

        b.set(true);
        assert_eq!(enc.count(), 1);
        fail.set(true);
        a.set(true);
        assert_eq!(enc.count(), 1);
        assert_eq!(enc.count(), 1);
        assert_eq!(enc.read_errors(), 2);

        fail.set(false);
        assert_eq!(enc.count(), 2);
        assert_eq!(enc.read_errors(), 2);
    }

    #[test]
    fn test_reset() {
        let a = Cell::new(false);
        let b = Cell::new(false);
        let mut enc = QuadratureEncoder::new(MockPin(&a), MockPin(&b)).unwrap();
        b.set(true);
        assert_eq!(enc.count(), 1);
        enc.reset();
        assert_eq!(enc.count(), 0);
    }
}

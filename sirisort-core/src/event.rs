//! Decoded detector events.
//!
//! An [`Event`] is a fixed-shape aggregate: every sub-record list has a fixed
//! capacity and an explicit count, so one event value can be reused for every
//! decode call without allocating.

use crate::{Error, Result};
use std::fmt;
use std::ops::Deref;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize, Serializer};

const MAX_E: usize = 32;
const MAX_DE: usize = 64;
const MAX_NA: usize = 32;
const MAX_SCALER: usize = 16;

/// Combination of channel id and ADC value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelAdc {
    /// The channel id.
    pub chn: u8,
    /// The ADC value.
    pub adc: u16,
}

/// Combination of channel id, ADC and TDC value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelAdcTdc {
    /// The channel id.
    pub chn: u8,
    /// The ADC value, 0 if only a TDC word was seen.
    pub adc: u16,
    /// The TDC value, 0 if only an ADC word was seen.
    pub tdc: u16,
}

/// Combination of channel id and scaler value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelScaler {
    /// The channel id.
    pub chn: u8,
    /// The scaler value.
    pub scaler: u32,
}

/// A fixed-capacity list with an explicit length.
///
/// Storage is inline; pushing past `N` fails instead of reallocating.
/// Equality and `Debug` only look at the stored items.
#[derive(Clone)]
pub struct BoundedList<T: Copy + Default, const N: usize> {
    items: [T; N],
    len: usize,
}

impl<T: Copy + Default, const N: usize> Default for BoundedList<T, N> {
    fn default() -> Self {
        Self {
            items: [T::default(); N],
            len: 0,
        }
    }
}

impl<T: Copy + Default, const N: usize> BoundedList<T, N> {
    /// Fixed capacity of the list.
    pub const CAPACITY: usize = N;

    /// Appends an item, handing it back if the list is full.
    ///
    /// # Errors
    /// Returns the rejected item when the list already holds `N` items.
    #[inline]
    pub fn push(&mut self, item: T) -> std::result::Result<(), T> {
        match self.items.get_mut(self.len) {
            Some(slot) => {
                *slot = item;
                self.len += 1;
                Ok(())
            }
            None => Err(item),
        }
    }

    /// Removes all items.
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// The stored items.
    #[must_use]
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.items[..self.len]
    }

    /// The stored items, mutable.
    #[must_use]
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.items[..self.len]
    }

    /// Returns true when no more items fit.
    #[must_use]
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == N
    }
}

impl<T: Copy + Default + PartialEq, const N: usize> PartialEq for BoundedList<T, N> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Copy + Default + Eq, const N: usize> Eq for BoundedList<T, N> {}

impl<T: Copy + Default + fmt::Debug, const N: usize> fmt::Debug for BoundedList<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<T: Copy + Default, const N: usize> Deref for BoundedList<T, N> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

#[cfg(feature = "serde")]
impl<T: Copy + Default + Serialize, const N: usize> Serialize for BoundedList<T, N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.as_slice())
    }
}

/// A SiRi/CACTUS event.
///
/// Lists are named after the detector that produced them:
/// - `e`: SiRi back detector ADC values,
/// - `de`: SiRi front detector ADC values,
/// - `na`: CACTUS ADC and TDC values,
/// - `scaler`: scaler readouts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Event {
    /// SiRi back detector ADC values.
    pub e: BoundedList<ChannelAdc, MAX_E>,
    /// SiRi front detector ADC values.
    pub de: BoundedList<ChannelAdc, MAX_DE>,
    /// CACTUS ADC and TDC values.
    pub na: BoundedList<ChannelAdcTdc, MAX_NA>,
    /// Scaler values.
    pub scaler: BoundedList<ChannelScaler, MAX_SCALER>,
    /// Wall clock time in seconds, if present.
    pub time: Option<u32>,
    /// Trigger pattern word, if present. It should always be present.
    pub pattern: Option<u16>,
}

impl Event {
    /// Capacity of the SiRi back detector list.
    pub const MAX_E: usize = MAX_E;
    /// Capacity of the SiRi front detector list.
    pub const MAX_DE: usize = MAX_DE;
    /// Capacity of the CACTUS list.
    pub const MAX_NA: usize = MAX_NA;
    /// Capacity of the scaler list.
    pub const MAX_SCALER: usize = MAX_SCALER;

    /// Creates an empty event.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets all counts to 0 and clears the optional fields.
    pub fn reset(&mut self) {
        self.e.clear();
        self.de.clear();
        self.na.clear();
        self.scaler.clear();
        self.time = None;
        self.pattern = None;
    }

    /// Adds a SiRi back detector value.
    ///
    /// # Errors
    /// Returns [`Error::CapacityExceeded`] if the list is full.
    pub fn push_e(&mut self, chn: u8, adc: u16) -> Result<()> {
        self.e.push(ChannelAdc { chn, adc }).map_err(|_| Error::CapacityExceeded {
            list: "e",
            capacity: Self::MAX_E,
        })
    }

    /// Adds a SiRi front detector value.
    ///
    /// # Errors
    /// Returns [`Error::CapacityExceeded`] if the list is full.
    pub fn push_de(&mut self, chn: u8, adc: u16) -> Result<()> {
        self.de.push(ChannelAdc { chn, adc }).map_err(|_| Error::CapacityExceeded {
            list: "de",
            capacity: Self::MAX_DE,
        })
    }

    /// Records a CACTUS ADC value, merging with a TDC value already seen for
    /// the same channel.
    ///
    /// # Errors
    /// Returns [`Error::CapacityExceeded`] if a new entry is needed and the list is full.
    pub fn set_na_adc(&mut self, chn: u8, adc: u16) -> Result<()> {
        self.na_entry(chn)?.adc = adc;
        Ok(())
    }

    /// Records a CACTUS TDC value, merging with an ADC value already seen for
    /// the same channel.
    ///
    /// # Errors
    /// Returns [`Error::CapacityExceeded`] if a new entry is needed and the list is full.
    pub fn set_na_tdc(&mut self, chn: u8, tdc: u16) -> Result<()> {
        self.na_entry(chn)?.tdc = tdc;
        Ok(())
    }

    /// Adds a scaler readout.
    ///
    /// # Errors
    /// Returns [`Error::CapacityExceeded`] if the list is full.
    pub fn push_scaler(&mut self, chn: u8, scaler: u32) -> Result<()> {
        self.scaler
            .push(ChannelScaler { chn, scaler })
            .map_err(|_| Error::CapacityExceeded {
                list: "scaler",
                capacity: Self::MAX_SCALER,
            })
    }

    /// Total number of sub-records in the event.
    #[must_use]
    pub fn multiplicity(&self) -> usize {
        self.e.len() + self.de.len() + self.na.len() + self.scaler.len()
    }

    fn na_entry(&mut self, chn: u8) -> Result<&mut ChannelAdcTdc> {
        let pos = match self.na.iter().position(|entry| entry.chn == chn) {
            Some(pos) => pos,
            None => {
                self.na
                    .push(ChannelAdcTdc {
                        chn,
                        ..ChannelAdcTdc::default()
                    })
                    .map_err(|_| Error::CapacityExceeded {
                        list: "na",
                        capacity: Self::MAX_NA,
                    })?;
                self.na.len() - 1
            }
        };
        Ok(&mut self.na.as_mut_slice()[pos])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_clears_counts_and_flags() {
        let mut event = Event::new();
        event.push_e(3, 100).unwrap();
        event.push_de(12, 200).unwrap();
        event.set_na_adc(1, 300).unwrap();
        event.push_scaler(0, 1_000_000).unwrap();
        event.time = Some(42);
        event.pattern = Some(0x0101);
        assert_eq!(event.multiplicity(), 4);

        event.reset();
        assert!(event.e.is_empty());
        assert!(event.de.is_empty());
        assert!(event.na.is_empty());
        assert!(event.scaler.is_empty());
        assert_eq!(event.time, None);
        assert_eq!(event.pattern, None);
    }

    #[test]
    fn test_reused_event_equals_fresh_event() {
        let mut reused = Event::new();
        reused.push_e(3, 100).unwrap();
        reused.set_na_tdc(2, 40).unwrap();
        reused.reset();
        assert_eq!(reused, Event::new());
        assert_eq!(format!("{reused:?}"), format!("{:?}", Event::new()));

        reused.push_e(3, 7).unwrap();
        let mut fresh = Event::new();
        fresh.push_e(3, 7).unwrap();
        assert_eq!(reused, fresh);
    }

    #[test]
    fn test_na_adc_and_tdc_merge_by_channel() {
        let mut event = Event::new();
        event.set_na_adc(5, 1200).unwrap();
        event.set_na_tdc(7, 80).unwrap();
        event.set_na_tdc(5, 90).unwrap();

        assert_eq!(
            event.na.as_slice(),
            &[
                ChannelAdcTdc { chn: 5, adc: 1200, tdc: 90 },
                ChannelAdcTdc { chn: 7, adc: 0, tdc: 80 },
            ]
        );
    }

    #[test]
    fn test_list_capacity_is_enforced() {
        let mut event = Event::new();
        for i in 0..Event::MAX_E {
            event.push_e(u8::try_from(i).unwrap(), 1).unwrap();
        }
        assert!(event.e.is_full());
        assert_eq!(
            event.push_e(0, 1),
            Err(Error::CapacityExceeded {
                list: "e",
                capacity: 32
            })
        );
        assert_eq!(event.e.len(), Event::MAX_E);
    }

    #[test]
    fn test_bounded_list_hands_back_rejected_item() {
        let mut list: BoundedList<u32, 2> = BoundedList::default();
        assert_eq!(BoundedList::<u32, 2>::CAPACITY, 2);
        list.push(1).unwrap();
        list.push(2).unwrap();
        assert_eq!(list.push(3), Err(3));
        assert_eq!(&*list, &[1, 2]);
        list.clear();
        assert!(list.is_empty());
    }
}

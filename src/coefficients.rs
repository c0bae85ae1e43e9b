//! Calibration coefficients keyed by zone and hour.
//!
//! The coefficients were fitted per zone and hour of the
//! monitoring flight by comparing H20T thermal imagery
//! against an Apogee MI-210 radiometer over nine reference
//! covers. Each entry is an affine correction
//! `T' = gain * T + offset` in degrees Celsius.

use std::{collections::HashMap, fmt, str::FromStr};

use lazy_static::lazy_static;
use regex::Regex;
use serde_derive::*;

use crate::{
    error::{Error, Result},
    location::Zone,
};

/// First and last hour of the monitoring window.
pub const FIRST_HOUR: u8 = 9;
pub const LAST_HOUR: u8 = 15;

/// A full hour within the daily monitoring window
/// (09:00 to 15:00 inclusive).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(u8);

impl TimeOfDay {
    pub fn from_hour(hour: u8) -> Option<Self> {
        (FIRST_HOUR..=LAST_HOUR)
            .contains(&hour)
            .then(|| TimeOfDay(hour))
    }

    pub fn hour(self) -> u8 {
        self.0
    }

    /// All valid times, in order.
    pub fn all() -> impl Iterator<Item = TimeOfDay> {
        (FIRST_HOUR..=LAST_HOUR).map(TimeOfDay)
    }
}

/// Formats as `HH:MM:SS`.
impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00:00", self.0)
    }
}

/// Accepts `H`, `HH:MM` or `HH:MM:SS`, with zero minutes and
/// seconds.
impl FromStr for TimeOfDay {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        lazy_static! {
            static ref RE: Regex =
                Regex::new(r"^(\d{1,2})(?::(\d{2}))?(?::(\d{2}))?$").unwrap();
        }

        let invalid = || Error::InvalidTime(s.into());
        let caps = RE.captures(s.trim()).ok_or_else(invalid)?;
        let on_the_hour = [caps.get(2), caps.get(3)]
            .iter()
            .flatten()
            .all(|m| m.as_str() == "00");
        if !on_the_hour {
            return Err(invalid());
        }

        let hour: u8 = caps[1].parse().map_err(|_| invalid())?;
        TimeOfDay::from_hour(hour).ok_or_else(invalid)
    }
}

impl std::convert::TryFrom<String> for TimeOfDay {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(t: TimeOfDay) -> String {
        t.to_string()
    }
}

/// Affine calibration coefficients.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct CoefficientPair {
    pub gain: f32,
    pub offset: f32,
}

impl CoefficientPair {
    /// Pass-through pair used when no coefficients are known.
    pub const IDENTITY: CoefficientPair = CoefficientPair::new(1.0, 0.0);

    pub const fn new(gain: f32, offset: f32) -> Self {
        CoefficientPair { gain, offset }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl From<(f32, f32)> for CoefficientPair {
    fn from((gain, offset): (f32, f32)) -> Self {
        CoefficientPair::new(gain, offset)
    }
}

/// Immutable `(zone, time) -> coefficients` table.
///
/// Construct once (typically [`CoefficientTable::builtin`])
/// and share by reference; the table is never mutated.
#[derive(Debug, Clone)]
pub struct CoefficientTable {
    entries: HashMap<(Zone, TimeOfDay), CoefficientPair>,
}

impl CoefficientTable {
    /// Table with the fitted coefficients for every zone
    /// and hour of the monitoring window.
    pub fn builtin() -> Self {
        use Zone::*;

        // gain, offset for 09:00 ..= 15:00
        let rows: [(Zone, [(f32, f32); 7]); 5] = [
            (
                Capote,
                [
                    (0.8700, 9.500),
                    (0.9000, 9.800),
                    (0.9150, 9.950),
                    (0.9244, 10.019),
                    (0.9150, 9.950),
                    (0.9000, 9.800),
                    (0.8700, 9.500),
                ],
            ),
            (
                Paredones,
                [
                    (0.85, 10.5),
                    (0.88, 11.2),
                    (0.90, 9.8),
                    (0.87, 10.0),
                    (0.89, 10.3),
                    (0.92, 11.0),
                    (0.95, 11.5),
                ],
            ),
            (
                Carniche,
                [
                    (0.92, 12.1),
                    (0.95, 11.5),
                    (0.93, 12.0),
                    (0.91, 11.8),
                    (0.94, 11.9),
                    (0.96, 12.3),
                    (0.98, 12.7),
                ],
            ),
            (
                Picsi,
                [
                    (0.6980, 8.520),
                    (0.7050, 8.630),
                    (0.7100, 8.700),
                    (0.7139, 8.7325),
                    (0.7100, 8.700),
                    (0.7050, 8.630),
                    (0.6980, 8.520),
                ],
            ),
            (
                LaMolina,
                [
                    (0.7130, 10.350),
                    (0.7180, 10.450),
                    (0.7240, 10.520),
                    (0.7291, 10.592),
                    (0.7240, 10.520),
                    (0.7180, 10.450),
                    (0.7130, 10.350),
                ],
            ),
        ];

        rows.iter()
            .flat_map(|(zone, pairs)| {
                TimeOfDay::all()
                    .zip(pairs.iter())
                    .map(move |(time, &pair)| ((*zone, time), CoefficientPair::from(pair)))
            })
            .collect()
    }

    /// Coefficients for `(zone, time)`.
    ///
    /// Falls back to [`CoefficientPair::IDENTITY`] when there
    /// is no entry, including when no zone is selected. The
    /// raw sensor values then pass through uncalibrated; this
    /// is intentional and not reported as an error.
    pub fn lookup(&self, zone: Option<Zone>, time: TimeOfDay) -> CoefficientPair {
        zone.and_then(|zone| self.get(zone, time))
            .unwrap_or(CoefficientPair::IDENTITY)
    }

    /// Exact lookup, without fallback.
    pub fn get(&self, zone: Zone, time: TimeOfDay) -> Option<CoefficientPair> {
        self.entries.get(&(zone, time)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::iter::FromIterator<((Zone, TimeOfDay), CoefficientPair)> for CoefficientTable {
    fn from_iter<I: IntoIterator<Item = ((Zone, TimeOfDay), CoefficientPair)>>(iter: I) -> Self {
        CoefficientTable {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_shareable() {
        fn shareable<T: Send + Sync>() {}
        shareable::<CoefficientTable>();
    }

    fn at(hour: u8) -> TimeOfDay {
        TimeOfDay::from_hour(hour).unwrap()
    }

    #[test]
    fn known_entries() {
        let table = CoefficientTable::builtin();
        assert_eq!(
            table.lookup(Some(Zone::Picsi), at(12)),
            CoefficientPair::new(0.7139, 8.7325)
        );
        assert_eq!(
            table.lookup(Some(Zone::Carniche), at(9)),
            CoefficientPair::new(0.92, 12.1)
        );
        assert_eq!(
            table.lookup(Some(Zone::Capote), at(12)),
            CoefficientPair::new(0.9244, 10.019)
        );
        assert_eq!(
            table.lookup(Some(Zone::LaMolina), at(15)),
            CoefficientPair::new(0.7130, 10.350)
        );
    }

    #[test]
    fn every_reachable_key_has_exactly_one_pair() {
        let table = CoefficientTable::builtin();
        assert_eq!(table.len(), Zone::ALL.len() * TimeOfDay::all().count());
        for &zone in Zone::ALL {
            for time in TimeOfDay::all() {
                assert!(table.get(zone, time).is_some(), "{} {}", zone, time);
            }
        }
    }

    #[test]
    fn missing_keys_fall_back_to_identity() {
        let table = CoefficientTable::builtin();
        for time in TimeOfDay::all() {
            assert_eq!(table.lookup(None, time), CoefficientPair::IDENTITY);
        }

        let sparse: CoefficientTable =
            vec![((Zone::Capote, at(9)), CoefficientPair::new(2.0, 1.0))]
                .into_iter()
                .collect();
        assert_eq!(sparse.lookup(Some(Zone::Capote), at(10)), CoefficientPair::IDENTITY);
        assert_eq!(sparse.lookup(Some(Zone::Picsi), at(9)), CoefficientPair::IDENTITY);
        assert!(sparse.lookup(Some(Zone::Picsi), at(9)).is_identity());
    }

    #[test]
    fn time_window() {
        assert!(TimeOfDay::from_hour(8).is_none());
        assert!(TimeOfDay::from_hour(16).is_none());
        assert_eq!(TimeOfDay::all().count(), 7);
        assert_eq!(at(9).to_string(), "09:00:00");
    }

    #[test]
    fn parse_time() {
        assert_eq!("12".parse::<TimeOfDay>().unwrap(), at(12));
        assert_eq!("9:00".parse::<TimeOfDay>().unwrap(), at(9));
        assert_eq!("15:00:00".parse::<TimeOfDay>().unwrap(), at(15));
        for bad in &["12:30", "08:00", "16", "noon", "12:00:01", ""] {
            assert!(
                matches!(bad.parse::<TimeOfDay>(), Err(Error::InvalidTime(_))),
                "{}",
                bad
            );
        }
    }

    #[test]
    fn time_serializes_as_string() {
        let json = serde_json::to_string(&at(10)).unwrap();
        assert_eq!(json, "\"10:00:00\"");
        let back: TimeOfDay = serde_json::from_str(&json).unwrap();
        assert_eq!(back, at(10));
    }
}

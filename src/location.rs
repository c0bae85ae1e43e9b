//! Survey locations.
//!
//! Locations form a small closed hierarchy:
//!
//! ```text
//! Lambayeque ─┬─ Ferreñafe ─── Capote
//!             └─ Chiclayo ──┬─ Chongoyape ─┬─ Carniche
//!                           │              └─ Paredones
//!                           └─ Picsi ───────── Picsi
//! Lima ───────── La Molina
//! ```
//!
//! Only the leaf [`Zone`] is used to look up calibration
//! coefficients. The upper levels exist for navigation, and
//! [`resolve_zone`] collapses a navigation path into the
//! zone it selects (if any).

use std::{fmt, str::FromStr};

use serde_derive::*;

use crate::error::{Error, Result};

macro_rules! location_enum {
    (
        $(#[$meta:meta])*
        $name:ident as $level:literal {
            $($variant:ident => $display:literal),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $(#[serde(rename = $display)] $variant),*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),*];

            /// Human readable name, as shown to the user.
            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $display),*
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                let key = normalize(s);
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| normalize(v.name()) == key)
                    .ok_or_else(|| Error::UnknownLocation {
                        level: $level,
                        name: s.into(),
                    })
            }
        }
    };
}

/// Case, accent and separator insensitive key.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .map(|c| if c == 'ñ' { 'n' } else { c })
        .collect()
}

location_enum! {
    /// Top level of the hierarchy.
    Region as "region" {
        Lambayeque => "Lambayeque",
        Lima => "Lima",
    }
}

location_enum! {
    Province as "province" {
        Ferrenafe => "Ferreñafe",
        Chiclayo => "Chiclayo",
    }
}

location_enum! {
    District as "district" {
        Chongoyape => "Chongoyape",
        Picsi => "Picsi",
    }
}

location_enum! {
    /// Smallest calibration-relevant unit.
    Zone as "zone" {
        Capote => "Capote",
        Paredones => "Paredones",
        Carniche => "Carniche",
        Picsi => "Picsi",
        LaMolina => "La Molina",
    }
}

impl Region {
    pub fn provinces(self) -> &'static [Province] {
        match self {
            Region::Lambayeque => &[Province::Ferrenafe, Province::Chiclayo],
            Region::Lima => &[],
        }
    }

    /// Zones listed directly under the region.
    pub fn zones(self) -> &'static [Zone] {
        match self {
            Region::Lambayeque => &[],
            Region::Lima => &[Zone::LaMolina],
        }
    }
}

impl Province {
    pub fn districts(self) -> &'static [District] {
        match self {
            Province::Ferrenafe => &[],
            Province::Chiclayo => &[District::Chongoyape, District::Picsi],
        }
    }

    /// Zones listed directly under the province.
    pub fn zones(self) -> &'static [Zone] {
        match self {
            Province::Ferrenafe => &[Zone::Capote],
            Province::Chiclayo => &[],
        }
    }
}

impl District {
    pub fn zones(self) -> &'static [Zone] {
        match self {
            District::Chongoyape => &[Zone::Carniche, Zone::Paredones],
            District::Picsi => &[Zone::Picsi],
        }
    }
}

/// Resolve a navigation path to the zone it selects.
///
/// Each level is only consulted if the level above offers
/// it. A level with a single option selects it implicitly
/// (Ferreñafe → Capote, Picsi → Picsi, Lima → La Molina);
/// a level with several options needs an explicit `zone`.
///
/// Returns `None` when the path is incomplete or a choice
/// is not offered at that point. Callers then get the
/// identity calibration from the coefficient table.
pub fn resolve_zone(
    region: Region,
    province: Option<Province>,
    district: Option<District>,
    zone: Option<Zone>,
) -> Option<Zone> {
    let options = if !region.zones().is_empty() {
        region.zones()
    } else {
        let province = province.filter(|p| region.provinces().contains(p))?;
        if !province.zones().is_empty() {
            province.zones()
        } else {
            district
                .filter(|d| province.districts().contains(d))?
                .zones()
        }
    };

    match (zone, options) {
        (Some(z), _) => options.contains(&z).then(|| z),
        (None, &[only]) => Some(only),
        (None, _) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_loosely() {
        assert_eq!("La Molina".parse::<Zone>().unwrap(), Zone::LaMolina);
        assert_eq!("la-molina".parse::<Zone>().unwrap(), Zone::LaMolina);
        assert_eq!("LaMolina".parse::<Zone>().unwrap(), Zone::LaMolina);
        assert_eq!("Ferreñafe".parse::<Province>().unwrap(), Province::Ferrenafe);
        assert_eq!("ferrenafe".parse::<Province>().unwrap(), Province::Ferrenafe);
        assert_eq!("PICSI".parse::<District>().unwrap(), District::Picsi);
        assert!(matches!(
            "Cusco".parse::<Region>(),
            Err(Error::UnknownLocation { level: "region", .. })
        ));
    }

    #[test]
    fn display_round_trips() {
        for zone in Zone::ALL {
            assert_eq!(zone.to_string().parse::<Zone>().unwrap(), *zone);
        }
    }

    #[test]
    fn every_zone_is_reachable() {
        let mut reached = vec![];
        for &region in Region::ALL {
            reached.extend_from_slice(region.zones());
            for &province in region.provinces() {
                reached.extend_from_slice(province.zones());
                for &district in province.districts() {
                    reached.extend_from_slice(district.zones());
                }
            }
        }
        reached.sort();
        let mut all = Zone::ALL.to_vec();
        all.sort();
        assert_eq!(reached, all);
    }

    #[test]
    fn single_options_are_implicit() {
        use Zone::*;
        assert_eq!(resolve_zone(Region::Lima, None, None, None), Some(LaMolina));
        assert_eq!(
            resolve_zone(Region::Lambayeque, Some(Province::Ferrenafe), None, None),
            Some(Capote)
        );
        assert_eq!(
            resolve_zone(
                Region::Lambayeque,
                Some(Province::Chiclayo),
                Some(District::Picsi),
                None
            ),
            Some(Picsi)
        );
    }

    #[test]
    fn explicit_choice_among_several() {
        let path = |zone| {
            resolve_zone(
                Region::Lambayeque,
                Some(Province::Chiclayo),
                Some(District::Chongoyape),
                zone,
            )
        };
        assert_eq!(path(Some(Zone::Paredones)), Some(Zone::Paredones));
        assert_eq!(path(Some(Zone::Carniche)), Some(Zone::Carniche));
        assert_eq!(path(None), None);
        assert_eq!(path(Some(Zone::Capote)), None);
    }

    #[test]
    fn incomplete_or_mismatched_paths() {
        assert_eq!(resolve_zone(Region::Lambayeque, None, None, None), None);
        assert_eq!(
            resolve_zone(Region::Lambayeque, Some(Province::Chiclayo), None, None),
            None
        );
        assert_eq!(
            resolve_zone(Region::Lima, None, None, Some(Zone::Picsi)),
            None
        );
    }
}

//! Static site → GFA region table.
//!
//! Graphical Forecast Area charts are published per region. The table maps
//! the stations we know about to the chart that covers them; stations not in
//! the table simply have no region.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GfaRegion {
    Gfacn31,
    Gfacn32,
    Gfacn33,
    Gfacn34,
    Gfacn35,
    Gfacn36,
    Gfacn37,
}

impl GfaRegion {
    pub const ALL: [GfaRegion; 7] = [
        GfaRegion::Gfacn31,
        GfaRegion::Gfacn32,
        GfaRegion::Gfacn33,
        GfaRegion::Gfacn34,
        GfaRegion::Gfacn35,
        GfaRegion::Gfacn36,
        GfaRegion::Gfacn37,
    ];

    /// Upstream chart code, e.g. `"GFACN34"`.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            GfaRegion::Gfacn31 => "GFACN31",
            GfaRegion::Gfacn32 => "GFACN32",
            GfaRegion::Gfacn33 => "GFACN33",
            GfaRegion::Gfacn34 => "GFACN34",
            GfaRegion::Gfacn35 => "GFACN35",
            GfaRegion::Gfacn36 => "GFACN36",
            GfaRegion::Gfacn37 => "GFACN37",
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            GfaRegion::Gfacn31 => "Pacific Region",
            GfaRegion::Gfacn32 => "Prairie Region",
            GfaRegion::Gfacn33 => "Ontario-Quebec Region",
            GfaRegion::Gfacn34 => "Atlantic Region",
            GfaRegion::Gfacn35 => "Yukon-NWT Region",
            GfaRegion::Gfacn36 => "Nunavut Region",
            GfaRegion::Gfacn37 => "Arctic Region",
        }
    }

    /// Looks up the region covering `site`. Case-insensitive; `None` when the
    /// station is not in the table.
    #[must_use]
    pub fn for_site(site: &str) -> Option<GfaRegion> {
        let site = site.trim();
        SITE_REGIONS
            .iter()
            .find(|(code, _)| code.eq_ignore_ascii_case(site))
            .map(|(_, region)| *region)
    }
}

impl fmt::Display for GfaRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for GfaRegion {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GfaRegion::ALL
            .into_iter()
            .find(|r| r.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownRegion(s.to_owned()))
    }
}

// CYCP and CYZF sit on chart boundaries; both resolve to the northern chart.
const SITE_REGIONS: &[(&str, GfaRegion)] = &[
    // Pacific
    ("CYVR", GfaRegion::Gfacn31),
    ("CYYJ", GfaRegion::Gfacn31),
    ("CYXX", GfaRegion::Gfacn31),
    ("CYQQ", GfaRegion::Gfacn31),
    ("CYCD", GfaRegion::Gfacn31),
    ("CYDT", GfaRegion::Gfacn31),
    ("CYPG", GfaRegion::Gfacn31),
    ("CYPU", GfaRegion::Gfacn31),
    ("CYXJ", GfaRegion::Gfacn31),
    ("CYYA", GfaRegion::Gfacn31),
    ("CYKA", GfaRegion::Gfacn31),
    // Prairie
    ("CYYC", GfaRegion::Gfacn32),
    ("CYEG", GfaRegion::Gfacn32),
    ("CYQR", GfaRegion::Gfacn32),
    ("CYWG", GfaRegion::Gfacn32),
    ("CYXE", GfaRegion::Gfacn32),
    ("CYPA", GfaRegion::Gfacn32),
    ("CYQD", GfaRegion::Gfacn32),
    ("CYQF", GfaRegion::Gfacn32),
    ("CYVC", GfaRegion::Gfacn32),
    ("CYYQ", GfaRegion::Gfacn32),
    ("CYZV", GfaRegion::Gfacn32),
    ("CYQW", GfaRegion::Gfacn32),
    // Ontario-Quebec
    ("CYYZ", GfaRegion::Gfacn33),
    ("CYUL", GfaRegion::Gfacn33),
    ("CYOW", GfaRegion::Gfacn33),
    ("CYQB", GfaRegion::Gfacn33),
    ("CYHM", GfaRegion::Gfacn33),
    ("CYXU", GfaRegion::Gfacn33),
    ("CYKF", GfaRegion::Gfacn33),
    ("CYQG", GfaRegion::Gfacn33),
    ("CYSB", GfaRegion::Gfacn33),
    ("CYTS", GfaRegion::Gfacn33),
    ("CYVO", GfaRegion::Gfacn33),
    ("CYYB", GfaRegion::Gfacn33),
    // Atlantic
    ("CYHZ", GfaRegion::Gfacn34),
    ("CYYT", GfaRegion::Gfacn34),
    ("CYYG", GfaRegion::Gfacn34),
    ("CYQX", GfaRegion::Gfacn34),
    ("CYQM", GfaRegion::Gfacn34),
    ("CYZX", GfaRegion::Gfacn34),
    ("CYFC", GfaRegion::Gfacn34),
    ("CYCH", GfaRegion::Gfacn34),
    ("CYYR", GfaRegion::Gfacn34),
    ("CYQT", GfaRegion::Gfacn34),
    ("CYSY", GfaRegion::Gfacn34),
    // Yukon-NWT
    ("CYXY", GfaRegion::Gfacn35),
    ("CYZF", GfaRegion::Gfacn35),
    ("CYHY", GfaRegion::Gfacn35),
    ("CYFS", GfaRegion::Gfacn35),
    ("CYVQ", GfaRegion::Gfacn35),
    ("CYDB", GfaRegion::Gfacn35),
    ("CYZS", GfaRegion::Gfacn35),
    ("CYRB", GfaRegion::Gfacn35),
    // Nunavut
    ("CYIK", GfaRegion::Gfacn36),
    ("CYVP", GfaRegion::Gfacn36),
    ("CYFB", GfaRegion::Gfacn36),
    ("CYRT", GfaRegion::Gfacn36),
    ("CYUX", GfaRegion::Gfacn36),
    ("CYVN", GfaRegion::Gfacn36),
    ("CYCP", GfaRegion::Gfacn36),
    // Arctic
    ("CYEV", GfaRegion::Gfacn37),
    ("CYLT", GfaRegion::Gfacn37),
    ("CYAS", GfaRegion::Gfacn37),
    ("CYPH", GfaRegion::Gfacn37),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(GfaRegion::for_site("cyyt"), GfaRegion::for_site("CYYT"));
        assert_eq!(GfaRegion::for_site("CYYT"), Some(GfaRegion::Gfacn34));
    }

    #[test]
    fn unmapped_site_has_no_region() {
        assert_eq!(GfaRegion::for_site("KJFK"), None);
    }

    #[test]
    fn boundary_stations_resolve_to_northern_chart() {
        assert_eq!(GfaRegion::for_site("CYZF"), Some(GfaRegion::Gfacn35));
        assert_eq!(GfaRegion::for_site("CYCP"), Some(GfaRegion::Gfacn36));
    }

    #[test]
    fn table_has_no_duplicate_stations() {
        let mut codes: Vec<&str> = SITE_REGIONS.iter().map(|(c, _)| *c).collect();
        codes.sort_unstable();
        let before = codes.len();
        codes.dedup();
        assert_eq!(before, codes.len());
    }

    #[test]
    fn region_code_round_trips_through_from_str() {
        for region in GfaRegion::ALL {
            assert_eq!(region.code().parse::<GfaRegion>().unwrap(), region);
        }
        assert!("gfacn99".parse::<GfaRegion>().is_err());
    }

    #[test]
    fn display_names_are_human_readable() {
        assert_eq!(GfaRegion::Gfacn33.display_name(), "Ontario-Quebec Region");
    }
}

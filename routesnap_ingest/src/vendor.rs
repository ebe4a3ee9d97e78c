use std::fmt;
use std::str::FromStr;

use routesnap_dialect_timos::{TimosBgpRoutes, TimosRouteTable};
use routesnap_dialect_vrp::VrpRoutingTable;
use routesnap_ir::Grammar;
use serde::{Deserialize, Serialize};

use crate::IngestError;

/// Output format selector for a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Vendor {
    /// Nokia SR OS `show router route-table`.
    Timos,
    /// Nokia SR OS `show router bgp routes`.
    TimosBgp,
    /// Huawei VRP `display ip routing-table`.
    Vrp,
    /// Pick the grammar of the first recognizable header in the capture.
    #[default]
    Auto,
}

/// Grammars tried on each line, in order, by [`Vendor::Auto`].
const DETECTION_ORDER: [Vendor; 3] = [Vendor::Timos, Vendor::TimosBgp, Vendor::Vrp];

impl Vendor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timos => "timos",
            Self::TimosBgp => "timos-bgp",
            Self::Vrp => "vrp",
            Self::Auto => "auto",
        }
    }

    /// Grammar for a concrete vendor; `None` for [`Vendor::Auto`].
    pub fn grammar(self) -> Option<&'static (dyn Grammar + Sync)> {
        match self {
            Self::Timos => Some(&TimosRouteTable),
            Self::TimosBgp => Some(&TimosBgpRoutes),
            Self::Vrp => Some(&VrpRoutingTable),
            Self::Auto => None,
        }
    }

    /// Resolve [`Vendor::Auto`] against `raw`; concrete vendors are returned unchanged.
    pub fn detect(self, raw: &str) -> Result<Vendor, IngestError> {
        if self != Self::Auto {
            return Ok(self);
        }
        raw.lines()
            .find_map(|line| {
                DETECTION_ORDER.into_iter().find(|vendor| {
                    vendor
                        .grammar()
                        .is_some_and(|grammar| grammar.match_header(line).is_some())
                })
            })
            .ok_or(IngestError::UndetectedVendor)
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vendor {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "timos" | "nokia" | "sros" => Ok(Self::Timos),
            "timos-bgp" | "nokia-bgp" => Ok(Self::TimosBgp),
            "vrp" | "huawei" => Ok(Self::Vrp),
            "auto" => Ok(Self::Auto),
            _ => Err(IngestError::UnsupportedVendor(s.trim().to_string())),
        }
    }
}

impl From<Vendor> for String {
    fn from(value: Vendor) -> Self {
        value.as_str().to_string()
    }
}

impl TryFrom<String> for Vendor {
    type Error = IngestError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve() {
        assert_eq!("Nokia".parse::<Vendor>().ok(), Some(Vendor::Timos));
        assert_eq!("sros".parse::<Vendor>().ok(), Some(Vendor::Timos));
        assert_eq!("nokia-bgp".parse::<Vendor>().ok(), Some(Vendor::TimosBgp));
        assert_eq!(" HUAWEI ".parse::<Vendor>().ok(), Some(Vendor::Vrp));
        assert_eq!("auto".parse::<Vendor>().ok(), Some(Vendor::Auto));
    }

    #[test]
    fn unknown_selector_is_rejected() {
        let err = "junos".parse::<Vendor>().expect_err("unsupported");
        assert!(matches!(err, IngestError::UnsupportedVendor(name) if name == "junos"));
    }

    #[test]
    fn detection_follows_the_first_header() {
        let timos = "A:pe1# show router 5 route-table\n";
        let bgp = "A:pe1# show router bgp routes\n";
        let vrp = "<HUAWEI>display ip routing-table\n";
        assert_eq!(Vendor::Auto.detect(timos).ok(), Some(Vendor::Timos));
        assert_eq!(Vendor::Auto.detect(bgp).ok(), Some(Vendor::TimosBgp));
        assert_eq!(Vendor::Auto.detect(vrp).ok(), Some(Vendor::Vrp));
        assert!(matches!(
            Vendor::Auto.detect("nothing to see"),
            Err(IngestError::UndetectedVendor)
        ));
        assert_eq!(Vendor::Vrp.detect("nothing to see").ok(), Some(Vendor::Vrp));
    }

    #[test]
    fn mixed_capture_uses_the_earliest_header() {
        let raw = "A:pe1# show router bgp routes
blah
A:pe1# show router route-table
";
        assert_eq!(Vendor::Auto.detect(raw).ok(), Some(Vendor::TimosBgp));
        let raw = "<HUAWEI>display ip routing-table
A:pe1# show router route-table
";
        assert_eq!(Vendor::Auto.detect(raw).ok(), Some(Vendor::Vrp));
    }
}

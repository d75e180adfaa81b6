use serde::{Deserialize, Serialize};
use std::fmt;

/// Industry sector, grouped from two-digit HS chapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sector {
    #[serde(rename = "Agriculture & Food")]
    AgricultureFood,
    #[serde(rename = "Minerals & Energy")]
    MineralsEnergy,
    #[serde(rename = "Chemicals & Plastics")]
    ChemicalsPlastics,
    #[serde(rename = "Textiles & Apparel")]
    TextilesApparel,
    #[serde(rename = "Metals")]
    Metals,
    #[serde(rename = "Machinery & Electronics")]
    MachineryElectronics,
    #[serde(rename = "Automotive & Transport")]
    AutomotiveTransport,
    #[serde(rename = "Other Manufacturing")]
    OtherManufacturing,
}

impl Sector {
    pub fn name(self) -> &'static str {
        match self {
            Self::AgricultureFood => "Agriculture & Food",
            Self::MineralsEnergy => "Minerals & Energy",
            Self::ChemicalsPlastics => "Chemicals & Plastics",
            Self::TextilesApparel => "Textiles & Apparel",
            Self::Metals => "Metals",
            Self::MachineryElectronics => "Machinery & Electronics",
            Self::AutomotiveTransport => "Automotive & Transport",
            Self::OtherManufacturing => "Other Manufacturing",
        }
    }

    /// Map a two-digit chapter key (`"85"`) to its sector.
    pub fn from_chapter(chapter: &str) -> Self {
        match chapter.parse::<u32>() {
            Ok(1..=24) => Self::AgricultureFood,
            Ok(25..=27) => Self::MineralsEnergy,
            Ok(28..=40) => Self::ChemicalsPlastics,
            Ok(50..=67) => Self::TextilesApparel,
            Ok(72..=83) => Self::Metals,
            Ok(84..=85) => Self::MachineryElectronics,
            Ok(86..=89) => Self::AutomotiveTransport,
            _ => Self::OtherManufacturing,
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub(crate) fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chapter_boundaries() {
        assert_eq!(Sector::from_chapter("01"), Sector::AgricultureFood);
        assert_eq!(Sector::from_chapter("24"), Sector::AgricultureFood);
        assert_eq!(Sector::from_chapter("27"), Sector::MineralsEnergy);
        assert_eq!(Sector::from_chapter("39"), Sector::ChemicalsPlastics);
        assert_eq!(Sector::from_chapter("61"), Sector::TextilesApparel);
        assert_eq!(Sector::from_chapter("72"), Sector::Metals);
        assert_eq!(Sector::from_chapter("85"), Sector::MachineryElectronics);
        assert_eq!(Sector::from_chapter("87"), Sector::AutomotiveTransport);
        assert_eq!(Sector::from_chapter("45"), Sector::OtherManufacturing);
        assert_eq!(Sector::from_chapter("00"), Sector::OtherManufacturing);
    }

    #[test]
    fn serialises_as_display_name() {
        let json = serde_json::to_string(&Sector::MachineryElectronics).unwrap();
        assert_eq!(json, "\"Machinery & Electronics\"");
    }

    #[test]
    fn mean_of_nothing_is_zero() {
        assert_eq!(mean(Vec::new()), 0.0);
        assert_eq!(mean(vec![1.0, 3.0]), 2.0);
    }
}

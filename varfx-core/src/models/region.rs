use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::str::FromStr;

use crate::errors::RegionError;

///
/// Region struct, a genomic range on one chromosome.
///
/// Coordinates are 0-based and both ends are inclusive, so a single base
/// at position `p` is `start == end == p`.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Region {
    pub chr: String,
    pub start: u32,
    pub end: u32,
}

impl Region {
    pub fn new(chr: &str, start: u32, end: u32) -> Self {
        Region {
            chr: chr.to_string(),
            start,
            end,
        }
    }

    ///
    /// Number of bases covered by the region
    ///
    pub fn size(&self) -> u32 {
        self.end.saturating_sub(self.start) + 1
    }

    /// Do the two regions share at least one base?
    pub fn intersects(&self, other: &Region) -> bool {
        self.chr == other.chr && self.start <= other.end && other.start <= self.end
    }

    pub fn intersects_pos(&self, pos: u32) -> bool {
        self.start <= pos && pos <= self.end
    }

    /// Is `other` completely inside this region?
    pub fn includes(&self, other: &Region) -> bool {
        self.chr == other.chr && self.start <= other.start && other.end <= self.end
    }

    ///
    /// The overlapping part of both regions, if any.
    ///
    pub fn intersect(&self, other: &Region) -> Option<Region> {
        if !self.intersects(other) {
            return None;
        }
        Some(Region {
            chr: self.chr.clone(),
            start: self.start.max(other.start),
            end: self.end.min(other.end),
        })
    }

    pub fn intersect_size(&self, other: &Region) -> u32 {
        self.intersect(other).map_or(0, |r| r.size())
    }

    ///
    /// Distance in bases between two regions on the same chromosome. Zero
    /// when they overlap, `None` across chromosomes.
    ///
    pub fn distance(&self, other: &Region) -> Option<u32> {
        if self.chr != other.chr {
            return None;
        }
        if self.intersects(other) {
            return Some(0);
        }
        if self.end < other.start {
            Some(other.start - self.end)
        } else {
            Some(self.start - other.end)
        }
    }

    pub fn as_string(&self) -> String {
        format!("{}:{}-{}", self.chr, self.start, self.end)
    }
}

impl Ord for Region {
    fn cmp(&self, other: &Self) -> Ordering {
        self.chr
            .cmp(&other.chr)
            .then(self.start.cmp(&other.start))
            .then(self.end.cmp(&other.end))
    }
}

impl PartialOrd for Region {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl FromStr for Region {
    type Err = RegionError;

    /// Parse `chr:start-end`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (chr, range) = s
            .rsplit_once(':')
            .ok_or_else(|| RegionError::ParseError(s.to_string()))?;
        let (start, end) = range
            .split_once('-')
            .ok_or_else(|| RegionError::ParseError(s.to_string()))?;
        let start: u32 = start
            .trim()
            .parse()
            .map_err(|_| RegionError::ParseError(s.to_string()))?;
        let end: u32 = end
            .trim()
            .parse()
            .map_err(|_| RegionError::ParseError(s.to_string()))?;

        if chr.is_empty() || end < start {
            return Err(RegionError::InvalidRange(s.to_string()));
        }

        Ok(Region::new(chr, start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn region() -> Region {
        Region::new("chr1", 100, 199)
    }

    #[rstest]
    fn test_size(region: Region) {
        assert_eq!(region.size(), 100);
        assert_eq!(Region::new("chr1", 5, 5).size(), 1);
    }

    #[rstest]
    #[case(Region::new("chr1", 199, 300), true)]
    #[case(Region::new("chr1", 200, 300), false)]
    #[case(Region::new("chr1", 0, 100), true)]
    #[case(Region::new("chr2", 150, 160), false)]
    fn test_intersects(region: Region, #[case] other: Region, #[case] expected: bool) {
        assert_eq!(region.intersects(&other), expected);
    }

    #[rstest]
    fn test_includes(region: Region) {
        assert!(region.includes(&Region::new("chr1", 100, 199)));
        assert!(region.includes(&Region::new("chr1", 120, 130)));
        assert!(!region.includes(&Region::new("chr1", 90, 130)));
    }

    #[rstest]
    fn test_intersect(region: Region) {
        let other = Region::new("chr1", 150, 400);
        assert_eq!(region.intersect(&other), Some(Region::new("chr1", 150, 199)));
        assert_eq!(region.intersect_size(&other), 50);
        assert_eq!(region.intersect(&Region::new("chr1", 300, 400)), None);
    }

    #[rstest]
    fn test_distance(region: Region) {
        assert_eq!(region.distance(&Region::new("chr1", 250, 260)), Some(51));
        assert_eq!(region.distance(&Region::new("chr1", 10, 20)), Some(80));
        assert_eq!(region.distance(&Region::new("chr1", 150, 160)), Some(0));
        assert_eq!(region.distance(&Region::new("chrX", 150, 160)), None);
    }

    #[rstest]
    fn test_parse_region() {
        let region: Region = "chr2:10-20".parse().unwrap();
        assert_eq!(region, Region::new("chr2", 10, 20));
        assert!("chr2:20-10".parse::<Region>().is_err());
        assert!("chr2".parse::<Region>().is_err());
    }
}

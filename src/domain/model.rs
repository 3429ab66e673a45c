use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub const YEARS: u8 = 4;
pub const QUARTERS_PER_YEAR: u8 = 4;
pub const SLOT_COUNT: usize = (YEARS as usize) * (QUARTERS_PER_YEAR as usize);
pub const DEFAULT_UNIT_CAP: u32 = 21;

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseId(pub String);

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequirementId(pub String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(CourseId);
string_id!(RequirementId);

/// Requirement category. Labels outside the known set fold into `Ge`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Prep,
    Major,
    TechBreadth,
    SciTech,
    Ge,
}

impl Category {
    /// Assignment priority, lowest first.
    pub const PRIORITY: [Category; 5] = [
        Category::Prep,
        Category::Major,
        Category::TechBreadth,
        Category::SciTech,
        Category::Ge,
    ];

    pub fn from_label(label: &str) -> Self {
        let normalized: String = label
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "prep" | "preparation" => Category::Prep,
            "major" => Category::Major,
            "techbreadth" => Category::TechBreadth,
            "scitech" => Category::SciTech,
            _ => Category::Ge,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Prep => "Prep",
            Category::Major => "Major",
            Category::TechBreadth => "Tech Breadth",
            Category::SciTech => "Sci-Tech",
            Category::Ge => "GE",
        }
    }

    pub fn rank(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub code: String,
    pub units: u32,
    pub description: String,
    /// Conjunction of OR-groups.
    pub prereq_groups: Vec<BTreeSet<CourseId>>,
    pub fulfills_req_ids: BTreeSet<RequirementId>,
}

impl Course {
    /// Prerequisite groups with this course's own id removed. A group that
    /// only named the course itself disappears rather than becoming
    /// unsatisfiable.
    pub fn effective_prereq_groups(&self) -> Vec<BTreeSet<CourseId>> {
        self.prereq_groups
            .iter()
            .map(|group| {
                group
                    .iter()
                    .filter(|id| **id != self.id)
                    .cloned()
                    .collect::<BTreeSet<_>>()
            })
            .filter(|group| !group.is_empty())
            .collect()
    }

    pub fn depends_on(&self, other: &CourseId) -> bool {
        *other != self.id && self.prereq_groups.iter().any(|g| g.contains(other))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: RequirementId,
    pub name: String,
    pub category: Category,
    pub courses_to_choose: u32,
    pub fulfilled_by: BTreeSet<CourseId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementGroup {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub num_requirements_to_choose: usize,
    pub requirements: Vec<Requirement>,
}

/// One of the sixteen quarter positions of the plan grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "SlotRepr", into = "SlotRepr")]
pub struct SlotId {
    year: u8,
    quarter: u8,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct SlotRepr {
    year: u8,
    quarter: u8,
}

impl TryFrom<SlotRepr> for SlotId {
    type Error = String;

    fn try_from(repr: SlotRepr) -> Result<Self, Self::Error> {
        SlotId::new(repr.year, repr.quarter)
            .ok_or_else(|| format!("no slot at year {} quarter {}", repr.year, repr.quarter))
    }
}

impl From<SlotId> for SlotRepr {
    fn from(slot: SlotId) -> Self {
        SlotRepr {
            year: slot.year,
            quarter: slot.quarter,
        }
    }
}

impl SlotId {
    pub fn new(year: u8, quarter: u8) -> Option<Self> {
        if (1..=YEARS).contains(&year) && (1..=QUARTERS_PER_YEAR).contains(&quarter) {
            Some(Self { year, quarter })
        } else {
            None
        }
    }

    pub fn from_quarter_number(number: u32) -> Option<Self> {
        if number == 0 || number > SLOT_COUNT as u32 {
            return None;
        }
        let zero_based = (number - 1) as u8;
        Self::new(zero_based / QUARTERS_PER_YEAR + 1, zero_based % QUARTERS_PER_YEAR + 1)
    }

    pub fn year(self) -> u8 {
        self.year
    }

    pub fn quarter(self) -> u8 {
        self.quarter
    }

    /// Sequential quarter number, 1..=16.
    pub fn quarter_number(self) -> u32 {
        u32::from(self.year - 1) * u32::from(QUARTERS_PER_YEAR) + u32::from(self.quarter)
    }

    pub fn index(self) -> usize {
        self.quarter_number() as usize - 1
    }

    pub fn all() -> impl Iterator<Item = SlotId> {
        (1..=SLOT_COUNT as u32).filter_map(SlotId::from_quarter_number)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Y{}Q{}", self.year, self.quarter)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "slot", rename_all = "snake_case")]
pub enum Location {
    Pool,
    Slot(SlotId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_quarter_number_mapping() {
        let first = SlotId::new(1, 1).unwrap();
        let last = SlotId::new(4, 4).unwrap();
        assert_eq!(first.quarter_number(), 1);
        assert_eq!(last.quarter_number(), 16);
        assert_eq!(SlotId::new(2, 3).unwrap().quarter_number(), 7);
        assert_eq!(SlotId::from_quarter_number(7), SlotId::new(2, 3));
        assert_eq!(SlotId::from_quarter_number(0), None);
        assert_eq!(SlotId::from_quarter_number(17), None);
        assert_eq!(SlotId::new(5, 1), None);
        assert_eq!(SlotId::all().count(), SLOT_COUNT);
    }

    #[test]
    fn test_slot_deserialization_is_checked() {
        let slot: SlotId = serde_json::from_str(r#"{"year": 2, "quarter": 4}"#).unwrap();
        assert_eq!(slot.quarter_number(), 8);
        assert!(serde_json::from_str::<SlotId>(r#"{"year": 5, "quarter": 1}"#).is_err());
        assert_eq!(
            serde_json::to_string(&slot).unwrap(),
            r#"{"year":2,"quarter":4}"#
        );
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(Category::from_label("Tech Breadth"), Category::TechBreadth);
        assert_eq!(Category::from_label("Sci-Tech"), Category::SciTech);
        assert_eq!(Category::from_label("prep"), Category::Prep);
        assert_eq!(Category::from_label("Writing"), Category::Ge);
        assert!(Category::Prep.rank() < Category::Ge.rank());
    }

    #[test]
    fn test_self_reference_is_stripped() {
        let course = Course {
            id: CourseId::from("CSE12"),
            code: "CSE 12".to_string(),
            units: 4,
            description: String::new(),
            prereq_groups: vec![
                BTreeSet::from([CourseId::from("CSE12")]),
                BTreeSet::from([CourseId::from("CSE8B"), CourseId::from("CSE12")]),
            ],
            fulfills_req_ids: BTreeSet::new(),
        };
        let groups = course.effective_prereq_groups();
        assert_eq!(groups.len(), 1);
        assert!(!groups[0].contains(&course.id));
        assert!(!course.depends_on(&course.id));
        assert!(course.depends_on(&CourseId::from("CSE8B")));
    }
}

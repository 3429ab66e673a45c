use std::collections::{BTreeSet, HashMap};

use crate::domain::model::{
    Category, Course, CourseId, Requirement, RequirementGroup, RequirementId,
};
use crate::domain::payload::{CatalogPayload, CoursePayload, RequirementGroupPayload, RequirementPayload};
use crate::utils::error::Result;

/// Immutable per-major snapshot of courses and requirement definitions.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    major: String,
    courses: Vec<Course>,
    course_index: HashMap<CourseId, usize>,
    groups: Vec<RequirementGroup>,
}

impl Catalog {
    pub fn from_json(major: &str, json: &str) -> Result<Self> {
        let payload: CatalogPayload = serde_json::from_str(json)?;
        Ok(Self::from_payload(major, payload))
    }

    pub fn from_payload(major: &str, payload: CatalogPayload) -> Self {
        let mut courses = Vec::with_capacity(payload.available_classes.len());
        let mut course_index = HashMap::new();

        for raw in payload.available_classes {
            if raw.id.as_str().trim().is_empty() {
                tracing::debug!("Skipping catalog course with empty id ({})", raw.code);
                continue;
            }
            if course_index.contains_key(&raw.id) {
                tracing::debug!("Duplicate catalog course {}, keeping first", raw.id);
                continue;
            }
            if raw.units == 0 {
                tracing::debug!("Catalog course {} has no units, counting it as 0", raw.id);
            }
            course_index.insert(raw.id.clone(), courses.len());
            courses.push(course_from_payload(raw));
        }

        let groups = match (payload.major_requirement_groups, payload.major_requirements) {
            (Some(groups), _) => groups.into_iter().map(group_from_payload).collect(),
            (None, Some(requirements)) => requirements
                .into_iter()
                .map(|raw| {
                    let requirement = requirement_from_payload(raw, Category::Ge);
                    RequirementGroup {
                        id: requirement.id.to_string(),
                        name: requirement.name.clone(),
                        category: requirement.category,
                        num_requirements_to_choose: 1,
                        requirements: vec![requirement],
                    }
                })
                .collect(),
            (None, None) => Vec::new(),
        };

        let major = payload
            .major
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| major.to_string());

        tracing::debug!(
            "Catalog for {}: {} courses, {} requirement groups",
            major,
            courses.len(),
            groups.len()
        );

        Self {
            major,
            courses,
            course_index,
            groups,
        }
    }

    pub fn major(&self) -> &str {
        &self.major
    }

    /// Courses in catalog declaration order.
    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn groups(&self) -> &[RequirementGroup] {
        &self.groups
    }

    pub fn course(&self, id: &CourseId) -> Option<&Course> {
        self.course_index.get(id).map(|&i| &self.courses[i])
    }

    pub fn contains(&self, id: &CourseId) -> bool {
        self.course_index.contains_key(id)
    }

    /// Catalog position, used to keep the pool in a stable order.
    pub fn position(&self, id: &CourseId) -> Option<usize> {
        self.course_index.get(id).copied()
    }

    pub fn course_by_code(&self, code: &str) -> Option<&Course> {
        let wanted = normalize_code(code);
        self.courses.iter().find(|c| normalize_code(&c.code) == wanted)
    }

    /// Looks a course up by id first, then by display code.
    pub fn resolve(&self, id_or_code: &str) -> Option<&Course> {
        self.course(&CourseId::from(id_or_code))
            .or_else(|| self.course_by_code(id_or_code))
    }

    pub fn code_of(&self, id: &CourseId) -> String {
        self.course(id)
            .map(|c| c.code.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.groups.iter().flat_map(|g| g.requirements.iter())
    }

    pub fn requirement(&self, id: &RequirementId) -> Option<&Requirement> {
        self.requirements().find(|r| r.id == *id)
    }

    /// A course counts toward a requirement when either side names the other.
    pub fn is_eligible(&self, course: &CourseId, requirement: &Requirement) -> bool {
        requirement.fulfilled_by.contains(course)
            || self
                .course(course)
                .is_some_and(|c| c.fulfills_req_ids.contains(&requirement.id))
    }

    pub fn eligible_requirements(&self, course: &CourseId) -> Vec<&Requirement> {
        self.requirements()
            .filter(|r| self.is_eligible(course, r))
            .collect()
    }

    pub fn courses_for_requirement(&self, id: &RequirementId) -> Vec<&Course> {
        match self.requirement(id) {
            Some(requirement) => self
                .courses
                .iter()
                .filter(|c| self.is_eligible(&c.id, requirement))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn categories_of(&self, course: &CourseId) -> BTreeSet<Category> {
        self.eligible_requirements(course)
            .into_iter()
            .map(|r| r.category)
            .collect()
    }

    pub fn courses_in_category(&self, category: Category) -> Vec<&Course> {
        self.courses
            .iter()
            .filter(|c| self.categories_of(&c.id).contains(&category))
            .collect()
    }

    /// Courses that name `id` in one of their prerequisite groups.
    pub fn dependents_of<'a>(&'a self, id: &'a CourseId) -> impl Iterator<Item = &'a Course> + 'a {
        self.courses.iter().filter(move |c| c.depends_on(id))
    }
}

fn normalize_code(code: &str) -> String {
    code.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase()
}

fn course_from_payload(raw: CoursePayload) -> Course {
    let prereq_groups = match (raw.prereq_groups, raw.prereq_ids) {
        (Some(groups), _) => groups
            .into_iter()
            .map(|g| g.into_iter().collect::<BTreeSet<_>>())
            .filter(|g| !g.is_empty())
            .collect(),
        (None, Some(ids)) => ids.into_iter().map(|id| BTreeSet::from([id])).collect(),
        (None, None) => Vec::new(),
    };

    Course {
        code: if raw.code.is_empty() {
            raw.id.to_string()
        } else {
            raw.code
        },
        id: raw.id,
        units: raw.units,
        description: raw.description,
        prereq_groups,
        fulfills_req_ids: raw.fulfills_req_ids.into_iter().collect(),
    }
}

fn requirement_from_payload(raw: RequirementPayload, fallback: Category) -> Requirement {
    let category = if raw.kind.trim().is_empty() {
        fallback
    } else {
        Category::from_label(&raw.kind)
    };
    Requirement {
        id: raw.id,
        name: raw.name,
        category,
        courses_to_choose: raw.courses_to_choose.unwrap_or(1).max(1),
        fulfilled_by: raw.fulfilled_by_class_ids.into_iter().collect(),
    }
}

fn group_from_payload(raw: RequirementGroupPayload) -> RequirementGroup {
    let category = Category::from_label(&raw.kind);
    let requirements: Vec<Requirement> = raw
        .requirements
        .into_iter()
        .map(|r| requirement_from_payload(r, category))
        .collect();
    let all = requirements.len();
    let num_requirements_to_choose = raw
        .num_requirements_to_choose
        .map_or(all, |n| n.clamp(1, all.max(1)));

    RequirementGroup {
        id: raw.id,
        name: raw.name,
        category,
        num_requirements_to_choose,
        requirements,
    }
}

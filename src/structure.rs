use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use sqlx::PgPool;
use tracing::warn;

use crate::db;
use crate::error::StructureError;
use crate::models::{
    BlockNode, CourseMajorRecord, CourseNode, CourseRecord, DepartmentKind, DepartmentNode,
    DepartmentRecord, MajorNode, MajorType, PersonSummary, Placement, ProfileRecord,
    SectionRecord, StrandRecord, Structure, YearLevelNode,
};

pub const ELEMENTARY_LEVELS: &[&str] = &[
    "Grade 1", "Grade 2", "Grade 3", "Grade 4", "Grade 5", "Grade 6",
];
pub const JUNIOR_HIGH_LEVELS: &[&str] = &["Grade 7", "Grade 8", "Grade 9", "Grade 10"];
pub const SENIOR_HIGH_LEVELS: &[&str] = &["Grade 11", "Grade 12"];
pub const COLLEGE_LEVELS: &[&str] = &["1st Year", "2nd Year", "3rd Year", "4th Year"];

/// Fallback labels applied at the bucketing step. A profile with missing
/// classification keys lands in one of these rather than being dropped.
pub const UNKNOWN: &str = "Unknown";
pub const NO_MAJOR: &str = "No Major";

pub fn canonical_levels(kind: DepartmentKind) -> &'static [&'static str] {
    match kind {
        DepartmentKind::Elementary => ELEMENTARY_LEVELS,
        DepartmentKind::JuniorHigh => JUNIOR_HIGH_LEVELS,
        DepartmentKind::SeniorHigh => SENIOR_HIGH_LEVELS,
        DepartmentKind::College => COLLEGE_LEVELS,
        DepartmentKind::Other => &[],
    }
}

/// Display name to node id: lowercase, whitespace runs become hyphens.
/// Slug equality defines node identity, so "Block A" and "block-a" are the
/// same block; the first-seen display name wins.
pub fn slug(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Composite grouping key: one flat ordered multimap instead of nested
/// maps-of-maps. All components are slugs; display labels live on the bucket.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct GroupKey {
    course: String,
    major: Option<String>,
    year: String,
    block: String,
}

#[derive(Debug)]
struct Bucket {
    course_label: String,
    major_label: Option<String>,
    year_label: String,
    block_label: String,
    members: Vec<PersonSummary>,
}

#[derive(Debug, Default)]
struct Buckets {
    map: BTreeMap<GroupKey, Bucket>,
}

impl Buckets {
    fn new() -> Self {
        Buckets::default()
    }

    fn insert(
        &mut self,
        course: &str,
        major: Option<&str>,
        year: &str,
        block: &str,
        person: PersonSummary,
    ) {
        let key = GroupKey {
            course: slug(course),
            major: major.map(slug),
            year: slug(year),
            block: slug(block),
        };
        let bucket = self.map.entry(key).or_insert_with(|| Bucket {
            course_label: course.to_string(),
            major_label: major.map(str::to_string),
            year_label: year.to_string(),
            block_label: block.to_string(),
            members: Vec::new(),
        });
        if bucket.block_label != block {
            warn!(
                kept = %bucket.block_label,
                merged = %block,
                "block names normalize to the same id"
            );
        }
        bucket.members.push(person);
    }

    /// Remove and return the members of one exact bucket.
    fn take(&mut self, course: &str, major: Option<&str>, year: &str, block: &str) -> Vec<PersonSummary> {
        let key = GroupKey {
            course: slug(course),
            major: major.map(slug),
            year: slug(year),
            block: slug(block),
        };
        self.map.remove(&key).map(|b| b.members).unwrap_or_default()
    }

    /// Remove matching buckets across every major key and merge their members.
    /// Used by the no-major college branch, where a stray `major` value on a
    /// profile must not strand it outside its block.
    fn take_any_major(&mut self, course: &str, year: &str, block: &str) -> Vec<PersonSummary> {
        let course = slug(course);
        let year = slug(year);
        let block = slug(block);
        let keys: Vec<GroupKey> = self
            .map
            .keys()
            .filter(|k| k.course == course && k.year == year && k.block == block)
            .cloned()
            .collect();
        let mut members = Vec::new();
        for key in keys {
            if let Some(bucket) = self.map.remove(&key) {
                members.extend(bucket.members);
            }
        }
        members
    }

    /// Remaining blocks for one (course, major, year), in slug order.
    fn drain_year(&mut self, course: &str, major: Option<&str>, year: &str) -> Vec<Bucket> {
        let course = slug(course);
        let major = major.map(slug);
        let year = slug(year);
        let keys: Vec<GroupKey> = self
            .map
            .keys()
            .filter(|k| k.course == course && k.major == major && k.year == year)
            .cloned()
            .collect();
        keys.into_iter()
            .filter_map(|k| self.map.remove(&k))
            .collect()
    }

    /// Remaining blocks for one (course, year) merged across majors.
    fn drain_year_any_major(&mut self, course: &str, year: &str) -> Vec<Bucket> {
        let course = slug(course);
        let year = slug(year);
        let keys: Vec<GroupKey> = self
            .map
            .keys()
            .filter(|k| k.course == course && k.year == year)
            .cloned()
            .collect();
        let mut merged: BTreeMap<String, Bucket> = BTreeMap::new();
        for key in keys {
            if let Some(bucket) = self.map.remove(&key) {
                match merged.entry(key.block) {
                    Entry::Occupied(mut slot) => slot.get_mut().members.extend(bucket.members),
                    Entry::Vacant(slot) => {
                        slot.insert(bucket);
                    }
                }
            }
        }
        merged.into_values().collect()
    }

    fn into_buckets(self) -> Vec<Bucket> {
        self.map.into_values().collect()
    }
}

fn make_block(id: String, name: String, mut members: Vec<PersonSummary>) -> BlockNode {
    members.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    let officers: Vec<PersonSummary> = members.iter().filter(|p| p.is_officer).cloned().collect();
    BlockNode {
        id,
        name,
        student_count: members.len(),
        officer_count: officers.len(),
        students: members,
        officers,
    }
}

/// Canonical levels in canonical order, then any extra grades present in the
/// reference sections (first-seen label, fetch order). Levels are never
/// dropped for lack of data.
fn level_labels(canonical: &[&str], sections: &[&SectionRecord]) -> Vec<String> {
    let mut labels: Vec<String> = canonical.iter().map(|l| l.to_string()).collect();
    let mut seen: BTreeSet<String> = labels.iter().map(|l| slug(l)).collect();
    for section in sections {
        if seen.insert(slug(&section.grade)) {
            labels.push(section.grade.clone());
        }
    }
    labels
}

fn dedup_sections<'a>(iter: impl Iterator<Item = &'a SectionRecord>) -> Vec<&'a SectionRecord> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for section in iter {
        if seen.insert(slug(&section.name)) {
            out.push(section);
        } else {
            warn!(section = %section.name, "section name normalizes to an already-emitted block id");
        }
    }
    out
}

/// After the reference scaffolding is emitted, any buckets still holding
/// members become synthesized nodes appended after the canonical content.
/// This is the degraded mode that keeps every approved profile in the tree.
fn place_leftovers(courses: &mut Vec<CourseNode>, buckets: Buckets) {
    for bucket in buckets.into_buckets() {
        let course_slug = slug(&bucket.course_label);
        let idx = match courses.iter().position(|c| slug(&c.name) == course_slug) {
            Some(i) => i,
            None => {
                warn!(course = %bucket.course_label, "no reference record for course key; emitting a degraded entry");
                courses.push(CourseNode::bare(course_slug.clone(), bucket.course_label.clone()));
                courses.len() - 1
            }
        };
        let course = &mut courses[idx];

        let levels = if course.majors.is_empty() {
            &mut course.year_levels
        } else {
            let major_label = bucket
                .major_label
                .clone()
                .unwrap_or_else(|| NO_MAJOR.to_string());
            let major_slug = slug(&major_label);
            let midx = match course.majors.iter().position(|m| slug(&m.name) == major_slug) {
                Some(i) => i,
                None => {
                    course.majors.push(MajorNode {
                        id: major_slug,
                        name: major_label,
                        year_levels: Vec::new(),
                    });
                    course.majors.len() - 1
                }
            };
            &mut course.majors[midx].year_levels
        };

        let year_slug = slug(&bucket.year_label);
        let lidx = match levels.iter().position(|l| l.id == year_slug) {
            Some(i) => i,
            None => {
                levels.push(YearLevelNode {
                    id: year_slug,
                    level: bucket.year_label.clone(),
                    blocks: Vec::new(),
                });
                levels.len() - 1
            }
        };
        let blocks = &mut levels[lidx].blocks;

        let block_slug = slug(&bucket.block_label);
        if let Some(i) = blocks.iter().position(|b| b.id == block_slug) {
            let existing = blocks.remove(i);
            let mut members = existing.students;
            members.extend(bucket.members);
            blocks.insert(i, make_block(existing.id, existing.name, members));
        } else {
            blocks.push(make_block(block_slug, bucket.block_label, bucket.members));
        }
    }
}

/// Elementary and junior high: one synthetic "{Department} Education" course,
/// canonical grades, blocks straight from the section list.
pub fn build_basic_education(
    dept: &DepartmentRecord,
    kind: DepartmentKind,
    sections: &[SectionRecord],
    profiles: &[ProfileRecord],
) -> DepartmentNode {
    let course_name = format!("{} Education", dept.name);

    let mut buckets = Buckets::new();
    for profile in profiles {
        if let Placement::BasicEd { grade, section } = profile.placement(kind) {
            buckets.insert(
                &course_name,
                None,
                grade.unwrap_or(UNKNOWN),
                section.unwrap_or(UNKNOWN),
                profile.summary(),
            );
        }
    }

    let all_sections: Vec<&SectionRecord> = sections.iter().collect();
    let mut year_levels = Vec::new();
    for level in level_labels(canonical_levels(kind), &all_sections) {
        let level_sections =
            dedup_sections(sections.iter().filter(|s| slug(&s.grade) == slug(&level)));
        let mut blocks = Vec::new();
        for section in level_sections {
            let members = buckets.take(&course_name, None, &section.grade, &section.name);
            blocks.push(make_block(slug(&section.name), section.name.clone(), members));
        }
        for bucket in buckets.drain_year(&course_name, None, &level) {
            blocks.push(make_block(
                slug(&bucket.block_label),
                bucket.block_label,
                bucket.members,
            ));
        }
        year_levels.push(YearLevelNode {
            id: slug(&level),
            level,
            blocks,
        });
    }

    let mut course = CourseNode::bare(slug(&course_name), course_name);
    course.year_levels = year_levels;
    let mut courses = vec![course];
    place_leftovers(&mut courses, buckets);

    DepartmentNode {
        id: dept.key.clone(),
        name: dept.name.clone(),
        kind: dept.key.clone(),
        courses,
    }
}

/// Senior high: strands play the course role. Blocks display as
/// "{strand} {section}" so identically named sections stay distinct
/// across strands.
pub fn build_senior_high(
    dept: &DepartmentRecord,
    strands: &[StrandRecord],
    sections: &[SectionRecord],
    profiles: &[ProfileRecord],
) -> DepartmentNode {
    let mut buckets = Buckets::new();
    for profile in profiles {
        if let Placement::SeniorHigh {
            strand,
            grade,
            section,
        } = profile.placement(DepartmentKind::SeniorHigh)
        {
            buckets.insert(
                strand.unwrap_or(dept.name.as_str()),
                None,
                grade.unwrap_or(UNKNOWN),
                section.unwrap_or(UNKNOWN),
                profile.summary(),
            );
        }
    }

    let mut courses = Vec::new();
    for strand in strands {
        let strand_sections: Vec<&SectionRecord> = sections
            .iter()
            .filter(|s| {
                s.strand_name
                    .as_deref()
                    .is_some_and(|n| slug(n) == slug(&strand.name))
            })
            .collect();

        let mut year_levels = Vec::new();
        for level in level_labels(SENIOR_HIGH_LEVELS, &strand_sections) {
            let level_sections = dedup_sections(
                strand_sections
                    .iter()
                    .copied()
                    .filter(|s| slug(&s.grade) == slug(&level)),
            );
            let mut blocks = Vec::new();
            for section in level_sections {
                let members = buckets.take(&strand.name, None, &section.grade, &section.name);
                let display = format!("{} {}", strand.name, section.name);
                blocks.push(make_block(slug(&display), display, members));
            }
            for bucket in buckets.drain_year(&strand.name, None, &level) {
                let display = format!("{} {}", strand.name, bucket.block_label);
                blocks.push(make_block(slug(&display), display, bucket.members));
            }
            year_levels.push(YearLevelNode {
                id: slug(&level),
                level,
                blocks,
            });
        }

        courses.push(CourseNode {
            id: strand.id.to_string(),
            name: strand.name.clone(),
            full_name: Some(strand.full_name.clone()),
            description: strand.description.clone(),
            tagline: strand.tagline.clone(),
            major_type: None,
            majors: Vec::new(),
            year_levels,
        });
    }

    place_leftovers(&mut courses, buckets);

    DepartmentNode {
        id: dept.key.clone(),
        name: dept.name.clone(),
        kind: dept.key.clone(),
        courses,
    }
}

fn build_major_course(
    course: &CourseRecord,
    majors: &[&CourseMajorRecord],
    sections: &[SectionRecord],
    buckets: &mut Buckets,
) -> CourseNode {
    let mut nodes = Vec::new();
    for course_major in majors {
        let major_sections: Vec<&SectionRecord> = sections
            .iter()
            .filter(|s| {
                s.course_name
                    .as_deref()
                    .is_some_and(|n| slug(n) == slug(&course.name))
                    && s.major_name
                        .as_deref()
                        .is_some_and(|n| slug(n) == slug(&course_major.major_name))
            })
            .collect();

        let mut year_levels = Vec::new();
        for level in level_labels(COLLEGE_LEVELS, &major_sections) {
            let level_sections = dedup_sections(
                major_sections
                    .iter()
                    .copied()
                    .filter(|s| slug(&s.grade) == slug(&level)),
            );
            let mut blocks = Vec::new();
            for section in level_sections {
                let members = buckets.take(
                    &course.name,
                    Some(course_major.major_name.as_str()),
                    &section.grade,
                    &section.name,
                );
                blocks.push(make_block(slug(&section.name), section.name.clone(), members));
            }
            for bucket in
                buckets.drain_year(&course.name, Some(course_major.major_name.as_str()), &level)
            {
                blocks.push(make_block(
                    slug(&bucket.block_label),
                    bucket.block_label,
                    bucket.members,
                ));
            }
            year_levels.push(YearLevelNode {
                id: slug(&level),
                level,
                blocks,
            });
        }

        nodes.push(MajorNode {
            id: course_major.id.to_string(),
            name: course_major.major_name.clone(),
            year_levels,
        });
    }

    // Year-level nesting lives on the majors; the course level stays empty.
    let mut node = CourseNode::bare(course.id.to_string(), course.name.clone());
    node.major_type = Some(course.major_type.as_key().to_string());
    node.majors = nodes;
    node
}

fn build_plain_course(
    course: &CourseRecord,
    sections: &[SectionRecord],
    buckets: &mut Buckets,
) -> CourseNode {
    let course_sections: Vec<&SectionRecord> = sections
        .iter()
        .filter(|s| {
            s.course_name
                .as_deref()
                .is_some_and(|n| slug(n) == slug(&course.name))
        })
        .collect();

    let mut year_levels = Vec::new();
    for level in level_labels(COLLEGE_LEVELS, &course_sections) {
        let level_sections = dedup_sections(
            course_sections
                .iter()
                .copied()
                .filter(|s| slug(&s.grade) == slug(&level)),
        );
        let mut blocks = Vec::new();
        for section in level_sections {
            let members = buckets.take_any_major(&course.name, &section.grade, &section.name);
            blocks.push(make_block(slug(&section.name), section.name.clone(), members));
        }
        for bucket in buckets.drain_year_any_major(&course.name, &level) {
            blocks.push(make_block(
                slug(&bucket.block_label),
                bucket.block_label,
                bucket.members,
            ));
        }
        year_levels.push(YearLevelNode {
            id: slug(&level),
            level,
            blocks,
        });
    }

    let mut node = CourseNode::bare(course.id.to_string(), course.name.clone());
    node.major_type = Some(course.major_type.as_key().to_string());
    node.year_levels = year_levels;
    node
}

/// College: per-course branch on declared major type. Blocks are the union
/// of profile-derived groups and the reference section list, so a section
/// with no students still shows up.
pub fn build_college(
    dept: &DepartmentRecord,
    course_records: &[CourseRecord],
    course_majors: &[CourseMajorRecord],
    sections: &[SectionRecord],
    profiles: &[ProfileRecord],
) -> DepartmentNode {
    // No reference courses for the year means nothing to hang blocks from.
    if course_records.is_empty() {
        return DepartmentNode {
            id: dept.key.clone(),
            name: dept.name.clone(),
            kind: dept.key.clone(),
            courses: Vec::new(),
        };
    }

    let mut buckets = Buckets::new();
    for profile in profiles {
        if let Placement::College {
            course,
            major,
            year,
            block,
        } = profile.placement(DepartmentKind::College)
        {
            buckets.insert(
                course.unwrap_or(dept.name.as_str()),
                Some(major.unwrap_or(NO_MAJOR)),
                year.unwrap_or(UNKNOWN),
                block.unwrap_or(UNKNOWN),
                profile.summary(),
            );
        }
    }

    let mut courses = Vec::new();
    for course in course_records {
        let majors: Vec<&CourseMajorRecord> = course_majors
            .iter()
            .filter(|m| m.course_id == course.id)
            .collect();
        let node = if course.major_type == MajorType::HasMajor && !majors.is_empty() {
            build_major_course(course, &majors, sections, &mut buckets)
        } else {
            build_plain_course(course, sections, &mut buckets)
        };
        courses.push(node);
    }

    place_leftovers(&mut courses, buckets);

    DepartmentNode {
        id: dept.key.clone(),
        name: dept.name.clone(),
        kind: dept.key.clone(),
        courses,
    }
}

/// Generic path for departments outside the fixed four: purely
/// profile-derived grouping, no section cross-referencing. Course identity
/// resolves against the reference collection by name when a record exists.
pub fn build_generic(
    dept: &DepartmentRecord,
    course_records: &[CourseRecord],
    course_majors: &[CourseMajorRecord],
    profiles: &[ProfileRecord],
) -> DepartmentNode {
    let mut buckets = Buckets::new();
    for profile in profiles {
        if let Placement::Generic {
            course,
            major,
            year,
            block,
        } = profile.placement(DepartmentKind::Other)
        {
            buckets.insert(
                course.unwrap_or(dept.name.as_str()),
                Some(major.unwrap_or(NO_MAJOR)),
                year.unwrap_or(UNKNOWN),
                block.unwrap_or(UNKNOWN),
                profile.summary(),
            );
        }
    }

    let mut courses = Vec::new();
    for course in course_records {
        let majors: Vec<&CourseMajorRecord> = course_majors
            .iter()
            .filter(|m| m.course_id == course.id)
            .collect();
        let node = if course.major_type == MajorType::HasMajor && !majors.is_empty() {
            build_major_course(course, &majors, &[], &mut buckets)
        } else {
            build_plain_course(course, &[], &mut buckets)
        };
        courses.push(node);
    }

    place_leftovers(&mut courses, buckets);

    DepartmentNode {
        id: dept.key.clone(),
        name: dept.name.clone(),
        kind: dept.key.clone(),
        courses,
    }
}

fn registry_entry(
    departments: &[DepartmentRecord],
    key: &str,
    default_name: &str,
) -> DepartmentRecord {
    departments
        .iter()
        .find(|d| d.key == key)
        .cloned()
        .unwrap_or_else(|| DepartmentRecord {
            key: key.to_string(),
            name: default_name.to_string(),
        })
}

async fn basic_education_department(
    pool: &PgPool,
    school_year_id: &str,
    dept: DepartmentRecord,
    kind: DepartmentKind,
    sections: &[SectionRecord],
) -> Result<DepartmentNode, StructureError> {
    let profiles = db::fetch_approved_profiles(pool, &dept.key, school_year_id)
        .await
        .map_err(StructureError::dependency)?;
    let dept_sections: Vec<SectionRecord> = sections
        .iter()
        .filter(|s| s.department == dept.key)
        .cloned()
        .collect();
    Ok(build_basic_education(&dept, kind, &dept_sections, &profiles))
}

async fn senior_high_department(
    pool: &PgPool,
    school_year_id: &str,
    dept: DepartmentRecord,
    sections: &[SectionRecord],
) -> Result<DepartmentNode, StructureError> {
    let (profiles, strands) = tokio::try_join!(
        db::fetch_approved_profiles(pool, &dept.key, school_year_id),
        db::fetch_active_strands(pool, school_year_id),
    )
    .map_err(StructureError::dependency)?;
    let dept_sections: Vec<SectionRecord> = sections
        .iter()
        .filter(|s| s.department == dept.key)
        .cloned()
        .collect();
    Ok(build_senior_high(&dept, &strands, &dept_sections, &profiles))
}

async fn college_department(
    pool: &PgPool,
    school_year_id: &str,
    dept: DepartmentRecord,
    course_majors: &[CourseMajorRecord],
    sections: &[SectionRecord],
) -> Result<DepartmentNode, StructureError> {
    let (profiles, courses) = tokio::try_join!(
        db::fetch_approved_profiles(pool, &dept.key, school_year_id),
        db::fetch_courses(pool, &dept.key, school_year_id),
    )
    .map_err(StructureError::dependency)?;
    let dept_sections: Vec<SectionRecord> = sections
        .iter()
        .filter(|s| s.department == dept.key)
        .cloned()
        .collect();
    Ok(build_college(
        &dept,
        &courses,
        course_majors,
        &dept_sections,
        &profiles,
    ))
}

async fn generic_department(
    pool: &PgPool,
    school_year_id: &str,
    dept: &DepartmentRecord,
    course_majors: &[CourseMajorRecord],
) -> Result<DepartmentNode, StructureError> {
    let (profiles, courses) = tokio::try_join!(
        db::fetch_approved_profiles(pool, &dept.key, school_year_id),
        db::fetch_courses(pool, &dept.key, school_year_id),
    )
    .map_err(StructureError::dependency)?;
    Ok(build_generic(dept, &courses, course_majors, &profiles))
}

/// Build the full yearbook structure for one school year. The four fixed
/// departments are computed concurrently and joined all-or-nothing; a
/// failure in any branch fails the whole call, never a partial tree.
pub async fn build_structure(
    pool: &PgPool,
    school_year_id: &str,
) -> Result<Structure, StructureError> {
    let school_year_id = school_year_id.trim();
    if school_year_id.is_empty() {
        return Err(StructureError::validation("schoolYearId is required"));
    }

    let departments = db::fetch_departments(pool)
        .await
        .map_err(StructureError::dependency)?;
    let sections = db::fetch_active_sections(pool, school_year_id)
        .await
        .map_err(StructureError::dependency)?;
    let course_majors = db::fetch_active_course_majors(pool, school_year_id)
        .await
        .map_err(StructureError::dependency)?;

    let (elementary, junior_high, senior_high, college) = tokio::try_join!(
        basic_education_department(
            pool,
            school_year_id,
            registry_entry(&departments, "elementary", "Elementary"),
            DepartmentKind::Elementary,
            &sections,
        ),
        basic_education_department(
            pool,
            school_year_id,
            registry_entry(&departments, "junior-high", "Junior High"),
            DepartmentKind::JuniorHigh,
            &sections,
        ),
        senior_high_department(
            pool,
            school_year_id,
            registry_entry(&departments, "senior-high", "Senior High"),
            &sections,
        ),
        college_department(
            pool,
            school_year_id,
            registry_entry(&departments, "college", "College"),
            &course_majors,
            &sections,
        ),
    )?;

    let mut nodes = vec![elementary, junior_high, senior_high, college];
    for dept in departments
        .iter()
        .filter(|d| DepartmentKind::from_key(&d.key) == DepartmentKind::Other)
    {
        nodes.push(generic_department(pool, school_year_id, dept, &course_majors).await?);
    }

    Ok(Structure {
        school_year_id: school_year_id.to_string(),
        departments: nodes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn dept(key: &str, name: &str) -> DepartmentRecord {
        DepartmentRecord {
            key: key.to_string(),
            name: name.to_string(),
        }
    }

    fn profile(name: &str, department: &str) -> ProfileRecord {
        ProfileRecord {
            id: Uuid::new_v4(),
            full_name: name.to_string(),
            department: department.to_string(),
            course_program: None,
            major: None,
            year_level: None,
            block_section: None,
            profile_picture: None,
            saying_motto: None,
            honors: None,
            officer_role: None,
        }
    }

    fn section(department: &str, grade: &str, name: &str) -> SectionRecord {
        SectionRecord {
            department: department.to_string(),
            grade: grade.to_string(),
            name: name.to_string(),
            course_name: None,
            major_name: None,
            strand_name: None,
        }
    }

    fn course(name: &str, major_type: MajorType) -> CourseRecord {
        CourseRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            department: "college".to_string(),
            major_type,
        }
    }

    fn level<'a>(node: &'a CourseNode, id: &str) -> &'a YearLevelNode {
        node.year_levels
            .iter()
            .find(|l| l.id == id)
            .unwrap_or_else(|| panic!("missing year level {id}"))
    }

    fn collect_ids(node: &DepartmentNode) -> Vec<Uuid> {
        let mut ids = Vec::new();
        for course in &node.courses {
            for major in &course.majors {
                for lvl in &major.year_levels {
                    for block in &lvl.blocks {
                        ids.extend(block.students.iter().map(|p| p.id));
                    }
                }
            }
            for lvl in &course.year_levels {
                for block in &lvl.blocks {
                    ids.extend(block.students.iter().map(|p| p.id));
                }
            }
        }
        ids
    }

    fn assert_officers_subset(node: &DepartmentNode) {
        let mut blocks: Vec<&BlockNode> = Vec::new();
        for course in &node.courses {
            for major in &course.majors {
                for lvl in &major.year_levels {
                    blocks.extend(lvl.blocks.iter());
                }
            }
            for lvl in &course.year_levels {
                blocks.extend(lvl.blocks.iter());
            }
        }
        for block in blocks {
            assert_eq!(block.student_count, block.students.len());
            assert_eq!(block.officer_count, block.officers.len());
            for officer in &block.officers {
                assert!(block.students.iter().any(|s| s.id == officer.id));
                assert!(officer.is_officer);
            }
            for student in &block.students {
                let emitted = block.officers.iter().any(|o| o.id == student.id);
                assert_eq!(student.is_officer, emitted);
            }
        }
    }

    #[test]
    fn slug_normalizes_case_and_whitespace() {
        assert_eq!(slug("Block A"), "block-a");
        assert_eq!(slug("block-a"), "block-a");
        assert_eq!(slug("  Grade   3 "), "grade-3");
    }

    #[test]
    fn elementary_groups_sections_and_officers() {
        let sections = vec![section("elementary", "Grade 3", "Rose")];
        let mut president = profile("Ana Cruz", "elementary");
        president.year_level = Some("Grade 3".to_string());
        president.block_section = Some("Rose".to_string());
        president.officer_role = Some("President".to_string());
        let mut member = profile("Ben Reyes", "elementary");
        member.year_level = Some("Grade 3".to_string());
        member.block_section = Some("Rose".to_string());

        let node = build_basic_education(
            &dept("elementary", "Elementary"),
            DepartmentKind::Elementary,
            &sections,
            &[president, member],
        );

        assert_eq!(node.courses.len(), 1);
        let education = &node.courses[0];
        assert_eq!(education.id, "elementary-education");
        assert_eq!(education.year_levels.len(), 6);

        let grade_three = level(education, "grade-3");
        assert_eq!(grade_three.blocks.len(), 1);
        let block = &grade_three.blocks[0];
        assert_eq!(block.id, "rose");
        assert_eq!(block.name, "Rose");
        assert_eq!(block.student_count, 2);
        assert_eq!(block.officer_count, 1);
        assert_eq!(block.officers[0].officer_position.as_deref(), Some("President"));
        assert_officers_subset(&node);
    }

    #[test]
    fn canonical_levels_present_without_data() {
        let node = build_basic_education(
            &dept("elementary", "Elementary"),
            DepartmentKind::Elementary,
            &[],
            &[],
        );
        let ids: Vec<&str> = node.courses[0]
            .year_levels
            .iter()
            .map(|l| l.id.as_str())
            .collect();
        assert_eq!(
            ids,
            vec!["grade-1", "grade-2", "grade-3", "grade-4", "grade-5", "grade-6"]
        );

        let junior = build_basic_education(
            &dept("junior-high", "Junior High"),
            DepartmentKind::JuniorHigh,
            &[],
            &[],
        );
        assert_eq!(junior.courses[0].id, "junior-high-education");
        assert_eq!(junior.courses[0].year_levels.len(), 4);
    }

    #[test]
    fn empty_section_still_emits_block() {
        let sections = vec![section("elementary", "Grade 1", "Sampaguita")];
        let node = build_basic_education(
            &dept("elementary", "Elementary"),
            DepartmentKind::Elementary,
            &sections,
            &[],
        );
        let grade_one = level(&node.courses[0], "grade-1");
        assert_eq!(grade_one.blocks.len(), 1);
        assert_eq!(grade_one.blocks[0].student_count, 0);
        assert_eq!(grade_one.blocks[0].officer_count, 0);
    }

    #[test]
    fn unmatched_profiles_land_in_synthesized_buckets() {
        let mut stray = profile("Cara Lim", "elementary");
        stray.year_level = Some("Grade 2".to_string());
        stray.block_section = Some("Orchid".to_string());
        let blank = profile("Dan Sy", "elementary");

        let node = build_basic_education(
            &dept("elementary", "Elementary"),
            DepartmentKind::Elementary,
            &[],
            &[stray.clone(), blank.clone()],
        );
        let education = &node.courses[0];

        // Stray section name joins its canonical grade.
        let grade_two = level(education, "grade-2");
        assert_eq!(grade_two.blocks.len(), 1);
        assert_eq!(grade_two.blocks[0].id, "orchid");
        assert_eq!(grade_two.blocks[0].students[0].id, stray.id);

        // Fully blank keys land in an appended "Unknown" level.
        assert_eq!(education.year_levels.len(), 7);
        let unknown = level(education, "unknown");
        assert_eq!(unknown.level, "Unknown");
        assert_eq!(unknown.blocks[0].id, "unknown");
        assert_eq!(unknown.blocks[0].students[0].id, blank.id);
    }

    #[test]
    fn strand_without_sections_keeps_canonical_levels() {
        let strand = StrandRecord {
            id: Uuid::new_v4(),
            name: "STEM".to_string(),
            full_name: "Science, Technology, Engineering and Mathematics".to_string(),
            description: None,
            tagline: None,
        };
        let node = build_senior_high(
            &dept("senior-high", "Senior High"),
            &[strand],
            &[],
            &[],
        );
        assert_eq!(node.courses.len(), 1);
        let stem = &node.courses[0];
        assert_eq!(stem.year_levels.len(), 2);
        assert!(level(stem, "grade-11").blocks.is_empty());
        assert!(level(stem, "grade-12").blocks.is_empty());
    }

    #[test]
    fn senior_high_blocks_carry_strand_prefix() {
        let strand = StrandRecord {
            id: Uuid::new_v4(),
            name: "STEM".to_string(),
            full_name: "Science, Technology, Engineering and Mathematics".to_string(),
            description: None,
            tagline: None,
        };
        let mut sec = section("senior-high", "Grade 11", "A");
        sec.strand_name = Some("STEM".to_string());

        let mut student = profile("Ely Tan", "senior-high");
        student.course_program = Some("STEM".to_string());
        student.year_level = Some("Grade 11".to_string());
        student.block_section = Some("A".to_string());

        let node = build_senior_high(
            &dept("senior-high", "Senior High"),
            &[strand],
            &[sec],
            &[student],
        );
        let grade_eleven = level(&node.courses[0], "grade-11");
        assert_eq!(grade_eleven.blocks.len(), 1);
        assert_eq!(grade_eleven.blocks[0].name, "STEM A");
        assert_eq!(grade_eleven.blocks[0].id, "stem-a");
        assert_eq!(grade_eleven.blocks[0].student_count, 1);
    }

    #[test]
    fn college_reference_section_emits_empty_block() {
        let bsit = course("BSIT", MajorType::NoMajor);
        let mut sec = section("college", "1st Year", "A");
        sec.course_name = Some("BSIT".to_string());

        let node = build_college(
            &dept("college", "College"),
            &[bsit],
            &[],
            &[sec],
            &[],
        );
        let node_course = &node.courses[0];
        assert!(node_course.majors.is_empty());
        assert_eq!(node_course.year_levels.len(), 4);
        let first_year = level(node_course, "1st-year");
        assert_eq!(first_year.blocks.len(), 1);
        assert_eq!(first_year.blocks[0].id, "a");
        assert_eq!(first_year.blocks[0].student_count, 0);
    }

    #[test]
    fn has_major_course_nests_levels_under_majors() {
        let bsed = course("BSED", MajorType::HasMajor);
        let english = CourseMajorRecord {
            id: Uuid::new_v4(),
            course_id: bsed.id,
            major_name: "English".to_string(),
        };
        let math = CourseMajorRecord {
            id: Uuid::new_v4(),
            course_id: bsed.id,
            major_name: "Mathematics".to_string(),
        };

        let mut student = profile("Fe Uy", "college");
        student.course_program = Some("BSED".to_string());
        student.major = Some("English".to_string());
        student.year_level = Some("2nd Year".to_string());
        student.block_section = Some("B".to_string());

        let node = build_college(
            &dept("college", "College"),
            &[bsed],
            &[english, math],
            &[],
            &[student.clone()],
        );
        let node_course = &node.courses[0];
        assert!(node_course.year_levels.is_empty());
        assert_eq!(node_course.majors.len(), 2);
        for major in &node_course.majors {
            assert_eq!(major.year_levels.len(), 4);
        }
        let english_major = &node_course.majors[0];
        assert_eq!(english_major.name, "English");
        let second_year = english_major
            .year_levels
            .iter()
            .find(|l| l.id == "2nd-year")
            .unwrap();
        assert_eq!(second_year.blocks[0].id, "b");
        assert_eq!(second_year.blocks[0].students[0].id, student.id);
    }

    #[test]
    fn missing_major_bucketed_under_no_major() {
        let bsed = course("BSED", MajorType::HasMajor);
        let english = CourseMajorRecord {
            id: Uuid::new_v4(),
            course_id: bsed.id,
            major_name: "English".to_string(),
        };

        let mut student = profile("Gio Ong", "college");
        student.course_program = Some("BSED".to_string());
        student.year_level = Some("1st Year".to_string());
        student.block_section = Some("A".to_string());

        let node = build_college(
            &dept("college", "College"),
            &[bsed],
            &[english],
            &[],
            &[student.clone()],
        );
        let node_course = &node.courses[0];
        let no_major = node_course
            .majors
            .iter()
            .find(|m| m.name == NO_MAJOR)
            .expect("synthesized No Major entry");
        let ids: Vec<Uuid> = no_major
            .year_levels
            .iter()
            .flat_map(|l| l.blocks.iter())
            .flat_map(|b| b.students.iter().map(|p| p.id))
            .collect();
        assert_eq!(ids, vec![student.id]);
    }

    #[test]
    fn college_without_course_records_is_empty() {
        let mut student = profile("Hana Lee", "college");
        student.course_program = Some("BSIT".to_string());
        let node = build_college(
            &dept("college", "College"),
            &[],
            &[],
            &[],
            &[student],
        );
        assert!(node.courses.is_empty());
    }

    #[test]
    fn generic_department_buckets_blank_keys_under_unknown() {
        let faculty = dept("faculty", "Faculty");
        let person = profile("Ira Gomez", "faculty");
        let node = build_generic(&faculty, &[], &[], &[person.clone()]);

        assert_eq!(node.courses.len(), 1);
        let bucket_course = &node.courses[0];
        assert_eq!(bucket_course.id, "faculty");
        assert_eq!(bucket_course.name, "Faculty");
        let unknown = level(bucket_course, "unknown");
        assert_eq!(unknown.blocks[0].id, "unknown");
        assert_eq!(unknown.blocks[0].students[0].id, person.id);
    }

    #[test]
    fn generic_department_resolves_course_by_name() {
        let faculty = dept("faculty", "Faculty");
        let mut record = course("Administration", MajorType::NoMajor);
        record.department = "faculty".to_string();

        let mut person = profile("Joy Cruz", "faculty");
        person.course_program = Some("Administration".to_string());
        person.year_level = Some("Unknown".to_string());
        person.block_section = Some("Office".to_string());

        let node = build_generic(&faculty, &[record.clone()], &[], &[person.clone()]);
        let resolved = node
            .courses
            .iter()
            .find(|c| c.name == "Administration")
            .unwrap();
        // Resolved against the reference record, not a slugged display name.
        assert_eq!(resolved.id, record.id.to_string());
        let ids = collect_ids(&node);
        assert_eq!(ids, vec![person.id]);
    }

    #[test]
    fn colliding_section_names_merge_into_one_block() {
        let sections = vec![
            section("elementary", "Grade 4", "Block A"),
            section("elementary", "Grade 4", "block-a"),
        ];
        let mut first = profile("Kim Pe", "elementary");
        first.year_level = Some("Grade 4".to_string());
        first.block_section = Some("Block A".to_string());
        let mut second = profile("Liz Co", "elementary");
        second.year_level = Some("Grade 4".to_string());
        second.block_section = Some("block-a".to_string());

        let node = build_basic_education(
            &dept("elementary", "Elementary"),
            DepartmentKind::Elementary,
            &sections,
            &[first, second],
        );
        let grade_four = level(&node.courses[0], "grade-4");
        assert_eq!(grade_four.blocks.len(), 1);
        let block = &grade_four.blocks[0];
        assert_eq!(block.id, "block-a");
        assert_eq!(block.name, "Block A");
        assert_eq!(block.student_count, 2);
    }

    #[test]
    fn every_profile_appears_exactly_once() {
        let mut placed = profile("Mia Sy", "elementary");
        placed.year_level = Some("Grade 5".to_string());
        placed.block_section = Some("Rose".to_string());
        let stray = profile("Noel Yu", "elementary");
        let profiles = vec![placed, stray];
        let sections = vec![section("elementary", "Grade 5", "Rose")];

        let node = build_basic_education(
            &dept("elementary", "Elementary"),
            DepartmentKind::Elementary,
            &sections,
            &profiles,
        );

        let mut ids = collect_ids(&node);
        ids.sort();
        let mut expected: Vec<Uuid> = profiles.iter().map(|p| p.id).collect();
        expected.sort();
        assert_eq!(ids, expected);
        assert_officers_subset(&node);
    }

    #[test]
    fn identical_inputs_build_identical_trees() {
        let strand = StrandRecord {
            id: Uuid::new_v4(),
            name: "ABM".to_string(),
            full_name: "Accountancy, Business and Management".to_string(),
            description: Some("Business track".to_string()),
            tagline: None,
        };
        let mut sec = section("senior-high", "Grade 12", "B");
        sec.strand_name = Some("ABM".to_string());
        let mut student = profile("Ola Dy", "senior-high");
        student.course_program = Some("ABM".to_string());
        student.year_level = Some("Grade 12".to_string());
        student.block_section = Some("B".to_string());

        let first = build_senior_high(
            &dept("senior-high", "Senior High"),
            std::slice::from_ref(&strand),
            std::slice::from_ref(&sec),
            std::slice::from_ref(&student),
        );
        let second = build_senior_high(
            &dept("senior-high", "Senior High"),
            std::slice::from_ref(&strand),
            std::slice::from_ref(&sec),
            std::slice::from_ref(&student),
        );
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }
}

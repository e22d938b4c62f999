use serde::Serialize;
use uuid::Uuid;

/// The four departments with fixed aggregation rules. Anything else that
/// shows up in the department registry flows through the generic path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepartmentKind {
    Elementary,
    JuniorHigh,
    SeniorHigh,
    College,
    Other,
}

impl DepartmentKind {
    pub fn from_key(key: &str) -> Self {
        match key {
            "elementary" => DepartmentKind::Elementary,
            "junior-high" => DepartmentKind::JuniorHigh,
            "senior-high" => DepartmentKind::SeniorHigh,
            "college" => DepartmentKind::College,
            _ => DepartmentKind::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MajorType {
    HasMajor,
    NoMajor,
}

impl MajorType {
    pub fn from_key(key: &str) -> Self {
        match key {
            "has-major" => MajorType::HasMajor,
            _ => MajorType::NoMajor,
        }
    }

    pub fn as_key(self) -> &'static str {
        match self {
            MajorType::HasMajor => "has-major",
            MajorType::NoMajor => "no-major",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DepartmentRecord {
    pub key: String,
    pub name: String,
}

/// One approved person for one school year. Status and school-year scoping
/// are applied by the storage queries, not carried on the record.
#[derive(Debug, Clone)]
pub struct ProfileRecord {
    pub id: Uuid,
    pub full_name: String,
    pub department: String,
    pub course_program: Option<String>,
    pub major: Option<String>,
    pub year_level: Option<String>,
    pub block_section: Option<String>,
    pub profile_picture: Option<String>,
    pub saying_motto: Option<String>,
    pub honors: Option<String>,
    pub officer_role: Option<String>,
}

/// Classification keys for a profile, shaped per department type. The
/// `"Unknown"` / `"No Major"` fallbacks are applied when bucketing, never
/// here, so missing data stays visible as `None` until the last moment.
#[derive(Debug, Clone)]
pub enum Placement<'a> {
    BasicEd {
        grade: Option<&'a str>,
        section: Option<&'a str>,
    },
    SeniorHigh {
        strand: Option<&'a str>,
        grade: Option<&'a str>,
        section: Option<&'a str>,
    },
    College {
        course: Option<&'a str>,
        major: Option<&'a str>,
        year: Option<&'a str>,
        block: Option<&'a str>,
    },
    Generic {
        course: Option<&'a str>,
        major: Option<&'a str>,
        year: Option<&'a str>,
        block: Option<&'a str>,
    },
}

impl ProfileRecord {
    pub fn placement(&self, kind: DepartmentKind) -> Placement<'_> {
        match kind {
            DepartmentKind::Elementary | DepartmentKind::JuniorHigh => Placement::BasicEd {
                grade: self.year_level.as_deref(),
                section: self.block_section.as_deref(),
            },
            DepartmentKind::SeniorHigh => Placement::SeniorHigh {
                strand: self.course_program.as_deref(),
                grade: self.year_level.as_deref(),
                section: self.block_section.as_deref(),
            },
            DepartmentKind::College => Placement::College {
                course: self.course_program.as_deref(),
                major: self.major.as_deref(),
                year: self.year_level.as_deref(),
                block: self.block_section.as_deref(),
            },
            DepartmentKind::Other => Placement::Generic {
                course: self.course_program.as_deref(),
                major: self.major.as_deref(),
                year: self.year_level.as_deref(),
                block: self.block_section.as_deref(),
            },
        }
    }

    pub fn summary(&self) -> PersonSummary {
        PersonSummary {
            id: self.id,
            name: self.full_name.clone(),
            image: self.profile_picture.clone(),
            quote: self.saying_motto.clone(),
            honors: self.honors.clone(),
            is_officer: self.officer_role.is_some(),
            officer_position: self.officer_role.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SectionRecord {
    pub department: String,
    pub grade: String,
    pub name: String,
    pub course_name: Option<String>,
    pub major_name: Option<String>,
    pub strand_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CourseRecord {
    pub id: Uuid,
    pub name: String,
    pub department: String,
    pub major_type: MajorType,
}

#[derive(Debug, Clone)]
pub struct CourseMajorRecord {
    pub id: Uuid,
    pub course_id: Uuid,
    pub major_name: String,
}

#[derive(Debug, Clone)]
pub struct StrandRecord {
    pub id: Uuid,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub tagline: Option<String>,
}

// --- output tree -----------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Structure {
    pub school_year_id: String,
    pub departments: Vec<DepartmentNode>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub courses: Vec<CourseNode>,
}

/// A course, strand, or synthesized grouping directly under a department.
/// Strand-only fields stay `None` elsewhere; `major_type` is college-only.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseNode {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub major_type: Option<String>,
    pub majors: Vec<MajorNode>,
    pub year_levels: Vec<YearLevelNode>,
}

impl CourseNode {
    pub fn bare(id: String, name: String) -> Self {
        CourseNode {
            id,
            name,
            full_name: None,
            description: None,
            tagline: None,
            major_type: None,
            majors: Vec::new(),
            year_levels: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MajorNode {
    pub id: String,
    pub name: String,
    pub year_levels: Vec<YearLevelNode>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearLevelNode {
    pub id: String,
    pub level: String,
    pub blocks: Vec<BlockNode>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockNode {
    pub id: String,
    pub name: String,
    pub student_count: usize,
    pub officer_count: usize,
    pub students: Vec<PersonSummary>,
    pub officers: Vec<PersonSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonSummary {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub quote: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub honors: Option<String>,
    pub is_officer: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub officer_position: Option<String>,
}

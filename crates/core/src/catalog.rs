//! Static declaration of every field in the admissions record.
//!
//! Each [`FieldDef`] carries the field's primitive type and its
//! unconditional constraints. Whether a field is *conditionally*
//! required is not declared here; that belongs to the rule table in
//! [`crate::rules`].

use regex::Regex;
use std::sync::LazyLock;

// ──────────────────────────────────────────────
// Field types and formats
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Number,
    Date,
    Enum,
    /// Multi-select over a fixed option list, stored as a list of text.
    MultiEnum,
    Boolean,
    Attachment,
}

impl FieldType {
    pub fn name(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Enum => "choice",
            FieldType::MultiEnum => "list of choices",
            FieldType::Boolean => "boolean",
            FieldType::Attachment => "attachment",
        }
    }
}

/// Named text formats with a fixed regular expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    PersonName,
    Email,
    Phone,
    Aadhaar,
    Passport,
    PostalCode,
}

static PERSON_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\p{L}[\p{L} .'\-]*$").expect("valid person-name regex"));
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9][0-9 \-]{6,14}[0-9]$").expect("valid phone regex"));
static AADHAAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[2-9][0-9]{3} ?[0-9]{4} ?[0-9]{4}$").expect("valid aadhaar regex"));
static PASSPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]{6,9}$").expect("valid passport regex"));
static POSTAL_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 \-]{2,9}$").expect("valid postal-code regex")
});

impl Format {
    pub fn regex(self) -> &'static Regex {
        match self {
            Format::PersonName => &PERSON_NAME,
            Format::Email => &EMAIL,
            Format::Phone => &PHONE,
            Format::Aadhaar => &AADHAAR,
            Format::Passport => &PASSPORT,
            Format::PostalCode => &POSTAL_CODE,
        }
    }

    /// Message used when a value does not match.
    pub fn describe(self) -> &'static str {
        match self {
            Format::PersonName => "may contain only letters, spaces, dots, hyphens and apostrophes",
            Format::Email => "must be a valid email address",
            Format::Phone => "must be a valid phone number",
            Format::Aadhaar => "must be a 12-digit Aadhaar number",
            Format::Passport => "must be 6 to 9 upper-case letters or digits",
            Format::PostalCode => "must be a valid postal code",
        }
    }
}

// ──────────────────────────────────────────────
// Field definitions
// ──────────────────────────────────────────────

/// Unconditional constraints checked against any present value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Constraints {
    pub format: Option<Format>,
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub options: &'static [&'static str],
    pub max_bytes: Option<usize>,
    pub extensions: &'static [&'static str],
}

impl Constraints {
    pub const NONE: Constraints = Constraints {
        format: None,
        min_len: None,
        max_len: None,
        min: None,
        max: None,
        options: &[],
        max_bytes: None,
        extensions: &[],
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub id: &'static str,
    pub field_type: FieldType,
    /// Required regardless of any rule.
    pub required: bool,
    pub constraints: Constraints,
}

impl FieldDef {
    const fn new(id: &'static str, field_type: FieldType) -> Self {
        FieldDef {
            id,
            field_type,
            required: false,
            constraints: Constraints::NONE,
        }
    }

    pub const fn text(id: &'static str) -> Self {
        FieldDef::new(id, FieldType::Text).length(0, 200)
    }

    /// Long free-text answer.
    pub const fn prose(id: &'static str) -> Self {
        FieldDef::new(id, FieldType::Text).length(0, 2000)
    }

    pub const fn number(id: &'static str) -> Self {
        FieldDef::new(id, FieldType::Number)
    }

    pub const fn date(id: &'static str) -> Self {
        FieldDef::new(id, FieldType::Date)
    }

    pub const fn boolean(id: &'static str) -> Self {
        FieldDef::new(id, FieldType::Boolean)
    }

    pub const fn choice(id: &'static str, options: &'static [&'static str]) -> Self {
        let mut def = FieldDef::new(id, FieldType::Enum);
        def.constraints.options = options;
        def
    }

    pub const fn choices(id: &'static str, options: &'static [&'static str]) -> Self {
        let mut def = FieldDef::new(id, FieldType::MultiEnum);
        def.constraints.options = options;
        def
    }

    /// Tri-state "Yes"/"No" trigger (absent until answered).
    pub const fn yes_no(id: &'static str) -> Self {
        FieldDef::choice(id, YES_NO)
    }

    pub const fn attachment(
        id: &'static str,
        max_bytes: usize,
        extensions: &'static [&'static str],
    ) -> Self {
        let mut def = FieldDef::new(id, FieldType::Attachment);
        def.constraints.max_bytes = Some(max_bytes);
        def.constraints.extensions = extensions;
        def
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn format(mut self, format: Format) -> Self {
        self.constraints.format = Some(format);
        self
    }

    pub const fn length(mut self, min: usize, max: usize) -> Self {
        self.constraints.min_len = Some(min);
        self.constraints.max_len = Some(max);
        self
    }

    pub const fn range(mut self, min: i64, max: i64) -> Self {
        self.constraints.min = Some(min);
        self.constraints.max = Some(max);
        self
    }

    pub const fn person_name(id: &'static str) -> Self {
        FieldDef::text(id).format(Format::PersonName).length(1, 50)
    }

    pub const fn email(id: &'static str) -> Self {
        FieldDef::text(id).format(Format::Email).length(3, 254)
    }

    pub const fn phone(id: &'static str) -> Self {
        FieldDef::text(id).format(Format::Phone)
    }
}

// ──────────────────────────────────────────────
// Option lists
// ──────────────────────────────────────────────

pub const YES: &str = "Yes";
pub const NO: &str = "No";
pub const YES_NO: &[&str] = &[YES, NO];

pub const GENDERS: &[&str] = &["Male", "Female", "Other"];
pub const RELIGIONS: &[&str] = &[
    "Hinduism",
    "Islam",
    "Christianity",
    "Sikhism",
    "Buddhism",
    "Jainism",
    "Zoroastrianism",
    "Other",
];
pub const COMMUNITIES: &[&str] = &["General", "OBC", "SC", "ST", "Other"];
pub const BLOOD_GROUPS: &[&str] = &["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];
pub const ID_PROOFS: &[&str] = &["Aadhaar Card", "Passport"];
pub const CLASSES: &[&str] = &[
    "Pre-KG", "LKG", "UKG", "Class I", "Class II", "Class III", "Class IV", "Class V",
    "Class VI", "Class VII", "Class VIII", "Class IX", "Class X", "Class XI", "Class XII",
];
/// Classes for which bed-wetting questions are asked.
pub const JUNIOR_CLASSES: &[&str] = &["Pre-KG", "LKG", "UKG", "Class I", "Class II"];
pub const SUBJECT_GROUPS: &[&str] = &[
    "Science with Mathematics",
    "Science with Biology",
    "Science with Computer Science",
    "Commerce with Mathematics",
    "Commerce without Mathematics",
    "Humanities",
];
pub const BOARDS: &[&str] = &["CBSE", "ICSE", "IB", "IGCSE", "State Board", "Other"];
pub const MARITAL_STATUSES: &[&str] =
    &["Married", "Divorced", "Separated", "Widowed", "Single Parent"];
pub const CUSTODY_HOLDERS: &[&str] = &["Father", "Mother", "Joint"];
pub const INTERESTS: &[&str] = &[
    "Music", "Dance", "Art", "Drama", "Sports", "Robotics", "Debate", "Quiz",
];
pub const PARENT_RELATIONS: &[&str] = &["Father", "Mother"];
pub const GUARDIAN_RELATIONS: &[&str] = &[
    "Grandparent",
    "Uncle",
    "Aunt",
    "Sibling",
    "Family Friend",
    "Other",
];

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg"];
const MB: usize = 1024 * 1024;

/// The thirteen free-text questions asked of Class XI applicants.
pub const CLASS_XI_QUESTIONS: &[&str] = &[
    "career_aspirations",
    "favourite_subjects",
    "reason_for_subject_choice",
    "academic_achievements",
    "extracurricular_achievements",
    "leadership_experience",
    "community_service",
    "books_recently_read",
    "hobbies_and_interests",
    "strengths",
    "areas_for_improvement",
    "reason_for_choosing_school",
    "expectations_from_school",
];

pub const SUBJECT_GROUP_CHOICES: &[&str] = &[
    "subject_group_first_choice",
    "subject_group_second_choice",
    "subject_group_third_choice",
    "subject_group_fourth_choice",
];

// ──────────────────────────────────────────────
// The catalog
// ──────────────────────────────────────────────

/// Scalar fields of the record, in declaration order.
///
/// Validation walks this list in order, so issue ordering follows it.
pub static FIELDS: &[FieldDef] = &[
    // Applicant
    FieldDef::person_name("first_name").required(),
    FieldDef::text("middle_name").format(Format::PersonName).length(0, 50),
    FieldDef::person_name("last_name").required(),
    FieldDef::date("date_of_birth").required(),
    FieldDef::choice("gender", GENDERS).required(),
    FieldDef::text("other_gender").length(0, 50),
    FieldDef::text("nationality").format(Format::PersonName).length(2, 50).required(),
    FieldDef::choice("religion", RELIGIONS).required(),
    FieldDef::text("other_religion").length(0, 50),
    FieldDef::choice("community", COMMUNITIES).required(),
    FieldDef::text("other_community").length(0, 50),
    FieldDef::text("mother_tongue").length(2, 50).required(),
    FieldDef::choice("blood_group", BLOOD_GROUPS),
    FieldDef::email("email").required(),
    FieldDef::phone("phone").required(),
    // Identity proof
    FieldDef::choice("id_proof", ID_PROOFS).required(),
    FieldDef::text("aadhaar_number").format(Format::Aadhaar),
    FieldDef::text("passport_number").format(Format::Passport),
    FieldDef::text("passport_place_of_issue").length(0, 100),
    FieldDef::date("passport_issue_date"),
    FieldDef::date("passport_expiry_date"),
    // Admission
    FieldDef::choice("applied_for", CLASSES).required(),
    FieldDef::choice("subject_group_first_choice", SUBJECT_GROUPS),
    FieldDef::choice("subject_group_second_choice", SUBJECT_GROUPS),
    FieldDef::choice("subject_group_third_choice", SUBJECT_GROUPS),
    FieldDef::choice("subject_group_fourth_choice", SUBJECT_GROUPS),
    FieldDef::prose("career_aspirations"),
    FieldDef::prose("favourite_subjects"),
    FieldDef::prose("reason_for_subject_choice"),
    FieldDef::prose("academic_achievements"),
    FieldDef::prose("extracurricular_achievements"),
    FieldDef::prose("leadership_experience"),
    FieldDef::prose("community_service"),
    FieldDef::prose("books_recently_read"),
    FieldDef::prose("hobbies_and_interests"),
    FieldDef::prose("strengths"),
    FieldDef::prose("areas_for_improvement"),
    FieldDef::prose("reason_for_choosing_school"),
    FieldDef::prose("expectations_from_school"),
    FieldDef::yes_no("wets_bed"),
    FieldDef::text("bed_wet_frequency").length(0, 100),
    FieldDef::choices("co_curricular_interests", INTERESTS),
    // Schooling
    FieldDef::yes_no("is_home_schooled").required(),
    FieldDef::prose("home_schooling_details"),
    FieldDef::text("current_school_name").length(0, 150),
    FieldDef::choice("current_school_board", BOARDS),
    FieldDef::text("current_school_address_line1"),
    FieldDef::text("current_school_address_line2"),
    FieldDef::text("current_school_country").length(0, 60),
    FieldDef::text("current_school_postal_code").format(Format::PostalCode),
    FieldDef::text("current_school_region").length(0, 100),
    FieldDef::text("current_school_city").length(0, 100),
    FieldDef::yes_no("has_previous_schools").required(),
    // Health
    FieldDef::yes_no("wears_glasses_or_lens").required(),
    FieldDef::text("vision_details").length(0, 500),
    FieldDef::yes_no("has_learning_challenge").required(),
    FieldDef::prose("learning_challenge_details"),
    FieldDef::yes_no("has_physical_challenge").required(),
    FieldDef::prose("physical_challenge_details"),
    FieldDef::yes_no("has_speech_challenge").required(),
    FieldDef::prose("speech_challenge_details"),
    FieldDef::yes_no("has_emotional_challenge").required(),
    FieldDef::prose("emotional_challenge_details"),
    FieldDef::yes_no("has_allergy").required(),
    FieldDef::prose("allergy_details"),
    FieldDef::yes_no("has_chronic_illness").required(),
    FieldDef::prose("chronic_illness_details"),
    FieldDef::yes_no("had_major_surgery").required(),
    FieldDef::prose("surgery_details"),
    FieldDef::yes_no("on_medication").required(),
    FieldDef::prose("medication_details"),
    FieldDef::attachment("medication_prescription", 5 * MB, DOCUMENT_EXTENSIONS),
    // Communication address
    FieldDef::text("comm_address_line1").length(1, 200).required(),
    FieldDef::text("comm_address_line2"),
    FieldDef::text("comm_country").length(1, 60).required(),
    FieldDef::text("comm_postal_code").format(Format::PostalCode).required(),
    FieldDef::text("comm_region").length(1, 100).required(),
    FieldDef::text("comm_city").length(1, 100).required(),
    // Billing address
    FieldDef::boolean("billing_same_as_communication"),
    FieldDef::text("billing_address_line1"),
    FieldDef::text("billing_address_line2"),
    FieldDef::text("billing_country").length(0, 60),
    FieldDef::text("billing_postal_code").format(Format::PostalCode),
    FieldDef::text("billing_region").length(0, 100),
    FieldDef::text("billing_city").length(0, 100),
    // Family
    FieldDef::choice("parent_marital_status", MARITAL_STATUSES).required(),
    FieldDef::choice("custody_holder", CUSTODY_HOLDERS),
    FieldDef::prose("custody_arrangement"),
    FieldDef::text("court_order_number").length(0, 60),
    FieldDef::date("divorce_date"),
    FieldDef::prose("visitation_details"),
    FieldDef::attachment("custody_order", 5 * MB, DOCUMENT_EXTENSIONS),
    FieldDef::yes_no("has_sibling_in_ihs").required(),
    FieldDef::yes_no("has_guardian").required(),
    // Documents
    FieldDef::attachment("recent_photograph", 2 * MB, IMAGE_EXTENSIONS).required(),
    FieldDef::attachment("birth_certificate", 5 * MB, DOCUMENT_EXTENSIONS).required(),
    FieldDef::boolean("declaration_accepted").required(),
];

/// Looks up a scalar field definition by id.
pub fn field(id: &str) -> Option<&'static FieldDef> {
    FIELDS.iter().find(|f| f.id == id)
}

/// Looks up a field definition in an arbitrary definition list.
pub fn find(defs: &'static [FieldDef], id: &str) -> Option<&'static FieldDef> {
    defs.iter().find(|f| f.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn field_ids_are_unique() {
        let mut seen = HashSet::new();
        for def in FIELDS {
            assert!(seen.insert(def.id), "duplicate field id '{}'", def.id);
        }
    }

    #[test]
    fn class_xi_questions_are_declared() {
        assert_eq!(CLASS_XI_QUESTIONS.len(), 13);
        for id in CLASS_XI_QUESTIONS.iter().chain(SUBJECT_GROUP_CHOICES) {
            assert!(field(id).is_some(), "'{}' missing from catalog", id);
        }
    }

    #[test]
    fn formats_accept_and_reject() {
        assert!(Format::Email.regex().is_match("a.b@example.org"));
        assert!(!Format::Email.regex().is_match("not-an-email"));
        assert!(Format::Aadhaar.regex().is_match("2345 6789 0123"));
        assert!(!Format::Aadhaar.regex().is_match("1234 5678 9012"));
        assert!(Format::PersonName.regex().is_match("Anne-Marie O'Neil"));
        assert!(!Format::PersonName.regex().is_match("R2D2"));
        assert!(Format::PostalCode.regex().is_match("110001"));
        assert!(!Format::PostalCode.regex().is_match("1"));
    }

    #[test]
    fn builders_set_constraints() {
        let def = FieldDef::number("from_year").range(1990, 2100).required();
        assert_eq!(def.field_type, FieldType::Number);
        assert!(def.required);
        assert_eq!(def.constraints.min, Some(1990));
        assert_eq!(def.constraints.max, Some(2100));
    }
}

use std::fmt;

/// Default header of the column holding the scanned QR payload.
pub const DEFAULT_SCAN_COLUMN: &str = "Scan QR code";

/// Number of class columns tracked for every school.
pub const CLASS_COUNT: u8 = 5;

/// A single spreadsheet cell as loaded from the input table.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Plain text cell.
    Text(String),
    /// Numeric cell. Integers loaded from workbooks are widened to `f64`.
    Number(f64),
    /// Boolean cell.
    Boolean(bool),
    /// Spreadsheet error cell such as `#DIV/0!`.
    Error(String),
    /// Blank cell.
    Empty,
}

impl CellValue {
    /// Builds a cell from raw text, treating blank strings as [`CellValue::Empty`].
    pub fn from_text(raw: &str) -> Self {
        if raw.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(raw.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Interprets the cell as a count, yielding a zero contribution with a
    /// reason when the cell cannot be read as a finite number.
    pub fn contribution(&self) -> Contribution {
        match self {
            CellValue::Number(value) if value.is_finite() => Contribution::Value(*value),
            CellValue::Number(_) => Contribution::Unparseable,
            CellValue::Text(text) => match text.trim().parse::<f64>() {
                Ok(value) if value.is_finite() => Contribution::Value(value),
                _ => Contribution::Unparseable,
            },
            CellValue::Boolean(_) | CellValue::Error(_) => Contribution::Unparseable,
            CellValue::Empty => Contribution::Blank,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(value) => write!(f, "{value}"),
            CellValue::Number(value) => write!(f, "{value}"),
            CellValue::Boolean(value) => write!(f, "{value}"),
            CellValue::Error(value) => write!(f, "{value}"),
            CellValue::Empty => Ok(()),
        }
    }
}

/// Outcome of reading one metric cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Contribution {
    /// The cell holds a usable count.
    Value(f64),
    /// The column is present but the cell is blank.
    Blank,
    /// The row has no such column.
    Absent,
    /// The cell holds something that is not a finite number.
    Unparseable,
}

impl Contribution {
    /// Amount added to a rollup. Anything other than a value adds zero.
    pub fn amount(self) -> f64 {
        match self {
            Contribution::Value(value) => value,
            Contribution::Blank | Contribution::Absent | Contribution::Unparseable => 0.0,
        }
    }
}

/// The per-class counts recorded for each school.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassMetric {
    Enrollments,
    Boys,
    Girls,
}

impl ClassMetric {
    pub const ALL: [ClassMetric; 3] = [ClassMetric::Enrollments, ClassMetric::Boys, ClassMetric::Girls];

    fn noun(self) -> &'static str {
        match self {
            ClassMetric::Enrollments => "enrollments",
            ClassMetric::Boys => "boys",
            ClassMetric::Girls => "girls",
        }
    }
}

/// Column naming used by the input table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnScheme {
    /// Header of the column carrying the QR payload.
    pub scan_column: String,
}

impl Default for ColumnScheme {
    fn default() -> Self {
        Self {
            scan_column: DEFAULT_SCAN_COLUMN.to_string(),
        }
    }
}

impl ColumnScheme {
    pub fn with_scan_column(scan_column: impl Into<String>) -> Self {
        Self {
            scan_column: scan_column.into(),
        }
    }

    /// Header of a class metric column, e.g. `Number of boys in class 3`.
    pub fn metric_column(metric: ClassMetric, class: u8) -> String {
        format!("Number of {} in class {class}", metric.noun())
    }
}

/// One input row: the optional QR payload and every other cell in header order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRecord {
    pub scan_text: Option<CellValue>,
    pub cells: Vec<(String, CellValue)>,
}

impl RawRecord {
    pub fn new(scan_text: Option<CellValue>, cells: Vec<(String, CellValue)>) -> Self {
        Self { scan_text, cells }
    }

    /// Convenience constructor for a row whose payload is plain text.
    pub fn with_scan(scan_text: impl Into<String>) -> Self {
        Self {
            scan_text: Some(CellValue::Text(scan_text.into())),
            cells: Vec::new(),
        }
    }

    /// Appends a cell, returning the record for chaining.
    pub fn cell(mut self, column: impl Into<String>, value: CellValue) -> Self {
        self.cells.push((column.into(), value));
        self
    }
}

/// A loaded input table. `columns` lists the non-payload headers in order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub records: Vec<RawRecord>,
}

/// Location fields parsed out of a QR payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedLocation {
    pub district: Option<String>,
    pub chiefdom: Option<String>,
    pub phu_name: Option<String>,
    pub community_name: Option<String>,
    pub school_name: Option<String>,
}

/// The five location levels carried by a QR payload, ordered from the
/// widest administrative unit down to the school.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LocationField {
    District,
    Chiefdom,
    PhuName,
    CommunityName,
    SchoolName,
}

impl LocationField {
    pub const ALL: [LocationField; 5] = [
        LocationField::District,
        LocationField::Chiefdom,
        LocationField::PhuName,
        LocationField::CommunityName,
        LocationField::SchoolName,
    ];

    /// Label that introduces the field inside the payload, without the colon.
    pub fn label(self) -> &'static str {
        match self {
            LocationField::District => "District",
            LocationField::Chiefdom => "Chiefdom",
            LocationField::PhuName => "PHU name",
            LocationField::CommunityName => "Community name",
            LocationField::SchoolName => "Name of school",
        }
    }

    /// Column header used when the field is tabulated.
    pub fn header(self) -> &'static str {
        match self {
            LocationField::District => "District",
            LocationField::Chiefdom => "Chiefdom",
            LocationField::PhuName => "PHU Name",
            LocationField::CommunityName => "Community Name",
            LocationField::SchoolName => "School Name",
        }
    }

    /// This level and every level above it, widest first.
    pub fn path(self) -> &'static [LocationField] {
        let depth = LocationField::ALL
            .iter()
            .position(|field| *field == self)
            .unwrap_or(0);
        &LocationField::ALL[..=depth]
    }
}

impl fmt::Display for LocationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

impl ExtractedLocation {
    pub fn get(&self, field: LocationField) -> Option<&str> {
        match field {
            LocationField::District => self.district.as_deref(),
            LocationField::Chiefdom => self.chiefdom.as_deref(),
            LocationField::PhuName => self.phu_name.as_deref(),
            LocationField::CommunityName => self.community_name.as_deref(),
            LocationField::SchoolName => self.school_name.as_deref(),
        }
    }

    pub fn set(&mut self, field: LocationField, value: Option<String>) {
        let slot = match field {
            LocationField::District => &mut self.district,
            LocationField::Chiefdom => &mut self.chiefdom,
            LocationField::PhuName => &mut self.phu_name,
            LocationField::CommunityName => &mut self.community_name,
            LocationField::SchoolName => &mut self.school_name,
        };
        *slot = value;
    }
}

/// An input row with its parsed location attached.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnrichedRecord {
    pub location: ExtractedLocation,
    pub cells: Vec<(String, CellValue)>,
}

impl EnrichedRecord {
    /// Looks up a cell by exact header.
    pub fn cell(&self, column: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Reads a numeric column. Absent columns and unusable cells come back as
    /// zero contributions rather than errors.
    pub fn contribution(&self, column: &str) -> Contribution {
        match self.cell(column) {
            Some(value) => value.contribution(),
            None => Contribution::Absent,
        }
    }

    pub fn metric(&self, metric: ClassMetric, class: u8) -> Contribution {
        self.contribution(&ColumnScheme::metric_column(metric, class))
    }
}
